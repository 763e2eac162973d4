//! Key types for the B+ trees.
//!
//! Every key carries a sort field and an out-of-band `record_id` naming a
//! payload slot in the subdatabase's record file. Ordering and equality are
//! defined solely on the sort field; the id rides along untouched through
//! inserts, lookups, and iteration.

use bytes::{Buf, BufMut};
use folio_common::KEY_WIDTH;
use std::cmp::Ordering;

/// A fixed-size, totally ordered B+ tree key.
pub trait IndexKey: Copy + Default {
    /// Exact size of the encoding in bytes.
    const ENCODED_LEN: usize;

    /// Compares the sort fields. The payload id never participates.
    fn order_cmp(&self, other: &Self) -> Ordering;

    /// Encodes the key into `buf`, which is exactly `ENCODED_LEN` bytes.
    fn encode(&self, buf: &mut [u8]);

    /// Decodes a key from `buf`, which is exactly `ENCODED_LEN` bytes.
    fn decode(buf: &[u8]) -> Self;
}

/// Key for the title and author trees: a fixed-width name plus payload id.
///
/// The name is NUL-padded to [`KEY_WIDTH`]; names longer than
/// `KEY_WIDTH - 3` bytes are truncated on a character boundary and suffixed
/// with `"..."`. Ordering is lexicographic on the padded bytes, which
/// matches C-string ordering because NUL sorts below every printable byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameKey {
    /// NUL-padded key text.
    pub name: [u8; KEY_WIDTH],
    /// Slot of the payload in the record file.
    pub record_id: i64,
}

impl NameKey {
    /// Builds a key from text, truncating and padding as needed.
    pub fn new(text: &str, record_id: i64) -> Self {
        let mut name = [0u8; KEY_WIDTH];
        let bytes = text.as_bytes();
        if bytes.len() > KEY_WIDTH - 3 {
            let mut cut = KEY_WIDTH - 3;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            name[..cut].copy_from_slice(&bytes[..cut]);
            name[cut..cut + 3].copy_from_slice(b"...");
        } else {
            name[..bytes.len()].copy_from_slice(bytes);
        }
        Self { name, record_id }
    }

    /// The stored text up to the first NUL.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.text_bytes()).into_owned()
    }

    /// The stored bytes up to the first NUL.
    pub fn text_bytes(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(KEY_WIDTH);
        &self.name[..end]
    }

    /// Whether the stored text starts with the given (untruncated) prefix.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.text_bytes().starts_with(prefix.as_bytes())
    }
}

impl Default for NameKey {
    fn default() -> Self {
        Self {
            name: [0u8; KEY_WIDTH],
            record_id: -1,
        }
    }
}

impl IndexKey for NameKey {
    const ENCODED_LEN: usize = KEY_WIDTH + 8;

    fn order_cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }

    fn encode(&self, mut buf: &mut [u8]) {
        buf.put_slice(&self.name);
        buf.put_i64_le(self.record_id);
    }

    fn decode(mut buf: &[u8]) -> Self {
        let mut name = [0u8; KEY_WIDTH];
        buf.copy_to_slice(&mut name);
        let record_id = buf.get_i64_le();
        Self { name, record_id }
    }
}

/// Key for the inverted index and top-K trees: a 64-bit hash plus payload id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashKey {
    /// Hash of the token or name; the sort field.
    pub hash: u64,
    /// Slot of the payload in the record file.
    pub record_id: i64,
}

impl HashKey {
    /// Creates a new hash key.
    pub fn new(hash: u64, record_id: i64) -> Self {
        Self { hash, record_id }
    }
}

impl Default for HashKey {
    fn default() -> Self {
        Self {
            hash: 0,
            record_id: -1,
        }
    }
}

impl IndexKey for HashKey {
    const ENCODED_LEN: usize = 16;

    fn order_cmp(&self, other: &Self) -> Ordering {
        self.hash.cmp(&other.hash)
    }

    fn encode(&self, mut buf: &mut [u8]) {
        buf.put_u64_le(self.hash);
        buf.put_i64_le(self.record_id);
    }

    fn decode(mut buf: &[u8]) -> Self {
        Self {
            hash: buf.get_u64_le(),
            record_id: buf.get_i64_le(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_key_ordering() {
        let a = NameKey::new("alpha", 1);
        let b = NameKey::new("beta", 2);
        assert_eq!(a.order_cmp(&b), Ordering::Less);
        assert_eq!(b.order_cmp(&a), Ordering::Greater);
        assert_eq!(a.order_cmp(&a), Ordering::Equal);
    }

    #[test]
    fn test_name_key_ordering_ignores_id() {
        let a = NameKey::new("same", 1);
        let b = NameKey::new("same", 99);
        assert_eq!(a.order_cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_name_key_prefix_ordering() {
        // "be" must sort at or before every key it prefixes.
        let prefix = NameKey::new("be", -1);
        let full = NameKey::new("beta", 0);
        assert_eq!(prefix.order_cmp(&full), Ordering::Less);
    }

    #[test]
    fn test_name_key_truncation() {
        let long = "x".repeat(100);
        let key = NameKey::new(&long, 0);
        let text = key.text();
        assert_eq!(text.len(), KEY_WIDTH);
        assert!(text.ends_with("..."));
        assert_eq!(&text[..KEY_WIDTH - 3], &long[..KEY_WIDTH - 3]);
    }

    #[test]
    fn test_name_key_truncation_char_boundary() {
        // 'é' is two bytes; truncation must not split it.
        let long = "é".repeat(40);
        let key = NameKey::new(&long, 0);
        assert!(key.text().ends_with("..."));
    }

    #[test]
    fn test_name_key_text_and_prefix() {
        let key = NameKey::new("beta", 7);
        assert_eq!(key.text(), "beta");
        assert!(key.starts_with("be"));
        assert!(key.starts_with("beta"));
        assert!(!key.starts_with("bet a"));
        assert!(!key.starts_with("betas"));
    }

    #[test]
    fn test_name_key_encode_decode() {
        let key = NameKey::new("round trip", 42);
        let mut buf = vec![0u8; NameKey::ENCODED_LEN];
        key.encode(&mut buf);
        let back = NameKey::decode(&buf);
        assert_eq!(back, key);
        assert_eq!(back.record_id, 42);
    }

    #[test]
    fn test_hash_key_ordering_ignores_id() {
        let a = HashKey::new(10, 1);
        let b = HashKey::new(10, 2);
        let c = HashKey::new(11, 0);
        assert_eq!(a.order_cmp(&b), Ordering::Equal);
        assert_eq!(a.order_cmp(&c), Ordering::Less);
    }

    #[test]
    fn test_hash_key_encode_decode() {
        let key = HashKey::new(u64::MAX - 1, 7);
        let mut buf = vec![0u8; HashKey::ENCODED_LEN];
        key.encode(&mut buf);
        let back = HashKey::decode(&buf);
        assert_eq!(back, key);
    }

    #[test]
    fn test_default_record_id() {
        assert_eq!(NameKey::default().record_id, -1);
        assert_eq!(HashKey::default().record_id, -1);
    }
}
