//! Pager for fixed-record file I/O.

use folio_common::{FolioError, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A type with a fixed on-disk encoding.
///
/// Records are stored back to back; record `n` lives at byte offset
/// `n * DISK_SIZE` of its file. Decoding must tolerate a zero-padded
/// buffer so that a short read at the end of a file still produces a value.
pub trait FixedRecord: Sized {
    /// Exact size of the encoding in bytes.
    const DISK_SIZE: usize;

    /// Encodes the record into `buf`, which is exactly `DISK_SIZE` bytes.
    fn write_to(&self, buf: &mut [u8]);

    /// Decodes a record from `buf`, which is exactly `DISK_SIZE` bytes.
    fn read_from(buf: &[u8]) -> Self;
}

/// Random-access fixed-record I/O over one regular file.
///
/// A pager binds a single file for the lifetime of its subdatabase. It does
/// not interpret record contents and it does not flush explicitly; durability
/// comes from closing the file at shutdown.
pub struct Pager {
    /// The open file handle.
    file: Mutex<File>,
    /// Path to the file, kept for error reporting.
    path: PathBuf,
    /// Whether this open created (or truncated) the file.
    created: bool,
}

impl Pager {
    /// Opens an existing record file, or creates a fresh one.
    ///
    /// With `create` unset, a missing file surfaces `FileMissing` and any
    /// other open failure surfaces `FileCorrupt`. With `create` set, the
    /// file is created or truncated to empty.
    pub fn open(path: impl AsRef<Path>, create: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = if create {
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path)
                .map_err(|_| FolioError::FileCorrupt { path: path.clone() })?
        } else {
            match OpenOptions::new().read(true).write(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(FolioError::FileMissing { path });
                }
                Err(_) => return Err(FolioError::FileCorrupt { path }),
            }
        };

        Ok(Self {
            file: Mutex::new(file),
            path,
            created: create,
        })
    }

    /// Whether this open created the file, i.e. the file starts out empty.
    ///
    /// A B+ tree consults this to decide whether to initialise its header.
    pub fn created(&self) -> bool {
        self.created
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the record at slot `n`.
    pub fn save<R: FixedRecord>(&self, n: i64, record: &R) -> Result<()> {
        let mut buf = vec![0u8; R::DISK_SIZE];
        record.write_to(&mut buf);

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(n as u64 * R::DISK_SIZE as u64))?;
        file.write_all(&buf)?;
        Ok(())
    }

    /// Reads the record at slot `n`.
    ///
    /// Returns `None` when nothing is readable at the slot (past end of
    /// file, or a negative slot). A partial record at the tail of the file
    /// decodes from a zero-padded buffer.
    pub fn recover<R: FixedRecord>(&self, n: i64) -> Result<Option<R>> {
        if n < 0 {
            return Ok(None);
        }

        let mut buf = vec![0u8; R::DISK_SIZE];
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(n as u64 * R::DISK_SIZE as u64))?;

        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled == 0 {
            Ok(None)
        } else {
            Ok(Some(R::read_from(&buf)))
        }
    }

    /// Returns the id an appended record would get: `file_len / DISK_SIZE`.
    pub fn next_id<R: FixedRecord>(&self) -> Result<i64> {
        let len = self.file.lock().seek(SeekFrom::End(0))?;
        Ok((len / R::DISK_SIZE as u64) as i64)
    }

    /// Marks slot `n` deleted by stamping a tombstone byte at its offset.
    pub fn erase<R: FixedRecord>(&self, n: i64) -> Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(n as u64 * R::DISK_SIZE as u64))?;
        file.write_all(b"X")?;
        Ok(())
    }
}

impl std::fmt::Debug for Pager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("path", &self.path)
            .field("created", &self.created)
            .finish()
    }
}
