//! Core value types shared across folio components.

use serde::{Deserialize, Serialize};

/// Fixed width of a stored key, in bytes.
///
/// Insertion keys longer than `KEY_WIDTH - 3` bytes are truncated and
/// suffixed with `"..."`; shorter keys are NUL-padded to this width.
pub const KEY_WIDTH: usize = 64;

/// A slice of the source XML file: byte offset plus length.
///
/// This is the payload stored in the record files; queries resolve keys to
/// spans, and the presentation layer re-reads the span from the corpus.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DocSpan {
    /// Byte offset into the source file.
    pub pos: u32,
    /// Length of the slice in bytes.
    pub len: u32,
}

impl DocSpan {
    /// Creates a new span.
    pub fn new(pos: u32, len: u32) -> Self {
        Self { pos, len }
    }
}

impl std::fmt::Display for DocSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.pos, self.len)
    }
}

/// Which keyed subdatabase an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    /// The author index.
    Author,
    /// The title index.
    Title,
}

impl Field {
    /// Short name used in file names and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Author => "author",
            Field::Title => "title",
        }
    }
}
