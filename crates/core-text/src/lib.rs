//! Buffer engine surface and the rope-backed engine behind it.
//!
//! The rest of the pipeline talks to text exclusively through
//! [`BufferEngine`] / [`EngineReader`] in terms of absolute byte offsets and
//! `(line, column)` points. Offsets always sit on UTF-8 rune boundaries; the
//! engine rejects anything else with [`EngineError::RuneBoundary`] rather
//! than rounding silently.

use ropey::Rope;
use thiserror::Error;

pub mod rune;
pub mod scan;
pub mod width;

/// Absolute byte position in the buffer's UTF-8 content.
pub type ByteOffset = usize;

/// `(line, column)` coordinate; `column` is a byte offset within the line's
/// bytes. Derived from a buffer revision and invalidated by any edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub line: usize,
    pub column: usize,
}

impl Point {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn origin() -> Self {
        Self { line: 0, column: 0 }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("offset {offset} out of range (buffer length {len})")]
    OutOfRange { offset: usize, len: usize },
    #[error("offset {0} is not on a rune boundary")]
    RuneBoundary(usize),
    #[error("buffer is read-only")]
    ReadOnly,
}

/// Outcome of a successful mutation: the byte range now occupied by the new
/// text and the revision it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditResult {
    pub start: ByteOffset,
    pub end: ByteOffset,
    pub revision: u64,
}

/// A reversible change record: `old_text` occupied `[start, start+old.len())`
/// before the edit, `new_text` occupies that position after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: ByteOffset,
    pub old_text: String,
    pub new_text: String,
}

impl Edit {
    pub fn insertion(start: ByteOffset, text: impl Into<String>) -> Self {
        Self {
            start,
            old_text: String::new(),
            new_text: text.into(),
        }
    }

    pub fn deletion(start: ByteOffset, old: impl Into<String>) -> Self {
        Self {
            start,
            old_text: old.into(),
            new_text: String::new(),
        }
    }

    /// The byte range the edit replaced, in pre-edit coordinates.
    pub fn range_before(&self) -> (ByteOffset, ByteOffset) {
        (self.start, self.start + self.old_text.len())
    }

    /// Signed byte growth of the buffer caused by this edit.
    pub fn delta(&self) -> isize {
        self.new_text.len() as isize - self.old_text.len() as isize
    }

    /// True when the edit adds or removes line breaks.
    pub fn is_structural(&self) -> bool {
        self.old_text.contains('\n') || self.new_text.contains('\n')
    }
}

/// Read-only view of buffer content at one revision.
pub trait EngineReader: Send {
    fn text(&self) -> String;
    fn text_range(&self, start: ByteOffset, end: ByteOffset) -> Result<String, EngineError>;
    /// Line content excluding any trailing newline; `None` past the end.
    fn line_text(&self, line: usize) -> Option<String>;
    fn len(&self) -> ByteOffset;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn line_count(&self) -> usize;
    fn line_start_offset(&self, line: usize) -> Option<ByteOffset>;
    /// End of line content, excluding the trailing newline.
    fn line_end_offset(&self, line: usize) -> Option<ByteOffset>;
    fn offset_to_point(&self, offset: ByteOffset) -> Result<Point, EngineError>;
    fn point_to_offset(&self, point: Point) -> Result<ByteOffset, EngineError>;
    fn revision_id(&self) -> u64;
}

/// The single mutator of buffer content. All edits funnel through
/// `insert`/`delete`/`replace`; every successful mutation strictly increases
/// the revision id.
pub trait BufferEngine: EngineReader {
    fn insert(&mut self, offset: ByteOffset, text: &str) -> Result<EditResult, EngineError>;
    fn delete(&mut self, start: ByteOffset, end: ByteOffset) -> Result<EditResult, EngineError>;
    fn replace(
        &mut self,
        start: ByteOffset,
        end: ByteOffset,
        text: &str,
    ) -> Result<EditResult, EngineError>;
    /// Replace the whole content (buffer load path).
    fn set_text(&mut self, text: &str) -> Result<EditResult, EngineError>;
    /// Immutable view at the current revision; cheap (rope clone).
    fn snapshot(&self) -> Box<dyn EngineReader>;
    fn is_read_only(&self) -> bool;
    fn set_read_only(&mut self, read_only: bool);
}

// -------------------------------------------------------------------------------------------------
// Rope-backed reference engine
// -------------------------------------------------------------------------------------------------

/// Reference [`BufferEngine`] backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct TextEngine {
    rope: Rope,
    revision: u64,
    read_only: bool,
}

impl TextEngine {
    pub fn new(content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
            revision: 1,
            read_only: false,
        }
    }

    /// Translate a byte offset to a rope char index, validating range and
    /// rune boundary.
    fn char_index(rope: &Rope, offset: ByteOffset) -> Result<usize, EngineError> {
        let len = rope.len_bytes();
        if offset > len {
            return Err(EngineError::OutOfRange { offset, len });
        }
        let ci = rope.byte_to_char(offset);
        if rope.char_to_byte(ci) != offset {
            return Err(EngineError::RuneBoundary(offset));
        }
        Ok(ci)
    }

    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }
}

fn reader_text_range(rope: &Rope, start: usize, end: usize) -> Result<String, EngineError> {
    let (s, e) = (start.min(end), start.max(end));
    let sc = TextEngine::char_index(rope, s)?;
    let ec = TextEngine::char_index(rope, e)?;
    Ok(rope.slice(sc..ec).to_string())
}

fn reader_line_text(rope: &Rope, line: usize) -> Option<String> {
    if line >= rope.len_lines() {
        return None;
    }
    let mut s = rope.line(line).to_string();
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    Some(s)
}

fn reader_line_start(rope: &Rope, line: usize) -> Option<usize> {
    if line >= rope.len_lines() {
        return None;
    }
    Some(rope.char_to_byte(rope.line_to_char(line)))
}

fn reader_offset_to_point(rope: &Rope, offset: usize) -> Result<Point, EngineError> {
    let _ = TextEngine::char_index(rope, offset)?;
    let line = rope.byte_to_line(offset);
    let line_start = rope.char_to_byte(rope.line_to_char(line));
    Ok(Point::new(line, offset - line_start))
}

fn reader_point_to_offset(rope: &Rope, point: Point) -> Result<usize, EngineError> {
    let len = rope.len_bytes();
    if point.line >= rope.len_lines() {
        return Err(EngineError::OutOfRange { offset: len, len });
    }
    let line_start = rope.char_to_byte(rope.line_to_char(point.line));
    let line_len = reader_line_text(rope, point.line)
        .map(|l| l.len())
        .unwrap_or(0);
    if point.column > line_len {
        return Err(EngineError::OutOfRange {
            offset: line_start + point.column,
            len,
        });
    }
    let offset = line_start + point.column;
    let _ = TextEngine::char_index(rope, offset)?;
    Ok(offset)
}

macro_rules! impl_reader {
    ($ty:ty, $rope:ident, $rev:ident) => {
        impl EngineReader for $ty {
            fn text(&self) -> String {
                self.$rope.to_string()
            }
            fn text_range(&self, start: ByteOffset, end: ByteOffset) -> Result<String, EngineError> {
                reader_text_range(&self.$rope, start, end)
            }
            fn line_text(&self, line: usize) -> Option<String> {
                reader_line_text(&self.$rope, line)
            }
            fn len(&self) -> ByteOffset {
                self.$rope.len_bytes()
            }
            fn line_count(&self) -> usize {
                self.$rope.len_lines()
            }
            fn line_start_offset(&self, line: usize) -> Option<ByteOffset> {
                reader_line_start(&self.$rope, line)
            }
            fn line_end_offset(&self, line: usize) -> Option<ByteOffset> {
                let start = reader_line_start(&self.$rope, line)?;
                let content = reader_line_text(&self.$rope, line)?;
                Some(start + content.len())
            }
            fn offset_to_point(&self, offset: ByteOffset) -> Result<Point, EngineError> {
                reader_offset_to_point(&self.$rope, offset)
            }
            fn point_to_offset(&self, point: Point) -> Result<ByteOffset, EngineError> {
                reader_point_to_offset(&self.$rope, point)
            }
            fn revision_id(&self) -> u64 {
                self.$rev
            }
        }
    };
}

impl_reader!(TextEngine, rope, revision);

/// Detached read-only view (rope clone, O(1)).
pub struct EngineSnapshot {
    rope: Rope,
    revision: u64,
}

impl_reader!(EngineSnapshot, rope, revision);

impl BufferEngine for TextEngine {
    fn insert(&mut self, offset: ByteOffset, text: &str) -> Result<EditResult, EngineError> {
        if self.read_only {
            return Err(EngineError::ReadOnly);
        }
        let ci = Self::char_index(&self.rope, offset)?;
        self.rope.insert(ci, text);
        let revision = self.bump();
        tracing::trace!(target: "text.engine", offset, bytes = text.len(), revision, "insert");
        Ok(EditResult {
            start: offset,
            end: offset + text.len(),
            revision,
        })
    }

    fn delete(&mut self, start: ByteOffset, end: ByteOffset) -> Result<EditResult, EngineError> {
        if self.read_only {
            return Err(EngineError::ReadOnly);
        }
        let (s, e) = (start.min(end), start.max(end));
        let sc = Self::char_index(&self.rope, s)?;
        let ec = Self::char_index(&self.rope, e)?;
        self.rope.remove(sc..ec);
        let revision = self.bump();
        tracing::trace!(target: "text.engine", start = s, end = e, revision, "delete");
        Ok(EditResult {
            start: s,
            end: s,
            revision,
        })
    }

    fn replace(
        &mut self,
        start: ByteOffset,
        end: ByteOffset,
        text: &str,
    ) -> Result<EditResult, EngineError> {
        if self.read_only {
            return Err(EngineError::ReadOnly);
        }
        let (s, e) = (start.min(end), start.max(end));
        let sc = Self::char_index(&self.rope, s)?;
        let ec = Self::char_index(&self.rope, e)?;
        self.rope.remove(sc..ec);
        self.rope.insert(sc, text);
        let revision = self.bump();
        tracing::trace!(target: "text.engine", start = s, end = e, bytes = text.len(), revision, "replace");
        Ok(EditResult {
            start: s,
            end: s + text.len(),
            revision,
        })
    }

    fn set_text(&mut self, text: &str) -> Result<EditResult, EngineError> {
        if self.read_only {
            return Err(EngineError::ReadOnly);
        }
        self.rope = Rope::from_str(text);
        let revision = self.bump();
        tracing::debug!(target: "text.engine", bytes = text.len(), revision, "set_text");
        Ok(EditResult {
            start: 0,
            end: text.len(),
            revision,
        })
    }

    fn snapshot(&self) -> Box<dyn EngineReader> {
        Box::new(EngineSnapshot {
            rope: self.rope.clone(),
            revision: self.revision,
        })
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_and_read_back() {
        let mut eng = TextEngine::new("hello world");
        let r = eng.insert(5, ",").unwrap();
        assert_eq!((r.start, r.end), (5, 6));
        assert_eq!(eng.text(), "hello, world");
    }

    #[test]
    fn delete_range() {
        let mut eng = TextEngine::new("hello, world");
        eng.delete(5, 6).unwrap();
        assert_eq!(eng.text(), "hello world");
    }

    #[test]
    fn replace_range() {
        let mut eng = TextEngine::new("abc def");
        let r = eng.replace(4, 7, "xyzzy").unwrap();
        assert_eq!(eng.text(), "abc xyzzy");
        assert_eq!((r.start, r.end), (4, 9));
    }

    #[test]
    fn rejects_mid_rune_offsets() {
        let mut eng = TextEngine::new("aé b"); // 'é' is 2 bytes at offset 1
        assert_eq!(eng.insert(2, "x"), Err(EngineError::RuneBoundary(2)));
        assert_eq!(
            eng.delete(0, 2).unwrap_err(),
            EngineError::RuneBoundary(2)
        );
        assert!(eng.insert(3, "x").is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        let mut eng = TextEngine::new("ab");
        assert_eq!(
            eng.insert(3, "x"),
            Err(EngineError::OutOfRange { offset: 3, len: 2 })
        );
        assert!(eng.text_range(0, 9).is_err());
    }

    #[test]
    fn read_only_blocks_mutation() {
        let mut eng = TextEngine::new("ab");
        eng.set_read_only(true);
        assert_eq!(eng.insert(0, "x"), Err(EngineError::ReadOnly));
        assert_eq!(eng.set_text("y"), Err(EngineError::ReadOnly));
        eng.set_read_only(false);
        assert!(eng.insert(0, "x").is_ok());
    }

    #[test]
    fn revision_strictly_increases() {
        let mut eng = TextEngine::new("ab");
        let r0 = eng.revision_id();
        let r1 = eng.insert(0, "x").unwrap().revision;
        let r2 = eng.delete(0, 1).unwrap().revision;
        assert!(r0 < r1 && r1 < r2);
        assert_eq!(eng.revision_id(), r2);
    }

    #[test]
    fn line_offsets_exclude_newline() {
        let eng = TextEngine::new("ab\ncde\n");
        assert_eq!(eng.line_count(), 3); // trailing newline yields an empty last line
        assert_eq!(eng.line_start_offset(0), Some(0));
        assert_eq!(eng.line_end_offset(0), Some(2));
        assert_eq!(eng.line_start_offset(1), Some(3));
        assert_eq!(eng.line_end_offset(1), Some(6));
        assert_eq!(eng.line_text(1).as_deref(), Some("cde"));
        assert_eq!(eng.line_text(9), None);
    }

    #[test]
    fn point_round_trip() {
        let eng = TextEngine::new("ab\ncdé\n");
        let p = eng.offset_to_point(5).unwrap();
        assert_eq!(p, Point::new(1, 2));
        assert_eq!(eng.point_to_offset(p).unwrap(), 5);
        assert!(eng.point_to_offset(Point::new(1, 99)).is_err());
        assert!(eng.point_to_offset(Point::new(9, 0)).is_err());
    }

    #[test]
    fn snapshot_is_immutable_view() {
        let mut eng = TextEngine::new("one");
        let snap = eng.snapshot();
        eng.insert(3, " two").unwrap();
        assert_eq!(snap.text(), "one");
        assert_eq!(eng.text(), "one two");
        assert!(snap.revision_id() < eng.revision_id());
    }
}
