//! Motion-to-range resolution.
//!
//! Operators and the delete/yank families share one resolver so their
//! semantics cannot drift: given a starting offset, a motion, and a count,
//! compute the half-open byte range the operation covers and whether it is
//! linewise. Resolution never mutates state; it replays the motion over a
//! snapshot of the content.

use crate::result::DispatchError;
use core_events::Motion;
use core_text::{EngineReader, rune, scan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: usize,
    pub end: usize,
    pub linewise: bool,
}

impl RangeSpec {
    pub fn charwise(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
            linewise: false,
        }
    }

    pub fn linewise(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
            linewise: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

fn line_is_blank(engine: &dyn EngineReader, line: usize) -> bool {
    engine
        .line_text(line)
        .map(|l| scan::is_blank_line(&l))
        .unwrap_or(true)
}

/// First blank line at or after the paragraph that begins at/after `line`
/// (skipping any blank run under it first). Clamps to the last line.
fn next_paragraph_boundary(engine: &dyn EngineReader, mut line: usize) -> usize {
    let last = engine.line_count().saturating_sub(1);
    while line < last && line_is_blank(engine, line) {
        line += 1;
    }
    while line < last && !line_is_blank(engine, line + 1) {
        line += 1;
    }
    (line + 1).min(last)
}

/// Blank line (or line 0) before the paragraph that ends at/before `line`.
fn prev_paragraph_boundary(engine: &dyn EngineReader, mut line: usize) -> usize {
    while line > 0 && line_is_blank(engine, line) {
        line -= 1;
    }
    while line > 0 && !line_is_blank(engine, line - 1) {
        line -= 1;
    }
    line.saturating_sub(1)
}

/// Byte range covering whole lines `first..=last` including the trailing
/// newline of `last` when present.
pub fn line_span(engine: &dyn EngineReader, first: usize, last: usize) -> Option<RangeSpec> {
    let start = engine.line_start_offset(first)?;
    let end = engine
        .line_start_offset(last + 1)
        .unwrap_or_else(|| engine.len());
    Some(RangeSpec::linewise(start, end))
}

/// Resolve `(origin, motion, count)` to the operator range.
pub fn motion_range(
    engine: &dyn EngineReader,
    origin: usize,
    motion: Motion,
    count: usize,
) -> Result<RangeSpec, DispatchError> {
    let count = count.max(1);
    let text = engine.text();
    let len = text.len();
    let origin = origin.min(len);
    let point = engine.offset_to_point(origin)?;
    let last_line = engine.line_count().saturating_sub(1);

    let spec = match motion {
        Motion::Word => {
            let mut end = origin;
            for _ in 0..count {
                end = scan::find_next_word_start(&text, end, len);
            }
            RangeSpec::charwise(origin, end)
        }
        Motion::WordEnd => {
            let mut end = origin;
            for _ in 0..count {
                end = scan::find_word_end(&text, end);
            }
            RangeSpec::charwise(origin, end)
        }
        Motion::WordBack => {
            let mut start = origin;
            for _ in 0..count {
                start = scan::find_prev_word_start(&text, start);
            }
            RangeSpec::charwise(start, origin)
        }
        Motion::Line => {
            let last = (point.line + count - 1).min(last_line);
            line_span(engine, point.line, last).unwrap_or(RangeSpec::linewise(origin, origin))
        }
        Motion::LineEnd => {
            let end = engine.line_end_offset(point.line).unwrap_or(len);
            RangeSpec::charwise(origin, end)
        }
        Motion::LineStart => {
            let start = engine.line_start_offset(point.line).unwrap_or(0);
            RangeSpec::charwise(start, origin)
        }
        Motion::FirstNonBlank => {
            let line_start = engine.line_start_offset(point.line).unwrap_or(0);
            let content = engine.line_text(point.line).unwrap_or_default();
            let target = line_start + scan::first_non_blank(&content);
            RangeSpec::charwise(target, origin)
        }
        Motion::Paragraph => {
            let mut boundary = point.line;
            for _ in 0..count {
                boundary = next_paragraph_boundary(engine, boundary);
            }
            // Cover through the line before the blank boundary; a boundary
            // pinned at the last line covers through it.
            let last = if boundary > point.line && line_is_blank(engine, boundary) {
                boundary - 1
            } else {
                boundary
            };
            line_span(engine, point.line, last.max(point.line))
                .unwrap_or(RangeSpec::linewise(origin, origin))
        }
        Motion::ParagraphBack => {
            let mut boundary = point.line;
            for _ in 0..count {
                boundary = prev_paragraph_boundary(engine, boundary);
            }
            let first = if boundary < point.line && line_is_blank(engine, boundary) {
                boundary + 1
            } else {
                boundary
            };
            line_span(engine, first.min(point.line), point.line)
                .unwrap_or(RangeSpec::linewise(origin, origin))
        }
        Motion::DocumentEnd => {
            line_span(engine, point.line, last_line).unwrap_or(RangeSpec::linewise(origin, len))
        }
        Motion::DocumentStart => {
            line_span(engine, 0, point.line).unwrap_or(RangeSpec::linewise(0, origin))
        }
    };
    Ok(spec)
}

/// Cursor destination for a bare motion (no operator). Linewise motions land
/// on a line start; charwise motions land on the moving end of the range.
pub fn motion_target(
    engine: &dyn EngineReader,
    origin: usize,
    motion: Motion,
    count: usize,
) -> Result<usize, DispatchError> {
    let count = count.max(1);
    let text = engine.text();
    let point = engine.offset_to_point(origin.min(text.len()))?;
    let target = match motion {
        Motion::Word => {
            let mut pos = origin;
            for _ in 0..count {
                pos = scan::find_next_word_start(&text, pos, text.len());
            }
            pos
        }
        Motion::WordEnd => {
            let mut pos = origin;
            for _ in 0..count {
                pos = scan::find_word_end(&text, pos);
            }
            // Land on the final rune of the word, not past it.
            rune::prev_rune_start(&text, pos)
        }
        Motion::WordBack => {
            let mut pos = origin;
            for _ in 0..count {
                pos = scan::find_prev_word_start(&text, pos);
            }
            pos
        }
        Motion::Line => {
            let line = (point.line + count).min(engine.line_count().saturating_sub(1));
            engine.line_start_offset(line).unwrap_or(origin)
        }
        Motion::LineEnd => engine.line_end_offset(point.line).unwrap_or(text.len()),
        Motion::LineStart => engine.line_start_offset(point.line).unwrap_or(0),
        Motion::FirstNonBlank => {
            let start = engine.line_start_offset(point.line).unwrap_or(0);
            let content = engine.line_text(point.line).unwrap_or_default();
            start + scan::first_non_blank(&content)
        }
        Motion::Paragraph => {
            let mut line = point.line;
            for _ in 0..count {
                line = next_paragraph_boundary(engine, line);
            }
            engine.line_start_offset(line).unwrap_or(text.len())
        }
        Motion::ParagraphBack => {
            let mut line = point.line;
            for _ in 0..count {
                line = prev_paragraph_boundary(engine, line);
            }
            engine.line_start_offset(line).unwrap_or(0)
        }
        Motion::DocumentEnd => engine
            .line_start_offset(engine.line_count().saturating_sub(1))
            .unwrap_or(0),
        Motion::DocumentStart => 0,
    };
    Ok(target)
}
