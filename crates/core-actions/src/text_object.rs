//! Text-object-to-range resolution.
//!
//! Objects resolve around the cursor: words by token run, sentences by
//! terminator scan, paragraphs by blank-line runs (linewise), quotes by
//! same-line pairing, and bracket pairs by a balanced outward scan. `None`
//! means no such object encloses the cursor.

use crate::range::{RangeSpec, line_span};
use crate::result::DispatchError;
use core_events::{TextObject, TextObjectKind};
use core_text::{EngineReader, rune, scan};

/// Resolve a text object at `origin`. `Ok(None)` when the object does not
/// exist there.
pub fn text_object_range(
    engine: &dyn EngineReader,
    origin: usize,
    obj: TextObject,
) -> Result<Option<RangeSpec>, DispatchError> {
    let text = engine.text();
    let origin = origin.min(text.len());

    let spec = match obj.kind {
        TextObjectKind::Word | TextObjectKind::BigWord => {
            let big = matches!(obj.kind, TextObjectKind::BigWord);
            scan::word_bounds_at(&text, origin, big).map(|(start, mut end)| {
                if obj.around {
                    end = scan::extend_trailing_blanks(&text, end);
                }
                RangeSpec::charwise(start, end)
            })
        }
        TextObjectKind::Sentence => {
            let (start, end) = scan::sentence_bounds_at(&text, origin, obj.around);
            (start < end).then_some(RangeSpec::charwise(start, end))
        }
        TextObjectKind::Paragraph => paragraph_object(engine, origin, obj.around)?,
        TextObjectKind::Quote(q) => quote_object(engine, origin, q, obj.around)?,
        TextObjectKind::Paren => pair_object(&text, origin, '(', ')', obj.around),
        TextObjectKind::Bracket => pair_object(&text, origin, '[', ']', obj.around),
        TextObjectKind::Brace => pair_object(&text, origin, '{', '}', obj.around),
        // Tags are simplified to their angle-bracket shell.
        TextObjectKind::Angle | TextObjectKind::Tag => pair_object(&text, origin, '<', '>', obj.around),
    };
    Ok(spec)
}

fn paragraph_object(
    engine: &dyn EngineReader,
    origin: usize,
    around: bool,
) -> Result<Option<RangeSpec>, DispatchError> {
    let point = engine.offset_to_point(origin)?;
    let blank = |l: usize| {
        engine
            .line_text(l)
            .map(|t| scan::is_blank_line(&t))
            .unwrap_or(true)
    };
    let on_blank = blank(point.line);
    let mut first = point.line;
    while first > 0 && blank(first - 1) == on_blank {
        first -= 1;
    }
    let last_line = engine.line_count().saturating_sub(1);
    let mut last = point.line;
    while last < last_line && blank(last + 1) == on_blank {
        last += 1;
    }
    if around {
        // Include the following blank run (or preceding one when the cursor
        // sits on blanks).
        if !on_blank {
            while last < last_line && blank(last + 1) {
                last += 1;
            }
        } else {
            while last < last_line && !blank(last + 1) {
                last += 1;
            }
        }
    }
    Ok(line_span(engine, first, last))
}

fn quote_object(
    engine: &dyn EngineReader,
    origin: usize,
    quote: char,
    around: bool,
) -> Result<Option<RangeSpec>, DispatchError> {
    // Quotes pair up sequentially within a single line.
    let point = engine.offset_to_point(origin)?;
    let line_start = engine.line_start_offset(point.line).unwrap_or(0);
    let line = engine.line_text(point.line).unwrap_or_default();
    let col = origin - line_start;

    let mut openings = Vec::new();
    let mut pairs = Vec::new();
    for (i, c) in line.char_indices() {
        if c == quote {
            match openings.pop() {
                Some(open) => pairs.push((open, i)),
                None => openings.push(i),
            }
        }
    }
    let found = pairs
        .into_iter()
        .find(|&(open, close)| open <= col && col <= close);
    let Some((open, close)) = found else {
        return Ok(None);
    };
    let q_len = quote.len_utf8();
    let spec = if around {
        RangeSpec::charwise(line_start + open, line_start + close + q_len)
    } else {
        RangeSpec::charwise(line_start + open + q_len, line_start + close)
    };
    Ok(Some(spec))
}

/// Balanced pair scan outward from `origin`.
fn pair_object(
    text: &str,
    origin: usize,
    open: char,
    close: char,
    around: bool,
) -> Option<RangeSpec> {
    let open_pos = if rune::rune_at(text, origin) == Some(open) {
        origin
    } else {
        // Walk backward tracking nesting depth.
        let mut depth = 0usize;
        let mut pos = origin;
        loop {
            if pos == 0 {
                return None;
            }
            pos = rune::prev_rune_start(text, pos);
            match rune::rune_at(text, pos) {
                Some(c) if c == close => depth += 1,
                Some(c) if c == open => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
        pos
    };

    // Forward from just past the opener, tracking depth.
    let mut depth = 0usize;
    let mut pos = rune::next_rune_end(text, open_pos);
    let close_pos = loop {
        match rune::rune_at(text, pos) {
            None => return None,
            Some(c) if c == open => depth += 1,
            Some(c) if c == close => {
                if depth == 0 {
                    break pos;
                }
                depth -= 1;
            }
            _ => {}
        }
        pos = rune::next_rune_end(text, pos);
    };

    let spec = if around {
        RangeSpec::charwise(open_pos, rune::next_rune_end(text, close_pos))
    } else {
        RangeSpec::charwise(rune::next_rune_end(text, open_pos), close_pos)
    };
    Some(spec)
}
