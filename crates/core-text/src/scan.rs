//! Token scanning: word boundaries, sentences, blank lines, indentation.
//!
//! Word classification:
//! * word rune: ASCII alphanumeric plus `_`
//! * WORD rune: any non-whitespace
//! * whitespace: space, tab, `\n`, `\r`
//!
//! Forward word search is a three-state walk over `(in_word,
//! found_non_word)`; punctuation after a word arms the separator flag,
//! punctuation directly after whitespace is itself a stop.

use crate::rune::{next_rune_end, prev_rune_start, rune_at};

pub fn is_word_rune(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn is_space_rune(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Word,
    Punct,
    Space,
}

fn classify(c: char) -> Class {
    if is_space_rune(c) {
        Class::Space
    } else if is_word_rune(c) {
        Class::Word
    } else {
        Class::Punct
    }
}

/// Start offset of the next word after `offset`, scanning no further than
/// `max`. Returns `max` when no further word start exists.
pub fn find_next_word_start(text: &str, offset: usize, max: usize) -> usize {
    let max = max.min(text.len());
    let mut pos = offset.min(max);
    let mut in_word = false;
    let mut found_non_word = false;
    let mut prev_space = false;
    while pos < max {
        let Some(c) = rune_at(text, pos) else { break };
        match classify(c) {
            Class::Word => {
                if found_non_word {
                    return pos;
                }
                in_word = true;
                prev_space = false;
            }
            Class::Space => {
                if in_word {
                    found_non_word = true;
                }
                in_word = false;
                prev_space = true;
            }
            Class::Punct => {
                if prev_space {
                    return pos;
                }
                if in_word {
                    found_non_word = true;
                }
                in_word = false;
                prev_space = false;
            }
        }
        pos = next_rune_end(text, pos);
    }
    max
}

/// Start offset of the previous word/punct token strictly before `offset`.
pub fn find_prev_word_start(text: &str, offset: usize) -> usize {
    let mut pos = offset.min(text.len());
    // Skip whitespace (and nothing at all) leftward to the previous token.
    loop {
        if pos == 0 {
            return 0;
        }
        let prev = prev_rune_start(text, pos);
        let Some(c) = rune_at(text, prev) else { return 0 };
        if classify(c) == Class::Space {
            pos = prev;
        } else {
            break;
        }
    }
    // Walk to the start of that token (same class run).
    let last = prev_rune_start(text, pos);
    let cls = rune_at(text, last).map(classify);
    let mut start = last;
    while start > 0 {
        let before = prev_rune_start(text, start);
        if rune_at(text, before).map(classify) == cls {
            start = before;
        } else {
            break;
        }
    }
    start
}

/// Exclusive end of the current/next word token after `offset` (Vim `e`:
/// always makes progress by at least one rune).
pub fn find_word_end(text: &str, offset: usize) -> usize {
    let len = text.len();
    let mut pos = next_rune_end(text, offset);
    while pos < len {
        match rune_at(text, pos) {
            Some(c) if classify(c) == Class::Space => pos = next_rune_end(text, pos),
            _ => break,
        }
    }
    if pos >= len {
        return len;
    }
    let cls = rune_at(text, pos).map(classify);
    let mut end = pos;
    while end < len && rune_at(text, end).map(classify) == cls {
        end = next_rune_end(text, end);
    }
    end
}

/// Bounds of the token containing `offset`: a word/punct/whitespace run, or
/// (with `big`) a run of anything non-whitespace.
pub fn word_bounds_at(text: &str, offset: usize, big: bool) -> Option<(usize, usize)> {
    let c = rune_at(text, offset)?;
    let same = |other: char| -> bool {
        if big {
            is_space_rune(other) == is_space_rune(c)
        } else {
            classify(other) == classify(c)
        }
    };
    let mut start = offset;
    while start > 0 {
        let before = prev_rune_start(text, start);
        match rune_at(text, before) {
            Some(p) if same(p) && p != '\n' => start = before,
            _ => break,
        }
    }
    let mut end = next_rune_end(text, offset);
    while end < text.len() {
        match rune_at(text, end) {
            Some(n) if same(n) && n != '\n' => end = next_rune_end(text, end),
            _ => break,
        }
    }
    Some((start, end))
}

/// Extend `end` over trailing same-line blanks (spaces/tabs only).
pub fn extend_trailing_blanks(text: &str, end: usize) -> usize {
    let mut e = end;
    while let Some(c) = rune_at(text, e) {
        if c == ' ' || c == '\t' {
            e = next_rune_end(text, e);
        } else {
            break;
        }
    }
    e
}

fn is_sentence_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Bounds of the sentence containing `offset`; sentences are bounded by
/// `.`/`!`/`?` followed by whitespace. `around` extends over trailing
/// whitespace.
pub fn sentence_bounds_at(text: &str, offset: usize, around: bool) -> (usize, usize) {
    let len = text.len();
    let offset = offset.min(len);
    // Start: first non-space after the previous terminator+space pair.
    let mut start = 0;
    let mut pos = offset;
    while pos > 0 {
        let prev = prev_rune_start(text, pos);
        let Some(c) = rune_at(text, prev) else { break };
        if is_sentence_terminator(c) && rune_at(text, pos).is_some_and(is_space_rune) {
            start = pos;
            break;
        }
        pos = prev;
    }
    while let Some(c) = rune_at(text, start) {
        if is_space_rune(c) && start < offset {
            start = next_rune_end(text, start);
        } else {
            break;
        }
    }
    // End: past the next terminator.
    let mut end = offset;
    while end < len {
        let Some(c) = rune_at(text, end) else { break };
        end = next_rune_end(text, end);
        if is_sentence_terminator(c) {
            break;
        }
    }
    if around {
        while rune_at(text, end).is_some_and(is_space_rune) {
            end = next_rune_end(text, end);
        }
    }
    (start, end)
}

/// A paragraph boundary is a run of lines that are empty or whitespace-only.
pub fn is_blank_line(line: &str) -> bool {
    line.chars().all(is_space_rune)
}

/// Byte offset of the first non-whitespace rune on `line` (or its length).
pub fn first_non_blank(line: &str) -> usize {
    let mut pos = 0;
    while let Some(c) = rune_at(line, pos) {
        if c == ' ' || c == '\t' {
            pos = next_rune_end(line, pos);
        } else {
            break;
        }
    }
    pos
}

/// Leading space/tab prefix of `line`.
pub fn leading_whitespace(line: &str) -> &str {
    &line[..first_non_blank(line)]
}

/// Display width of a whitespace prefix, expanding tabs to `tab_width`
/// columns.
pub fn indent_width(ws: &str, tab_width: usize) -> usize {
    ws.chars()
        .map(|c| if c == '\t' { tab_width.max(1) } else { 1 })
        .sum()
}
