//! `editor.delete*` handlers.
//!
//! Every delete captures the concatenated removed text (buffer order) into
//! the result's register content and records it in the register store.

use super::util::{PlannedEdit, apply_edit_plan, merge_ranges, plan_lines, shift_for};
use crate::context::ExecutionContext;
use crate::result::{ActionResult, DispatchError, redraw_for};
use core_state::{RegisterContent, Selection};
use core_text::{EngineReader, rune, scan};

fn validate_register(register: Option<char>) -> Result<(), DispatchError> {
    match register {
        Some(r) if !(r == '"' || r.is_ascii_alphanumeric()) => Err(DispatchError::Validation(
            format!("bad register name `{r}`"),
        )),
        _ => Ok(()),
    }
}

/// Shared tail for charwise deletes: merge ranges, apply, write registers,
/// collapse cursors to the (shifted) range starts.
fn run_delete(
    ctx: &mut ExecutionContext<'_>,
    group: &str,
    ranges: Vec<(usize, usize)>,
    linewise: bool,
    register: Option<char>,
) -> ActionResult {
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    if let Err(e) = validate_register(register) {
        return ActionResult::error(e);
    }
    let ranges = merge_ranges(ranges.into_iter().filter(|(s, e)| s < e).collect());
    if ranges.is_empty() {
        return ActionResult::noop();
    }
    let plan: Vec<PlannedEdit> = ranges
        .iter()
        .map(|&(s, e)| PlannedEdit::delete(s, e))
        .collect();
    let lines = plan_lines(ctx, &plan);
    let removed = match apply_edit_plan(ctx, group, plan.clone()) {
        Ok(r) => r,
        Err(e) => return ActionResult::error(e),
    };
    let mut text: String = removed.into_iter().map(|(_, t)| t).collect();
    if linewise && !text.ends_with('\n') {
        text.push('\n');
    }
    let content = RegisterContent { text, linewise };
    if let Err(e) = ctx.registers.record_delete(content.clone(), register) {
        return ActionResult::error(DispatchError::Validation(e.to_string()));
    }
    let cursors: Vec<Selection> = plan
        .iter()
        .enumerate()
        .map(|(i, e)| Selection::cursor(shift_for(&plan, Some(i), e.start)))
        .collect();
    let _ = ctx.cursors.set_all(cursors);
    ActionResult::ok()
        .with_redraw(redraw_for(ctx.edits(), lines))
        .with_register_content(content)
}

/// `editor.deleteChar`: `count` runes forward from each cursor.
pub(crate) fn delete_char(
    ctx: &mut ExecutionContext<'_>,
    count: usize,
    register: Option<char>,
) -> ActionResult {
    let text = ctx.engine.text();
    let ranges = ctx
        .cursors
        .all()
        .iter()
        .map(|s| (s.head, rune::advance(&text, s.head, count)))
        .collect();
    run_delete(ctx, "deleteChar", ranges, false, register)
}

/// `editor.deleteCharBack`: `count` runes backward from each cursor.
pub(crate) fn delete_char_back(
    ctx: &mut ExecutionContext<'_>,
    count: usize,
    register: Option<char>,
) -> ActionResult {
    let text = ctx.engine.text();
    let ranges = ctx
        .cursors
        .all()
        .iter()
        .map(|s| (rune::retreat(&text, s.head, count), s.head))
        .collect();
    run_delete(ctx, "deleteCharBack", ranges, false, register)
}

/// `editor.deleteToEnd`: cursor to line end, newline untouched.
pub(crate) fn delete_to_end(
    ctx: &mut ExecutionContext<'_>,
    register: Option<char>,
) -> ActionResult {
    let mut ranges = Vec::new();
    for s in ctx.cursors.all() {
        match ctx.engine.offset_to_point(s.head.min(ctx.engine.len())) {
            Ok(p) => {
                let end = ctx.engine.line_end_offset(p.line).unwrap_or(ctx.engine.len());
                ranges.push((s.head.min(end), end));
            }
            Err(e) => return ActionResult::error(e.into()),
        }
    }
    run_delete(ctx, "deleteToEnd", ranges, false, register)
}

/// `editor.deleteSelection`: drop each non-empty selection, collapsing to
/// its start.
pub(crate) fn delete_selection(
    ctx: &mut ExecutionContext<'_>,
    register: Option<char>,
) -> ActionResult {
    let ranges = ctx.cursors.all().iter().map(Selection::range).collect();
    run_delete(ctx, "deleteSelection", ranges, false, register)
}

/// `editor.deleteWord`: forward to the `count`-th next word start.
pub(crate) fn delete_word(
    ctx: &mut ExecutionContext<'_>,
    count: usize,
    register: Option<char>,
) -> ActionResult {
    let text = ctx.engine.text();
    let ranges = ctx
        .cursors
        .all()
        .iter()
        .map(|s| {
            let mut end = s.head;
            for _ in 0..count.max(1) {
                end = scan::find_next_word_start(&text, end, text.len());
            }
            (s.head, end)
        })
        .collect();
    run_delete(ctx, "deleteWord", ranges, false, register)
}

/// `editor.deleteWordBack`: back to the `count`-th previous word start.
pub(crate) fn delete_word_back(
    ctx: &mut ExecutionContext<'_>,
    count: usize,
    register: Option<char>,
) -> ActionResult {
    let text = ctx.engine.text();
    let ranges = ctx
        .cursors
        .all()
        .iter()
        .map(|s| {
            let mut start = s.head;
            for _ in 0..count.max(1) {
                start = scan::find_prev_word_start(&text, start);
            }
            (start, s.head)
        })
        .collect();
    run_delete(ctx, "deleteWordBack", ranges, false, register)
}

/// `editor.deleteLine`: `count` whole lines per cursor; the register gets
/// the lines with a trailing newline, and deleting through end-of-buffer
/// consumes the preceding newline instead.
pub(crate) fn delete_line(
    ctx: &mut ExecutionContext<'_>,
    count: usize,
    register: Option<char>,
) -> ActionResult {
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    if let Err(e) = validate_register(register) {
        return ActionResult::error(e);
    }
    let count = count.max(1);
    let last_line = ctx.engine.line_count().saturating_sub(1);
    let mut intervals: Vec<(usize, usize)> = ctx
        .cursors
        .all()
        .iter()
        .filter_map(|s| {
            let p = ctx.engine.offset_to_point(s.head.min(ctx.engine.len())).ok()?;
            Some((p.line, (p.line + count - 1).min(last_line)))
        })
        .collect();
    intervals.sort_unstable();
    intervals.dedup();
    // Merge overlapping line intervals.
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(intervals.len());
    for (a, b) in intervals {
        match merged.last_mut() {
            Some((_, prev_b)) if a <= *prev_b + 1 => *prev_b = b.max(*prev_b),
            _ => merged.push((a, b)),
        }
    }
    if merged.is_empty() {
        return ActionResult::noop();
    }

    let len = ctx.engine.len();
    let mut register_text = String::new();
    let mut ranges = Vec::with_capacity(merged.len());
    for &(first, last) in &merged {
        let start = match ctx.engine.line_start_offset(first) {
            Some(s) => s,
            None => continue,
        };
        let end = ctx.engine.line_start_offset(last + 1).unwrap_or(len);
        match ctx.engine.text_range(start, end) {
            Ok(t) => {
                register_text.push_str(&t);
                if !register_text.ends_with('\n') {
                    register_text.push('\n');
                }
            }
            Err(e) => return ActionResult::error(e.into()),
        }
        // Last lines of the buffer: take the newline that precedes them.
        let start = if end == len && first > 0 {
            ctx.engine.line_end_offset(first - 1).unwrap_or(start)
        } else {
            start
        };
        ranges.push((start, end));
    }

    let plan: Vec<PlannedEdit> = merge_ranges(ranges)
        .into_iter()
        .map(|(s, e)| PlannedEdit::delete(s, e))
        .collect();
    if let Err(e) = apply_edit_plan(ctx, "deleteLine", plan) {
        return ActionResult::error(e);
    }
    let content = RegisterContent::linewise(register_text);
    if let Err(e) = ctx.registers.record_delete(content.clone(), register) {
        return ActionResult::error(DispatchError::Validation(e.to_string()));
    }
    // Reposition each cursor at the start of the replacement line,
    // accounting for lines removed by earlier intervals.
    let new_last = ctx.engine.line_count().saturating_sub(1);
    let mut removed_before = 0usize;
    let cursors: Vec<Selection> = merged
        .iter()
        .map(|&(first, last)| {
            let line = first.saturating_sub(removed_before).min(new_last);
            removed_before += last - first + 1;
            Selection::cursor(ctx.engine.line_start_offset(line).unwrap_or(0))
        })
        .collect();
    let _ = ctx.cursors.set_all(cursors);
    ActionResult::ok()
        .with_redraw(crate::result::Redraw::All)
        .with_register_content(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::EditorModel;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn ctx_on(model: &mut EditorModel) -> ExecutionContext<'_> {
        ExecutionContext::new(model.split(), 0, HashMap::new())
    }

    #[test]
    fn delete_char_forward_captures_register() {
        let mut model = EditorModel::from_text("abc");
        let r = {
            let mut ctx = ctx_on(&mut model);
            delete_char(&mut ctx, 2, None)
        };
        assert_eq!(model.text(), "c");
        assert_eq!(r.register_content.unwrap().text, "ab");
        assert!(!r.linewise);
        assert_eq!(model.registers.read('"').unwrap().text, "ab");
    }

    #[test]
    fn delete_char_stops_at_buffer_end() {
        let mut model = EditorModel::from_text("ab");
        {
            let mut ctx = ctx_on(&mut model);
            delete_char(&mut ctx, 99, None);
        }
        assert_eq!(model.text(), "");
    }

    #[test]
    fn delete_char_back_moves_cursor() {
        let mut model = EditorModel::from_text("héllo");
        model.cursors.set_all(vec![Selection::cursor(3)]).unwrap(); // after é
        {
            let mut ctx = ctx_on(&mut model);
            delete_char_back(&mut ctx, 2, None);
        }
        assert_eq!(model.text(), "llo");
        assert_eq!(model.cursors.primary(), Selection::cursor(0));
    }

    #[test]
    fn delete_word_forward() {
        let mut model = EditorModel::from_text("foo bar baz");
        let r = {
            let mut ctx = ctx_on(&mut model);
            delete_word(&mut ctx, 1, None)
        };
        assert_eq!(model.text(), "bar baz");
        assert_eq!(r.register_content.unwrap().text, "foo ");
    }

    #[test]
    fn delete_to_end_keeps_newline() {
        let mut model = EditorModel::from_text("foo bar\nbaz");
        model.cursors.set_all(vec![Selection::cursor(3)]).unwrap();
        {
            let mut ctx = ctx_on(&mut model);
            delete_to_end(&mut ctx, None);
        }
        assert_eq!(model.text(), "foo\nbaz");
    }

    #[test]
    fn delete_selection_collapses_to_start() {
        let mut model = EditorModel::from_text("abcdef");
        model.cursors.set_all(vec![Selection::new(4, 1)]).unwrap(); // reversed
        {
            let mut ctx = ctx_on(&mut model);
            delete_selection(&mut ctx, None);
        }
        assert_eq!(model.text(), "aef");
        assert_eq!(model.cursors.primary(), Selection::cursor(1));
    }

    #[test]
    fn delete_line_middle() {
        let mut model = EditorModel::from_text("one\ntwo\nthree");
        model.cursors.set_all(vec![Selection::cursor(5)]).unwrap(); // on "two"
        let r = {
            let mut ctx = ctx_on(&mut model);
            delete_line(&mut ctx, 1, None)
        };
        assert_eq!(model.text(), "one\nthree");
        let content = r.register_content.unwrap();
        assert_eq!(content.text, "two\n");
        assert!(content.linewise && r.linewise);
        assert_eq!(model.cursors.primary(), Selection::cursor(4)); // start of "three"
    }

    #[test]
    fn delete_last_line_consumes_preceding_newline() {
        let mut model = EditorModel::from_text("one\ntwo");
        model.cursors.set_all(vec![Selection::cursor(5)]).unwrap();
        let r = {
            let mut ctx = ctx_on(&mut model);
            delete_line(&mut ctx, 1, None)
        };
        assert_eq!(model.text(), "one");
        assert_eq!(r.register_content.unwrap().text, "two\n");
        assert_eq!(model.cursors.primary(), Selection::cursor(0));
    }

    #[test]
    fn delete_line_count_through_eof_clamps() {
        let mut model = EditorModel::from_text("a\nb\nc");
        model.cursors.set_all(vec![Selection::cursor(2)]).unwrap(); // on "b"
        {
            let mut ctx = ctx_on(&mut model);
            delete_line(&mut ctx, 9, None);
        }
        assert_eq!(model.text(), "a");
    }

    #[test]
    fn multi_cursor_overlapping_ranges_merge() {
        let mut model = EditorModel::from_text("abcdef");
        model
            .cursors
            .set_all(vec![Selection::cursor(0), Selection::cursor(2)])
            .unwrap();
        {
            let mut ctx = ctx_on(&mut model);
            delete_char(&mut ctx, 4, None);
        }
        // 0..4 and 2..6 merge to 0..6.
        assert_eq!(model.text(), "");
        assert_eq!(model.cursors.count(), 1);
    }

    #[test]
    fn named_register_receives_delete() {
        let mut model = EditorModel::from_text("word here");
        {
            let mut ctx = ctx_on(&mut model);
            delete_word(&mut ctx, 1, Some('d'));
        }
        assert_eq!(model.registers.read('d').unwrap().text, "word ");
    }

    #[test]
    fn bad_register_is_validation_error_before_mutation() {
        let mut model = EditorModel::from_text("abc");
        let r = {
            let mut ctx = ctx_on(&mut model);
            delete_char(&mut ctx, 1, Some('%'))
        };
        assert_eq!(r.status, crate::result::Status::Error);
        assert_eq!(model.text(), "abc");
    }
}
