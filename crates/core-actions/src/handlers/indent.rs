//! `editor.indent` / `editor.outdent` / `editor.autoIndent`.
//!
//! Indent math is column-based: tabs count `tab_width` columns when
//! measuring leading whitespace, and one indent step is the configured
//! indent string. Cursors ride the offset deltas: right on indent, left on
//! outdent (clamped to the line start).

use super::util::{PlannedEdit, apply_edit_plan};
use crate::context::ExecutionContext;
use crate::result::{ActionResult, Redraw};
use core_text::{EngineReader, scan};
use std::collections::BTreeSet;

/// Union of line numbers covered by all selections.
pub(crate) fn selection_lines(ctx: &ExecutionContext<'_>) -> BTreeSet<usize> {
    let len = ctx.engine.len();
    let mut lines = BTreeSet::new();
    for s in ctx.cursors.all() {
        let (start, end) = s.range();
        let Ok(a) = ctx.engine.offset_to_point(start.min(len)) else {
            continue;
        };
        let Ok(b) = ctx.engine.offset_to_point(end.min(len)) else {
            continue;
        };
        // A linewise-ish selection ending exactly at a line start does not
        // cover that next line.
        let last = if b.line > a.line && b.column == 0 {
            b.line - 1
        } else {
            b.line
        };
        lines.extend(a.line..=last);
    }
    lines
}

/// Insert `count` indent steps at the start of each non-empty line.
pub(crate) fn indent_lines(
    ctx: &mut ExecutionContext<'_>,
    lines: &BTreeSet<usize>,
    count: usize,
) -> ActionResult {
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    let step = ctx.config.indent.indent_string().repeat(count.max(1));
    let mut plan = Vec::new();
    for &line in lines {
        let Some(content) = ctx.engine.line_text(line) else {
            continue;
        };
        if content.is_empty() {
            continue;
        }
        if let Some(start) = ctx.engine.line_start_offset(line) {
            plan.push(PlannedEdit::insert(start, step.clone()));
        }
    }
    if plan.is_empty() {
        return ActionResult::noop();
    }
    if let Err(e) = apply_edit_plan(ctx, "indent", plan) {
        return ActionResult::error(e);
    }
    ctx.cursors.apply_deltas(&ctx.deltas());
    ActionResult::ok().with_redraw(Redraw::lines(lines.iter().copied()))
}

/// Remove up to `count * indent_size` leading columns from each line.
pub(crate) fn outdent_lines(
    ctx: &mut ExecutionContext<'_>,
    lines: &BTreeSet<usize>,
    count: usize,
) -> ActionResult {
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    let indent = &ctx.config.indent;
    let target_cols = indent.indent_size.max(1) * count.max(1);
    let tab_width = indent.tab_width.max(1);
    let mut plan = Vec::new();
    for &line in lines {
        let Some(content) = ctx.engine.line_text(line) else {
            continue;
        };
        let ws = scan::leading_whitespace(&content);
        let mut cols = 0usize;
        let mut bytes = 0usize;
        for c in ws.chars() {
            if cols >= target_cols {
                break;
            }
            cols += if c == '\t' { tab_width } else { 1 };
            bytes += c.len_utf8();
        }
        if bytes > 0
            && let Some(start) = ctx.engine.line_start_offset(line)
        {
            plan.push(PlannedEdit::delete(start, start + bytes));
        }
    }
    if plan.is_empty() {
        return ActionResult::noop();
    }
    if let Err(e) = apply_edit_plan(ctx, "outdent", plan) {
        return ActionResult::error(e);
    }
    ctx.cursors.apply_deltas(&ctx.deltas());
    ActionResult::ok().with_redraw(Redraw::lines(lines.iter().copied()))
}

fn opens_block(line: &str) -> bool {
    line.trim_end()
        .chars()
        .last()
        .is_some_and(|c| matches!(c, '{' | '[' | '('))
}

fn closes_block(line: &str) -> bool {
    line.trim_start()
        .chars()
        .next()
        .is_some_and(|c| matches!(c, '}' | ']' | ')'))
}

/// Re-derive each line's leading whitespace from the line above: carry its
/// indent, one step deeper after an opener, one step shallower on a closer.
/// Lines are processed top to bottom so corrections cascade.
pub(crate) fn auto_indent(
    ctx: &mut ExecutionContext<'_>,
    lines: &BTreeSet<usize>,
) -> ActionResult {
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    let step = ctx.config.indent.indent_string();
    let grouped = lines.len() > 1;
    if grouped {
        ctx.begin_group("autoIndent");
    }
    let mut touched = false;
    for &line in lines {
        let Some(content) = ctx.engine.line_text(line) else {
            continue;
        };
        let mut target = if line == 0 {
            String::new()
        } else {
            let prev = ctx.engine.line_text(line - 1).unwrap_or_default();
            let mut t = scan::leading_whitespace(&prev).to_string();
            if opens_block(&prev) {
                t.push_str(&step);
            }
            t
        };
        if closes_block(&content) && target.len() >= step.len() {
            target.truncate(target.len() - step.len());
        }
        let current_ws = scan::leading_whitespace(&content).to_string();
        if current_ws == target {
            continue;
        }
        let Some(start) = ctx.engine.line_start_offset(line) else {
            continue;
        };
        if let Err(e) = ctx.replace_range(start, start + current_ws.len(), &target) {
            if grouped {
                ctx.end_group();
            }
            return ActionResult::error(e);
        }
        touched = true;
    }
    if grouped {
        ctx.end_group();
    }
    if !touched {
        return ActionResult::noop();
    }
    ctx.cursors.apply_deltas(&ctx.deltas());
    ActionResult::ok().with_redraw(Redraw::lines(lines.iter().copied()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::EditorModel;
    use core_state::Selection;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn ctx_on(model: &mut EditorModel) -> ExecutionContext<'_> {
        ExecutionContext::new(model.split(), 0, HashMap::new())
    }

    fn lines(range: impl IntoIterator<Item = usize>) -> BTreeSet<usize> {
        range.into_iter().collect()
    }

    #[test]
    fn indent_two_lines_shifts_cursors() {
        let mut model = EditorModel::from_text("foo\nbar");
        model
            .cursors
            .set_all(vec![Selection::cursor(0), Selection::cursor(7)])
            .unwrap();
        let r = {
            let mut ctx = ctx_on(&mut model);
            indent_lines(&mut ctx, &lines([0, 1]), 1)
        };
        assert_eq!(model.text(), "    foo\n    bar");
        assert_eq!(
            model.cursors.all(),
            vec![Selection::cursor(4), Selection::cursor(15)]
        );
        assert_eq!(r.redraw, Redraw::lines([0, 1]));
    }

    #[test]
    fn indent_skips_empty_lines() {
        let mut model = EditorModel::from_text("foo\n\nbar");
        {
            let mut ctx = ctx_on(&mut model);
            indent_lines(&mut ctx, &lines([0, 1, 2]), 1);
        }
        assert_eq!(model.text(), "    foo\n\n    bar");
    }

    #[test]
    fn outdent_consumes_columns_tab_aware() {
        let mut model = EditorModel::from_text("\tfoo\n        bar\n  baz");
        {
            let mut ctx = ctx_on(&mut model);
            outdent_lines(&mut ctx, &lines([0, 1, 2]), 1);
        }
        // tab = 4 cols = one step; 8 spaces lose 4; 2 spaces lose both.
        assert_eq!(model.text(), "foo\n    bar\nbaz");
    }

    #[test]
    fn outdent_shifts_cursor_left_clamped_to_line_start() {
        let mut model = EditorModel::from_text("    foo");
        model.cursors.set_all(vec![Selection::cursor(2)]).unwrap(); // inside the indent
        {
            let mut ctx = ctx_on(&mut model);
            outdent_lines(&mut ctx, &lines([0]), 1);
        }
        assert_eq!(model.text(), "foo");
        assert_eq!(model.cursors.primary(), Selection::cursor(0));
    }

    #[test]
    fn auto_indent_follows_previous_line() {
        let mut model = EditorModel::from_text("    alpha\nbeta");
        {
            let mut ctx = ctx_on(&mut model);
            auto_indent(&mut ctx, &lines([1]));
        }
        assert_eq!(model.text(), "    alpha\n    beta");
    }

    #[test]
    fn auto_indent_steps_into_and_out_of_blocks() {
        let mut model = EditorModel::from_text("fn x() {\nbody\n}");
        {
            let mut ctx = ctx_on(&mut model);
            auto_indent(&mut ctx, &lines([1, 2]));
        }
        assert_eq!(model.text(), "fn x() {\n    body\n}");
    }

    #[test]
    fn auto_indent_cascades_top_to_bottom() {
        let mut model = EditorModel::from_text("if a {\nx\ny\n}");
        {
            let mut ctx = ctx_on(&mut model);
            auto_indent(&mut ctx, &lines([1, 2, 3]));
        }
        assert_eq!(model.text(), "if a {\n    x\n    y\n}");
    }

    #[test]
    fn selection_lines_unions_multi_cursor_spans() {
        let mut model = EditorModel::from_text("aa\nbb\ncc\ndd");
        model
            .cursors
            .set_all(vec![Selection::new(0, 4), Selection::cursor(10)])
            .unwrap();
        let ctx = ctx_on(&mut model);
        assert_eq!(selection_lines(&ctx), lines([0, 1, 3]));
    }
}
