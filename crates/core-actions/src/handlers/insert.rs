//! `editor.insert*` handlers.

use super::util::{PlannedEdit, apply_edit_plan, plan_lines, shift_for};
use crate::context::ExecutionContext;
use crate::result::{ActionResult, DispatchError, redraw_for};
use core_state::{ModeId, Selection};
use core_text::EngineReader;

/// `editor.insertText`: for each selection, replace its range with `text`;
/// every cursor ends just past its inserted copy.
pub(crate) fn insert_text(ctx: &mut ExecutionContext<'_>, text: &str) -> ActionResult {
    if text.is_empty() {
        return ActionResult::noop();
    }
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    let sels = ctx.cursors.all();
    let plan: Vec<PlannedEdit> = sels
        .iter()
        .map(|s| PlannedEdit::replace(s.start(), s.end(), text))
        .collect();
    let lines = plan_lines(ctx, &plan);
    if let Err(e) = apply_edit_plan(ctx, "insert", plan.clone()) {
        return ActionResult::error(e);
    }
    let cursors: Vec<Selection> = sels
        .iter()
        .enumerate()
        .map(|(i, s)| Selection::cursor(shift_for(&plan, Some(i), s.start()) + text.len()))
        .collect();
    let _ = ctx.cursors.set_all(cursors);
    ActionResult::ok().with_redraw(redraw_for(ctx.edits(), lines))
}

/// `editor.insertChar`: single codepoint variant; empty input is a no-op.
pub(crate) fn insert_char(ctx: &mut ExecutionContext<'_>, text: &str) -> ActionResult {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (None, _) => ActionResult::noop(),
        (Some(c), None) => insert_text(ctx, &c.to_string()),
        _ => ActionResult::error(DispatchError::Validation(format!(
            "insertChar expects one codepoint, got {:?}",
            text
        ))),
    }
}

pub(crate) fn insert_newline(ctx: &mut ExecutionContext<'_>) -> ActionResult {
    insert_text(ctx, "\n")
}

pub(crate) fn insert_tab(ctx: &mut ExecutionContext<'_>) -> ActionResult {
    let indent = ctx.config.indent.indent_string();
    insert_text(ctx, &indent)
}

/// `editor.insertLineAbove`: open an empty line above each cursor's line and
/// park the cursor on it; switches to insert mode.
pub(crate) fn insert_line_above(ctx: &mut ExecutionContext<'_>) -> ActionResult {
    open_line(ctx, true)
}

/// `editor.insertLineBelow`: open an empty line below each cursor's line.
pub(crate) fn insert_line_below(ctx: &mut ExecutionContext<'_>) -> ActionResult {
    open_line(ctx, false)
}

fn open_line(ctx: &mut ExecutionContext<'_>, above: bool) -> ActionResult {
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    let sels = ctx.cursors.all();
    let mut anchors: Vec<usize> = Vec::with_capacity(sels.len());
    for s in &sels {
        let point = match ctx.engine.offset_to_point(s.head.min(ctx.engine.len())) {
            Ok(p) => p,
            Err(e) => return ActionResult::error(e.into()),
        };
        let at = if above {
            ctx.engine.line_start_offset(point.line).unwrap_or(0)
        } else {
            ctx.engine.line_end_offset(point.line).unwrap_or(ctx.engine.len())
        };
        anchors.push(at);
    }
    let plan: Vec<PlannedEdit> = anchors
        .iter()
        .map(|&at| PlannedEdit::insert(at, "\n"))
        .collect();
    if let Err(e) = apply_edit_plan(ctx, "openLine", plan.clone()) {
        return ActionResult::error(e);
    }
    let cursors: Vec<Selection> = anchors
        .iter()
        .enumerate()
        .map(|(i, &at)| {
            let base = shift_for(&plan, Some(i), at);
            // Above: the empty line sits where the newline landed. Below:
            // the new line starts just past it.
            Selection::cursor(if above { base } else { base + 1 })
        })
        .collect();
    let _ = ctx.cursors.set_all(cursors);
    ActionResult::ok()
        .with_redraw(crate::result::Redraw::All)
        .with_mode_change(ModeId::Insert)
}

/// `editor.replaceChar`: overwrite `count` runes at each cursor with the
/// given rune. In replace mode the cursor advances past the overwrite (the
/// `R` typing path); elsewhere it stays on the last replaced rune.
pub(crate) fn replace_char(
    ctx: &mut ExecutionContext<'_>,
    text: &str,
    count: usize,
) -> ActionResult {
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    let Some(ch) = text.chars().next() else {
        return ActionResult::error(DispatchError::Validation(
            "replaceChar requires a rune".to_string(),
        ));
    };
    let buffer = ctx.engine.text();
    let count = count.max(1);
    let sels = ctx.cursors.all();
    let mut plan: Vec<PlannedEdit> = Vec::with_capacity(sels.len());
    for s in &sels {
        let head = s.head.min(buffer.len());
        let p = match ctx.engine.offset_to_point(head) {
            Ok(p) => p,
            Err(e) => return ActionResult::error(e.into()),
        };
        let line_end = ctx.engine.line_end_offset(p.line).unwrap_or(buffer.len());
        // Overwrite up to `count` runes but never across the newline.
        let mut end = head;
        let mut replaced = 0usize;
        while replaced < count && end < line_end {
            end = core_text::rune::next_rune_end(&buffer, end).min(line_end);
            replaced += 1;
        }
        if replaced == 0 {
            // At end of line: replace-mode typing appends instead.
            plan.push(PlannedEdit::insert(head, ch.to_string().repeat(count)));
        } else {
            plan.push(PlannedEdit::replace(head, end, ch.to_string().repeat(replaced)));
        }
    }
    let lines = plan_lines(ctx, &plan);
    if let Err(e) = apply_edit_plan(ctx, "replaceChar", plan.clone()) {
        return ActionResult::error(e);
    }
    let advance = ctx.modes.current() == ModeId::Replace;
    let cursors: Vec<Selection> = sels
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let base = shift_for(&plan, Some(i), s.head.min(buffer.len()));
            let inserted = plan[i].text.len();
            let head = if advance {
                base + inserted
            } else {
                base + inserted.saturating_sub(ch.len_utf8())
            };
            Selection::cursor(head)
        })
        .collect();
    let _ = ctx.cursors.set_all(cursors);
    ActionResult::ok().with_redraw(redraw_for(ctx.edits(), lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::EditorModel;
    use core_text::BufferEngine;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn ctx_on(model: &mut EditorModel) -> ExecutionContext<'_> {
        ExecutionContext::new(model.split(), 0, HashMap::new())
    }

    #[test]
    fn insert_text_at_single_cursor() {
        let mut model = EditorModel::from_text("world");
        {
            let mut ctx = ctx_on(&mut model);
            let r = insert_text(&mut ctx, "hello ");
            assert!(r.is_ok());
        }
        assert_eq!(model.text(), "hello world");
        assert_eq!(model.cursors.primary(), Selection::cursor(6));
    }

    #[test]
    fn insert_text_replaces_selection() {
        let mut model = EditorModel::from_text("abcdef");
        model.cursors.set_all(vec![Selection::new(1, 4)]).unwrap();
        {
            let mut ctx = ctx_on(&mut model);
            insert_text(&mut ctx, "X");
        }
        assert_eq!(model.text(), "aXef");
        assert_eq!(model.cursors.primary(), Selection::cursor(2));
    }

    #[test]
    fn insert_text_multi_cursor_moves_each() {
        let mut model = EditorModel::from_text("a b c");
        model
            .cursors
            .set_all(vec![
                Selection::cursor(0),
                Selection::cursor(2),
                Selection::cursor(4),
            ])
            .unwrap();
        {
            let mut ctx = ctx_on(&mut model);
            insert_text(&mut ctx, "--");
        }
        assert_eq!(model.text(), "--a --b --c");
        assert_eq!(
            model.cursors.all(),
            vec![
                Selection::cursor(2),
                Selection::cursor(6),
                Selection::cursor(10)
            ]
        );
        model.validate_selections().unwrap();
    }

    #[test]
    fn insert_char_validates_arity() {
        let mut model = EditorModel::from_text("");
        let mut ctx = ctx_on(&mut model);
        assert_eq!(insert_char(&mut ctx, "").status, crate::result::Status::NoOp);
        assert!(insert_char(&mut ctx, "ab").error.is_some());
    }

    #[test]
    fn newline_is_structural() {
        let mut model = EditorModel::from_text("ab");
        model.cursors.set_all(vec![Selection::cursor(1)]).unwrap();
        let r = {
            let mut ctx = ctx_on(&mut model);
            insert_newline(&mut ctx)
        };
        assert_eq!(model.text(), "a\nb");
        assert_eq!(r.redraw, crate::result::Redraw::All);
    }

    #[test]
    fn line_above_parks_cursor_on_empty_line() {
        let mut model = EditorModel::from_text("foo\nbar");
        model.cursors.set_all(vec![Selection::cursor(5)]).unwrap(); // on "bar"
        let r = {
            let mut ctx = ctx_on(&mut model);
            insert_line_above(&mut ctx)
        };
        assert_eq!(model.text(), "foo\n\nbar");
        assert_eq!(model.cursors.primary(), Selection::cursor(4));
        assert_eq!(r.mode_change, Some(ModeId::Insert));
    }

    #[test]
    fn line_below_moves_to_new_line_start() {
        let mut model = EditorModel::from_text("foo\nbar");
        model.cursors.set_all(vec![Selection::cursor(1)]).unwrap(); // on "foo"
        {
            let mut ctx = ctx_on(&mut model);
            insert_line_below(&mut ctx);
        }
        assert_eq!(model.text(), "foo\n\nbar");
        assert_eq!(model.cursors.primary(), Selection::cursor(4));
    }

    #[test]
    fn tab_uses_configured_indent() {
        let mut model = EditorModel::from_text("x");
        {
            let mut ctx = ctx_on(&mut model);
            insert_tab(&mut ctx);
        }
        assert_eq!(model.text(), "    x");
    }

    #[test]
    fn read_only_rejected() {
        let mut model = EditorModel::from_text("x");
        model.engine_mut().set_read_only(true);
        let mut ctx = ctx_on(&mut model);
        let r = insert_text(&mut ctx, "y");
        assert_eq!(r.status, crate::result::Status::Error);
    }

    #[test]
    fn replace_char_overwrites_in_place() {
        let mut model = EditorModel::from_text("abc");
        {
            let mut ctx = ctx_on(&mut model);
            replace_char(&mut ctx, "x", 2);
        }
        assert_eq!(model.text(), "xxc");
        assert_eq!(model.cursors.primary(), Selection::cursor(1), "on the last replaced rune");
    }

    #[test]
    fn replace_char_clamps_at_line_end() {
        let mut model = EditorModel::from_text("ab\ncd");
        {
            let mut ctx = ctx_on(&mut model);
            replace_char(&mut ctx, "z", 9);
        }
        assert_eq!(model.text(), "zz\ncd", "never crosses the newline");
    }

    #[test]
    fn replace_mode_advances_cursor() {
        let mut model = EditorModel::from_text("abc");
        model.modes.switch_to(ModeId::Replace);
        {
            let mut ctx = ctx_on(&mut model);
            replace_char(&mut ctx, "x", 1);
        }
        assert_eq!(model.text(), "xbc");
        assert_eq!(model.cursors.primary(), Selection::cursor(1));
    }
}
