//! `mode.*` handlers. Dispatch is total over the closed mode sum; the
//! insert-entry variants position cursors first the way their Vim
//! counterparts do.

use super::insert;
use crate::context::ExecutionContext;
use crate::result::{ActionResult, DispatchError};
use core_state::{ModeId, Selection};
use core_text::{EngineReader, rune, scan};

pub(crate) const VERBS: &[&str] = &[
    "normal",
    "insert",
    "append",
    "appendLine",
    "insertLineStart",
    "openAbove",
    "openBelow",
    "visual",
    "visualLine",
    "visualBlock",
    "command",
    "replace",
    "operatorPending",
];

pub(crate) fn handle(ctx: &mut ExecutionContext<'_>, verb: &str) -> ActionResult {
    match verb {
        "normal" => {
            // Leaving a visual mode collapses selections onto their carets.
            let collapsed: Vec<Selection> = ctx
                .cursors
                .all()
                .iter()
                .map(|s| Selection::cursor(s.head))
                .collect();
            let _ = ctx.cursors.set_all(collapsed);
            ActionResult::ok().with_mode_change(ModeId::Normal)
        }
        "insert" => ActionResult::ok().with_mode_change(ModeId::Insert),
        "append" => {
            if let Err(e) = move_cursors(ctx, CursorGoal::AfterRune) {
                return ActionResult::error(e);
            }
            ActionResult::ok().with_mode_change(ModeId::Insert)
        }
        "appendLine" => {
            if let Err(e) = move_cursors(ctx, CursorGoal::LineEnd) {
                return ActionResult::error(e);
            }
            ActionResult::ok().with_mode_change(ModeId::Insert)
        }
        "insertLineStart" => {
            if let Err(e) = move_cursors(ctx, CursorGoal::FirstNonBlank) {
                return ActionResult::error(e);
            }
            ActionResult::ok().with_mode_change(ModeId::Insert)
        }
        "openAbove" => insert::insert_line_above(ctx),
        "openBelow" => insert::insert_line_below(ctx),
        "visual" => ActionResult::ok().with_mode_change(ModeId::Visual),
        "visualLine" => ActionResult::ok().with_mode_change(ModeId::VisualLine),
        "visualBlock" => ActionResult::ok().with_mode_change(ModeId::VisualBlock),
        "command" => ActionResult::ok().with_mode_change(ModeId::Command),
        "replace" => ActionResult::ok().with_mode_change(ModeId::Replace),
        "operatorPending" => ActionResult::ok().with_mode_change(ModeId::OperatorPending),
        other => ActionResult::error(DispatchError::UnknownAction(format!("mode.{other}"))),
    }
}

enum CursorGoal {
    AfterRune,
    LineEnd,
    FirstNonBlank,
}

fn move_cursors(ctx: &mut ExecutionContext<'_>, goal: CursorGoal) -> Result<(), DispatchError> {
    let text = ctx.engine.text();
    let mut out = Vec::new();
    for s in ctx.cursors.all() {
        let head = s.head.min(text.len());
        let p = ctx.engine.offset_to_point(head)?;
        let line_start = ctx.engine.line_start_offset(p.line).unwrap_or(0);
        let line_end = ctx.engine.line_end_offset(p.line).unwrap_or(text.len());
        let new = match goal {
            CursorGoal::AfterRune => {
                if head < line_end {
                    rune::next_rune_end(&text, head).min(line_end)
                } else {
                    head
                }
            }
            CursorGoal::LineEnd => line_end,
            CursorGoal::FirstNonBlank => {
                let content = ctx.engine.line_text(p.line).unwrap_or_default();
                line_start + scan::first_non_blank(&content)
            }
        };
        out.push(Selection::cursor(new));
    }
    let _ = ctx.cursors.set_all(out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::EditorModel;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn run(model: &mut EditorModel, verb: &str) -> ActionResult {
        let mut ctx = ExecutionContext::new(model.split(), 0, HashMap::new());
        let r = handle(&mut ctx, verb);
        if let Some(mode) = r.mode_change {
            ctx.modes.switch_to(mode);
        }
        r
    }

    #[test]
    fn normal_collapses_selection_to_head() {
        let mut model = EditorModel::from_text("abcdef");
        model.modes.switch_to(ModeId::Visual);
        model.cursors.set_all(vec![Selection::new(1, 4)]).unwrap();
        run(&mut model, "normal");
        assert_eq!(model.modes.current(), ModeId::Normal);
        assert_eq!(model.cursors.primary(), Selection::cursor(4));
    }

    #[test]
    fn append_steps_past_current_rune() {
        let mut model = EditorModel::from_text("ab");
        run(&mut model, "append");
        assert_eq!(model.modes.current(), ModeId::Insert);
        assert_eq!(model.cursors.primary(), Selection::cursor(1));
    }

    #[test]
    fn append_at_line_end_stays() {
        let mut model = EditorModel::from_text("ab\ncd");
        model.cursors.set_all(vec![Selection::cursor(2)]).unwrap();
        run(&mut model, "append");
        assert_eq!(model.cursors.primary(), Selection::cursor(2));
    }

    #[test]
    fn append_line_and_insert_line_start() {
        let mut model = EditorModel::from_text("  hello");
        model.cursors.set_all(vec![Selection::cursor(4)]).unwrap();
        run(&mut model, "appendLine");
        assert_eq!(model.cursors.primary(), Selection::cursor(7));
        run(&mut model, "insertLineStart");
        assert_eq!(model.cursors.primary(), Selection::cursor(2));
    }

    #[test]
    fn open_below_opens_line_and_enters_insert() {
        let mut model = EditorModel::from_text("abc");
        run(&mut model, "openBelow");
        assert_eq!(model.text(), "abc\n");
        assert_eq!(model.modes.current(), ModeId::Insert);
        assert_eq!(model.cursors.primary(), Selection::cursor(4));
    }

    #[test]
    fn visual_family_switches() {
        let mut model = EditorModel::from_text("abc");
        run(&mut model, "visual");
        assert_eq!(model.modes.current(), ModeId::Visual);
        run(&mut model, "visualLine");
        assert_eq!(model.modes.current(), ModeId::VisualLine);
        run(&mut model, "visualBlock");
        assert_eq!(model.modes.current(), ModeId::VisualBlock);
    }

    #[test]
    fn unknown_verb_errors() {
        let mut model = EditorModel::from_text("abc");
        let r = run(&mut model, "zen");
        assert_eq!(r.status, crate::result::Status::Error);
    }
}
