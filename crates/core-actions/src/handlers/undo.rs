//! `editor.undo` / `editor.redo`.
//!
//! Undo applies the inverse of a closed history group (edits reversed);
//! recording is suspended while the inverse runs so the replayed mutations
//! do not pollute the stream. Engine errors leave partial application in
//! place (no rollback, same as every other handler).

use crate::context::ExecutionContext;
use crate::result::{ActionResult, Redraw};
use core_state::Selection;
use core_text::{BufferEngine, Edit, EngineReader};

pub(crate) fn undo(ctx: &mut ExecutionContext<'_>, count: usize) -> ActionResult {
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    let mut undone = 0usize;
    for _ in 0..count.max(1) {
        let Some(group) = ctx.history.take_undo() else {
            break;
        };
        ctx.history.set_suspended(true);
        let mut failure = None;
        for edit in group.edits.iter().rev() {
            let end = edit.start + edit.new_text.len();
            match ctx.engine.replace(edit.start, end, &edit.old_text) {
                Ok(_) => ctx.note_external_edit(Edit {
                    start: edit.start,
                    old_text: edit.new_text.clone(),
                    new_text: edit.old_text.clone(),
                }),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        ctx.history.set_suspended(false);
        if let Some(e) = failure {
            return ActionResult::error(e.into());
        }
        if group.selections_before.is_empty() {
            if let Some(edit) = group.edits.first() {
                let at = edit.start.min(ctx.engine.len());
                let _ = ctx.cursors.set_all(vec![Selection::cursor(at)]);
            }
        } else {
            let _ = ctx.cursors.set_all(group.selections_before.clone());
        }
        ctx.history.push_redo(group);
        undone += 1;
    }
    if undone == 0 {
        return ActionResult::noop_with_message("nothing to undo");
    }
    ActionResult::ok()
        .with_redraw(Redraw::All)
        .with_message(format!("undid {undone} change(s)"))
}

pub(crate) fn redo(ctx: &mut ExecutionContext<'_>, count: usize) -> ActionResult {
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    let mut redone = 0usize;
    for _ in 0..count.max(1) {
        let Some(group) = ctx.history.take_redo() else {
            break;
        };
        ctx.history.set_suspended(true);
        let mut failure = None;
        let mut last_end = None;
        for edit in &group.edits {
            let end = edit.start + edit.old_text.len();
            match ctx.engine.replace(edit.start, end, &edit.new_text) {
                Ok(res) => {
                    last_end = Some(res.end);
                    ctx.note_external_edit(edit.clone());
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        ctx.history.set_suspended(false);
        if let Some(e) = failure {
            return ActionResult::error(e.into());
        }
        if let Some(end) = last_end {
            let _ = ctx
                .cursors
                .set_all(vec![Selection::cursor(end.min(ctx.engine.len()))]);
        }
        ctx.history.push_undo(group);
        redone += 1;
    }
    if redone == 0 {
        return ActionResult::noop_with_message("nothing to redo");
    }
    ActionResult::ok()
        .with_redraw(Redraw::All)
        .with_message(format!("redid {redone} change(s)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::insert::insert_text;
    use core_model::EditorModel;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn ctx_on(model: &mut EditorModel) -> ExecutionContext<'_> {
        ExecutionContext::new(model.split(), 0, HashMap::new())
    }

    #[test]
    fn undo_reverses_insert_and_restores_cursor() {
        let mut model = EditorModel::from_text("world");
        {
            let mut ctx = ctx_on(&mut model);
            insert_text(&mut ctx, "hello ");
        }
        assert_eq!(model.text(), "hello world");
        {
            let mut ctx = ctx_on(&mut model);
            let r = undo(&mut ctx, 1);
            assert!(r.is_ok());
        }
        assert_eq!(model.text(), "world");
        assert_eq!(model.cursors.primary().head, 0);
    }

    #[test]
    fn redo_replays_the_group() {
        let mut model = EditorModel::from_text("ab");
        {
            let mut ctx = ctx_on(&mut model);
            insert_text(&mut ctx, "XY");
        }
        {
            let mut ctx = ctx_on(&mut model);
            undo(&mut ctx, 1);
        }
        assert_eq!(model.text(), "ab");
        {
            let mut ctx = ctx_on(&mut model);
            let r = redo(&mut ctx, 1);
            assert!(r.is_ok());
        }
        assert_eq!(model.text(), "XYab");
    }

    #[test]
    fn undo_on_empty_history_is_noop() {
        let mut model = EditorModel::from_text("ab");
        let r = {
            let mut ctx = ctx_on(&mut model);
            undo(&mut ctx, 1)
        };
        assert_eq!(r.status, crate::result::Status::NoOp);
    }

    #[test]
    fn multi_cursor_insert_undoes_as_one_step() {
        let mut model = EditorModel::from_text("a b");
        model
            .cursors
            .set_all(vec![Selection::cursor(0), Selection::cursor(2)])
            .unwrap();
        {
            let mut ctx = ctx_on(&mut model);
            insert_text(&mut ctx, "--");
        }
        assert_eq!(model.text(), "--a --b");
        {
            let mut ctx = ctx_on(&mut model);
            undo(&mut ctx, 1);
        }
        assert_eq!(model.text(), "a b");
        assert_eq!(model.cursors.count(), 2, "selections restored from the group");
    }

    #[test]
    fn undo_count_walks_multiple_steps() {
        let mut model = EditorModel::from_text("");
        for t in ["a", "b", "c"] {
            let mut ctx = ctx_on(&mut model);
            insert_text(&mut ctx, t);
        }
        assert_eq!(model.text(), "abc");
        {
            let mut ctx = ctx_on(&mut model);
            undo(&mut ctx, 2);
        }
        assert_eq!(model.text(), "a");
        {
            let mut ctx = ctx_on(&mut model);
            redo(&mut ctx, 2);
        }
        assert_eq!(model.text(), "abc");
    }

    #[test]
    fn new_edit_after_undo_clears_redo() {
        let mut model = EditorModel::from_text("");
        {
            let mut ctx = ctx_on(&mut model);
            insert_text(&mut ctx, "one");
        }
        {
            let mut ctx = ctx_on(&mut model);
            undo(&mut ctx, 1);
        }
        {
            let mut ctx = ctx_on(&mut model);
            insert_text(&mut ctx, "two");
        }
        let r = {
            let mut ctx = ctx_on(&mut model);
            redo(&mut ctx, 1)
        };
        assert_eq!(r.status, crate::result::Status::NoOp);
        assert_eq!(model.text(), "two");
    }
}
