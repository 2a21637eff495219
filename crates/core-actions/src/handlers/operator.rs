//! `operator.*` handlers: an operation applied over a range derived from a
//! motion, a text object, or the current selection.

use super::indent::{indent_lines, outdent_lines};
use super::util::{PlannedEdit, apply_edit_plan, merge_ranges, shift_for};
use crate::context::ExecutionContext;
use crate::range::{RangeSpec, motion_range};
use crate::result::{ActionResult, DispatchError, Redraw, redraw_for};
use crate::text_object::text_object_range;
use core_events::Action;
use core_state::{ModeId, RegisterContent, Selection};
use core_text::EngineReader;
use std::collections::BTreeSet;

/// Resolve the ranges an operator covers, one per selection.
fn resolve_ranges(
    ctx: &ExecutionContext<'_>,
    action: &Action,
) -> Result<Option<Vec<RangeSpec>>, DispatchError> {
    let sels = ctx.cursors.all();
    let count = ctx.effective_count();
    if let Some(motion) = action.args.motion {
        let mut out = Vec::with_capacity(sels.len());
        for s in &sels {
            out.push(motion_range(ctx.engine, s.head, motion, count)?);
        }
        return Ok(Some(out));
    }
    if let Some(obj) = action.args.text_object {
        let mut out = Vec::with_capacity(sels.len());
        for s in &sels {
            match text_object_range(ctx.engine, s.head, obj)? {
                Some(spec) => out.push(spec),
                None => return Ok(None),
            }
        }
        return Ok(Some(out));
    }
    // No motion, no object: the selections themselves are the ranges.
    let linewise = ctx.modes.current() == ModeId::VisualLine;
    let mut out = Vec::with_capacity(sels.len());
    for s in sels.iter().filter(|s| !s.is_empty()) {
        let spec = if linewise {
            expand_linewise(ctx, s.start(), s.end())?
        } else {
            RangeSpec::charwise(s.start(), s.end())
        };
        out.push(spec);
    }
    if out.is_empty() {
        return Ok(None);
    }
    Ok(Some(out))
}

/// Grow a charwise range to cover whole lines.
fn expand_linewise(
    ctx: &ExecutionContext<'_>,
    start: usize,
    end: usize,
) -> Result<RangeSpec, DispatchError> {
    let len = ctx.engine.len();
    let a = ctx.engine.offset_to_point(start.min(len))?;
    let b = ctx.engine.offset_to_point(end.min(len))?;
    let last = if b.line > a.line && b.column == 0 {
        b.line - 1
    } else {
        b.line
    };
    let s = ctx.engine.line_start_offset(a.line).unwrap_or(0);
    let e = ctx.engine.line_start_offset(last + 1).unwrap_or(len);
    Ok(RangeSpec::linewise(s, e))
}

fn lines_of_ranges(
    ctx: &ExecutionContext<'_>,
    specs: &[RangeSpec],
) -> BTreeSet<usize> {
    let len = ctx.engine.len();
    let mut lines = BTreeSet::new();
    for spec in specs {
        let Ok(a) = ctx.engine.offset_to_point(spec.start.min(len)) else {
            continue;
        };
        let Ok(b) = ctx.engine.offset_to_point(spec.end.min(len)) else {
            continue;
        };
        let last = if b.line > a.line && b.column == 0 {
            b.line - 1
        } else {
            b.line
        };
        lines.extend(a.line..=last);
    }
    lines
}

/// After a visual-mode operator the selection is spent: collapse to the
/// range start and drop back to normal unless the operator chose a mode.
fn leave_visual(ctx: &ExecutionContext<'_>, result: ActionResult) -> ActionResult {
    if !ctx.modes.current().is_visual() {
        return result;
    }
    let collapsed: Vec<Selection> = ctx
        .cursors
        .all()
        .iter()
        .map(Selection::collapsed_to_start)
        .collect();
    let _ = ctx.cursors.set_all(collapsed);
    if result.mode_change.is_none() {
        result.with_mode_change(ModeId::Normal)
    } else {
        result
    }
}

pub(crate) fn apply(ctx: &mut ExecutionContext<'_>, verb: &str, action: &Action) -> ActionResult {
    if matches!(verb, "motion" | "textObject") {
        return ActionResult::error(DispatchError::Validation(format!(
            "operator.{verb} is an input-layer sentinel and cannot be dispatched"
        )));
    }
    let specs = match resolve_ranges(ctx, action) {
        Ok(Some(specs)) => specs,
        Ok(None) => return ActionResult::noop_with_message("nothing to operate on"),
        Err(e) => return ActionResult::error(e),
    };
    let register = action.args.register;
    let result = match verb {
        "delete" => delete_or_change(ctx, specs, register, false),
        "change" => delete_or_change(ctx, specs, register, true),
        "yank" => yank(ctx, specs, register),
        "indent" => {
            let lines = lines_of_ranges(ctx, &specs);
            indent_lines(ctx, &lines, 1)
        }
        "outdent" => {
            let lines = lines_of_ranges(ctx, &specs);
            outdent_lines(ctx, &lines, 1)
        }
        "lowercase" => transform(ctx, specs, |s| s.to_lowercase()),
        "uppercase" => transform(ctx, specs, |s| s.to_uppercase()),
        "toggleCase" => transform(ctx, specs, toggle_case),
        // Reserved: hosts intercept via a hook when they supply a formatter.
        "format" => ActionResult::ok(),
        other => ActionResult::error(DispatchError::UnknownAction(format!("operator.{other}"))),
    };
    let result = leave_visual(ctx, result);
    // Composed operators arrive while the mode manager still says
    // operator-pending; fall back to normal unless the operator chose.
    if ctx.modes.current() == ModeId::OperatorPending && result.mode_change.is_none() {
        result.with_mode_change(ModeId::Normal)
    } else {
        result
    }
}

fn delete_or_change(
    ctx: &mut ExecutionContext<'_>,
    specs: Vec<RangeSpec>,
    register: Option<char>,
    change: bool,
) -> ActionResult {
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    let linewise = specs.iter().any(|s| s.linewise);
    let ranges = merge_ranges(
        specs
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| (s.start, s.end))
            .collect(),
    );
    if ranges.is_empty() {
        return ActionResult::noop();
    }
    let group = if change { "change" } else { "delete" };
    ctx.begin_group(group);
    let plan: Vec<PlannedEdit> = ranges
        .iter()
        .map(|&(s, e)| PlannedEdit::delete(s, e))
        .collect();
    let removed = match apply_edit_plan(ctx, group, plan.clone()) {
        Ok(r) => r,
        Err(e) => {
            ctx.end_group();
            return ActionResult::error(e);
        }
    };
    let mut text: String = removed.into_iter().map(|(_, t)| t).collect();
    let took_newline = text.ends_with('\n');
    if linewise && !took_newline {
        text.push('\n');
    }
    let content = RegisterContent { text, linewise };
    if let Err(e) = ctx.registers.record_delete(content.clone(), register) {
        ctx.end_group();
        return ActionResult::error(DispatchError::Validation(e.to_string()));
    }
    let cursors: Vec<Selection> = plan
        .iter()
        .enumerate()
        .map(|(i, e)| Selection::cursor(shift_for(&plan, Some(i), e.start)))
        .collect();
    // Linewise change keeps an empty line to type on.
    if change && linewise && took_newline {
        let at = cursors[0].head;
        if let Err(e) = ctx.insert(at, "\n") {
            ctx.end_group();
            return ActionResult::error(e);
        }
    }
    ctx.end_group();
    let _ = ctx.cursors.set_all(cursors);
    let mut result = ActionResult::ok()
        .with_redraw(Redraw::All)
        .with_register_content(content);
    if change {
        result = result.with_mode_change(ModeId::Insert);
    }
    result
}

fn yank(
    ctx: &mut ExecutionContext<'_>,
    specs: Vec<RangeSpec>,
    register: Option<char>,
) -> ActionResult {
    let linewise = specs.iter().any(|s| s.linewise);
    let ranges = merge_ranges(
        specs
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| (s.start, s.end))
            .collect(),
    );
    if ranges.is_empty() {
        return ActionResult::noop();
    }
    let mut text = String::new();
    for &(s, e) in &ranges {
        match ctx.engine.text_range(s, e) {
            Ok(t) => text.push_str(&t),
            Err(e) => return ActionResult::error(e.into()),
        }
    }
    if linewise && !text.ends_with('\n') {
        text.push('\n');
    }
    let content = RegisterContent { text, linewise };
    if let Err(e) = ctx.registers.record_yank(content.clone(), register) {
        return ActionResult::error(DispatchError::Validation(e.to_string()));
    }
    ActionResult::ok().with_register_content(content)
}

fn toggle_case(s: &str) -> String {
    s.chars()
        .flat_map(|c| {
            if c.is_uppercase() {
                c.to_lowercase().collect::<Vec<_>>()
            } else if c.is_lowercase() {
                c.to_uppercase().collect::<Vec<_>>()
            } else {
                vec![c]
            }
        })
        .collect()
}

fn transform(
    ctx: &mut ExecutionContext<'_>,
    specs: Vec<RangeSpec>,
    f: impl Fn(&str) -> String,
) -> ActionResult {
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    let ranges = merge_ranges(
        specs
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| (s.start, s.end))
            .collect(),
    );
    if ranges.is_empty() {
        return ActionResult::noop();
    }
    let mut plan = Vec::with_capacity(ranges.len());
    for &(s, e) in &ranges {
        let old = match ctx.engine.text_range(s, e) {
            Ok(t) => t,
            Err(e) => return ActionResult::error(e.into()),
        };
        let new = f(&old);
        if new != old {
            plan.push(PlannedEdit::replace(s, e, new));
        }
    }
    if plan.is_empty() {
        return ActionResult::noop();
    }
    let lines = super::util::plan_lines(ctx, &plan);
    if let Err(e) = apply_edit_plan(ctx, "transformCase", plan) {
        return ActionResult::error(e);
    }
    ctx.cursors.apply_deltas(&ctx.deltas());
    ActionResult::ok().with_redraw(redraw_for(ctx.edits(), lines))
}
