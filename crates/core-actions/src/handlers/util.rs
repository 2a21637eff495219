//! Shared edit-plan plumbing for multi-cursor handlers.
//!
//! The discipline every mutating handler follows: snapshot selections, build
//! the complete `(range, text)` plan in pre-edit coordinates, apply it in
//! descending range order (earlier edits never shift later offsets), then
//! place cursors with [`shift_for`] and let the cursor set merge overlaps.

use crate::context::ExecutionContext;
use crate::result::DispatchError;
use core_text::EngineReader;

#[derive(Debug, Clone)]
pub(crate) struct PlannedEdit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl PlannedEdit {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            text: text.into(),
        }
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            text: String::new(),
        }
    }

    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Collapse overlapping or duplicate ranges to their union (multi-cursor
/// delete ranges may collide when cursors sit close together).
pub(crate) fn merge_ranges(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_unstable();
    let mut out: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match out.last_mut() {
            Some((_, prev_end)) if start < *prev_end => *prev_end = end.max(*prev_end),
            _ => out.push((start, end)),
        }
    }
    out
}

/// Apply a plan through the context, opening a history group iff more than
/// one edit lands. Returns `(start, removed_text)` per applied edit in
/// ascending buffer order. On an engine error partial edits stay applied and
/// the group still closes.
pub(crate) fn apply_edit_plan(
    ctx: &mut ExecutionContext<'_>,
    group: &str,
    mut plan: Vec<PlannedEdit>,
) -> Result<Vec<(usize, String)>, DispatchError> {
    plan.retain(|e| e.start != e.end || !e.text.is_empty());
    if plan.is_empty() {
        return Ok(Vec::new());
    }
    let grouped = plan.len() > 1;
    if grouped {
        ctx.begin_group(group);
    }
    plan.sort_by(|a, b| b.start.cmp(&a.start));
    let mut removed: Vec<(usize, String)> = Vec::with_capacity(plan.len());
    for e in &plan {
        let outcome = if e.start == e.end {
            ctx.insert(e.start, &e.text).map(|_| String::new())
        } else if e.text.is_empty() {
            ctx.delete_range(e.start, e.end)
        } else {
            ctx.replace_range(e.start, e.end, &e.text)
        };
        match outcome {
            Ok(old) => removed.push((e.start, old)),
            Err(err) => {
                if grouped {
                    ctx.end_group();
                }
                return Err(err);
            }
        }
    }
    if grouped {
        ctx.end_group();
    }
    removed.sort_by_key(|(start, _)| *start);
    Ok(removed)
}

/// Map a pre-plan offset into post-plan coordinates. `skip` names the plan
/// entry the offset belongs to (its own edit does not shift it). Offsets
/// inside another entry's removed span clamp to that span's start.
pub(crate) fn shift_for(plan: &[PlannedEdit], skip: Option<usize>, pre: usize) -> usize {
    let mut base = pre;
    let mut delta: isize = 0;
    for (i, e) in plan.iter().enumerate() {
        if Some(i) == skip {
            continue;
        }
        if base >= e.end {
            delta += e.text.len() as isize - (e.end - e.start) as isize;
        } else if base > e.start {
            base = e.start;
        }
    }
    (base as isize + delta).max(0) as usize
}

/// Pre-edit line numbers touched by a plan (for redraw hints).
pub(crate) fn plan_lines(
    ctx: &ExecutionContext<'_>,
    plan: &[PlannedEdit],
) -> Vec<usize> {
    let mut lines = Vec::with_capacity(plan.len() * 2);
    for e in plan {
        if let Ok(p) = ctx.engine.offset_to_point(e.start.min(ctx.engine.len())) {
            lines.push(p.line);
        }
        if e.end > e.start
            && let Ok(p) = ctx.engine.offset_to_point(e.end.min(ctx.engine.len()))
        {
            lines.push(p.line);
        }
    }
    lines
}
