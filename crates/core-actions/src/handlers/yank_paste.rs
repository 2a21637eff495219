//! `editor.yank*` and `editor.paste*` handlers.

use super::util::{PlannedEdit, apply_edit_plan, merge_ranges, shift_for};
use crate::context::ExecutionContext;
use crate::result::{ActionResult, DispatchError, Redraw, redraw_for};
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

/// Shared tail for yanks: read the merged ranges in ascending order without
/// mutating, record into registers, leave cursors alone.
fn run_yank(
    ctx: &mut ExecutionContext<'_>,
    ranges: Vec<(usize, usize)>,
    linewise: bool,
    register: Option<char>,
) -> ActionResult {
    if let Err(e) = validate_register(register) {
        return ActionResult::error(e);
    }
    let ranges = merge_ranges(ranges.into_iter().filter(|(s, e)| s < e).collect());
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

pub(crate) fn yank_selection(
    ctx: &mut ExecutionContext<'_>,
    register: Option<char>,
) -> ActionResult {
    let ranges = ctx.cursors.all().iter().map(Selection::range).collect();
    run_yank(ctx, ranges, false, register)
}

pub(crate) fn yank_line(
    ctx: &mut ExecutionContext<'_>,
    count: usize,
    register: Option<char>,
) -> ActionResult {
    let count = count.max(1);
    let last_line = ctx.engine.line_count().saturating_sub(1);
    let len = ctx.engine.len();
    let mut ranges = Vec::new();
    for s in ctx.cursors.all() {
        let p = match ctx.engine.offset_to_point(s.head.min(len)) {
            Ok(p) => p,
            Err(e) => return ActionResult::error(e.into()),
        };
        let last = (p.line + count - 1).min(last_line);
        let start = ctx.engine.line_start_offset(p.line).unwrap_or(0);
        let end = ctx.engine.line_start_offset(last + 1).unwrap_or(len);
        ranges.push((start, end));
    }
    run_yank(ctx, ranges, true, register)
}

pub(crate) fn yank_to_end(
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
    run_yank(ctx, ranges, false, register)
}

pub(crate) fn yank_word(
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
    run_yank(ctx, ranges, false, register)
}

/// Paste placement: linewise content lands on a fresh line boundary,
/// charwise content lands relative to the cursor rune.
pub(crate) fn paste(
    ctx: &mut ExecutionContext<'_>,
    arg_text: Option<&str>,
    register: Option<char>,
    count: usize,
    after: bool,
) -> ActionResult {
    if let Err(e) = ctx.require_editable() {
        return ActionResult::error(e);
    }
    if let Err(e) = validate_register(register) {
        return ActionResult::error(e);
    }
    let (text, linewise) = match arg_text {
        Some(t) => (t.to_string(), t.ends_with('\n')),
        None => {
            let name = register.unwrap_or(core_state::UNNAMED_REGISTER);
            match ctx.registers.read(name) {
                Ok(c) => {
                    let lw = c.linewise || c.text.ends_with('\n');
                    (c.text, lw)
                }
                Err(e) => return ActionResult::error(DispatchError::Validation(e.to_string())),
            }
        }
    };
    if text.is_empty() {
        return ActionResult::noop();
    }
    let count = count.max(1);
    let repeated = text.repeat(count);
    let buffer = ctx.engine.text();
    let len = buffer.len();

    let sels = ctx.cursors.all();
    let mut plan: Vec<PlannedEdit> = Vec::with_capacity(sels.len());
    // Cursor destination per selection, relative to its own insertion.
    let mut targets: Vec<(usize, usize)> = Vec::with_capacity(sels.len()); // (insert_at, offset_within)
    for s in &sels {
        let head = s.head.min(len);
        let p = match ctx.engine.offset_to_point(head) {
            Ok(p) => p,
            Err(e) => return ActionResult::error(e.into()),
        };
        if linewise {
            if after {
                match ctx.engine.line_start_offset(p.line + 1) {
                    Some(off) => {
                        plan.push(PlannedEdit::insert(off, repeated.clone()));
                        targets.push((off, 0));
                    }
                    None => {
                        // Last line: open a boundary first when the buffer
                        // does not already end with a newline.
                        if buffer.ends_with('\n') || buffer.is_empty() {
                            plan.push(PlannedEdit::insert(len, repeated.clone()));
                            targets.push((len, 0));
                        } else {
                            plan.push(PlannedEdit::insert(len, format!("\n{repeated}")));
                            targets.push((len, 1));
                        }
                    }
                }
            } else {
                let off = ctx.engine.line_start_offset(p.line).unwrap_or(0);
                plan.push(PlannedEdit::insert(off, repeated.clone()));
                targets.push((off, 0));
            }
        } else {
            let line_end = ctx.engine.line_end_offset(p.line).unwrap_or(len);
            let off = if after && head < line_end {
                rune::next_rune_end(&buffer, head)
            } else {
                head
            };
            plan.push(PlannedEdit::insert(off, repeated.clone()));
            targets.push((off, usize::MAX)); // MAX = end of pasted text
        }
    }
    let lines = super::util::plan_lines(ctx, &plan);
    if let Err(e) = apply_edit_plan(ctx, if after { "pasteAfter" } else { "pasteBefore" }, plan.clone())
    {
        return ActionResult::error(e);
    }
    let cursors: Vec<Selection> = targets
        .iter()
        .enumerate()
        .map(|(i, &(at, within))| {
            let base = shift_for(&plan, Some(i), at);
            let inner = if within == usize::MAX {
                plan[i].text.len()
            } else {
                within
            };
            Selection::cursor(base + inner)
        })
        .collect();
    let _ = ctx.cursors.set_all(cursors);
    ActionResult::ok().with_redraw(if linewise {
        Redraw::All
    } else {
        redraw_for(ctx.edits(), lines)
    })
}
