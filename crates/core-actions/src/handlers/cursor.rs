//! `cursor.*` handlers.
//!
//! Motions move every cursor; in the visual modes they extend the head and
//! leave the anchor pinned. Vertical movement keeps a sticky display column
//! so the caret tracks the same visual position across short lines; any
//! horizontal motion resets it.

use crate::context::ExecutionContext;
use crate::range::motion_target;
use crate::result::{ActionResult, DispatchError};
use core_events::Motion;
use core_state::Selection;
use core_text::{EngineReader, rune, width};
use std::sync::Mutex;

pub(crate) struct CursorState {
    sticky_col: Mutex<Option<usize>>,
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            sticky_col: Mutex::new(None),
        }
    }

    fn take_or_seed(&self, seed: impl FnOnce() -> usize) -> usize {
        let mut guard = self.sticky_col.lock().expect("sticky column poisoned");
        *guard.get_or_insert_with(seed)
    }

    fn reset(&self) {
        *self.sticky_col.lock().expect("sticky column poisoned") = None;
    }
}

pub(crate) const VERBS: &[&str] = &[
    "moveLeft",
    "moveRight",
    "moveUp",
    "moveDown",
    "wordForward",
    "wordBack",
    "wordEnd",
    "lineStart",
    "lineEnd",
    "firstNonBlank",
    "documentStart",
    "documentEnd",
    "paragraphForward",
    "paragraphBack",
    "addAbove",
    "addBelow",
    "collapse",
];

pub(crate) fn handle(
    ctx: &mut ExecutionContext<'_>,
    state: &CursorState,
    verb: &str,
) -> ActionResult {
    let count = ctx.effective_count();
    match verb {
        "moveUp" => vertical(ctx, state, -(count as isize)),
        "moveDown" => vertical(ctx, state, count as isize),
        "moveLeft" => {
            state.reset();
            horizontal(ctx, count, false)
        }
        "moveRight" => {
            state.reset();
            horizontal(ctx, count, true)
        }
        "addAbove" => add_cursor(ctx, state, -1),
        "addBelow" => add_cursor(ctx, state, 1),
        "collapse" => {
            state.reset();
            ctx.cursors.collapse_to_primary();
            ActionResult::ok()
        }
        _ => {
            state.reset();
            let motion = match verb {
                "wordForward" => Motion::Word,
                "wordBack" => Motion::WordBack,
                "wordEnd" => Motion::WordEnd,
                "lineStart" => Motion::LineStart,
                "lineEnd" => Motion::LineEnd,
                "firstNonBlank" => Motion::FirstNonBlank,
                "documentStart" => Motion::DocumentStart,
                "documentEnd" => Motion::DocumentEnd,
                "paragraphForward" => Motion::Paragraph,
                "paragraphBack" => Motion::ParagraphBack,
                other => {
                    return ActionResult::error(DispatchError::UnknownAction(format!(
                        "cursor.{other}"
                    )));
                }
            };
            by_motion(ctx, motion, count)
        }
    }
}

fn place(ctx: &ExecutionContext<'_>, sels: &[Selection], heads: Vec<usize>) -> ActionResult {
    let extend = ctx.modes.current().is_visual();
    let new: Vec<Selection> = sels
        .iter()
        .zip(heads)
        .map(|(s, head)| {
            if extend {
                s.with_head(head)
            } else {
                Selection::cursor(head)
            }
        })
        .collect();
    let _ = ctx.cursors.set_all(new);
    ActionResult::ok()
}

fn by_motion(ctx: &mut ExecutionContext<'_>, motion: Motion, count: usize) -> ActionResult {
    let sels = ctx.cursors.all();
    let extending = ctx.modes.current().is_visual();
    let mut heads = Vec::with_capacity(sels.len());
    for s in &sels {
        let origin = s.head.min(ctx.engine.len());
        // Extending a half-open selection over a word end must cover the
        // final rune, so the visual head lands just past it.
        let target = if extending && motion == Motion::WordEnd {
            let text = ctx.engine.text();
            let mut pos = origin;
            for _ in 0..count {
                pos = core_text::scan::find_word_end(&text, pos);
            }
            Ok(pos)
        } else {
            motion_target(ctx.engine, origin, motion, count)
        };
        match target {
            Ok(t) => heads.push(t),
            Err(e) => return ActionResult::error(e),
        }
    }
    place(ctx, &sels, heads)
}

/// Rune-wise movement constrained to the cursor's line.
fn horizontal(ctx: &mut ExecutionContext<'_>, count: usize, right: bool) -> ActionResult {
    let text = ctx.engine.text();
    let sels = ctx.cursors.all();
    let mut heads = Vec::with_capacity(sels.len());
    for s in &sels {
        let head = s.head.min(text.len());
        let p = match ctx.engine.offset_to_point(head) {
            Ok(p) => p,
            Err(e) => return ActionResult::error(e.into()),
        };
        let line_start = ctx.engine.line_start_offset(p.line).unwrap_or(0);
        let line_end = ctx.engine.line_end_offset(p.line).unwrap_or(text.len());
        let mut pos = head;
        for _ in 0..count {
            if right {
                if pos >= line_end {
                    break;
                }
                pos = rune::next_rune_end(&text, pos).min(line_end);
            } else {
                if pos <= line_start {
                    break;
                }
                pos = rune::prev_rune_start(&text, pos).max(line_start);
            }
        }
        heads.push(pos);
    }
    place(ctx, &sels, heads)
}

fn vertical(ctx: &mut ExecutionContext<'_>, state: &CursorState, delta: isize) -> ActionResult {
    let sels = ctx.cursors.all();
    let last_line = ctx.engine.line_count().saturating_sub(1);
    let primary = sels[0];
    let seed_col = {
        let engine = &*ctx.engine;
        move || {
            let head = primary.head.min(engine.len());
            match engine.offset_to_point(head) {
                Ok(p) => {
                    let content = engine.line_text(p.line).unwrap_or_default();
                    width::display_col(&content, p.column)
                }
                Err(_) => 0,
            }
        }
    };
    let col = state.take_or_seed(seed_col);

    let mut heads = Vec::with_capacity(sels.len());
    for s in &sels {
        let head = s.head.min(ctx.engine.len());
        let p = match ctx.engine.offset_to_point(head) {
            Ok(p) => p,
            Err(e) => return ActionResult::error(e.into()),
        };
        let target_line = p.line.saturating_add_signed(delta).min(last_line);
        let content = ctx.engine.line_text(target_line).unwrap_or_default();
        let byte = width::byte_for_col(&content, col);
        let start = ctx.engine.line_start_offset(target_line).unwrap_or(0);
        heads.push(start + byte);
    }
    place(ctx, &sels, heads)
}

/// Spawn an extra cursor one line above/below the primary, same display
/// column.
fn add_cursor(ctx: &mut ExecutionContext<'_>, state: &CursorState, dir: isize) -> ActionResult {
    state.reset();
    let primary = ctx.cursors.primary();
    let head = primary.head.min(ctx.engine.len());
    let p = match ctx.engine.offset_to_point(head) {
        Ok(p) => p,
        Err(e) => return ActionResult::error(e.into()),
    };
    let last_line = ctx.engine.line_count().saturating_sub(1);
    let Some(target_line) = p.line.checked_add_signed(dir).filter(|&l| l <= last_line) else {
        return ActionResult::noop_with_message("no line there");
    };
    let content = ctx.engine.line_text(p.line).unwrap_or_default();
    let col = width::display_col(&content, p.column);
    let target_content = ctx.engine.line_text(target_line).unwrap_or_default();
    let byte = width::byte_for_col(&target_content, col);
    let start = ctx.engine.line_start_offset(target_line).unwrap_or(0);
    let mut sels = ctx.cursors.all();
    sels.push(Selection::cursor(start + byte));
    let _ = ctx.cursors.set_all(sels);
    ActionResult::ok()
}
