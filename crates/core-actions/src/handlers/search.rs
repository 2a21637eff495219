//! `search.*` handlers: regex search over the buffer.
//!
//! The handler owns the last compiled pattern and direction so `search.next`
//! / `search.prev` work across dispatches. Only the primary cursor moves;
//! wrap-around is always on.

use crate::context::ExecutionContext;
use crate::result::{ActionResult, DispatchError};
use core_events::Action;
use core_state::Selection;
use core_text::EngineReader;
use regex::Regex;
use serde_json::Value;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct SearchState {
    inner: Mutex<Option<StoredPattern>>,
}

struct StoredPattern {
    regex: Regex,
    forward: bool,
}

pub(crate) const VERBS: &[&str] = &["forward", "backward", "next", "prev"];

pub(crate) fn handle(
    ctx: &mut ExecutionContext<'_>,
    state: &SearchState,
    verb: &str,
    action: &Action,
) -> ActionResult {
    match verb {
        "forward" | "backward" => {
            let Some(pattern) = action.args.text.as_deref().filter(|p| !p.is_empty()) else {
                return ActionResult::error(DispatchError::Validation(
                    "search requires a pattern".to_string(),
                ));
            };
            let regex = match Regex::new(pattern) {
                Ok(r) => r,
                Err(e) => {
                    return ActionResult::error(DispatchError::Validation(format!(
                        "bad pattern: {e}"
                    )));
                }
            };
            let forward = verb == "forward";
            *state.inner.lock().expect("search state poisoned") = Some(StoredPattern {
                regex: regex.clone(),
                forward,
            });
            seek(ctx, &regex, forward)
        }
        "next" | "prev" => {
            let guard = state.inner.lock().expect("search state poisoned");
            let Some(stored) = guard.as_ref() else {
                return ActionResult::noop_with_message("no previous search");
            };
            let forward = if verb == "next" {
                stored.forward
            } else {
                !stored.forward
            };
            let regex = stored.regex.clone();
            drop(guard);
            seek(ctx, &regex, forward)
        }
        other => ActionResult::error(DispatchError::UnknownAction(format!("search.{other}"))),
    }
}

fn seek(ctx: &mut ExecutionContext<'_>, regex: &Regex, forward: bool) -> ActionResult {
    let text = ctx.engine.text();
    let from = ctx.cursors.primary().head.min(text.len());

    let found = if forward {
        regex
            .find_at(&text, core_text::rune::next_rune_end(&text, from))
            .or_else(|| regex.find(&text))
    } else {
        let mut best = None;
        for m in regex.find_iter(&text) {
            if m.start() < from {
                best = Some(m);
            } else {
                break;
            }
        }
        best.or_else(|| regex.find_iter(&text).last())
    };

    let Some(m) = found else {
        return ActionResult::noop_with_message("pattern not found");
    };
    let mut sels = ctx.cursors.all();
    sels[0] = Selection::cursor(m.start());
    let _ = ctx.cursors.set_all(sels);
    ActionResult::ok()
        .with_data("match_start", Value::from(m.start() as u64))
        .with_data("match_end", Value::from(m.end() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::ActionArgs;
    use core_model::EditorModel;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn search(
        model: &mut EditorModel,
        state: &SearchState,
        verb: &str,
        pattern: Option<&str>,
    ) -> ActionResult {
        let mut ctx = ExecutionContext::new(model.split(), 0, HashMap::new());
        let mut action = Action::new(format!("search.{verb}"));
        if let Some(p) = pattern {
            action = action.with_args(ActionArgs::text(p));
        }
        handle(&mut ctx, state, verb, &action)
    }

    #[test]
    fn forward_finds_next_match() {
        let mut model = EditorModel::from_text("foo bar foo baz");
        let st = SearchState::default();
        let r = search(&mut model, &st, "forward", Some("foo"));
        assert!(r.is_ok());
        assert_eq!(model.cursors.primary(), Selection::cursor(8));
    }

    #[test]
    fn forward_wraps_around() {
        let mut model = EditorModel::from_text("foo bar");
        model.cursors.set_all(vec![Selection::cursor(5)]).unwrap();
        let st = SearchState::default();
        search(&mut model, &st, "forward", Some("foo"));
        assert_eq!(model.cursors.primary(), Selection::cursor(0));
    }

    #[test]
    fn backward_finds_previous() {
        let mut model = EditorModel::from_text("foo bar foo baz");
        model.cursors.set_all(vec![Selection::cursor(9)]).unwrap();
        let st = SearchState::default();
        search(&mut model, &st, "backward", Some("foo"));
        assert_eq!(model.cursors.primary(), Selection::cursor(0));
    }

    #[test]
    fn next_and_prev_reuse_pattern_and_direction() {
        let mut model = EditorModel::from_text("x a1 a2 a3");
        let st = SearchState::default();
        search(&mut model, &st, "forward", Some("a[0-9]"));
        assert_eq!(model.cursors.primary(), Selection::cursor(2));
        search(&mut model, &st, "next", None);
        assert_eq!(model.cursors.primary(), Selection::cursor(5));
        search(&mut model, &st, "prev", None);
        assert_eq!(model.cursors.primary(), Selection::cursor(2));
    }

    #[test]
    fn no_pattern_stored_is_noop() {
        let mut model = EditorModel::from_text("abc");
        let st = SearchState::default();
        let r = search(&mut model, &st, "next", None);
        assert_eq!(r.status, crate::result::Status::NoOp);
    }

    #[test]
    fn bad_regex_is_validation_error() {
        let mut model = EditorModel::from_text("abc");
        let st = SearchState::default();
        let r = search(&mut model, &st, "forward", Some("["));
        assert_eq!(r.status, crate::result::Status::Error);
    }

    #[test]
    fn unmatched_pattern_is_noop() {
        let mut model = EditorModel::from_text("abc");
        let st = SearchState::default();
        let r = search(&mut model, &st, "forward", Some("zzz"));
        assert_eq!(r.status, crate::result::Status::NoOp);
    }
}
