//! `macro.*` handlers.
//!
//! Recording itself happens in the post-dispatch capture hook; these verbs
//! drive the recorder state machine and expand playback. Replay never
//! re-enters the dispatcher: expanded actions are either handed to the
//! registered callback or returned in the result's `follow_up` list for the
//! host to feed back through the action channel.

use crate::context::ExecutionContext;
use crate::result::{ActionResult, DispatchError};
use core_events::{Action, ActionSource};
use serde_json::Value;
use std::sync::RwLock;

type PlayCallback = Box<dyn Fn(Action) + Send + Sync>;

/// Optional sink for expanded macro actions. Without a callback, playback
/// returns the expansion in `follow_up`.
#[derive(Default)]
pub struct MacroPlayback {
    callback: RwLock<Option<PlayCallback>>,
}

impl MacroPlayback {
    pub fn set_callback(&self, cb: PlayCallback) {
        *self.callback.write().expect("macro callback poisoned") = Some(cb);
    }
}

pub(crate) const VERBS: &[&str] = &["startRecord", "stopRecord", "play", "playLast"];

pub(crate) fn handle(
    ctx: &mut ExecutionContext<'_>,
    playback: &MacroPlayback,
    verb: &str,
    action: &Action,
) -> ActionResult {
    match verb {
        "startRecord" => {
            let Some(register) = action.args.register else {
                return ActionResult::error(DispatchError::Validation(
                    "macro.startRecord requires a register".to_string(),
                ));
            };
            match ctx.macros.start_record(register) {
                Ok(()) => ActionResult::ok().with_message(format!("recording @{register}")),
                Err(e) => ActionResult::error(DispatchError::Validation(e.to_string())),
            }
        }
        "stopRecord" => match ctx.macros.stop_record() {
            Ok((register, len)) => ActionResult::ok()
                .with_message(format!("recorded {len} action(s) into @{register}"))
                .with_data("register", Value::String(register.to_string()))
                .with_data("actions", Value::from(len as u64)),
            Err(e) => ActionResult::error(DispatchError::Validation(e.to_string())),
        },
        "play" => {
            let Some(register) = action.args.register else {
                return ActionResult::error(DispatchError::Validation(
                    "macro.play requires a register".to_string(),
                ));
            };
            play(ctx, playback, register, action.effective_count())
        }
        "playLast" => match ctx.macros.last_played() {
            Ok(register) => play(ctx, playback, register, action.effective_count()),
            Err(e) => ActionResult::error(DispatchError::Validation(e.to_string())),
        },
        other => ActionResult::error(DispatchError::UnknownAction(format!("macro.{other}"))),
    }
}

fn play(
    ctx: &mut ExecutionContext<'_>,
    playback: &MacroPlayback,
    register: char,
    count: usize,
) -> ActionResult {
    if ctx.macros.recording().is_some() {
        return ActionResult::error(DispatchError::Validation(
            "cannot play a macro while recording".to_string(),
        ));
    }
    let actions = match ctx.macros.get(register) {
        Ok(a) => a,
        Err(e) => return ActionResult::error(DispatchError::Validation(e.to_string())),
    };
    ctx.macros.note_played(register);
    let expanded: Vec<Action> = std::iter::repeat_n(actions, count.max(1))
        .flatten()
        .map(|a| a.with_source(ActionSource::Macro))
        .collect();
    let total = expanded.len();
    tracing::debug!(target: "actions.macros", register = %register, actions = total, "playback");

    let cb = playback.callback.read().expect("macro callback poisoned");
    if let Some(cb) = cb.as_ref() {
        for a in expanded {
            cb(a);
        }
        ActionResult::ok().with_data("played", Value::from(total as u64))
    } else {
        drop(cb);
        ActionResult::ok()
            .with_data("played", Value::from(total as u64))
            .with_follow_up(expanded)
    }
}
