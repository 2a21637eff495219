//! The dispatcher: hook chain, routing, panic isolation.
//!
//! `dispatch` is the single entry point turning an `Action` into an
//! `ActionResult`:
//!
//! 1. pre-hooks, descending priority; the first `Cancel` aborts with `NoOp`;
//! 2. route by namespace, then exact name, then fallback;
//! 3. run the handler against a fresh [`ExecutionContext`] under
//!    `catch_unwind`; a panic becomes `Status::Error` and any open history
//!    groups are force-closed, the dispatcher keeps serving;
//! 4. apply the result's mode change;
//! 5. post-hooks, ascending priority (highest priority observes the final
//!    result last).
//!
//! Registries hold trait objects behind RwLocks; the ordered hook list is
//! snapshotted under the lock and iterated outside it, so hooks and handlers
//! may re-register without deadlocking.

use crate::context::ExecutionContext;
use crate::result::{ActionResult, DispatchError, Status};
use core_events::{Action, is_valid_action_name, split_action_name};
use core_model::EditorModel;
use core_text::BufferEngine;
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, warn};

/// Implements one or more action verbs.
pub trait Handler: Send + Sync {
    fn can_handle(&self, name: &str) -> bool;
    fn handle(&self, action: &Action, ctx: &mut ExecutionContext<'_>) -> ActionResult;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookDecision {
    Continue,
    Cancel(Option<String>),
}

/// Pluggable pre/post interceptor on the dispatch pipeline.
pub trait Hook: Send + Sync {
    fn name(&self) -> &'static str;
    /// Higher priority runs earlier pre-dispatch and later post-dispatch.
    fn priority(&self) -> i32;
    fn pre(&self, _action: &Action, _scratch: &mut HashMap<String, Value>) -> HookDecision {
        HookDecision::Continue
    }
    fn post(&self, _action: &Action, _result: &ActionResult, _scratch: &mut HashMap<String, Value>) {
    }
}

#[derive(Default)]
pub struct Dispatcher {
    /// Sorted by descending priority; ties keep registration order.
    hooks: RwLock<Vec<Arc<dyn Hook>>>,
    namespaces: RwLock<HashMap<String, Arc<dyn Handler>>>,
    named: RwLock<HashMap<String, Arc<dyn Handler>>>,
    fallback: RwLock<Option<Arc<dyn Handler>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_hook(&self, hook: Arc<dyn Hook>) {
        let mut hooks = self.hooks.write().expect("hook registry poisoned");
        let pos = hooks
            .iter()
            .position(|h| h.priority() < hook.priority())
            .unwrap_or(hooks.len());
        hooks.insert(pos, hook);
    }

    pub fn register_namespace(&self, namespace: &str, handler: Arc<dyn Handler>) {
        self.namespaces
            .write()
            .expect("namespace registry poisoned")
            .insert(namespace.to_string(), handler);
    }

    pub fn register_named(&self, name: &str, handler: Arc<dyn Handler>) {
        self.named
            .write()
            .expect("named registry poisoned")
            .insert(name.to_string(), handler);
    }

    pub fn set_fallback(&self, handler: Arc<dyn Handler>) {
        *self.fallback.write().expect("fallback registry poisoned") = Some(handler);
    }

    fn route(&self, name: &str) -> Option<Arc<dyn Handler>> {
        if let Some((ns, _)) = split_action_name(name) {
            let namespaces = self.namespaces.read().expect("namespace registry poisoned");
            if let Some(h) = namespaces.get(ns)
                && h.can_handle(name)
            {
                return Some(h.clone());
            }
        }
        let named = self.named.read().expect("named registry poisoned");
        if let Some(h) = named.get(name) {
            return Some(h.clone());
        }
        drop(named);
        self.fallback
            .read()
            .expect("fallback registry poisoned")
            .clone()
    }

    /// Dispatch one action against the model.
    pub fn dispatch(&self, action: &Action, model: &mut EditorModel) -> ActionResult {
        if !is_valid_action_name(&action.name) {
            return ActionResult::error(DispatchError::Validation(format!(
                "malformed action name `{}`",
                action.name
            )));
        }

        // Snapshot the ordered hook list; never call hooks under the lock.
        let hooks: Vec<Arc<dyn Hook>> =
            self.hooks.read().expect("hook registry poisoned").clone();

        let mut scratch: HashMap<String, Value> = HashMap::new();
        scratch.insert(
            "_read_only".to_string(),
            Value::Bool(model.engine().is_read_only()),
        );

        for hook in &hooks {
            if let HookDecision::Cancel(message) = hook.pre(action, &mut scratch) {
                debug!(target: "actions.dispatch", action = %action.name, hook = hook.name(), "pre-hook cancel");
                return match message {
                    Some(m) => ActionResult::noop_with_message(m),
                    None => ActionResult::noop(),
                };
            }
        }

        let Some(handler) = self.route(&action.name) else {
            let result = ActionResult::error(DispatchError::UnknownAction(action.name.clone()));
            for hook in hooks.iter().rev() {
                hook.post(action, &result, &mut scratch);
            }
            return result;
        };

        let (result, mut scratch) = {
            let mut ctx = ExecutionContext::new(model.split(), action.count, scratch);
            let entry_depth = ctx.history.open_depth();

            let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(action, &mut ctx)));
            let mut result = match outcome {
                Ok(result) => result,
                Err(_) => {
                    error!(target: "actions.dispatch", action = %action.name, "handler panic");
                    ctx.history.set_suspended(false);
                    ActionResult::error(DispatchError::HandlerPanic(action.name.clone()))
                }
            };

            // Undo balance: every begin_group must have closed by now.
            if ctx.history.open_depth() > entry_depth {
                warn!(target: "actions.dispatch", action = %action.name, "unbalanced history group, force-closing");
                ctx.history.force_close_all();
            }

            if result.edits.is_empty() {
                result.edits = ctx.take_edits();
            }
            if let Some(mode) = result.mode_change {
                ctx.modes.switch_to(mode);
            }
            (result, ctx.scratch)
        };

        // Buffer-load handlers report a new path through result data.
        if let Some(Value::String(p)) = result.data.get("file_path") {
            model.file_path = Some(p.clone().into());
        }

        for hook in hooks.iter().rev() {
            hook.post(action, &result, &mut scratch);
        }

        debug!(
            target: "actions.dispatch",
            action = %action.name,
            status = ?result.status,
            edits = result.edits.len(),
            "dispatched"
        );
        result
    }
}
