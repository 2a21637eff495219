//! The input front-end state machine.
//!
//! Per key event: pre-key hooks (ascending priority, first consumer wins),
//! prefix accumulators (count, register, pending single-rune replace), then
//! the keymap. An exact match fires; an exact match shadowed by a live
//! longer binding waits and is resolved by the sequence timeout; an
//! unmatched sequence drains through the current mode's unmapped
//! interpreter.
//!
//! The front-end mirrors the modal state it needs (mode, recording flag,
//! read-only flag) instead of borrowing the editor: the caller syncs the
//! mirror after every dispatch. Operator accumulation lives here: a bare
//! `operator.*` binding from normal mode parks the operator and enters
//! operator-pending; the pending layer's motion/object sentinels compose the
//! final action with multiplicative counts.

use crate::hooks::KeyHook;
use crate::unmapped;
use core_events::{
    Action, ActionArgs, ActionSource, KEY_EVENTS_TOTAL, KeyEvent, SEQUENCE_TIMEOUTS,
};
use core_keymap::{Keymap, KeymapContext};
use core_state::ModeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tracing::{debug, trace};

const COUNT_CAP: i32 = 999_999;

#[derive(Debug)]
pub struct KeyOutcome {
    /// Actions to dispatch, in order. Usually zero or one; resolving a
    /// shadowed exact match plus the key that broke the sequence can yield
    /// two.
    pub actions: Vec<Action>,
    /// True while a multi-key sequence is still accumulating (the caller
    /// should arm the sequence timer).
    pub pending: bool,
    /// Timer generation; pass back to [`InputFrontEnd::on_timeout`].
    pub generation: u64,
}

impl KeyOutcome {
    fn empty(generation: u64) -> Self {
        Self {
            actions: Vec::new(),
            pending: false,
            generation,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredBinding {
    action: String,
    args: ActionArgs,
    /// How many sequence events the binding covered when it was stored.
    consumed: usize,
}

pub(crate) struct Pending {
    pub(crate) mode: ModeId,
    pub(crate) sequence: Vec<KeyEvent>,
    pub(crate) count: i32,
    pub(crate) post_count: i32,
    pub(crate) register: Option<char>,
    pub(crate) operator: Option<String>,
    pub(crate) operator_register: Option<char>,
    pub(crate) awaiting_register: bool,
    pub(crate) pending_replace: bool,
    pub(crate) command_line: Option<String>,
    stored_exact: Option<StoredBinding>,
    macro_recording: bool,
    read_only: bool,
    conditions: HashMap<String, bool>,
    variables: HashMap<String, String>,
}

impl Pending {
    fn new() -> Self {
        Self {
            mode: ModeId::Normal,
            sequence: Vec::new(),
            count: 0,
            post_count: 0,
            register: None,
            operator: None,
            operator_register: None,
            awaiting_register: false,
            pending_replace: false,
            command_line: None,
            stored_exact: None,
            macro_recording: false,
            read_only: false,
            conditions: HashMap::new(),
            variables: HashMap::new(),
        }
    }

    pub(crate) fn take_count(&mut self) -> i32 {
        std::mem::take(&mut self.count)
    }
}

pub struct InputFrontEnd {
    keymap: RwLock<Keymap>,
    state: Mutex<Pending>,
    hooks: RwLock<Vec<Arc<dyn KeyHook>>>,
    closed: AtomicBool,
    generation: AtomicU64,
    timeout: Duration,
}

impl InputFrontEnd {
    pub fn new(keymap: Keymap, timeout: Duration) -> Self {
        Self {
            keymap: RwLock::new(keymap),
            state: Mutex::new(Pending::new()),
            hooks: RwLock::new(Vec::new()),
            closed: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            timeout,
        }
    }

    pub fn sequence_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn keymap(&self) -> &RwLock<Keymap> {
        &self.keymap
    }

    /// Register a key hook; kept ordered by ascending priority.
    pub fn register_key_hook(&self, hook: Arc<dyn KeyHook>) {
        let mut hooks = self.hooks.write().expect("key hook registry poisoned");
        let pos = hooks
            .iter()
            .position(|h| h.priority() > hook.priority())
            .unwrap_or(hooks.len());
        hooks.insert(pos, hook);
    }

    /// Mirror editor state the keymap and accumulators depend on. Call after
    /// every dispatch.
    pub fn sync(&self, mode: ModeId, macro_recording: bool, read_only: bool) {
        let mut st = self.state.lock().expect("input state poisoned");
        st.mode = mode;
        st.macro_recording = macro_recording;
        st.read_only = read_only;
    }

    /// Host-mirrored keymap condition (e.g. `editorTextFocus`).
    pub fn set_condition(&self, name: impl Into<String>, value: bool) {
        self.state
            .lock()
            .expect("input state poisoned")
            .conditions
            .insert(name.into(), value);
    }

    /// Host-mirrored keymap variable (e.g. `resourceLangId`).
    pub fn set_variable(&self, name: impl Into<String>, value: impl Into<String>) {
        self.state
            .lock()
            .expect("input state poisoned")
            .variables
            .insert(name.into(), value.into());
    }

    pub fn mode(&self) -> ModeId {
        self.state.lock().expect("input state poisoned").mode
    }

    /// Command line accumulated in command mode (for a host statusline).
    pub fn command_line(&self) -> Option<String> {
        self.state
            .lock()
            .expect("input state poisoned")
            .command_line
            .clone()
    }

    /// Stop accepting input. Subsequent key events are no-ops.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Feed one key event.
    pub fn handle_key(&self, event: KeyEvent) -> KeyOutcome {
        if self.is_closed() {
            return KeyOutcome::empty(self.generation());
        }
        KEY_EVENTS_TOTAL.fetch_add(1, Ordering::Relaxed);

        let hooks: Vec<Arc<dyn KeyHook>> =
            self.hooks.read().expect("key hook registry poisoned").clone();
        for hook in &hooks {
            if hook.pre_key(&event) {
                trace!(target: "input.front_end", hook = hook.name(), key = %event, "key consumed by hook");
                return KeyOutcome::empty(self.generation());
            }
        }

        // Every key event invalidates an outstanding sequence timer.
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let mut actions = Vec::new();
        let mut queue = vec![event];
        let mut depth = 0;
        while depth < 8 {
            depth += 1;
            let Some(ev) = queue.pop() else { break };
            self.process_one(ev, &mut actions, &mut queue);
        }

        let pending = !self
            .state
            .lock()
            .expect("input state poisoned")
            .sequence
            .is_empty();

        for hook in &hooks {
            hook.post_key(&event, actions.last());
        }
        KeyOutcome {
            actions,
            pending,
            generation,
        }
    }

    /// Sequence timer fired. Stale generations are ignored (a newer key
    /// already cancelled the timer).
    pub fn on_timeout(&self, generation: u64) -> KeyOutcome {
        if self.is_closed() || generation != self.generation() {
            return KeyOutcome::empty(generation);
        }
        SEQUENCE_TIMEOUTS.fetch_add(1, Ordering::Relaxed);
        let mut actions = Vec::new();
        let remaining = {
            let mut st = self.state.lock().expect("input state poisoned");
            if let Some(stored) = st.stored_exact.take() {
                let consumed = stored.consumed.min(st.sequence.len());
                let remaining = st.sequence.split_off(consumed);
                st.sequence.clear();
                debug!(target: "input.front_end", action = %stored.action, "timeout resolves shadowed exact match");
                self.compose(&mut st, stored, &mut actions);
                remaining
            } else {
                let seq = std::mem::take(&mut st.sequence);
                for ev in seq {
                    unmapped::handle(&mut st, ev, &mut actions);
                }
                Vec::new()
            }
        };
        // Keys typed after the stored match re-enter resolution in order.
        for ev in remaining {
            let mut queue = vec![ev];
            let mut depth = 0;
            while depth < 8 {
                depth += 1;
                let Some(e) = queue.pop() else { break };
                self.process_one(e, &mut actions, &mut queue);
            }
        }
        KeyOutcome {
            actions,
            pending: false,
            generation,
        }
    }

    fn process_one(&self, event: KeyEvent, actions: &mut Vec<Action>, requeue: &mut Vec<KeyEvent>) {
        let mut st = self.state.lock().expect("input state poisoned");
        let mode = st.mode;

        // Reconcile accumulators with the (possibly externally switched)
        // mode.
        if mode != ModeId::OperatorPending {
            st.operator = None;
            st.operator_register = None;
            st.post_count = 0;
        }
        match (mode, st.command_line.is_some()) {
            (ModeId::Command, false) => st.command_line = Some(String::new()),
            (ModeId::Command, true) => {}
            (_, true) => st.command_line = None,
            _ => {}
        }
        if mode != ModeId::Normal {
            st.pending_replace = false;
        }

        // Single-rune replace (`r`): the next rune is the replacement.
        if st.pending_replace {
            st.pending_replace = false;
            if let Some(c) = event.plain_rune() {
                let count = st.take_count();
                actions.push(
                    Action::new("editor.replaceChar")
                        .with_args(ActionArgs::text(c.to_string()))
                        .with_count(count),
                );
            }
            return;
        }

        // Register designator after `"`.
        if st.awaiting_register {
            st.awaiting_register = false;
            match event.plain_rune() {
                Some(c) if c.is_ascii_alphanumeric() => st.register = Some(c),
                _ => st.register = None,
            }
            return;
        }

        // Count accumulation. Digits bypass the keymap while a count is
        // already pending so multi-digit counts survive a bound `0`; a
        // leading `0` falls through to its line-start binding.
        if let Some(c) = event.plain_rune()
            && c.is_ascii_digit()
            && matches!(
                mode,
                ModeId::Normal
                    | ModeId::OperatorPending
                    | ModeId::Visual
                    | ModeId::VisualLine
                    | ModeId::VisualBlock
            )
            && st.sequence.is_empty()
        {
            let digit = c as i32 - '0' as i32;
            if mode == ModeId::OperatorPending {
                if digit != 0 || st.post_count > 0 {
                    st.post_count = st.post_count.saturating_mul(10).saturating_add(digit).min(COUNT_CAP);
                    trace!(target: "input.front_end", post_count = st.post_count, "post-operator count");
                    return;
                }
            } else if digit != 0 || st.count > 0 {
                st.count = st.count.saturating_mul(10).saturating_add(digit).min(COUNT_CAP);
                trace!(target: "input.front_end", count = st.count, "count prefix");
                return;
            }
        }

        // Register prefix `"` (normal and visual modes only).
        if event.plain_rune() == Some('"')
            && st.sequence.is_empty()
            && matches!(
                mode,
                ModeId::Normal | ModeId::Visual | ModeId::VisualLine | ModeId::VisualBlock
            )
        {
            st.awaiting_register = true;
            return;
        }

        st.sequence.push(event);
        let ctx = keymap_context(&st);
        let keymap = self.keymap.read().expect("keymap poisoned");
        let lookup = keymap.lookup(mode.name(), &st.sequence, &ctx);
        let exact = lookup.exact.map(|b| StoredBinding {
            action: b.action.clone(),
            args: b.args.clone(),
            consumed: st.sequence.len(),
        });
        let prefix = lookup.prefix;
        drop(keymap);

        match (exact, prefix) {
            (Some(stored), false) => {
                st.sequence.clear();
                st.stored_exact = None;
                self.compose(&mut st, stored, actions);
            }
            (Some(stored), true) => {
                // Longer sequences take precedence; remember the exact match
                // for the timeout.
                st.stored_exact = Some(stored);
            }
            (None, true) => {}
            (None, false) => {
                if let Some(stored) = st.stored_exact.take() {
                    // The new key broke a shadowed match: fire the match,
                    // then reprocess everything typed after it.
                    let consumed = stored.consumed.min(st.sequence.len());
                    let rest = st.sequence.split_off(consumed);
                    st.sequence.clear();
                    self.compose(&mut st, stored, actions);
                    // The requeue is a stack; push in reverse so the events
                    // replay in order.
                    for ev in rest.into_iter().rev() {
                        requeue.push(ev);
                    }
                } else {
                    let seq = std::mem::take(&mut st.sequence);
                    for ev in seq {
                        unmapped::handle(&mut st, ev, actions);
                    }
                }
            }
        }
    }

    /// Fold a resolved binding through the pending accumulators.
    fn compose(&self, st: &mut Pending, binding: StoredBinding, out: &mut Vec<Action>) {
        let name = binding.action;

        // Operator-pending sentinels: complete the pending operator.
        if name == "operator.motion" || name == "operator.textObject" {
            let Some(op) = st.operator.take() else {
                st.post_count = 0;
                return;
            };
            let prefix = st.take_count().max(1);
            let post = std::mem::take(&mut st.post_count).max(1);
            let total = prefix.saturating_mul(post).min(COUNT_CAP);
            let mut args = binding.args;
            if args.register.is_none() {
                args.register = st.operator_register.take();
            }
            st.mode = ModeId::Normal;
            debug!(target: "input.front_end", operator = %op, count = total, "operator composed");
            out.push(Action {
                name: op,
                args,
                count: total,
                source: ActionSource::Keyboard,
            });
            return;
        }

        // A bare operator from normal mode waits for its motion.
        if name.starts_with("operator.")
            && binding.args.motion.is_none()
            && binding.args.text_object.is_none()
            && st.mode == ModeId::Normal
        {
            st.operator_register = st.register.take().or(binding.args.register);
            st.operator = Some(name.clone());
            st.post_count = 0;
            st.mode = ModeId::OperatorPending;
            debug!(target: "input.front_end", operator = %name, "operator pending");
            out.push(Action::new("mode.operatorPending"));
            return;
        }

        let mut args = binding.args;
        if args.register.is_none() {
            args.register = st.register.take();
        }
        let count = st.take_count();

        if name == "mode.command" {
            st.command_line = Some(String::new());
        }
        // Optimistic modal mirror so the very next key resolves against the
        // right layer; the post-dispatch sync confirms it.
        if let Some(next) = optimistic_mode(&name, st.mode) {
            st.mode = next;
        }
        out.push(Action {
            name,
            args,
            count,
            source: ActionSource::Keyboard,
        });
    }
}

fn optimistic_mode(action: &str, current: ModeId) -> Option<ModeId> {
    let next = match action {
        "mode.insert" | "mode.append" | "mode.appendLine" | "mode.insertLineStart"
        | "mode.openAbove" | "mode.openBelow" => ModeId::Insert,
        "mode.normal" => ModeId::Normal,
        "mode.visual" => {
            if current == ModeId::Visual {
                ModeId::Normal
            } else {
                ModeId::Visual
            }
        }
        "mode.visualLine" => ModeId::VisualLine,
        "mode.visualBlock" => ModeId::VisualBlock,
        "mode.command" => ModeId::Command,
        "mode.replace" => ModeId::Replace,
        "operator.change" => ModeId::Insert,
        _ if action.starts_with("operator.") && current.is_visual() => ModeId::Normal,
        _ => return None,
    };
    Some(next)
}

fn keymap_context(st: &Pending) -> KeymapContext {
    let mut ctx = KeymapContext::new();
    ctx.set_condition("editorTextFocus", true);
    ctx.set_condition("macroRecording", st.macro_recording);
    ctx.set_condition("readOnly", st.read_only);
    for (k, v) in &st.conditions {
        ctx.set_condition(k.clone(), *v);
    }
    ctx.set_variable("mode", st.mode.name());
    if let Some(op) = &st.operator {
        ctx.set_variable("pendingOperator", op.clone());
    }
    for (k, v) in &st.variables {
        ctx.set_variable(k.clone(), v.clone());
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::{Motion, parse_sequence};
    use core_keymap::default_keymap;
    use pretty_assertions::assert_eq;

    fn front_end() -> InputFrontEnd {
        InputFrontEnd::new(default_keymap(), Duration::from_millis(1000))
    }

    fn feed(fe: &InputFrontEnd, keys: &str) -> Vec<Action> {
        let mut out = Vec::new();
        for ev in parse_sequence(keys).unwrap() {
            out.extend(fe.handle_key(ev).actions);
        }
        out
    }

    #[test]
    fn simple_motion_binding() {
        let fe = front_end();
        let actions = feed(&fe, "w");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "cursor.wordForward");
        assert_eq!(actions[0].count, 0);
    }

    #[test]
    fn count_prefix_attaches() {
        let fe = front_end();
        let actions = feed(&fe, "5 w");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].count, 5);
        // Multi-digit including a bound `0`.
        let actions = feed(&fe, "2 0 j");
        assert_eq!(actions[0].name, "cursor.moveDown");
        assert_eq!(actions[0].count, 20);
    }

    #[test]
    fn leading_zero_is_line_start() {
        let fe = front_end();
        let actions = feed(&fe, "0");
        assert_eq!(actions[0].name, "cursor.lineStart");
    }

    #[test]
    fn operator_motion_composition() {
        let fe = front_end();
        let actions = feed(&fe, "d w");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].name, "mode.operatorPending");
        assert_eq!(actions[1].name, "operator.delete");
        assert_eq!(actions[1].args.motion, Some(Motion::Word));
        assert_eq!(actions[1].count, 1);
        assert_eq!(fe.mode(), ModeId::Normal, "mirror returns to normal");
    }

    #[test]
    fn multiplicative_counts() {
        let fe = front_end();
        let actions = feed(&fe, "2 d 3 w");
        let op = actions.last().unwrap();
        assert_eq!(op.name, "operator.delete");
        assert_eq!(op.count, 6);
    }

    #[test]
    fn doubled_operator_is_linewise() {
        let fe = front_end();
        let actions = feed(&fe, "d d");
        let op = actions.last().unwrap();
        assert_eq!(op.name, "operator.delete");
        assert_eq!(op.args.motion, Some(Motion::Line));
    }

    #[test]
    fn text_object_composition() {
        let fe = front_end();
        let actions = feed(&fe, "d i w");
        let op = actions.last().unwrap();
        assert_eq!(op.name, "operator.delete");
        let obj = op.args.text_object.unwrap();
        assert!(!obj.around);
    }

    #[test]
    fn register_prefix_flows_to_operator() {
        let fe = front_end();
        let actions = feed(&fe, "\" a d w");
        let op = actions.last().unwrap();
        assert_eq!(op.args.register, Some('a'));
    }

    #[test]
    fn escape_cancels_pending_operator() {
        let fe = front_end();
        let actions = feed(&fe, "d <Esc> w");
        // d enters pending, Esc resolves to mode.normal, w is a plain motion.
        assert_eq!(actions[0].name, "mode.operatorPending");
        assert_eq!(actions[1].name, "mode.normal");
        assert_eq!(actions[2].name, "cursor.wordForward");
        assert_eq!(actions[2].args.motion, None);
    }

    #[test]
    fn insert_mode_literals() {
        let fe = front_end();
        fe.sync(ModeId::Insert, false, false);
        let actions = feed(&fe, "h i");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].name, "editor.insertText");
        assert_eq!(actions[0].args.text.as_deref(), Some("h"));
        assert_eq!(actions[1].args.text.as_deref(), Some("i"));
    }

    #[test]
    fn prefix_waits_and_timeout_fires_exact() {
        let fe = front_end();
        // `q` (while not recording) is only a prefix -> nothing yet.
        let outcome = fe.handle_key(KeyEvent::rune('g'));
        assert!(outcome.actions.is_empty());
        assert!(outcome.pending);
        // Timeout with a current generation: `g` alone has no exact match,
        // sequence drains through unmapped (nothing in normal mode).
        let out = fe.on_timeout(outcome.generation);
        assert!(out.actions.is_empty());
        // Now a real shadowed exact: bind `g` itself.
        {
            let mut km = fe.keymap().write().unwrap();
            km.bind(
                "normal",
                core_keymap::Binding::new(parse_sequence("g").unwrap(), "cursor.lineStart"),
            )
            .unwrap();
        }
        let outcome = fe.handle_key(KeyEvent::rune('g'));
        assert!(outcome.pending);
        let out = fe.on_timeout(outcome.generation);
        assert_eq!(out.actions[0].name, "cursor.lineStart");
    }

    #[test]
    fn stale_timeout_is_ignored() {
        let fe = front_end();
        let first = fe.handle_key(KeyEvent::rune('g'));
        let _ = fe.handle_key(KeyEvent::rune('g')); // resolves g g
        let out = fe.on_timeout(first.generation);
        assert!(out.actions.is_empty(), "old generation must not fire");
    }

    #[test]
    fn broken_prefix_fires_exact_then_reprocesses() {
        let fe = front_end();
        {
            let mut km = fe.keymap().write().unwrap();
            km.bind(
                "normal",
                core_keymap::Binding::new(parse_sequence("g").unwrap(), "cursor.lineStart"),
            )
            .unwrap();
        }
        let actions = feed(&fe, "g w");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].name, "cursor.lineStart");
        assert_eq!(actions[1].name, "cursor.wordForward");
    }

    #[test]
    fn replace_pending_rune() {
        let fe = front_end();
        let actions = feed(&fe, "r x");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "editor.replaceChar");
        assert_eq!(actions[0].args.text.as_deref(), Some("x"));
    }

    #[test]
    fn command_line_accumulates_and_executes() {
        let fe = front_end();
        let actions = feed(&fe, ":");
        assert_eq!(actions[0].name, "mode.command");
        assert_eq!(fe.mode(), ModeId::Command);
        let actions = feed(&fe, "w q");
        assert!(actions.is_empty());
        assert_eq!(fe.command_line().as_deref(), Some("wq"));
        let actions = feed(&fe, "<CR>");
        assert_eq!(actions[0].name, "palette.run");
        assert_eq!(actions[0].args.text.as_deref(), Some("wq"));
        assert_eq!(fe.mode(), ModeId::Normal);
    }

    #[test]
    fn macro_record_keys_resolve_by_condition() {
        let fe = front_end();
        let actions = feed(&fe, "q a");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name, "macro.startRecord");
        assert_eq!(actions[0].args.register, Some('a'));
        // While recording, `q` fires immediately.
        fe.sync(ModeId::Normal, true, false);
        let outcome = fe.handle_key(KeyEvent::rune('q'));
        assert_eq!(outcome.actions[0].name, "macro.stopRecord");
        assert!(!outcome.pending);
    }

    #[test]
    fn closed_front_end_ignores_keys() {
        let fe = front_end();
        fe.close();
        let outcome = fe.handle_key(KeyEvent::rune('w'));
        assert!(outcome.actions.is_empty());
    }

    #[test]
    fn key_hook_can_consume() {
        struct Swallow;
        impl KeyHook for Swallow {
            fn name(&self) -> &'static str {
                "swallow"
            }
            fn priority(&self) -> i32 {
                10
            }
            fn pre_key(&self, ev: &KeyEvent) -> bool {
                ev.plain_rune() == Some('w')
            }
        }
        let fe = front_end();
        fe.register_key_hook(Arc::new(Swallow));
        assert!(feed(&fe, "w").is_empty());
        assert_eq!(feed(&fe, "b")[0].name, "cursor.wordBack");
    }

    #[test]
    fn visual_operator_applies_immediately() {
        let fe = front_end();
        let actions = feed(&fe, "v");
        assert_eq!(actions[0].name, "mode.visual");
        assert_eq!(fe.mode(), ModeId::Visual);
        let actions = feed(&fe, "d");
        assert_eq!(actions[0].name, "operator.delete");
        assert_eq!(actions[0].args.motion, None);
        assert_eq!(fe.mode(), ModeId::Normal, "mirror leaves visual");
    }
}
