//! Built-in dispatch hooks.
//!
//! Priorities (higher = earlier pre, later post):
//! * 1000: timing/audit
//! * 900: count limit, rate limit
//! * 800: read-only guard
//! * 500: repeat capture (post-only)
//! * 400: macro recording capture (post-only)
//! * 100: context ring for host AI/telemetry consumers

use crate::dispatcher::{Hook, HookDecision};
use crate::result::ActionResult;
use core_events::{Action, ActionSource};
use core_state::MacroStore;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;
use tracing::{debug, trace};

fn process_start() -> Instant {
    static START: OnceLock<Instant> = OnceLock::new();
    *START.get_or_init(Instant::now)
}

// -------------------------------------------------------------------------------------------------
// 1000: timing / audit
// -------------------------------------------------------------------------------------------------

pub struct TimingHook;

impl Hook for TimingHook {
    fn name(&self) -> &'static str {
        "audit.timing"
    }

    fn priority(&self) -> i32 {
        1000
    }

    fn pre(&self, _action: &Action, scratch: &mut HashMap<String, Value>) -> HookDecision {
        let nanos = process_start().elapsed().as_nanos() as u64;
        scratch.insert("_timing_start".to_string(), Value::from(nanos));
        HookDecision::Continue
    }

    fn post(&self, action: &Action, result: &ActionResult, scratch: &mut HashMap<String, Value>) {
        let Some(start) = scratch.get("_timing_start").and_then(Value::as_u64) else {
            return;
        };
        let elapsed_us = (process_start().elapsed().as_nanos() as u64)
            .saturating_sub(start)
            / 1000;
        debug!(
            target: "actions.audit",
            action = %action.name,
            status = ?result.status,
            elapsed_us,
            "action timed"
        );
    }
}

// -------------------------------------------------------------------------------------------------
// 900: count limit + rate limit
// -------------------------------------------------------------------------------------------------

pub struct CountLimitHook {
    max: i32,
}

impl CountLimitHook {
    pub fn new(max: i32) -> Self {
        Self { max }
    }
}

impl Hook for CountLimitHook {
    fn name(&self) -> &'static str {
        "limit.count"
    }

    fn priority(&self) -> i32 {
        900
    }

    fn pre(&self, action: &Action, _scratch: &mut HashMap<String, Value>) -> HookDecision {
        if action.count > self.max {
            HookDecision::Cancel(Some(format!(
                "count {} exceeds limit {}",
                action.count, self.max
            )))
        } else {
            HookDecision::Continue
        }
    }
}

struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last: Instant,
}

impl TokenBucket {
    fn new(per_sec: u32) -> Self {
        Self {
            capacity: per_sec as f64,
            tokens: per_sec as f64,
            refill_per_sec: per_sec as f64,
            last: Instant::now(),
        }
    }

    fn try_take(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token-bucket admission; disabled when constructed with 0.
pub struct RateLimitHook {
    bucket: Option<Mutex<TokenBucket>>,
}

impl RateLimitHook {
    pub fn new(per_sec: u32) -> Self {
        Self {
            bucket: (per_sec > 0).then(|| Mutex::new(TokenBucket::new(per_sec))),
        }
    }
}

impl Hook for RateLimitHook {
    fn name(&self) -> &'static str {
        "limit.rate"
    }

    fn priority(&self) -> i32 {
        900
    }

    fn pre(&self, _action: &Action, _scratch: &mut HashMap<String, Value>) -> HookDecision {
        let Some(bucket) = &self.bucket else {
            return HookDecision::Continue;
        };
        if bucket.lock().expect("rate bucket poisoned").try_take() {
            HookDecision::Continue
        } else {
            HookDecision::Cancel(Some("rate limit exceeded".to_string()))
        }
    }
}

// -------------------------------------------------------------------------------------------------
// 800: read-only guard
// -------------------------------------------------------------------------------------------------

/// Safe while the buffer is read-only: navigation, view movement,
/// non-replace search, and mode transitions that cannot edit.
fn is_read_only_safe(name: &str) -> bool {
    if let Some(ns) = name.split('.').next() {
        match ns {
            "cursor" | "view" | "scroll" => return true,
            "search" => return !name.ends_with("Replace"),
            "mode" => {
                // The open-line transitions insert text; the rest only
                // change modal state.
                return !matches!(name, "mode.openAbove" | "mode.openBelow");
            }
            _ => {}
        }
    }
    false
}

pub struct ReadOnlyGuardHook;

impl Hook for ReadOnlyGuardHook {
    fn name(&self) -> &'static str {
        "validate.readOnly"
    }

    fn priority(&self) -> i32 {
        800
    }

    fn pre(&self, action: &Action, scratch: &mut HashMap<String, Value>) -> HookDecision {
        let read_only = scratch
            .get("_read_only")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if read_only && !is_read_only_safe(&action.name) {
            HookDecision::Cancel(Some("buffer is read-only".to_string()))
        } else {
            HookDecision::Continue
        }
    }
}

// -------------------------------------------------------------------------------------------------
// 500: repeat capture (post-only)
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RepeatEntry {
    /// Deep copy of the action at capture time.
    pub action: Action,
    pub count: i32,
}

/// Captures the last repeatable action for `.` to re-dispatch.
#[derive(Default)]
pub struct RepeatHook {
    slot: Mutex<Option<RepeatEntry>>,
}

impl RepeatHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<RepeatEntry> {
        self.slot.lock().expect("repeat slot poisoned").clone()
    }
}

fn is_repeatable(name: &str) -> bool {
    // Undo traffic and the repeat trigger itself never re-capture.
    if matches!(name, "editor.undo" | "editor.redo" | "editor.repeatLast") {
        return false;
    }
    name.starts_with("editor.")
        || name.starts_with("operator.")
        || matches!(name, "mode.openAbove" | "mode.openBelow")
}

impl Hook for RepeatHook {
    fn name(&self) -> &'static str {
        "repeat.capture"
    }

    fn priority(&self) -> i32 {
        500
    }

    fn post(&self, action: &Action, result: &ActionResult, _scratch: &mut HashMap<String, Value>) {
        if !result.is_ok() || !is_repeatable(&action.name) {
            return;
        }
        trace!(target: "actions.repeat", action = %action.name, "captured");
        *self.slot.lock().expect("repeat slot poisoned") = Some(RepeatEntry {
            action: action.clone(),
            count: action.count,
        });
    }
}

// -------------------------------------------------------------------------------------------------
// 400: macro recording capture (post-only)
// -------------------------------------------------------------------------------------------------

/// Appends successfully dispatched keyboard actions to the active macro
/// recording. Macro-sourced actions are skipped so replay cannot re-record
/// itself; `macro.*` control traffic is never part of a recording.
pub struct MacroCaptureHook {
    store: Arc<MacroStore>,
}

impl MacroCaptureHook {
    pub fn new(store: Arc<MacroStore>) -> Self {
        Self { store }
    }
}

impl Hook for MacroCaptureHook {
    fn name(&self) -> &'static str {
        "macro.capture"
    }

    fn priority(&self) -> i32 {
        400
    }

    fn post(&self, action: &Action, result: &ActionResult, _scratch: &mut HashMap<String, Value>) {
        if !result.is_ok()
            || action.source != ActionSource::Keyboard
            || action.name.starts_with("macro.")
        {
            return;
        }
        self.store.record(action);
    }
}

// -------------------------------------------------------------------------------------------------
// 100: context ring
// -------------------------------------------------------------------------------------------------

/// Bounded ring of recent action names, for host AI/telemetry surfaces.
pub struct ContextRingHook {
    ring: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl ContextRingHook {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn recent(&self) -> Vec<String> {
        self.ring
            .lock()
            .expect("context ring poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

impl Hook for ContextRingHook {
    fn name(&self) -> &'static str {
        "context.capture"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn post(&self, action: &Action, result: &ActionResult, _scratch: &mut HashMap<String, Value>) {
        let mut ring = self.ring.lock().expect("context ring poisoned");
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(format!("{} {:?}", action.name, result.status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ActionResult;

    fn scratch() -> HashMap<String, Value> {
        HashMap::new()
    }

    #[test]
    fn count_limit_cancels_over_max() {
        let hook = CountLimitHook::new(100);
        let ok = Action::new("cursor.moveDown").with_count(100);
        let over = Action::new("cursor.moveDown").with_count(101);
        assert_eq!(hook.pre(&ok, &mut scratch()), HookDecision::Continue);
        assert!(matches!(
            hook.pre(&over, &mut scratch()),
            HookDecision::Cancel(Some(_))
        ));
    }

    #[test]
    fn rate_limit_disabled_at_zero() {
        let hook = RateLimitHook::new(0);
        for _ in 0..1000 {
            assert_eq!(
                hook.pre(&Action::new("cursor.moveDown"), &mut scratch()),
                HookDecision::Continue
            );
        }
    }

    #[test]
    fn rate_limit_eventually_cancels() {
        let hook = RateLimitHook::new(2);
        let a = Action::new("cursor.moveDown");
        let mut cancelled = false;
        for _ in 0..10 {
            if matches!(hook.pre(&a, &mut scratch()), HookDecision::Cancel(_)) {
                cancelled = true;
                break;
            }
        }
        assert!(cancelled, "burst far above the budget must be limited");
    }

    #[test]
    fn read_only_guard_allows_safe_families() {
        let hook = ReadOnlyGuardHook;
        let mut s = scratch();
        s.insert("_read_only".into(), Value::Bool(true));
        for safe in [
            "cursor.moveDown",
            "view.center",
            "scroll.pageDown",
            "search.forward",
            "mode.visual",
            "mode.normal",
        ] {
            assert_eq!(
                hook.pre(&Action::new(safe), &mut s),
                HookDecision::Continue,
                "{safe} must pass"
            );
        }
        for blocked in [
            "editor.insertText",
            "operator.delete",
            "mode.openBelow",
            "search.andReplace",
            "file.save",
        ] {
            assert!(
                matches!(hook.pre(&Action::new(blocked), &mut s), HookDecision::Cancel(_)),
                "{blocked} must be blocked"
            );
        }
    }

    #[test]
    fn read_only_guard_passes_when_writable() {
        let hook = ReadOnlyGuardHook;
        let mut s = scratch();
        s.insert("_read_only".into(), Value::Bool(false));
        assert_eq!(
            hook.pre(&Action::new("editor.insertText"), &mut s),
            HookDecision::Continue
        );
    }

    #[test]
    fn repeat_captures_editor_and_operator_only() {
        let hook = RepeatHook::new();
        let ok = ActionResult::ok();
        hook.post(&Action::new("cursor.moveDown"), &ok, &mut scratch());
        assert!(hook.last().is_none());
        hook.post(&Action::new("editor.undo"), &ok, &mut scratch());
        assert!(hook.last().is_none(), "undo is not repeatable");
        hook.post(
            &Action::new("editor.insertText").with_count(2),
            &ok,
            &mut scratch(),
        );
        let entry = hook.last().unwrap();
        assert_eq!(entry.action.name, "editor.insertText");
        assert_eq!(entry.count, 2);
        hook.post(&Action::new("mode.openBelow"), &ok, &mut scratch());
        assert_eq!(hook.last().unwrap().action.name, "mode.openBelow");
    }

    #[test]
    fn repeat_ignores_failures() {
        let hook = RepeatHook::new();
        let failed = ActionResult::error(crate::result::DispatchError::Validation("x".into()));
        hook.post(&Action::new("editor.insertText"), &failed, &mut scratch());
        assert!(hook.last().is_none());
    }

    #[test]
    fn macro_capture_filters_sources() {
        let store = Arc::new(MacroStore::new());
        let hook = MacroCaptureHook::new(store.clone());
        store.start_record('a').unwrap();
        let ok = ActionResult::ok();
        hook.post(&Action::new("cursor.moveDown"), &ok, &mut scratch());
        hook.post(
            &Action::new("cursor.moveDown").with_source(ActionSource::Macro),
            &ok,
            &mut scratch(),
        );
        hook.post(&Action::new("macro.stopRecord"), &ok, &mut scratch());
        let (_, len) = store.stop_record().unwrap();
        assert_eq!(len, 1, "only the keyboard-sourced action records");
    }

    #[test]
    fn context_ring_is_bounded() {
        let hook = ContextRingHook::new(3);
        let ok = ActionResult::ok();
        for i in 0..5 {
            hook.post(&Action::new(format!("cursor.move{i}")), &ok, &mut scratch());
        }
        let recent = hook.recent();
        assert_eq!(recent.len(), 3);
        assert!(recent[0].starts_with("cursor.move2"));
    }

    #[test]
    fn timing_hook_round_trips_scratch() {
        let hook = TimingHook;
        let mut s = scratch();
        hook.pre(&Action::new("cursor.moveDown"), &mut s);
        assert!(s.contains_key("_timing_start"));
        hook.post(&Action::new("cursor.moveDown"), &ActionResult::ok(), &mut s);
    }
}
