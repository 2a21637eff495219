//! Dispatch results and the error taxonomy.

use core_events::Action;
use core_state::{ModeId, RegisterContent};
use core_text::{Edit, EngineError};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NoOp,
    Error,
}

/// Redraw hint for the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Redraw {
    #[default]
    None,
    Lines(BTreeSet<usize>),
    All,
}

impl Redraw {
    pub fn line(line: usize) -> Self {
        Redraw::Lines(BTreeSet::from([line]))
    }

    pub fn lines(lines: impl IntoIterator<Item = usize>) -> Self {
        let set: BTreeSet<usize> = lines.into_iter().collect();
        if set.is_empty() {
            Redraw::None
        } else {
            Redraw::Lines(set)
        }
    }

    pub fn merge(self, other: Redraw) -> Redraw {
        match (self, other) {
            (Redraw::All, _) | (_, Redraw::All) => Redraw::All,
            (Redraw::None, r) | (r, Redraw::None) => r,
            (Redraw::Lines(mut a), Redraw::Lines(b)) => {
                a.extend(b);
                Redraw::Lines(a)
            }
        }
    }
}

/// Every failure kind a dispatch can surface. No variant is ever retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("handler panic while executing `{0}`")]
    HandlerPanic(String),
}

/// Outcome of dispatching one action.
#[derive(Debug)]
pub struct ActionResult {
    pub status: Status,
    pub error: Option<DispatchError>,
    pub message: Option<String>,
    pub mode_change: Option<ModeId>,
    pub redraw: Redraw,
    pub register_content: Option<RegisterContent>,
    /// Mirror of `register_content.linewise` for consumers that only care
    /// about the flag.
    pub linewise: bool,
    /// Change records for post-hooks that reconstruct what happened.
    pub edits: Vec<Edit>,
    pub data: HashMap<String, Value>,
    /// Actions for the host to feed back through dispatch (macro replay).
    pub follow_up: Vec<Action>,
}

impl ActionResult {
    fn with_status(status: Status) -> Self {
        Self {
            status,
            error: None,
            message: None,
            mode_change: None,
            redraw: Redraw::None,
            register_content: None,
            linewise: false,
            edits: Vec::new(),
            data: HashMap::new(),
            follow_up: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::with_status(Status::Ok)
    }

    pub fn noop() -> Self {
        Self::with_status(Status::NoOp)
    }

    pub fn noop_with_message(message: impl Into<String>) -> Self {
        let mut r = Self::noop();
        r.message = Some(message.into());
        r
    }

    pub fn error(error: DispatchError) -> Self {
        let mut r = Self::with_status(Status::Error);
        r.message = Some(error.to_string());
        r.error = Some(error);
        r
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    pub fn with_redraw(mut self, redraw: Redraw) -> Self {
        self.redraw = self.redraw.merge(redraw);
        self
    }

    pub fn with_mode_change(mut self, mode: ModeId) -> Self {
        self.mode_change = Some(mode);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_register_content(mut self, content: RegisterContent) -> Self {
        self.linewise = content.linewise;
        self.register_content = Some(content);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn with_follow_up(mut self, actions: Vec<Action>) -> Self {
        self.follow_up = actions;
        self
    }
}

/// Redraw hint for a set of applied edits: any structural edit escalates to
/// `All`, otherwise the union of the given line numbers.
pub fn redraw_for(edits: &[Edit], lines: impl IntoIterator<Item = usize>) -> Redraw {
    if edits.iter().any(Edit::is_structural) {
        Redraw::All
    } else {
        Redraw::lines(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redraw_merging() {
        let a = Redraw::line(1).merge(Redraw::line(3));
        assert_eq!(a, Redraw::lines([1, 3]));
        assert_eq!(Redraw::line(1).merge(Redraw::All), Redraw::All);
        assert_eq!(Redraw::None.merge(Redraw::line(2)), Redraw::line(2));
        assert_eq!(Redraw::lines(Vec::<usize>::new()), Redraw::None);
    }

    #[test]
    fn error_result_carries_message() {
        let r = ActionResult::error(DispatchError::UnknownAction("x.y".into()));
        assert_eq!(r.status, Status::Error);
        assert!(r.message.as_deref().unwrap().contains("x.y"));
    }

    #[test]
    fn structural_edit_escalates_redraw() {
        let edits = vec![Edit::insertion(0, "a\nb")];
        assert_eq!(redraw_for(&edits, [0]), Redraw::All);
        let edits = vec![Edit::insertion(0, "ab")];
        assert_eq!(redraw_for(&edits, [0]), Redraw::line(0));
    }

    #[test]
    fn register_content_sets_linewise_mirror() {
        let r = ActionResult::ok().with_register_content(RegisterContent::linewise("x\n"));
        assert!(r.linewise);
    }
}
