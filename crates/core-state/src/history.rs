//! Undo history: named, nested edit groups.
//!
//! Handlers bracket engine mutations with `begin_group`/`end_group`; all
//! edits recorded between matching markers form one undoable step. Nested
//! groups fold into their parent, so the outermost bracket defines the step.
//! Edits recorded with no group open become single-edit steps of their own.
//!
//! Undo/redo themselves run with recording suspended so applying inverse
//! edits does not pollute the stream.

use crate::Selection;
use core_text::Edit;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{trace, warn};

/// Maximum number of closed groups retained.
pub const HISTORY_MAX: usize = 200;

#[derive(Debug, Clone)]
pub struct HistoryGroup {
    pub name: String,
    pub edits: Vec<Edit>,
    /// Selections captured when the group was opened; undo restores them.
    pub selections_before: Vec<Selection>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("end_group without a matching begin_group")]
    Unbalanced,
}

struct Inner {
    open: Vec<HistoryGroup>,
    undo: Vec<HistoryGroup>,
    redo: Vec<HistoryGroup>,
    suspended: bool,
}

pub struct History {
    inner: Mutex<Inner>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                open: Vec::new(),
                undo: Vec::new(),
                redo: Vec::new(),
                suspended: false,
            }),
        }
    }

    pub fn begin_group(&self, name: &str, selections_before: Vec<Selection>) {
        let mut inner = self.inner.lock().expect("history lock poisoned");
        if inner.suspended {
            return;
        }
        inner.open.push(HistoryGroup {
            name: name.to_string(),
            edits: Vec::new(),
            selections_before,
        });
        trace!(target: "state.history", group = name, depth = inner.open.len(), "begin_group");
    }

    /// Close the innermost group. A nested group folds its edits into the
    /// parent; the outermost non-empty group commits as one undo step.
    pub fn end_group(&self) -> Result<(), HistoryError> {
        let mut inner = self.inner.lock().expect("history lock poisoned");
        if inner.suspended {
            return Ok(());
        }
        let group = inner.open.pop().ok_or(HistoryError::Unbalanced)?;
        trace!(target: "state.history", group = %group.name, depth = inner.open.len(), edits = group.edits.len(), "end_group");
        if let Some(parent) = inner.open.last_mut() {
            parent.edits.extend(group.edits);
            return Ok(());
        }
        if !group.edits.is_empty() {
            commit(&mut inner, group);
        }
        Ok(())
    }

    /// Append an edit to the innermost open group, or commit it as its own
    /// step when nothing is open.
    pub fn record_edit(&self, edit: Edit) {
        let mut inner = self.inner.lock().expect("history lock poisoned");
        if inner.suspended {
            return;
        }
        match inner.open.last_mut() {
            Some(group) => group.edits.push(edit),
            None => {
                let group = HistoryGroup {
                    name: "edit".to_string(),
                    edits: vec![edit],
                    selections_before: Vec::new(),
                };
                commit(&mut inner, group);
            }
        }
    }

    pub fn open_depth(&self) -> usize {
        self.inner.lock().expect("history lock poisoned").open.len()
    }

    /// Commit any still-open groups (panic recovery path). Returns how many
    /// were force-closed.
    pub fn force_close_all(&self) -> usize {
        let mut inner = self.inner.lock().expect("history lock poisoned");
        let n = inner.open.len();
        if n == 0 {
            return 0;
        }
        warn!(target: "state.history", open = n, "force-closing unbalanced history groups");
        let mut open = std::mem::take(&mut inner.open);
        let mut root = open.remove(0);
        for g in open {
            root.edits.extend(g.edits);
        }
        if !root.edits.is_empty() {
            commit(&mut inner, root);
        }
        n
    }

    /// While suspended, begin/end/record are no-ops (undo application path).
    pub fn set_suspended(&self, suspended: bool) {
        self.inner.lock().expect("history lock poisoned").suspended = suspended;
    }

    pub fn take_undo(&self) -> Option<HistoryGroup> {
        self.inner.lock().expect("history lock poisoned").undo.pop()
    }

    pub fn take_redo(&self) -> Option<HistoryGroup> {
        self.inner.lock().expect("history lock poisoned").redo.pop()
    }

    /// Re-stack a group popped by undo so redo can replay it.
    pub fn push_redo(&self, group: HistoryGroup) {
        self.inner.lock().expect("history lock poisoned").redo.push(group);
    }

    /// Re-stack a group popped by redo (does not clear redo).
    pub fn push_undo(&self, group: HistoryGroup) {
        self.inner.lock().expect("history lock poisoned").undo.push(group);
    }

    pub fn undo_depth(&self) -> usize {
        self.inner.lock().expect("history lock poisoned").undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.inner.lock().expect("history lock poisoned").redo.len()
    }
}

fn commit(inner: &mut Inner, group: HistoryGroup) {
    trace!(target: "state.history", group = %group.name, edits = group.edits.len(), undo_depth = inner.undo.len() + 1, "commit");
    inner.undo.push(group);
    if inner.undo.len() > HISTORY_MAX {
        inner.undo.remove(0);
        trace!(target: "state.history", "undo stack trimmed");
    }
    if !inner.redo.is_empty() {
        inner.redo.clear();
        trace!(target: "state.history", "redo cleared on new edit");
    }
}
