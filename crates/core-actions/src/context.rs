//! The per-dispatch execution context.
//!
//! Short-lived: the dispatcher builds one from the model's split borrow,
//! hands it to exactly one handler, then tears it down. The mutation helpers
//! (`insert`/`delete_range`/`replace_range`) are the only way handlers
//! should touch the engine; they record each change into history and into
//! the context's edit list in the same step, which is what keeps undo
//! balance and result reconstruction honest.

use crate::result::DispatchError;
use core_config::EditorConfig;
use core_model::ModelParts;
use core_state::{CursorSet, EditDelta, History, MacroStore, ModeManager, RegisterStore};
use core_text::{BufferEngine, Edit, EditResult, EngineReader};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct ExecutionContext<'a> {
    pub engine: &'a mut dyn BufferEngine,
    pub cursors: &'a CursorSet,
    pub modes: &'a ModeManager,
    pub history: &'a History,
    pub registers: &'a RegisterStore,
    pub macros: &'a MacroStore,
    pub config: &'a EditorConfig,
    /// Count carried by the dispatched action (0 = unset).
    pub count: i32,
    pub file_path: Option<PathBuf>,
    /// Per-dispatch scratch data; keys prefixed `_` are reserved for
    /// infrastructure hooks (`_timing_start`, `_read_only`).
    pub scratch: HashMap<String, Value>,
    edits: Vec<Edit>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(parts: ModelParts<'a>, count: i32, scratch: HashMap<String, Value>) -> Self {
        Self {
            engine: parts.engine,
            cursors: parts.cursors,
            modes: parts.modes,
            history: parts.history,
            registers: parts.registers,
            macros: parts.macros,
            config: parts.config,
            count,
            file_path: parts.file_path.cloned(),
            scratch,
            edits: Vec::new(),
        }
    }

    /// Effective repetition count (floors at 1).
    pub fn effective_count(&self) -> usize {
        self.count.max(1) as usize
    }

    pub fn require_editable(&self) -> Result<(), DispatchError> {
        if self.engine.is_read_only() {
            Err(DispatchError::Engine(core_text::EngineError::ReadOnly))
        } else {
            Ok(())
        }
    }

    /// Insert text, recording the edit.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<EditResult, DispatchError> {
        let res = self.engine.insert(offset, text)?;
        self.record(Edit::insertion(offset, text));
        Ok(res)
    }

    /// Delete a range, recording the edit; returns the removed text.
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<String, DispatchError> {
        let old = self.engine.text_range(start, end)?;
        self.engine.delete(start, end)?;
        self.record(Edit::deletion(start.min(end), old.clone()));
        Ok(old)
    }

    /// Replace a range, recording the edit; returns the replaced text.
    pub fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<String, DispatchError> {
        let old = self.engine.text_range(start, end)?;
        self.engine.replace(start, end, text)?;
        self.record(Edit {
            start: start.min(end),
            old_text: old.clone(),
            new_text: text.to_string(),
        });
        Ok(old)
    }

    fn record(&mut self, edit: Edit) {
        self.history.record_edit(edit.clone());
        self.edits.push(edit);
    }

    /// Open a history group named after the handler, snapshotting cursors.
    pub fn begin_group(&self, name: &str) {
        self.history.begin_group(name, self.cursors.all());
    }

    pub fn end_group(&self) {
        if self.history.end_group().is_err() {
            tracing::warn!(target: "actions.context", "end_group without open group");
        }
    }

    /// Deltas of every edit applied so far, in application order.
    pub fn deltas(&self) -> Vec<EditDelta> {
        self.edits.iter().map(EditDelta::of).collect()
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn take_edits(&mut self) -> Vec<Edit> {
        std::mem::take(&mut self.edits)
    }

    /// Record an edit applied outside the helpers (undo/redo path, which
    /// runs with history suspended but still reports its edits).
    pub fn note_external_edit(&mut self, edit: Edit) {
        self.edits.push(edit);
    }
}
