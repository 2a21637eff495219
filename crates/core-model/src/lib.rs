//! `EditorModel`: the aggregate the dispatcher operates on.
//!
//! One model owns the buffer engine plus every session store (cursors,
//! modes, registers, macros, history) and the effective configuration. The
//! stores carry their own interior locks, so a split borrow hands the
//! dispatcher exclusive engine access alongside shared store handles without
//! any pointer games.
//!
//! Invariants (hold after every public call):
//! * the cursor set is never empty;
//! * every selection endpoint is a rune boundary of the current engine
//!   content ([`EditorModel::validate_selections`] checks this, tests and
//!   the dispatcher's debug path rely on it).

use core_config::EditorConfig;
use core_state::{CursorSet, History, MacroStore, ModeManager, RegisterStore};
use core_text::{BufferEngine, EngineReader, TextEngine};
use std::path::PathBuf;
use std::sync::Arc;

pub struct EditorModel {
    engine: Box<dyn BufferEngine>,
    pub cursors: CursorSet,
    pub modes: ModeManager,
    pub history: History,
    pub registers: RegisterStore,
    /// Shared so the macro-capture hook can record without borrowing the
    /// model.
    pub macros: Arc<MacroStore>,
    pub config: EditorConfig,
    pub file_path: Option<PathBuf>,
}

/// Disjoint borrows of one model, scoped to a single dispatch.
pub struct ModelParts<'a> {
    pub engine: &'a mut dyn BufferEngine,
    pub cursors: &'a CursorSet,
    pub modes: &'a ModeManager,
    pub history: &'a History,
    pub registers: &'a RegisterStore,
    pub macros: &'a MacroStore,
    pub config: &'a EditorConfig,
    pub file_path: Option<&'a PathBuf>,
}

impl EditorModel {
    pub fn new(engine: Box<dyn BufferEngine>, config: EditorConfig) -> Self {
        Self {
            engine,
            cursors: CursorSet::new(),
            modes: ModeManager::new(),
            history: History::new(),
            registers: RegisterStore::new(),
            macros: Arc::new(MacroStore::new()),
            config,
            file_path: None,
        }
    }

    /// Rope-backed model with default configuration.
    pub fn from_text(text: &str) -> Self {
        Self::new(Box::new(TextEngine::new(text)), EditorConfig::default())
    }

    pub fn with_config(text: &str, config: EditorConfig) -> Self {
        Self::new(Box::new(TextEngine::new(text)), config)
    }

    pub fn engine(&self) -> &dyn BufferEngine {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> &mut dyn BufferEngine {
        self.engine.as_mut()
    }

    pub fn split(&mut self) -> ModelParts<'_> {
        ModelParts {
            engine: self.engine.as_mut(),
            cursors: &self.cursors,
            modes: &self.modes,
            history: &self.history,
            registers: &self.registers,
            macros: self.macros.as_ref(),
            config: &self.config,
            file_path: self.file_path.as_ref(),
        }
    }

    /// Full buffer content (test/diagnostic convenience).
    pub fn text(&self) -> String {
        self.engine.text()
    }

    /// Check the selection invariants against the current content.
    pub fn validate_selections(&self) -> Result<(), String> {
        let sels = self.cursors.all();
        if sels.is_empty() {
            return Err("cursor set is empty".to_string());
        }
        for (i, sel) in sels.iter().enumerate() {
            for offset in [sel.anchor, sel.head] {
                self.engine
                    .offset_to_point(offset)
                    .map_err(|e| format!("selection {i} offset {offset}: {e}"))?;
            }
        }
        for pair in sels.windows(2) {
            if pair[1].start() < pair[0].end() {
                return Err(format!(
                    "selections overlap: {:?} and {:?}",
                    pair[0], pair[1]
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::Selection;

    #[test]
    fn from_text_seeds_single_cursor() {
        let model = EditorModel::from_text("hello");
        assert_eq!(model.cursors.count(), 1);
        assert_eq!(model.cursors.primary(), Selection::cursor(0));
        assert_eq!(model.text(), "hello");
        model.validate_selections().unwrap();
    }

    #[test]
    fn split_borrow_allows_engine_mutation() {
        let mut model = EditorModel::from_text("ab");
        {
            let parts = model.split();
            parts.engine.insert(0, "x").unwrap();
            parts.cursors.set_all(vec![Selection::cursor(1)]).unwrap();
        }
        assert_eq!(model.text(), "xab");
        assert_eq!(model.cursors.primary(), Selection::cursor(1));
    }

    #[test]
    fn validation_catches_mid_rune_cursor() {
        let model = EditorModel::from_text("aé");
        model.cursors.set_all(vec![Selection::cursor(2)]).unwrap(); // inside 'é'
        assert!(model.validate_selections().is_err());
    }
}
