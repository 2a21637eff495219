//! Command palette: named entries, subsequence filtering, command-line
//! parsing, and execution history.
//!
//! The palette is a front door, not a handler: it turns a command line (the
//! text typed after `:`) or a picked entry into an `Action` with
//! `source = Palette` for the host to dispatch.

use crate::result::DispatchError;
use core_events::{Action, ActionArgs, ActionSource, is_valid_action_name};
use std::collections::VecDeque;
use std::sync::{Mutex, RwLock};

const HISTORY_CAP: usize = 50;

#[derive(Debug, Clone)]
pub struct PaletteEntry {
    /// Action name the entry dispatches.
    pub action: String,
    /// Human-facing title shown in the picker.
    pub title: String,
}

#[derive(Default)]
pub struct CommandPalette {
    entries: RwLock<Vec<PaletteEntry>>,
    history: Mutex<VecDeque<String>>,
}

/// Subsequence match score: lower is better, `None` when the query is not a
/// subsequence. Contiguous matches beat scattered ones.
fn subsequence_score(query: &str, candidate: &str) -> Option<usize> {
    if query.is_empty() {
        return Some(usize::MAX);
    }
    let candidate_lower = candidate.to_lowercase();
    let mut score = 0usize;
    let mut pos = 0usize;
    for qc in query.to_lowercase().chars() {
        let rest = &candidate_lower[pos..];
        let found = rest.char_indices().find(|(_, c)| *c == qc)?;
        score += found.0;
        pos += found.0 + qc.len_utf8();
    }
    Some(score)
}

impl CommandPalette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Palette with entries for the core action families.
    pub fn with_defaults() -> Self {
        let palette = Self::new();
        for (action, title) in [
            ("file.open", "File: Open"),
            ("file.save", "File: Save"),
            ("file.saveAs", "File: Save As"),
            ("editor.undo", "Edit: Undo"),
            ("editor.redo", "Edit: Redo"),
            ("editor.indent", "Edit: Indent Lines"),
            ("editor.outdent", "Edit: Outdent Lines"),
            ("editor.autoIndent", "Edit: Auto-Indent Lines"),
            ("search.forward", "Search: Forward"),
            ("search.backward", "Search: Backward"),
            ("cursor.addBelow", "Cursors: Add Below"),
            ("cursor.addAbove", "Cursors: Add Above"),
            ("cursor.collapse", "Cursors: Collapse To Primary"),
            ("macro.playLast", "Macro: Replay Last"),
        ] {
            palette.register(PaletteEntry {
                action: action.to_string(),
                title: title.to_string(),
            });
        }
        palette
    }

    pub fn register(&self, entry: PaletteEntry) {
        self.entries.write().expect("palette entries poisoned").push(entry);
    }

    pub fn entries(&self) -> Vec<PaletteEntry> {
        self.entries.read().expect("palette entries poisoned").clone()
    }

    /// Filter entries by subsequence match over title and action name,
    /// best matches first.
    pub fn filter(&self, query: &str) -> Vec<PaletteEntry> {
        let entries = self.entries();
        let mut scored: Vec<(usize, PaletteEntry)> = entries
            .into_iter()
            .filter_map(|e| {
                let best = subsequence_score(query, &e.title)
                    .into_iter()
                    .chain(subsequence_score(query, &e.action))
                    .min()?;
                Some((best, e))
            })
            .collect();
        scored.sort_by_key(|(score, _)| *score);
        scored.into_iter().map(|(_, e)| e).collect()
    }

    /// Parse a `:`-command line into a dispatchable action. Short forms
    /// cover the common file verbs; anything shaped like `namespace.verb`
    /// passes through with the remainder as its text argument.
    pub fn parse_command_line(&self, line: &str) -> Result<Action, DispatchError> {
        let line = line.trim().trim_start_matches(':').trim();
        if line.is_empty() {
            return Err(DispatchError::Validation("empty command".to_string()));
        }
        self.note_history(line);
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((h, r)) => (h, r.trim()),
            None => (line, ""),
        };
        let (name, arg): (&str, &str) = match head {
            "w" | "write" => ("file.save", rest),
            "e" | "edit" | "o" | "open" => ("file.open", rest),
            "saveas" => ("file.saveAs", rest),
            "u" | "undo" => ("editor.undo", ""),
            "redo" => ("editor.redo", ""),
            "search" => ("search.forward", rest),
            name if is_valid_action_name(name) => (name, rest),
            other => {
                return Err(DispatchError::Validation(format!(
                    "unknown command `{other}`"
                )));
            }
        };
        let mut args = ActionArgs::default();
        if !arg.is_empty() {
            args.text = Some(arg.to_string());
        }
        Ok(Action::new(name)
            .with_args(args)
            .with_source(ActionSource::Palette))
    }

    /// Build the action for a picked entry.
    pub fn run(&self, entry: &PaletteEntry) -> Action {
        self.note_history(&entry.action);
        Action::new(entry.action.clone()).with_source(ActionSource::Palette)
    }

    fn note_history(&self, line: &str) {
        let mut history = self.history.lock().expect("palette history poisoned");
        if history.len() == HISTORY_CAP {
            history.pop_front();
        }
        history.push_back(line.to_string());
    }

    /// Recent command lines, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .expect("palette history poisoned")
            .iter()
            .cloned()
            .collect()
    }
}
