//! Keystorm: the input-to-edit pipeline of a modal text editor.
//!
//! [`Editor`] wires the whole core together: configuration → rope engine →
//! session stores → dispatcher (handlers + hook chain) → keymap → input
//! front-end. Keystrokes go in through [`Editor::feed_key`]; durable,
//! undoable edits and redraw hints come out as [`ActionResult`]s.
//!
//! ```
//! use keystorm::Editor;
//!
//! let mut editor = Editor::new("");
//! editor.feed_keys("i h i <Esc>").unwrap();
//! assert_eq!(editor.text(), "hi");
//! ```

mod worker;

pub use core_actions::{ActionResult, DispatchError, Dispatcher, Redraw, Status};
pub use core_config::EditorConfig;
pub use core_events::{Action, ActionArgs, ActionChannel, KeyEvent, Motion, TextObject};
pub use core_input::{InputFrontEnd, InputService};
pub use core_model::EditorModel;
pub use core_state::ModeId;
pub use worker::spawn_dispatch_worker;

use core_actions::{CommandPalette, DefaultHandles, FsFileStore, register_defaults};
use core_events::{ActionSource, parse_sequence};
use core_keymap::default_keymap;
use core_text::BufferEngine;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Bound on the follow-up feed loop (macro replay, dot repeat). A runaway
/// nested expansion stops here instead of spinning.
const FOLLOW_UP_BUDGET: usize = 10_000;

pub struct Editor {
    model: EditorModel,
    dispatcher: Arc<Dispatcher>,
    front_end: Arc<InputFrontEnd>,
    palette: Arc<CommandPalette>,
    handles: DefaultHandles,
}

impl Editor {
    pub fn new(text: &str) -> Self {
        Self::with_config(text, EditorConfig::default())
    }

    pub fn with_config(text: &str, config: EditorConfig) -> Self {
        let model = EditorModel::with_config(text, config.clone());
        let dispatcher = Arc::new(Dispatcher::new());
        let handles = register_defaults(
            &dispatcher,
            &config,
            model.macros.clone(),
            Arc::new(FsFileStore),
        );
        let front_end = Arc::new(InputFrontEnd::new(
            default_keymap(),
            Duration::from_millis(config.input.sequence_timeout_ms),
        ));
        let editor = Self {
            model,
            dispatcher,
            front_end,
            palette: Arc::new(CommandPalette::with_defaults()),
            handles,
        };
        editor.sync_front_end();
        editor
    }

    /// Feed one key event; returns the results of every action it resolved
    /// into (usually zero or one).
    pub fn feed_key(&mut self, event: KeyEvent) -> Vec<ActionResult> {
        let outcome = self.front_end.handle_key(event);
        let results = outcome
            .actions
            .into_iter()
            .map(|a| self.dispatch(a))
            .collect();
        self.sync_front_end();
        results
    }

    /// Feed a wire-syntax key sequence (`"d i w"`, `"<C-x>"`).
    pub fn feed_keys(&mut self, keys: &str) -> anyhow::Result<Vec<ActionResult>> {
        let mut results = Vec::new();
        for ev in parse_sequence(keys)? {
            results.extend(self.feed_key(ev));
        }
        Ok(results)
    }

    /// Resolve an expired sequence timer (synchronous hosts drive this
    /// themselves; the async service does it automatically).
    pub fn on_sequence_timeout(&mut self, generation: u64) -> Vec<ActionResult> {
        let outcome = self.front_end.on_timeout(generation);
        let results = outcome
            .actions
            .into_iter()
            .map(|a| self.dispatch(a))
            .collect();
        self.sync_front_end();
        results
    }

    /// Dispatch one action, running the follow-up feed loop for macro
    /// replay and dot-repeat expansions.
    pub fn dispatch(&mut self, action: Action) -> ActionResult {
        if action.name == "palette.run" {
            return self.run_command_line(action);
        }
        let mut result = self.dispatcher.dispatch(&action, &mut self.model);
        let mut queue: VecDeque<Action> = result.follow_up.drain(..).collect();
        let mut budget = FOLLOW_UP_BUDGET;
        while let Some(next) = queue.pop_front() {
            if budget == 0 {
                warn!(target: "keystorm", "follow-up budget exhausted, dropping remaining actions");
                break;
            }
            budget -= 1;
            let mut r = self.dispatcher.dispatch(&next, &mut self.model);
            // Nested expansions run depth-first, in place.
            for f in r.follow_up.drain(..).rev() {
                queue.push_front(f);
            }
        }
        self.sync_front_end();
        result
    }

    fn run_command_line(&mut self, action: Action) -> ActionResult {
        let line = action.args.text.unwrap_or_default();
        let parsed = match self.palette.parse_command_line(&line) {
            Ok(parsed) if parsed.name != "palette.run" => parsed,
            Ok(_) => {
                return ActionResult::error(DispatchError::Validation(
                    "palette.run cannot recurse".to_string(),
                ));
            }
            Err(e) => {
                self.model.modes.switch_to(ModeId::Normal);
                self.sync_front_end();
                return ActionResult::error(e);
            }
        };
        let result = self.dispatch(parsed);
        // The command line is done either way; drop back to normal.
        self.model.modes.switch_to(ModeId::Normal);
        self.sync_front_end();
        result
    }

    /// Re-dispatch the last captured repeatable action (`.`).
    pub fn repeat_last(&mut self) -> ActionResult {
        match self.handles.repeat.last() {
            Some(entry) => self.dispatch(entry.action.with_source(ActionSource::Repeat)),
            None => ActionResult::noop_with_message("nothing to repeat"),
        }
    }

    /// Play a recorded macro.
    pub fn play_macro(&mut self, register: char, count: i32) -> ActionResult {
        let action = Action::new("macro.play")
            .with_register(register)
            .with_count(count);
        self.dispatch(action)
    }

    fn sync_front_end(&self) {
        self.front_end.sync(
            self.model.modes.current(),
            self.model.macros.recording().is_some(),
            self.model.engine().is_read_only(),
        );
    }

    pub fn text(&self) -> String {
        self.model.text()
    }

    pub fn mode(&self) -> ModeId {
        self.model.modes.current()
    }

    pub fn model(&self) -> &EditorModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut EditorModel {
        &mut self.model
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn front_end(&self) -> &Arc<InputFrontEnd> {
        &self.front_end
    }

    pub fn palette(&self) -> &Arc<CommandPalette> {
        &self.palette
    }

    pub fn handles(&self) -> &DefaultHandles {
        &self.handles
    }

    /// Close the pipeline: the front-end stops accepting keys.
    pub fn close(&self) {
        self.front_end.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::Selection;
    use pretty_assertions::assert_eq;

    #[test]
    fn doc_example_flow() {
        let mut ed = Editor::new("");
        ed.feed_keys("i h i <Esc>").unwrap();
        assert_eq!(ed.text(), "hi");
        assert_eq!(ed.mode(), ModeId::Normal);
    }

    #[test]
    fn dot_repeat_via_keys() {
        let mut ed = Editor::new("aaaa");
        ed.feed_keys("x").unwrap();
        assert_eq!(ed.text(), "aaa");
        ed.feed_keys(".").unwrap();
        assert_eq!(ed.text(), "aa");
    }

    #[test]
    fn command_line_executes_palette_command() {
        let mut ed = Editor::new("needle in haystack");
        ed.model_mut()
            .cursors
            .set_all(vec![Selection::cursor(0)])
            .unwrap();
        ed.feed_keys(": s e a r c h <Space> h a y <CR>").unwrap();
        assert_eq!(ed.mode(), ModeId::Normal);
        assert_eq!(ed.model().cursors.primary().head, 10);
    }

    #[test]
    fn bad_command_surfaces_error_and_returns_to_normal() {
        let mut ed = Editor::new("x");
        let results = ed.feed_keys(": z z z <CR>").unwrap();
        let last = results.last().unwrap();
        assert_eq!(last.status, Status::Error);
        assert_eq!(ed.mode(), ModeId::Normal);
    }

    #[test]
    fn closed_editor_ignores_input() {
        let mut ed = Editor::new("abc");
        ed.close();
        let results = ed.feed_keys("x").unwrap();
        assert!(results.is_empty());
        assert_eq!(ed.text(), "abc");
    }
}
