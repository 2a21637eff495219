//! Built-in handler families and their registration.
//!
//! One namespace handler per action family; each matches its verb table in
//! `can_handle` and multiplexes in `handle`. `register_defaults` wires the
//! whole set plus the standard hook chain onto a dispatcher and returns the
//! handles a host needs afterwards (repeat slot, macro playback sink,
//! context ring).

pub(crate) mod cursor;
pub(crate) mod delete;
pub mod file;
pub(crate) mod indent;
pub(crate) mod insert;
pub(crate) mod macros;
pub(crate) mod mode;
pub(crate) mod operator;
pub(crate) mod search;
pub(crate) mod undo;
pub(crate) mod util;
pub(crate) mod yank_paste;

use crate::context::ExecutionContext;
use crate::dispatcher::{Dispatcher, Handler};
use crate::hooks::{
    ContextRingHook, CountLimitHook, MacroCaptureHook, RateLimitHook, ReadOnlyGuardHook,
    RepeatHook, TimingHook,
};
use crate::result::{ActionResult, DispatchError};
use core_config::EditorConfig;
use core_events::{Action, ActionSource, split_action_name};
use core_state::MacroStore;
use file::FileStore;
pub use macros::MacroPlayback;
use std::sync::Arc;

fn verb_of(name: &str) -> &str {
    split_action_name(name).map(|(_, v)| v).unwrap_or("")
}

const EDITOR_VERBS: &[&str] = &[
    "insertText",
    "insertChar",
    "insertNewline",
    "insertLineAbove",
    "insertLineBelow",
    "insertTab",
    "replaceChar",
    "deleteChar",
    "deleteCharBack",
    "deleteLine",
    "deleteToEnd",
    "deleteSelection",
    "deleteWord",
    "deleteWordBack",
    "yankSelection",
    "yankLine",
    "yankToEnd",
    "yankWord",
    "pasteAfter",
    "pasteBefore",
    "indent",
    "outdent",
    "autoIndent",
    "undo",
    "redo",
];

struct EditorHandler;

impl Handler for EditorHandler {
    fn can_handle(&self, name: &str) -> bool {
        EDITOR_VERBS.contains(&verb_of(name))
    }

    fn handle(&self, action: &Action, ctx: &mut ExecutionContext<'_>) -> ActionResult {
        let count = action.effective_count();
        let register = action.args.register;
        let text = action.args.text.as_deref();
        match verb_of(&action.name) {
            "insertText" => match text {
                Some(t) => insert::insert_text(ctx, t),
                None => missing_text(&action.name),
            },
            "insertChar" => match text {
                Some(t) => insert::insert_char(ctx, t),
                None => missing_text(&action.name),
            },
            "insertNewline" => insert::insert_newline(ctx),
            "insertLineAbove" => insert::insert_line_above(ctx),
            "insertLineBelow" => insert::insert_line_below(ctx),
            "insertTab" => insert::insert_tab(ctx),
            "replaceChar" => match text {
                Some(t) => insert::replace_char(ctx, t, count),
                None => missing_text(&action.name),
            },
            "deleteChar" => delete::delete_char(ctx, count, register),
            "deleteCharBack" => delete::delete_char_back(ctx, count, register),
            "deleteLine" => delete::delete_line(ctx, count, register),
            "deleteToEnd" => delete::delete_to_end(ctx, register),
            "deleteSelection" => delete::delete_selection(ctx, register),
            "deleteWord" => delete::delete_word(ctx, count, register),
            "deleteWordBack" => delete::delete_word_back(ctx, count, register),
            "yankSelection" => yank_paste::yank_selection(ctx, register),
            "yankLine" => yank_paste::yank_line(ctx, count, register),
            "yankToEnd" => yank_paste::yank_to_end(ctx, register),
            "yankWord" => yank_paste::yank_word(ctx, count, register),
            "pasteAfter" | "pasteBefore" => {
                // Blockwise paste semantics are host-defined and rejected
                // here.
                if action.args.extra.contains_key("block") {
                    return ActionResult::error(DispatchError::Validation(
                        "blockwise paste is not supported".to_string(),
                    ));
                }
                let after = verb_of(&action.name) == "pasteAfter";
                yank_paste::paste(ctx, text, register, count, after)
            }
            "indent" => {
                let lines = indent::selection_lines(ctx);
                indent::indent_lines(ctx, &lines, count)
            }
            "outdent" => {
                let lines = indent::selection_lines(ctx);
                indent::outdent_lines(ctx, &lines, count)
            }
            "autoIndent" => {
                let lines = indent::selection_lines(ctx);
                indent::auto_indent(ctx, &lines)
            }
            "undo" => undo::undo(ctx, count),
            "redo" => undo::redo(ctx, count),
            other => ActionResult::error(DispatchError::UnknownAction(format!("editor.{other}"))),
        }
    }
}

fn missing_text(name: &str) -> ActionResult {
    ActionResult::error(DispatchError::Validation(format!(
        "{name} requires a text argument"
    )))
}

struct OperatorHandler;

impl Handler for OperatorHandler {
    fn can_handle(&self, name: &str) -> bool {
        matches!(
            verb_of(name),
            "delete"
                | "change"
                | "yank"
                | "indent"
                | "outdent"
                | "lowercase"
                | "uppercase"
                | "toggleCase"
                | "format"
                | "motion"
                | "textObject"
        )
    }

    fn handle(&self, action: &Action, ctx: &mut ExecutionContext<'_>) -> ActionResult {
        operator::apply(ctx, verb_of(&action.name), action)
    }
}

struct CursorHandler {
    state: cursor::CursorState,
}

impl Handler for CursorHandler {
    fn can_handle(&self, name: &str) -> bool {
        cursor::VERBS.contains(&verb_of(name))
    }

    fn handle(&self, action: &Action, ctx: &mut ExecutionContext<'_>) -> ActionResult {
        cursor::handle(ctx, &self.state, verb_of(&action.name))
    }
}

struct ModeHandler;

impl Handler for ModeHandler {
    fn can_handle(&self, name: &str) -> bool {
        mode::VERBS.contains(&verb_of(name))
    }

    fn handle(&self, action: &Action, ctx: &mut ExecutionContext<'_>) -> ActionResult {
        mode::handle(ctx, verb_of(&action.name))
    }
}

struct MacroHandler {
    playback: Arc<MacroPlayback>,
}

impl Handler for MacroHandler {
    fn can_handle(&self, name: &str) -> bool {
        macros::VERBS.contains(&verb_of(name))
    }

    fn handle(&self, action: &Action, ctx: &mut ExecutionContext<'_>) -> ActionResult {
        macros::handle(ctx, &self.playback, verb_of(&action.name), action)
    }
}

struct FileHandler {
    store: Arc<dyn FileStore>,
}

impl Handler for FileHandler {
    fn can_handle(&self, name: &str) -> bool {
        file::VERBS.contains(&verb_of(name))
    }

    fn handle(&self, action: &Action, ctx: &mut ExecutionContext<'_>) -> ActionResult {
        file::handle(ctx, self.store.as_ref(), verb_of(&action.name), action)
    }
}

struct SearchHandler {
    state: search::SearchState,
}

impl Handler for SearchHandler {
    fn can_handle(&self, name: &str) -> bool {
        search::VERBS.contains(&verb_of(name))
    }

    fn handle(&self, action: &Action, ctx: &mut ExecutionContext<'_>) -> ActionResult {
        search::handle(ctx, &self.state, verb_of(&action.name), action)
    }
}

/// `editor.repeatLast` (`.`): re-issue the captured action with
/// `source = Repeat` via `follow_up`; handlers never re-enter the
/// dispatcher.
struct RepeatLastHandler {
    hook: Arc<RepeatHook>,
}

impl Handler for RepeatLastHandler {
    fn can_handle(&self, name: &str) -> bool {
        name == "editor.repeatLast"
    }

    fn handle(&self, _action: &Action, _ctx: &mut ExecutionContext<'_>) -> ActionResult {
        match self.hook.last() {
            Some(entry) => {
                let replay = entry.action.with_source(ActionSource::Repeat);
                ActionResult::ok().with_follow_up(vec![replay])
            }
            None => ActionResult::noop_with_message("nothing to repeat"),
        }
    }
}

/// Handles a host needs after wiring the defaults.
pub struct DefaultHandles {
    pub repeat: Arc<RepeatHook>,
    pub playback: Arc<MacroPlayback>,
    pub context_ring: Arc<ContextRingHook>,
}

/// Register every built-in handler family and the standard hook chain.
pub fn register_defaults(
    dispatcher: &Dispatcher,
    config: &EditorConfig,
    macro_store: Arc<MacroStore>,
    file_store: Arc<dyn FileStore>,
) -> DefaultHandles {
    let repeat = Arc::new(RepeatHook::new());
    let playback = Arc::new(MacroPlayback::default());
    let context_ring = Arc::new(ContextRingHook::new(64));

    dispatcher.register_hook(Arc::new(TimingHook));
    dispatcher.register_hook(Arc::new(CountLimitHook::new(config.dispatch.max_count)));
    dispatcher.register_hook(Arc::new(RateLimitHook::new(
        config.dispatch.rate_limit_per_sec,
    )));
    dispatcher.register_hook(Arc::new(ReadOnlyGuardHook));
    dispatcher.register_hook(repeat.clone());
    dispatcher.register_hook(Arc::new(MacroCaptureHook::new(macro_store)));
    dispatcher.register_hook(context_ring.clone());

    dispatcher.register_namespace("editor", Arc::new(EditorHandler));
    dispatcher.register_namespace("operator", Arc::new(OperatorHandler));
    dispatcher.register_namespace(
        "cursor",
        Arc::new(CursorHandler {
            state: cursor::CursorState::new(),
        }),
    );
    dispatcher.register_namespace("mode", Arc::new(ModeHandler));
    dispatcher.register_namespace(
        "macro",
        Arc::new(MacroHandler {
            playback: playback.clone(),
        }),
    );
    dispatcher.register_namespace("file", Arc::new(FileHandler { store: file_store }));
    dispatcher.register_namespace(
        "search",
        Arc::new(SearchHandler {
            state: search::SearchState::default(),
        }),
    );
    dispatcher.register_named("editor.repeatLast", Arc::new(RepeatLastHandler {
        hook: repeat.clone(),
    }));

    DefaultHandles {
        repeat,
        playback,
        context_ring,
    }
}
