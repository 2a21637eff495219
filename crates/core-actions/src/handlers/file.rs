//! `file.*` handlers: a thin translation onto a host-provided store.
//!
//! The core never touches the filesystem directly; hosts inject a
//! [`FileStore`] (the bundled [`FsFileStore`] wraps `std::fs`). Opening a
//! buffer replaces the engine content wholesale and resets cursors; the new
//! path travels back to the model through the result's `file_path` datum.

use crate::context::ExecutionContext;
use crate::result::{ActionResult, DispatchError, Redraw};
use core_events::Action;
use core_state::Selection;
use core_text::{BufferEngine, EngineReader};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};

pub trait FileStore: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<String>;
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;
}

/// `std::fs`-backed store.
pub struct FsFileStore;

impl FileStore for FsFileStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }
}

pub(crate) const VERBS: &[&str] = &["open", "save", "saveAs"];

pub(crate) fn handle(
    ctx: &mut ExecutionContext<'_>,
    store: &dyn FileStore,
    verb: &str,
    action: &Action,
) -> ActionResult {
    match verb {
        "open" => open(ctx, store, action),
        "save" => save(ctx, store, action, false),
        "saveAs" => save(ctx, store, action, true),
        other => ActionResult::error(DispatchError::UnknownAction(format!("file.{other}"))),
    }
}

fn arg_path(action: &Action) -> Option<PathBuf> {
    action
        .args
        .text
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(PathBuf::from)
}

fn open(ctx: &mut ExecutionContext<'_>, store: &dyn FileStore, action: &Action) -> ActionResult {
    let Some(path) = arg_path(action) else {
        return ActionResult::error(DispatchError::Validation(
            "file.open requires a path argument".to_string(),
        ));
    };
    let content = match store.read(&path) {
        Ok(c) => c,
        Err(e) => {
            return ActionResult::error(DispatchError::Validation(format!(
                "cannot open {}: {e}",
                path.display()
            )));
        }
    };
    if let Err(e) = ctx.engine.set_text(&content) {
        return ActionResult::error(e.into());
    }
    let _ = ctx.cursors.set_all(vec![Selection::cursor(0)]);
    tracing::info!(target: "actions.file", path = %path.display(), bytes = content.len(), "opened");
    ActionResult::ok()
        .with_redraw(Redraw::All)
        .with_message(format!("opened {}", path.display()))
        .with_data("file_path", Value::String(path.display().to_string()))
}

fn save(
    ctx: &mut ExecutionContext<'_>,
    store: &dyn FileStore,
    action: &Action,
    save_as: bool,
) -> ActionResult {
    let path = match (arg_path(action), ctx.file_path.clone()) {
        (Some(p), _) => p,
        (None, _) if save_as => {
            return ActionResult::error(DispatchError::Validation(
                "file.saveAs requires a path argument".to_string(),
            ));
        }
        (None, Some(p)) => p,
        (None, None) => {
            return ActionResult::error(DispatchError::Validation(
                "buffer has no file path".to_string(),
            ));
        }
    };
    let content = ctx.engine.text();
    if let Err(e) = store.write(&path, &content) {
        return ActionResult::error(DispatchError::Validation(format!(
            "cannot write {}: {e}",
            path.display()
        )));
    }
    tracing::info!(target: "actions.file", path = %path.display(), bytes = content.len(), "saved");
    let mut result = ActionResult::ok().with_message(format!("wrote {}", path.display()));
    if save_as || ctx.file_path.is_none() {
        result = result.with_data("file_path", Value::String(path.display().to_string()));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::ActionArgs;
    use core_model::EditorModel;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    fn action(name: &str, path: Option<&Path>) -> Action {
        let mut a = Action::new(name);
        if let Some(p) = path {
            a = a.with_args(ActionArgs::text(p.display().to_string()));
        }
        a
    }

    #[test]
    fn open_replaces_buffer_and_resets_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "from disk").unwrap();

        let mut model = EditorModel::from_text("stale");
        model.cursors.set_all(vec![Selection::cursor(3)]).unwrap();
        let r = {
            let mut ctx = ExecutionContext::new(model.split(), 0, HashMap::new());
            let a = action("file.open", Some(&path));
            handle(&mut ctx, &FsFileStore, "open", &a)
        };
        assert!(r.is_ok());
        assert_eq!(model.text(), "from disk\n");
        assert_eq!(model.cursors.primary(), Selection::cursor(0));
        assert_eq!(
            r.data.get("file_path").and_then(Value::as_str),
            Some(path.display().to_string().as_str())
        );
    }

    #[test]
    fn open_missing_file_is_validation_error() {
        let mut model = EditorModel::from_text("keep");
        let r = {
            let mut ctx = ExecutionContext::new(model.split(), 0, HashMap::new());
            let a = action("file.open", Some(Path::new("/no/such/file.txt")));
            handle(&mut ctx, &FsFileStore, "open", &a)
        };
        assert_eq!(r.status, crate::result::Status::Error);
        assert_eq!(model.text(), "keep");
    }

    #[test]
    fn save_uses_model_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut model = EditorModel::from_text("content");
        model.file_path = Some(path.clone());
        let r = {
            let mut ctx = ExecutionContext::new(model.split(), 0, HashMap::new());
            let a = action("file.save", None);
            handle(&mut ctx, &FsFileStore, "save", &a)
        };
        assert!(r.is_ok());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn save_without_path_errors() {
        let mut model = EditorModel::from_text("content");
        let r = {
            let mut ctx = ExecutionContext::new(model.split(), 0, HashMap::new());
            let a = action("file.save", None);
            handle(&mut ctx, &FsFileStore, "save", &a)
        };
        assert_eq!(r.status, crate::result::Status::Error);
    }

    #[test]
    fn save_as_reports_new_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt");
        let mut model = EditorModel::from_text("x");
        let r = {
            let mut ctx = ExecutionContext::new(model.split(), 0, HashMap::new());
            let a = action("file.saveAs", Some(&path));
            handle(&mut ctx, &FsFileStore, "saveAs", &a)
        };
        assert!(r.is_ok());
        assert!(r.data.contains_key("file_path"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x");
    }
}
