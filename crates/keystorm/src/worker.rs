//! Async dispatch worker.
//!
//! One worker drains the action channel FIFO; per-buffer effects become
//! visible atomically before the next action begins because the worker holds
//! the editor lock for exactly one dispatch (plus its follow-up feed loop).
//! Results stream out on a tokio channel for the host's view layer.

use crate::Editor;
use core_actions::ActionResult;
use core_events::ActionChannel;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::info;

/// Spawn the single dispatch worker. Ends when the channel closes; dropping
/// the result receiver only stops result forwarding, not dispatching.
pub fn spawn_dispatch_worker(
    editor: Arc<tokio::sync::Mutex<Editor>>,
    channel: ActionChannel,
    results: Sender<ActionResult>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(target: "keystorm.worker", "dispatch worker started");
        while let Some(action) = channel.recv().await {
            let result = {
                let mut editor = editor.lock().await;
                editor.dispatch(action)
            };
            let _ = results.send(result).await;
        }
        info!(target: "keystorm.worker", "dispatch worker stopped");
    })
}
