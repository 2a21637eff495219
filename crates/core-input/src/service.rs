//! Async input service: terminal events → front-end → action channel.
//!
//! One task owns the crossterm `EventStream` and drives the front-end;
//! resolved actions go onto the shared [`ActionChannel`], which the dispatch
//! worker drains. Sequence timeouts are armed per pending outcome as
//! generation-stamped sleep tasks; a newer key event bumps the generation
//! and the stale timer fires into a no-op.

use crate::front_end::{InputFrontEnd, KeyOutcome};
use crate::key_event_from_crossterm;
use core_events::{ActionChannel, KeyEvent};
use crossterm::event::{Event as CtEvent, EventStream, KeyEventKind};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

pub struct InputService {
    front_end: Arc<InputFrontEnd>,
    channel: ActionChannel,
}

impl InputService {
    pub fn new(front_end: Arc<InputFrontEnd>, channel: ActionChannel) -> Self {
        Self { front_end, channel }
    }

    /// Forward one key event's resolution onto the channel, arming the
    /// sequence timer when input is left pending. Returns `false` once the
    /// channel rejects sends (consumer gone).
    pub fn feed(&self, event: KeyEvent) -> bool {
        let outcome = self.front_end.handle_key(event);
        self.forward(outcome)
    }

    fn forward(&self, outcome: KeyOutcome) -> bool {
        let pending = outcome.pending;
        let generation = outcome.generation;
        for action in outcome.actions {
            if self.channel.send(action).is_err() {
                return false;
            }
        }
        if pending {
            self.arm_timer(generation);
        }
        true
    }

    fn arm_timer(&self, generation: u64) {
        let front_end = self.front_end.clone();
        let channel = self.channel.clone();
        let timeout = front_end.sequence_timeout();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let outcome = front_end.on_timeout(generation);
            if outcome.actions.is_empty() {
                return;
            }
            debug!(target: "input.service", generation, "sequence timeout resolved input");
            for action in outcome.actions {
                if channel.send(action).is_err() {
                    break;
                }
            }
        });
    }

    /// Spawn the terminal reader task. Stops when the stream ends, the
    /// channel closes, or the front-end is closed.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(target: "input.service", "input service started");
            let mut stream = EventStream::new();
            while let Some(event) = stream.next().await {
                if self.front_end.is_closed() {
                    break;
                }
                match event {
                    Ok(CtEvent::Key(key))
                        if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
                    {
                        if let Some(ev) = key_event_from_crossterm(&key)
                            && !self.feed(ev)
                        {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(target: "input.service", error = %e, "input stream error");
                        break;
                    }
                }
            }
            info!(target: "input.service", "input service stopped");
        })
    }
}
