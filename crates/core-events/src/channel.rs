//! Bounded action channel.
//!
//! Producers (input thread, macro replay, plugin calls) run in parallel and
//! use this queue as their single synchronization point; one worker drains it
//! FIFO. Overflow policy: drop the **oldest** queued action before enqueueing
//! the new one and bump [`crate::ACTIONS_DROPPED`]: recent input stays
//! interactive, stale batches give way.
//!
//! Sends are synchronous (a short mutex hold); receiving is async via a
//! `Notify` wakeup so the dispatch worker can run on the runtime the host
//! already has. The drop observer is invoked after the queue lock is
//! released.

use crate::{ACTIONS_DROPPED, ACTIONS_SUBMITTED, Action};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tokio::sync::Notify;

/// Default bound for the action queue.
pub const ACTION_CHANNEL_CAP: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("action channel closed")]
pub struct ChannelClosed;

type DropObserver = dyn Fn(&Action) + Send + Sync;

struct Inner {
    queue: Mutex<VecDeque<Action>>,
    notify: Notify,
    closed: AtomicBool,
    capacity: usize,
    on_drop: RwLock<Option<Arc<DropObserver>>>,
}

/// Cloneable handle to a bounded multi-producer single-consumer action queue.
#[derive(Clone)]
pub struct ActionChannel {
    inner: Arc<Inner>,
}

impl ActionChannel {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
                notify: Notify::new(),
                closed: AtomicBool::new(false),
                capacity: capacity.max(1),
                on_drop: RwLock::new(None),
            }),
        }
    }

    /// Register the observer called with each action discarded by overflow.
    pub fn set_drop_observer<F>(&self, f: F)
    where
        F: Fn(&Action) + Send + Sync + 'static,
    {
        *self.inner.on_drop.write().expect("drop observer lock poisoned") = Some(Arc::new(f));
    }

    /// Enqueue an action. Never blocks; on overflow the oldest queued action
    /// is discarded first.
    pub fn send(&self, action: Action) -> Result<(), ChannelClosed> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(ChannelClosed);
        }
        let dropped = {
            let mut q = self.inner.queue.lock().expect("action queue lock poisoned");
            let dropped = if q.len() >= self.inner.capacity {
                q.pop_front()
            } else {
                None
            };
            q.push_back(action);
            dropped
        };
        ACTIONS_SUBMITTED.fetch_add(1, Ordering::Relaxed);
        if let Some(old) = dropped {
            ACTIONS_DROPPED.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(target: "events.channel", action = %old.name, "dropped oldest action on overflow");
            let observer = self
                .inner
                .on_drop
                .read()
                .expect("drop observer lock poisoned")
                .clone();
            if let Some(obs) = observer {
                obs(&old);
            }
        }
        self.inner.notify.notify_one();
        Ok(())
    }

    pub fn try_recv(&self) -> Option<Action> {
        self.inner
            .queue
            .lock()
            .expect("action queue lock poisoned")
            .pop_front()
    }

    /// Await the next action; `None` once the channel is closed and drained.
    pub async fn recv(&self) -> Option<Action> {
        loop {
            let notified = self.inner.notify.notified();
            if let Some(a) = self.try_recv() {
                return Some(a);
            }
            if self.inner.closed.load(Ordering::Acquire) {
                return None;
            }
            notified.await;
        }
    }

    /// Close the channel: pending actions are discarded, waiting receivers
    /// wake, and subsequent sends fail.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner
            .queue
            .lock()
            .expect("action queue lock poisoned")
            .clear();
        self.inner.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.inner.queue.lock().expect("action queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn act(name: &str) -> Action {
        Action::new(name)
    }

    #[test]
    fn fifo_order() {
        let ch = ActionChannel::new(8);
        ch.send(act("cursor.moveDown")).unwrap();
        ch.send(act("cursor.moveUp")).unwrap();
        assert_eq!(ch.try_recv().unwrap().name, "cursor.moveDown");
        assert_eq!(ch.try_recv().unwrap().name, "cursor.moveUp");
        assert!(ch.try_recv().is_none());
    }

    #[test]
    fn overflow_drops_oldest_and_counts() {
        let ch = ActionChannel::new(2);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        ch.set_drop_observer(move |a| seen2.lock().unwrap().push(a.name.clone()));

        let before = ACTIONS_DROPPED.load(Ordering::Relaxed);
        ch.send(act("editor.insertText")).unwrap();
        ch.send(act("cursor.moveDown")).unwrap();
        ch.send(act("cursor.moveUp")).unwrap(); // evicts insertText
        assert_eq!(ch.len(), 2);
        assert_eq!(ACTIONS_DROPPED.load(Ordering::Relaxed), before + 1);
        assert_eq!(*seen.lock().unwrap(), vec!["editor.insertText".to_string()]);
        assert_eq!(ch.try_recv().unwrap().name, "cursor.moveDown");
    }

    #[test]
    fn close_rejects_sends_and_drains() {
        let ch = ActionChannel::new(4);
        ch.send(act("cursor.moveDown")).unwrap();
        ch.close();
        assert!(ch.is_closed());
        assert_eq!(ch.send(act("cursor.moveUp")), Err(ChannelClosed));
        assert!(ch.try_recv().is_none(), "close drains pending actions");
    }

    #[tokio::test]
    async fn async_recv_wakes_on_send() {
        let ch = ActionChannel::new(4);
        let ch2 = ch.clone();
        let consumer = tokio::spawn(async move { ch2.recv().await.map(|a| a.name) });
        tokio::task::yield_now().await;
        ch.send(act("editor.insertNewline")).unwrap();
        assert_eq!(consumer.await.unwrap().as_deref(), Some("editor.insertNewline"));
    }

    #[tokio::test]
    async fn async_recv_returns_none_after_close() {
        let ch = ActionChannel::new(4);
        let ch2 = ch.clone();
        let consumer = tokio::spawn(async move { ch2.recv().await });
        tokio::task::yield_now().await;
        ch.close();
        assert!(consumer.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn parallel_producers_all_land() {
        let ch = ActionChannel::new(64);
        let done = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for t in 0..4 {
            let ch = ch.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..8 {
                    ch.send(act(&format!("t{t}.a{i}"))).unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        while ch.try_recv().is_some() {
            done.fetch_add(1, Ordering::Relaxed);
        }
        assert_eq!(done.load(Ordering::Relaxed), 32);
    }
}
