//! Macro store and recorder.
//!
//! Macros are named sequences of recorded actions keyed by register `a`–`z`.
//! The recorder is a two-state machine (`Idle` / `Recording`); callers feed
//! it every successfully dispatched keyboard action. Macro-sourced actions
//! are filtered out by the caller so replay cannot re-record itself.

use core_events::Action;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording(char),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MacroError {
    #[error("already recording into register `{0}`")]
    AlreadyRecording(char),
    #[error("not recording")]
    NotRecording,
    #[error("invalid macro register `{0}` (expected a-z)")]
    InvalidRegister(char),
    #[error("no macro recorded in register `{0}`")]
    Empty(char),
    #[error("no macro has been played yet")]
    NoLastPlayed,
}

struct Inner {
    macros: HashMap<char, Vec<Action>>,
    state: RecorderState,
    pending: Vec<Action>,
    last_played: Option<char>,
}

pub struct MacroStore {
    inner: Mutex<Inner>,
}

impl Default for MacroStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                macros: HashMap::new(),
                state: RecorderState::Idle,
                pending: Vec::new(),
                last_played: None,
            }),
        }
    }

    pub fn start_record(&self, register: char) -> Result<(), MacroError> {
        if !register.is_ascii_lowercase() {
            return Err(MacroError::InvalidRegister(register));
        }
        let mut inner = self.inner.lock().expect("macro lock poisoned");
        if let RecorderState::Recording(r) = inner.state {
            return Err(MacroError::AlreadyRecording(r));
        }
        inner.state = RecorderState::Recording(register);
        inner.pending.clear();
        drop(inner);
        debug!(target: "state.macros", register = %register, "recording started");
        Ok(())
    }

    /// Commit the recording buffer; returns the register and action count.
    pub fn stop_record(&self) -> Result<(char, usize), MacroError> {
        let mut inner = self.inner.lock().expect("macro lock poisoned");
        let RecorderState::Recording(register) = inner.state else {
            return Err(MacroError::NotRecording);
        };
        let actions = std::mem::take(&mut inner.pending);
        let len = actions.len();
        inner.macros.insert(register, actions);
        inner.state = RecorderState::Idle;
        drop(inner);
        debug!(target: "state.macros", register = %register, actions = len, "recording committed");
        Ok((register, len))
    }

    /// Append one action to the active recording (no-op while idle). The
    /// stored copy is a deep clone of the action at capture time.
    pub fn record(&self, action: &Action) {
        let mut inner = self.inner.lock().expect("macro lock poisoned");
        if matches!(inner.state, RecorderState::Recording(_)) {
            inner.pending.push(action.clone());
        }
    }

    pub fn recording(&self) -> Option<char> {
        match self.inner.lock().expect("macro lock poisoned").state {
            RecorderState::Recording(r) => Some(r),
            RecorderState::Idle => None,
        }
    }

    pub fn get(&self, register: char) -> Result<Vec<Action>, MacroError> {
        if !register.is_ascii_lowercase() {
            return Err(MacroError::InvalidRegister(register));
        }
        self.inner
            .lock()
            .expect("macro lock poisoned")
            .macros
            .get(&register)
            .cloned()
            .ok_or(MacroError::Empty(register))
    }

    pub fn note_played(&self, register: char) {
        self.inner.lock().expect("macro lock poisoned").last_played = Some(register);
    }

    pub fn last_played(&self) -> Result<char, MacroError> {
        self.inner
            .lock()
            .expect("macro lock poisoned")
            .last_played
            .ok_or(MacroError::NoLastPlayed)
    }

    /// Drop all recorded macros and recorder state.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("macro lock poisoned");
        inner.macros.clear();
        inner.pending.clear();
        inner.state = RecorderState::Idle;
        inner.last_played = None;
    }
}
