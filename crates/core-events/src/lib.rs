//! Core event and action types for Keystorm.
//!
//! Everything the input front-end and the dispatcher exchange lives here:
//! normalized key events with their wire syntax, the `Action` model that the
//! rest of the pipeline consumes, and the bounded action channel that couples
//! parallel producers (input thread, macro replay, plugin calls) to the
//! single dispatch worker.

use std::sync::atomic::AtomicU64;

mod action;
mod channel;
mod key;

pub use action::{
    Action, ActionArgs, ActionSource, Motion, TextObject, TextObjectKind, is_valid_action_name,
    split_action_name,
};
pub use channel::{ACTION_CHANNEL_CAP, ActionChannel, ChannelClosed};
pub use key::{KeyEvent, KeyKind, KeyParseError, ModMask, NamedKey, format_sequence, parse_sequence};

// -------------------------------------------------------------------------------------------------
// Telemetry
// -------------------------------------------------------------------------------------------------
// Simple atomic counters (fetch_add relaxed, no locking). They are inspected in
// unit tests and may be logged periodically by a host; a metrics exporter can
// layer on top without touching call sites.
// -------------------------------------------------------------------------------------------------

/// Total key events accepted by the input front-end.
pub static KEY_EVENTS_TOTAL: AtomicU64 = AtomicU64::new(0);
/// Actions successfully enqueued on an [`ActionChannel`].
pub static ACTIONS_SUBMITTED: AtomicU64 = AtomicU64::new(0);
/// Actions discarded by channel overflow (oldest-first drop policy).
pub static ACTIONS_DROPPED: AtomicU64 = AtomicU64::new(0);
/// Sequence timeouts that fired and flushed pending input.
pub static SEQUENCE_TIMEOUTS: AtomicU64 = AtomicU64::new(0);
