//! Input front-end: key events in, actions out.
//!
//! The front-end owns the pending-input state machine (sequence buffer,
//! count/register/operator accumulators, modal mirror) and consults the
//! keymap per key. It never dispatches; resolved actions go back to the
//! caller (or onto the action channel in the async service), which keeps the
//! front-end free of editor borrows and lets the raw input thread run it
//! directly.

mod convert;
mod front_end;
mod hooks;
mod service;
mod unmapped;

pub use convert::key_event_from_crossterm;
pub use front_end::{InputFrontEnd, KeyOutcome};
pub use hooks::KeyHook;
pub use service::InputService;
