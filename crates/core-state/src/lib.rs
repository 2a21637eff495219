//! Session state stores: modes, cursors, registers, macros, history.
//!
//! Every store guards its state with an internal lock and exposes
//! individually-atomic get/set operations; callers never hold two store
//! locks at once, and nothing here calls back out while locked. The
//! dispatcher borrows all of them for the lifetime of one dispatch.

pub mod history;
pub mod macros;
pub mod mode;
pub mod registers;
pub mod selection;

pub use history::{HISTORY_MAX, History, HistoryError, HistoryGroup};
pub use macros::{MacroError, MacroStore, RecorderState};
pub use mode::{ModeDescriptor, ModeError, ModeId, ModeManager};
pub use registers::{RegisterContent, RegisterError, RegisterStore, UNNAMED_REGISTER};
pub use selection::{CursorSet, EditDelta, Selection, SelectionError};
