//! Action dispatch: hook chain, routing, execution context, and the built-in
//! handler families.
//!
//! The dispatcher is the only code path that constructs an
//! [`ExecutionContext`]; handlers receive it for exactly one dispatch and
//! mutate the engine through its recording helpers so every change lands in
//! history and in the result's edit list. Hooks run outside every internal
//! lock, pre-dispatch in descending priority and post-dispatch ascending.

pub mod context;
pub mod dispatcher;
pub mod handlers;
pub mod hooks;
pub mod palette;
pub mod range;
pub mod result;
pub mod text_object;

pub use context::ExecutionContext;
pub use dispatcher::{Dispatcher, Handler, Hook, HookDecision};
pub use handlers::file::{FileStore, FsFileStore};
pub use handlers::{DefaultHandles, MacroPlayback, register_defaults};
pub use hooks::{
    ContextRingHook, CountLimitHook, MacroCaptureHook, RateLimitHook, ReadOnlyGuardHook,
    RepeatEntry, RepeatHook, TimingHook,
};
pub use palette::{CommandPalette, PaletteEntry};
pub use range::{RangeSpec, motion_range};
pub use result::{ActionResult, DispatchError, Redraw, Status};
pub use text_object::text_object_range;
