//! Modal state: the closed mode set and its manager.

use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

/// The closed set of editor modes. `mode.*` dispatch is total over this sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeId {
    Normal,
    Insert,
    Visual,
    VisualLine,
    VisualBlock,
    Command,
    OperatorPending,
    Replace,
}

impl ModeId {
    pub const ALL: [ModeId; 8] = [
        ModeId::Normal,
        ModeId::Insert,
        ModeId::Visual,
        ModeId::VisualLine,
        ModeId::VisualBlock,
        ModeId::Command,
        ModeId::OperatorPending,
        ModeId::Replace,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModeId::Normal => "normal",
            ModeId::Insert => "insert",
            ModeId::Visual => "visual",
            ModeId::VisualLine => "visual-line",
            ModeId::VisualBlock => "visual-block",
            ModeId::Command => "command",
            ModeId::OperatorPending => "operator-pending",
            ModeId::Replace => "replace",
        }
    }

    /// Accepts the canonical kebab name and the camelCase action-verb form.
    pub fn parse(name: &str) -> Option<ModeId> {
        let id = match name {
            "normal" => ModeId::Normal,
            "insert" => ModeId::Insert,
            "visual" => ModeId::Visual,
            "visual-line" | "visualLine" => ModeId::VisualLine,
            "visual-block" | "visualBlock" => ModeId::VisualBlock,
            "command" => ModeId::Command,
            "operator-pending" | "operatorPending" => ModeId::OperatorPending,
            "replace" => ModeId::Replace,
            _ => return None,
        };
        Some(id)
    }

    pub fn is_visual(self) -> bool {
        matches!(
            self,
            ModeId::Visual | ModeId::VisualLine | ModeId::VisualBlock
        )
    }

    /// Modes where unmapped printable runes become buffer text.
    pub fn is_insert_like(self) -> bool {
        matches!(self, ModeId::Insert | ModeId::Replace)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModeError {
    #[error("unknown mode `{0}`")]
    Unknown(String),
    #[error("initial mode can only be set before the first transition")]
    AlreadyRunning,
}

/// Host-adjustable metadata for one of the built-in modes. The mode set
/// itself is closed; registering replaces the descriptor, not the sum.
#[derive(Debug, Clone)]
pub struct ModeDescriptor {
    pub id: ModeId,
    pub display_name: String,
    /// Keymap layer consulted while the mode is active.
    pub keymap_layer: String,
}

impl ModeDescriptor {
    fn builtin(id: ModeId) -> Self {
        Self {
            id,
            display_name: id.name().to_string(),
            keymap_layer: id.name().to_string(),
        }
    }
}

struct ModeState {
    current: ModeId,
    previous: Option<ModeId>,
    transitioned: bool,
    descriptors: HashMap<ModeId, ModeDescriptor>,
}

/// Tracks the current/previous mode. Initial mode is `normal`.
pub struct ModeManager {
    inner: Mutex<ModeState>,
}

impl Default for ModeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeManager {
    pub fn new() -> Self {
        let descriptors = ModeId::ALL
            .iter()
            .map(|&id| (id, ModeDescriptor::builtin(id)))
            .collect();
        Self {
            inner: Mutex::new(ModeState {
                current: ModeId::Normal,
                previous: None,
                transitioned: false,
                descriptors,
            }),
        }
    }

    pub fn current(&self) -> ModeId {
        self.inner.lock().expect("mode lock poisoned").current
    }

    pub fn previous(&self) -> Option<ModeId> {
        self.inner.lock().expect("mode lock poisoned").previous
    }

    /// Switch by name. Unknown names are an error; callers that want the
    /// spec'd fallback use [`ModeManager::switch_or_normal`].
    pub fn switch(&self, name: &str) -> Result<ModeId, ModeError> {
        let id = ModeId::parse(name).ok_or_else(|| ModeError::Unknown(name.to_string()))?;
        self.switch_to(id);
        Ok(id)
    }

    /// Switch by name, falling back to `normal` on unknown transitions.
    pub fn switch_or_normal(&self, name: &str) -> ModeId {
        let id = ModeId::parse(name).unwrap_or(ModeId::Normal);
        self.switch_to(id);
        id
    }

    pub fn switch_to(&self, id: ModeId) {
        let mut st = self.inner.lock().expect("mode lock poisoned");
        if st.current != id {
            st.previous = Some(st.current);
        }
        let from = st.current;
        st.current = id;
        st.transitioned = true;
        drop(st);
        debug!(target: "state.mode", from = from.name(), to = id.name(), "mode switch");
    }

    /// Set the starting mode; only legal before any transition happened.
    pub fn set_initial_mode(&self, name: &str) -> Result<(), ModeError> {
        let id = ModeId::parse(name).ok_or_else(|| ModeError::Unknown(name.to_string()))?;
        let mut st = self.inner.lock().expect("mode lock poisoned");
        if st.transitioned {
            return Err(ModeError::AlreadyRunning);
        }
        st.current = id;
        Ok(())
    }

    /// Replace the descriptor of one built-in mode.
    pub fn register(&self, desc: ModeDescriptor) {
        let mut st = self.inner.lock().expect("mode lock poisoned");
        st.descriptors.insert(desc.id, desc);
    }

    pub fn descriptor(&self, id: ModeId) -> ModeDescriptor {
        self.inner
            .lock()
            .expect("mode lock poisoned")
            .descriptors
            .get(&id)
            .cloned()
            .unwrap_or_else(|| ModeDescriptor::builtin(id))
    }
}
