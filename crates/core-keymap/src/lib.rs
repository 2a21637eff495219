//! Keymap resolution engine.
//!
//! Bindings map key sequences to actions per mode, guarded by optional
//! `when` predicates over mirrored editor conditions and variables. Each
//! mode layer compiles into a trie; resolution is pure: it depends only on
//! the pending sequence and the supplied context, and surfaces ambiguity by
//! reporting both the exact match and whether any *live* longer binding
//! still has the sequence as a prefix (a descendant whose predicate fails
//! under the current context is not live).

use core_events::{ActionArgs, KeyEvent, is_valid_action_name};
use smallvec::SmallVec;
use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

mod default_map;
mod predicate;
mod spec;

pub use default_map::default_keymap;
pub use predicate::{Predicate, PredicateError};
pub use spec::{BindingSpec, apply_specs};

/// Well-known mode layer names.
pub mod layer {
    pub const NORMAL: &str = "normal";
    pub const INSERT: &str = "insert";
    pub const VISUAL: &str = "visual";
    pub const VISUAL_LINE: &str = "visual-line";
    pub const VISUAL_BLOCK: &str = "visual-block";
    pub const COMMAND: &str = "command";
    pub const OPERATOR_PENDING: &str = "operator-pending";
    pub const REPLACE: &str = "replace";
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeymapError {
    #[error("binding has an empty key sequence")]
    EmptySequence,
    #[error("invalid action name `{0}`")]
    InvalidAction(String),
    #[error("invalid key sequence: {0}")]
    InvalidKeys(#[from] core_events::KeyParseError),
    #[error("invalid `when` predicate: {0}")]
    InvalidPredicate(#[from] PredicateError),
    #[error("unknown motion `{0}`")]
    UnknownMotion(String),
}

/// One resolvable binding.
#[derive(Debug, Clone)]
pub struct Binding {
    pub sequence: Vec<KeyEvent>,
    pub action: String,
    pub args: ActionArgs,
    pub when: Option<Predicate>,
}

impl Binding {
    pub fn new(sequence: Vec<KeyEvent>, action: impl Into<String>) -> Self {
        Self {
            sequence,
            action: action.into(),
            args: ActionArgs::default(),
            when: None,
        }
    }

    pub fn with_args(mut self, args: ActionArgs) -> Self {
        self.args = args;
        self
    }

    pub fn with_when(mut self, when: Predicate) -> Self {
        self.when = Some(when);
        self
    }
}

/// Mirror of editor state that keymap predicates can observe.
#[derive(Debug, Clone, Default)]
pub struct KeymapContext {
    pub conditions: HashMap<String, bool>,
    pub variables: HashMap<String, String>,
}

impl KeymapContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_condition(&mut self, name: impl Into<String>, value: bool) {
        self.conditions.insert(name.into(), value);
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn condition(&self, name: &str) -> bool {
        self.conditions.get(name).copied().unwrap_or(false)
    }
}

/// Result of a keymap consultation.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    /// Binding terminating exactly at the supplied sequence (predicate
    /// already checked), if any.
    pub exact: Option<&'a Binding>,
    /// True when some longer live binding has this sequence as a strict
    /// prefix.
    pub prefix: bool,
}

impl Lookup<'_> {
    pub fn is_unmapped(&self) -> bool {
        self.exact.is_none() && !self.prefix
    }
}

#[derive(Debug, Default)]
struct Node {
    /// Binding indices terminating here, insertion order. Later bindings
    /// shadow earlier ones with the same sequence.
    terminals: SmallVec<[usize; 1]>,
    edges: SmallVec<[(KeyEvent, usize); 4]>,
}

#[derive(Debug, Default)]
struct Trie {
    nodes: Vec<Node>,
    bindings: Vec<Binding>,
}

impl Trie {
    fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            bindings: Vec::new(),
        }
    }

    fn add(&mut self, binding: Binding) {
        let idx = self.bindings.len();
        let mut cur = 0usize;
        for ev in &binding.sequence {
            cur = match self.nodes[cur].edges.iter().find(|(k, _)| k == ev) {
                Some((_, next)) => *next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[cur].edges.push((*ev, next));
                    next
                }
            };
        }
        self.nodes[cur].terminals.push(idx);
        self.bindings.push(binding);
    }

    fn walk(&self, seq: &[KeyEvent]) -> Option<usize> {
        let mut cur = 0usize;
        for ev in seq {
            cur = *self.nodes[cur]
                .edges
                .iter()
                .find_map(|(k, next)| (k == ev).then_some(next))?;
        }
        Some(cur)
    }

    fn live_terminal(&self, node: usize, ctx: &KeymapContext) -> Option<&Binding> {
        // Reverse order: latest registration wins among same-sequence bindings.
        self.nodes[node]
            .terminals
            .iter()
            .rev()
            .map(|&i| &self.bindings[i])
            .find(|b| b.when.as_ref().is_none_or(|p| p.eval(ctx)))
    }

    fn any_live_descendant(&self, node: usize, ctx: &KeymapContext) -> bool {
        let mut stack: Vec<usize> = self.nodes[node].edges.iter().map(|(_, n)| *n).collect();
        while let Some(n) = stack.pop() {
            if self.live_terminal(n, ctx).is_some() {
                return true;
            }
            stack.extend(self.nodes[n].edges.iter().map(|(_, next)| *next));
        }
        false
    }
}

/// Per-mode layered keymap.
#[derive(Debug, Default)]
pub struct Keymap {
    layers: HashMap<String, Trie>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding on a mode layer. The sequence must be non-empty
    /// and the action name well-formed.
    pub fn bind(&mut self, mode: &str, binding: Binding) -> Result<(), KeymapError> {
        if binding.sequence.is_empty() {
            return Err(KeymapError::EmptySequence);
        }
        if !is_valid_action_name(&binding.action) {
            return Err(KeymapError::InvalidAction(binding.action));
        }
        self.layers
            .entry(mode.to_string())
            .or_insert_with(Trie::new)
            .add(binding);
        Ok(())
    }

    /// Resolve `(sequence, mode, context)`. Longer sequences take precedence:
    /// callers should keep waiting while `prefix` is true and fall back to
    /// `exact` on timeout.
    pub fn lookup<'a>(&'a self, mode: &str, seq: &[KeyEvent], ctx: &KeymapContext) -> Lookup<'a> {
        let Some(trie) = self.layers.get(mode) else {
            return Lookup {
                exact: None,
                prefix: false,
            };
        };
        let Some(node) = trie.walk(seq) else {
            return Lookup {
                exact: None,
                prefix: false,
            };
        };
        let exact = trie.live_terminal(node, ctx);
        let prefix = trie.any_live_descendant(node, ctx);
        trace!(
            target: "keymap.lookup",
            mode,
            seq_len = seq.len(),
            exact = exact.map(|b| b.action.as_str()),
            prefix,
            "resolved"
        );
        Lookup { exact, prefix }
    }

    /// Number of bindings registered on a layer (diagnostics/tests).
    pub fn layer_len(&self, mode: &str) -> usize {
        self.layers.get(mode).map(|t| t.bindings.len()).unwrap_or(0)
    }
}
