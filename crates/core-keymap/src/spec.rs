//! Serde-loadable binding specifications.
//!
//! Hosts can declare keymaps in TOML/JSON and compile them onto a `Keymap`;
//! fields mirror the binding model with string forms for keys, motions, and
//! predicates.

use crate::{Binding, Keymap, KeymapError, Predicate, layer};
use core_events::{ActionArgs, Motion, parse_sequence};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BindingSpec {
    /// Wire-syntax key sequence, e.g. `"d i w"` or `"<C-x> <C-s>"`.
    pub keys: String,
    pub action: String,
    /// Mode layer name; defaults to `normal`.
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub register: Option<char>,
    /// Motion by long name or mnemonic (`"word"`, `"w"`, `"$"`, …).
    #[serde(default)]
    pub motion: Option<String>,
}

impl BindingSpec {
    pub fn compile(&self) -> Result<(String, Binding), KeymapError> {
        let sequence = parse_sequence(&self.keys)?;
        let motion = self
            .motion
            .as_deref()
            .map(|m| Motion::parse(m).ok_or_else(|| KeymapError::UnknownMotion(m.to_string())))
            .transpose()?;
        let args = ActionArgs {
            text: self.text.clone(),
            register: self.register,
            motion,
            ..ActionArgs::default()
        };
        let mut binding = Binding::new(sequence, self.action.clone()).with_args(args);
        if let Some(w) = &self.when {
            binding = binding.with_when(Predicate::parse(w)?);
        }
        let mode = self.mode.clone().unwrap_or_else(|| layer::NORMAL.into());
        Ok((mode, binding))
    }
}

/// Compile a list of specs onto an existing keymap (later specs shadow
/// earlier bindings with the same sequence).
pub fn apply_specs(keymap: &mut Keymap, specs: &[BindingSpec]) -> Result<(), KeymapError> {
    for spec in specs {
        let (mode, binding) = spec.compile()?;
        keymap.bind(&mode, binding)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeymapContext;
    use core_events::parse_sequence;

    #[derive(Deserialize)]
    struct KeymapFile {
        binding: Vec<BindingSpec>,
    }

    #[test]
    fn compile_from_toml() {
        let raw = r#"
            [[binding]]
            keys = "g g"
            action = "cursor.documentStart"

            [[binding]]
            keys = "C"
            action = "operator.change"
            motion = "$"

            [[binding]]
            keys = "q"
            action = "macro.stopRecord"
            when = "macroRecording"
            mode = "normal"
        "#;
        let file: KeymapFile = toml::from_str(raw).unwrap();
        let mut km = Keymap::new();
        apply_specs(&mut km, &file.binding).unwrap();

        let ctx = KeymapContext::new();
        let l = km.lookup(layer::NORMAL, &parse_sequence("C").unwrap(), &ctx);
        let b = l.exact.unwrap();
        assert_eq!(b.action, "operator.change");
        assert_eq!(b.args.motion, Some(core_events::Motion::LineEnd));
    }

    #[test]
    fn unknown_motion_is_rejected() {
        let spec = BindingSpec {
            keys: "Z".into(),
            action: "operator.delete".into(),
            mode: None,
            when: None,
            text: None,
            register: None,
            motion: Some("sideways".into()),
        };
        assert!(matches!(spec.compile(), Err(KeymapError::UnknownMotion(_))));
    }
}
