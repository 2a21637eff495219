//! Register store.
//!
//! `"` is the default/unnamed register; `a`–`z` are user slots. Writing to
//! an uppercase letter appends to the lowercase register (the linewise flag
//! becomes the OR of both parts). On top of the named slots, yanks mirror
//! into `0` and deletes shift the `1`–`9` ring, so recent kills stay
//! reachable.

use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::trace;

pub const UNNAMED_REGISTER: char = '"';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterContent {
    pub text: String,
    pub linewise: bool,
}

impl RegisterContent {
    pub fn charwise(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            linewise: false,
        }
    }

    pub fn linewise(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            linewise: true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("invalid register name `{0}`")]
    InvalidName(char),
    #[error("register `{0}` is empty")]
    Empty(char),
}

fn valid_name(name: char) -> bool {
    name == UNNAMED_REGISTER || name.is_ascii_alphanumeric()
}

#[derive(Default)]
pub struct RegisterStore {
    inner: Mutex<HashMap<char, RegisterContent>>,
}

impl RegisterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write to a register. Uppercase targets append to their lowercase
    /// slot.
    pub fn write(&self, name: char, content: RegisterContent) -> Result<(), RegisterError> {
        if !valid_name(name) {
            return Err(RegisterError::InvalidName(name));
        }
        let mut map = self.inner.lock().expect("register lock poisoned");
        if name.is_ascii_uppercase() {
            let slot = map.entry(name.to_ascii_lowercase()).or_default();
            slot.text.push_str(&content.text);
            slot.linewise |= content.linewise;
        } else {
            map.insert(name, content);
        }
        trace!(target: "state.registers", register = %name, "write");
        Ok(())
    }

    /// Read a register (uppercase reads the lowercase slot).
    pub fn read(&self, name: char) -> Result<RegisterContent, RegisterError> {
        if !valid_name(name) {
            return Err(RegisterError::InvalidName(name));
        }
        self.inner
            .lock()
            .expect("register lock poisoned")
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or(RegisterError::Empty(name))
    }

    /// Record a yank: target register (or unnamed), mirrored into `"` and
    /// the yank slot `0`.
    pub fn record_yank(
        &self,
        content: RegisterContent,
        target: Option<char>,
    ) -> Result<(), RegisterError> {
        if let Some(name) = target {
            self.write(name, content.clone())?;
        }
        self.write(UNNAMED_REGISTER, content.clone())?;
        self.write('0', content)
    }

    /// Record a delete/change: target register (or unnamed), mirrored into
    /// `"`, with the numbered ring `1`–`9` shifted down.
    pub fn record_delete(
        &self,
        content: RegisterContent,
        target: Option<char>,
    ) -> Result<(), RegisterError> {
        if let Some(name) = target {
            self.write(name, content.clone())?;
        }
        {
            let mut map = self.inner.lock().expect("register lock poisoned");
            for slot in (2..=9u8).rev() {
                let from = (b'0' + slot - 1) as char;
                let to = (b'0' + slot) as char;
                if let Some(v) = map.get(&from).cloned() {
                    map.insert(to, v);
                }
            }
            map.insert('1', content.clone());
        }
        self.write(UNNAMED_REGISTER, content)
    }

    /// Non-empty registers, sorted by name (diagnostics / `:reg`-style UI).
    pub fn snapshot(&self) -> Vec<(char, RegisterContent)> {
        let map = self.inner.lock().expect("register lock poisoned");
        let mut out: Vec<(char, RegisterContent)> = map
            .iter()
            .filter(|(_, v)| !v.text.is_empty())
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        out.sort_by_key(|(k, _)| *k);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn write_and_read_named() {
        let regs = RegisterStore::new();
        regs.write('a', RegisterContent::charwise("hello")).unwrap();
        assert_eq!(regs.read('a').unwrap().text, "hello");
        assert_eq!(regs.read('A').unwrap().text, "hello");
    }

    #[test]
    fn uppercase_appends() {
        let regs = RegisterStore::new();
        regs.write('a', RegisterContent::charwise("one")).unwrap();
        regs.write('A', RegisterContent::linewise("two\n")).unwrap();
        let merged = regs.read('a').unwrap();
        assert_eq!(merged.text, "onetwo\n");
        assert!(merged.linewise, "append ORs the linewise flag");
    }

    #[test]
    fn invalid_names_rejected() {
        let regs = RegisterStore::new();
        assert_eq!(
            regs.write('%', RegisterContent::charwise("x")),
            Err(RegisterError::InvalidName('%'))
        );
        assert_eq!(regs.read('!'), Err(RegisterError::InvalidName('!')));
    }

    #[test]
    fn empty_register_reads_error() {
        let regs = RegisterStore::new();
        assert_eq!(regs.read('z'), Err(RegisterError::Empty('z')));
    }

    #[test]
    fn yank_mirrors_unnamed_and_zero() {
        let regs = RegisterStore::new();
        regs.record_yank(RegisterContent::linewise("line\n"), Some('b'))
            .unwrap();
        assert_eq!(regs.read('b').unwrap().text, "line\n");
        assert_eq!(regs.read(UNNAMED_REGISTER).unwrap().text, "line\n");
        assert!(regs.read('0').unwrap().linewise);
    }

    #[test]
    fn delete_ring_shifts() {
        let regs = RegisterStore::new();
        regs.record_delete(RegisterContent::charwise("first"), None)
            .unwrap();
        regs.record_delete(RegisterContent::charwise("second"), None)
            .unwrap();
        assert_eq!(regs.read('1').unwrap().text, "second");
        assert_eq!(regs.read('2').unwrap().text, "first");
        assert_eq!(regs.read(UNNAMED_REGISTER).unwrap().text, "second");
    }
}
