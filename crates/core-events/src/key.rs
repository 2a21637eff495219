//! Normalized key events and their wire syntax.
//!
//! A key event is either a printable rune or a named key, plus a modifier
//! mask. Sequences serialize as space-separated tokens: `"d i w"`,
//! `"<C-x> <C-s>"`, `"<Esc>"`. The token grammar is the one keymap files and
//! macros round-trip through, so parse and format must stay inverses.

use std::fmt;
use thiserror::Error;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ModMask: u8 {
        const CTRL  = 1;
        const ALT   = 2;
        const SHIFT = 4;
        const SUPER = 8;
    }
}

/// Closed set of non-printable keys surfaced to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Esc,
    Tab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    F(u8),
}

impl NamedKey {
    fn token(&self) -> String {
        match self {
            NamedKey::Enter => "CR".into(),
            NamedKey::Esc => "Esc".into(),
            NamedKey::Tab => "Tab".into(),
            NamedKey::Backspace => "BS".into(),
            NamedKey::Up => "Up".into(),
            NamedKey::Down => "Down".into(),
            NamedKey::Left => "Left".into(),
            NamedKey::Right => "Right".into(),
            NamedKey::Home => "Home".into(),
            NamedKey::End => "End".into(),
            NamedKey::PageUp => "PageUp".into(),
            NamedKey::PageDown => "PageDown".into(),
            NamedKey::Insert => "Insert".into(),
            NamedKey::Delete => "Del".into(),
            NamedKey::F(n) => format!("F{n}"),
        }
    }

    fn from_token(tok: &str) -> Option<NamedKey> {
        let named = match tok.to_ascii_lowercase().as_str() {
            "cr" | "enter" | "return" => NamedKey::Enter,
            "esc" | "escape" => NamedKey::Esc,
            "tab" => NamedKey::Tab,
            "bs" | "backspace" => NamedKey::Backspace,
            "up" => NamedKey::Up,
            "down" => NamedKey::Down,
            "left" => NamedKey::Left,
            "right" => NamedKey::Right,
            "home" => NamedKey::Home,
            "end" => NamedKey::End,
            "pageup" => NamedKey::PageUp,
            "pagedown" => NamedKey::PageDown,
            "insert" => NamedKey::Insert,
            "del" | "delete" => NamedKey::Delete,
            other => {
                let n: u8 = other.strip_prefix('f')?.parse().ok()?;
                if (1..=12).contains(&n) {
                    NamedKey::F(n)
                } else {
                    return None;
                }
            }
        };
        Some(named)
    }
}

/// Logical identity of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Rune(char),
    Named(NamedKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub kind: KeyKind,
    pub mods: ModMask,
}

impl KeyEvent {
    pub fn rune(c: char) -> Self {
        Self {
            kind: KeyKind::Rune(c),
            mods: ModMask::empty(),
        }
    }

    pub fn named(k: NamedKey) -> Self {
        Self {
            kind: KeyKind::Named(k),
            mods: ModMask::empty(),
        }
    }

    pub fn ctrl(c: char) -> Self {
        Self {
            kind: KeyKind::Rune(c),
            mods: ModMask::CTRL,
        }
    }

    pub fn with_mods(mut self, mods: ModMask) -> Self {
        self.mods = mods;
        self
    }

    /// The printable rune, if this is an unmodified rune press.
    pub fn plain_rune(&self) -> Option<char> {
        match self.kind {
            // SHIFT alone is implied by an uppercase rune and stays printable.
            KeyKind::Rune(c) if (self.mods & !ModMask::SHIFT).is_empty() => Some(c),
            _ => None,
        }
    }

    pub fn is(&self, k: NamedKey) -> bool {
        self.kind == KeyKind::Named(k) && self.mods.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("empty key token")]
    Empty,
    #[error("unknown key token `{0}`")]
    UnknownToken(String),
    #[error("unknown modifier `{0}` in key token")]
    UnknownModifier(char),
}

/// Parse a single wire token (`"d"`, `"<C-x>"`, `"<Esc>"`, `"<Space>"`).
pub fn parse_key_token(tok: &str) -> Result<KeyEvent, KeyParseError> {
    if tok.is_empty() {
        return Err(KeyParseError::Empty);
    }
    if let Some(inner) = tok.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        if inner.is_empty() {
            return Err(KeyParseError::UnknownToken(tok.into()));
        }
        let mut mods = ModMask::empty();
        let mut rest = inner;
        // Modifier prefixes are single letters separated by '-': <C-A-x>.
        while rest.len() > 2 && rest.as_bytes()[1] == b'-' {
            let m = rest.chars().next().ok_or(KeyParseError::Empty)?;
            mods |= match m {
                'C' | 'c' => ModMask::CTRL,
                'A' | 'a' | 'M' | 'm' => ModMask::ALT,
                'S' | 's' => ModMask::SHIFT,
                'D' | 'd' => ModMask::SUPER,
                other => return Err(KeyParseError::UnknownModifier(other)),
            };
            rest = &rest[2..];
        }
        let mut chars = rest.chars();
        let kind = match (chars.next(), chars.next()) {
            (Some(c), None) => KeyKind::Rune(c),
            _ => match rest.to_ascii_lowercase().as_str() {
                "space" => KeyKind::Rune(' '),
                "lt" => KeyKind::Rune('<'),
                _ => KeyKind::Named(
                    NamedKey::from_token(rest)
                        .ok_or_else(|| KeyParseError::UnknownToken(tok.into()))?,
                ),
            },
        };
        return Ok(KeyEvent { kind, mods });
    }
    let mut chars = tok.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(KeyEvent::rune(c)),
        _ => Err(KeyParseError::UnknownToken(tok.into())),
    }
}

/// Parse a space-separated key sequence (`"d i w"`).
pub fn parse_sequence(s: &str) -> Result<Vec<KeyEvent>, KeyParseError> {
    s.split_whitespace().map(parse_key_token).collect()
}

/// Format a sequence back into wire syntax. Inverse of [`parse_sequence`] for
/// every event constructible from it.
pub fn format_sequence(seq: &[KeyEvent]) -> String {
    let toks: Vec<String> = seq.iter().map(|e| e.to_string()).collect();
    toks.join(" ")
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.kind {
            KeyKind::Rune(' ') => "Space".to_string(),
            KeyKind::Rune('<') => "lt".to_string(),
            KeyKind::Rune(c) => c.to_string(),
            KeyKind::Named(k) => k.token(),
        };
        let needs_brackets = !self.mods.is_empty()
            || matches!(self.kind, KeyKind::Named(_) | KeyKind::Rune(' ') | KeyKind::Rune('<'));
        if !needs_brackets {
            return write!(f, "{base}");
        }
        write!(f, "<")?;
        if self.mods.contains(ModMask::CTRL) {
            write!(f, "C-")?;
        }
        if self.mods.contains(ModMask::ALT) {
            write!(f, "A-")?;
        }
        if self.mods.contains(ModMask::SHIFT) {
            write!(f, "S-")?;
        }
        if self.mods.contains(ModMask::SUPER) {
            write!(f, "D-")?;
        }
        write!(f, "{base}>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_rune_token() {
        assert_eq!(parse_key_token("d").unwrap(), KeyEvent::rune('d'));
        assert_eq!(KeyEvent::rune('d').to_string(), "d");
    }

    #[test]
    fn chord_token() {
        let ev = parse_key_token("<C-x>").unwrap();
        assert_eq!(ev, KeyEvent::ctrl('x'));
        assert_eq!(ev.to_string(), "<C-x>");
    }

    #[test]
    fn named_tokens_round_trip() {
        for tok in ["<Esc>", "<CR>", "<Tab>", "<BS>", "<Up>", "<PageDown>", "<F5>", "<Del>"] {
            let ev = parse_key_token(tok).unwrap();
            assert_eq!(ev.to_string(), tok, "token {tok} must round-trip");
        }
    }

    #[test]
    fn multi_modifier_chord() {
        let ev = parse_key_token("<C-A-Left>").unwrap();
        assert_eq!(ev.kind, KeyKind::Named(NamedKey::Left));
        assert_eq!(ev.mods, ModMask::CTRL | ModMask::ALT);
    }

    #[test]
    fn sequence_round_trip() {
        let seq = parse_sequence("d i w").unwrap();
        assert_eq!(
            seq,
            vec![KeyEvent::rune('d'), KeyEvent::rune('i'), KeyEvent::rune('w')]
        );
        assert_eq!(format_sequence(&seq), "d i w");

        let seq = parse_sequence("<C-x> <C-s>").unwrap();
        assert_eq!(format_sequence(&seq), "<C-x> <C-s>");
    }

    #[test]
    fn space_and_angle_escapes() {
        assert_eq!(parse_key_token("<Space>").unwrap(), KeyEvent::rune(' '));
        assert_eq!(parse_key_token("<lt>").unwrap(), KeyEvent::rune('<'));
        assert_eq!(KeyEvent::rune(' ').to_string(), "<Space>");
        assert_eq!(KeyEvent::rune('<').to_string(), "<lt>");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_key_token("").is_err());
        assert!(parse_key_token("<X-a>").is_err());
        assert!(parse_key_token("<NoSuchKey>").is_err());
        assert!(parse_key_token("ab").is_err());
    }

    #[test]
    fn plain_rune_accessor_respects_mods() {
        assert_eq!(KeyEvent::rune('x').plain_rune(), Some('x'));
        assert_eq!(
            KeyEvent::rune('X').with_mods(ModMask::SHIFT).plain_rune(),
            Some('X')
        );
        assert_eq!(KeyEvent::ctrl('x').plain_rune(), None);
    }
}
