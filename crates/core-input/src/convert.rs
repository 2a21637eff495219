//! Crossterm event translation.

use core_events::{KeyEvent, KeyKind, ModMask, NamedKey};
use crossterm::event::{KeyCode as CtCode, KeyEvent as CtKey, KeyModifiers as CtMods};

fn mods_from(ct: CtMods) -> ModMask {
    let mut mods = ModMask::empty();
    if ct.contains(CtMods::CONTROL) {
        mods |= ModMask::CTRL;
    }
    if ct.contains(CtMods::ALT) {
        mods |= ModMask::ALT;
    }
    if ct.contains(CtMods::SHIFT) {
        mods |= ModMask::SHIFT;
    }
    if ct.contains(CtMods::SUPER) {
        mods |= ModMask::SUPER;
    }
    mods
}

/// Translate a crossterm key event; `None` for keys outside the core wire
/// form (media keys and the like).
pub fn key_event_from_crossterm(ct: &CtKey) -> Option<KeyEvent> {
    let kind = match ct.code {
        CtCode::Char(c) => KeyKind::Rune(c),
        CtCode::Enter => KeyKind::Named(NamedKey::Enter),
        CtCode::Esc => KeyKind::Named(NamedKey::Esc),
        CtCode::Tab => KeyKind::Named(NamedKey::Tab),
        CtCode::BackTab => KeyKind::Named(NamedKey::Tab),
        CtCode::Backspace => KeyKind::Named(NamedKey::Backspace),
        CtCode::Up => KeyKind::Named(NamedKey::Up),
        CtCode::Down => KeyKind::Named(NamedKey::Down),
        CtCode::Left => KeyKind::Named(NamedKey::Left),
        CtCode::Right => KeyKind::Named(NamedKey::Right),
        CtCode::Home => KeyKind::Named(NamedKey::Home),
        CtCode::End => KeyKind::Named(NamedKey::End),
        CtCode::PageUp => KeyKind::Named(NamedKey::PageUp),
        CtCode::PageDown => KeyKind::Named(NamedKey::PageDown),
        CtCode::Insert => KeyKind::Named(NamedKey::Insert),
        CtCode::Delete => KeyKind::Named(NamedKey::Delete),
        CtCode::F(n) if (1..=12).contains(&n) => KeyKind::Named(NamedKey::F(n)),
        _ => return None,
    };
    let mut mods = mods_from(ct.modifiers);
    // A plain shifted rune already carries its case; keep SHIFT only for
    // named keys and chords.
    if matches!(kind, KeyKind::Rune(_)) && mods == ModMask::SHIFT {
        mods = ModMask::empty();
    }
    Some(KeyEvent { kind, mods })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn ct(code: CtCode, mods: CtMods) -> CtKey {
        let mut ev = CtKey::new(code, mods);
        ev.kind = KeyEventKind::Press;
        ev
    }

    #[test]
    fn plain_and_shifted_runes() {
        let ev = key_event_from_crossterm(&ct(CtCode::Char('a'), CtMods::NONE)).unwrap();
        assert_eq!(ev, KeyEvent::rune('a'));
        let ev = key_event_from_crossterm(&ct(CtCode::Char('A'), CtMods::SHIFT)).unwrap();
        assert_eq!(ev, KeyEvent::rune('A'), "shift folds into the uppercase rune");
    }

    #[test]
    fn control_chord() {
        let ev = key_event_from_crossterm(&ct(CtCode::Char('r'), CtMods::CONTROL)).unwrap();
        assert_eq!(ev, KeyEvent::ctrl('r'));
    }

    #[test]
    fn named_keys() {
        let ev = key_event_from_crossterm(&ct(CtCode::Esc, CtMods::NONE)).unwrap();
        assert_eq!(ev, KeyEvent::named(NamedKey::Esc));
        let ev = key_event_from_crossterm(&ct(CtCode::F(5), CtMods::NONE)).unwrap();
        assert_eq!(ev, KeyEvent::named(NamedKey::F(5)));
        assert!(key_event_from_crossterm(&ct(CtCode::F(20), CtMods::NONE)).is_none());
    }
}
