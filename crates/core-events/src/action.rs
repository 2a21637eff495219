//! The `Action` model: what the input front-end produces and the dispatcher
//! consumes.
//!
//! Action names follow `namespace.verb` (lowercase namespace, camelCase
//! verb). Arguments are a small closed set of typed fields plus an untyped
//! `extra` map for filter/debug metadata; handlers must not require `extra`
//! for correctness.

use serde_json::Value;
use std::collections::HashMap;

/// Where an action originated. Macro-sourced actions are never re-recorded;
/// repeat-sourced actions are never re-captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionSource {
    Keyboard,
    Macro,
    Palette,
    Plugin,
    Repeat,
}

/// Cursor-relative motions an operator can apply over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    Word,
    WordEnd,
    WordBack,
    Line,
    LineEnd,
    LineStart,
    FirstNonBlank,
    Paragraph,
    ParagraphBack,
    DocumentEnd,
    DocumentStart,
}

impl Motion {
    /// Linewise motions cover whole lines when used with an operator.
    pub fn is_linewise(self) -> bool {
        matches!(
            self,
            Motion::Line
                | Motion::Paragraph
                | Motion::ParagraphBack
                | Motion::DocumentEnd
                | Motion::DocumentStart
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Motion::Word => "word",
            Motion::WordEnd => "wordEnd",
            Motion::WordBack => "wordBack",
            Motion::Line => "line",
            Motion::LineEnd => "lineEnd",
            Motion::LineStart => "lineStart",
            Motion::FirstNonBlank => "firstNonBlank",
            Motion::Paragraph => "paragraph",
            Motion::ParagraphBack => "paragraphBack",
            Motion::DocumentEnd => "documentEnd",
            Motion::DocumentStart => "documentStart",
        }
    }

    /// Accepts both the long name and the single-key mnemonic.
    pub fn parse(s: &str) -> Option<Motion> {
        let m = match s {
            "word" | "w" => Motion::Word,
            "wordEnd" | "e" => Motion::WordEnd,
            "wordBack" | "b" => Motion::WordBack,
            "line" | "l" => Motion::Line,
            "lineEnd" | "$" => Motion::LineEnd,
            "lineStart" | "0" => Motion::LineStart,
            "firstNonBlank" | "^" => Motion::FirstNonBlank,
            "paragraph" | "}" => Motion::Paragraph,
            "paragraphBack" | "{" => Motion::ParagraphBack,
            "documentEnd" | "G" => Motion::DocumentEnd,
            "documentStart" | "gg" => Motion::DocumentStart,
            _ => return None,
        };
        Some(m)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextObjectKind {
    Word,
    /// WORD: any run of non-whitespace.
    BigWord,
    Sentence,
    Paragraph,
    Quote(char),
    Paren,
    Bracket,
    Brace,
    Angle,
    /// Simplification: tags resolve like angle brackets.
    Tag,
}

/// A text object reference: the semantic unit plus the inner/around flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextObject {
    pub kind: TextObjectKind,
    pub around: bool,
}

impl TextObject {
    pub fn inner(kind: TextObjectKind) -> Self {
        Self { kind, around: false }
    }

    pub fn around(kind: TextObjectKind) -> Self {
        Self { kind, around: true }
    }

    /// Map an object mnemonic key to its kind (`w`, `s`, `p`, quotes,
    /// bracket pairs, `t`).
    pub fn kind_for_key(c: char) -> Option<TextObjectKind> {
        let kind = match c {
            'w' => TextObjectKind::Word,
            'W' => TextObjectKind::BigWord,
            's' => TextObjectKind::Sentence,
            'p' => TextObjectKind::Paragraph,
            '"' | '\'' | '`' => TextObjectKind::Quote(c),
            '(' | ')' | 'b' => TextObjectKind::Paren,
            '[' | ']' => TextObjectKind::Bracket,
            '{' | '}' | 'B' => TextObjectKind::Brace,
            '<' | '>' => TextObjectKind::Angle,
            't' => TextObjectKind::Tag,
            _ => return None,
        };
        Some(kind)
    }
}

/// Optional arguments carried by an action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionArgs {
    pub text: Option<String>,
    pub register: Option<char>,
    pub motion: Option<Motion>,
    pub text_object: Option<TextObject>,
    pub extra: HashMap<String, Value>,
}

impl ActionArgs {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn motion(motion: Motion) -> Self {
        Self {
            motion: Some(motion),
            ..Self::default()
        }
    }

    pub fn text_object(obj: TextObject) -> Self {
        Self {
            text_object: Some(obj),
            ..Self::default()
        }
    }
}

/// One dispatchable unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// `namespace.verb`; see [`is_valid_action_name`].
    pub name: String,
    pub args: ActionArgs,
    /// 0 means "no count given"; handlers treat that as 1.
    pub count: i32,
    pub source: ActionSource,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: ActionArgs::default(),
            count: 0,
            source: ActionSource::Keyboard,
        }
    }

    pub fn with_args(mut self, args: ActionArgs) -> Self {
        self.args = args;
        self
    }

    pub fn with_count(mut self, count: i32) -> Self {
        self.count = count;
        self
    }

    pub fn with_register(mut self, register: char) -> Self {
        self.args.register = Some(register);
        self
    }

    pub fn with_source(mut self, source: ActionSource) -> Self {
        self.source = source;
        self
    }

    /// Effective repetition count (counts below 1 collapse to 1).
    pub fn effective_count(&self) -> usize {
        self.count.max(1) as usize
    }

    pub fn namespace(&self) -> &str {
        split_action_name(&self.name).map(|(ns, _)| ns).unwrap_or("")
    }
}

/// `^[a-z][a-z0-9]*\.[a-zA-Z][a-zA-Z0-9]*$`, checked without a regex engine.
pub fn is_valid_action_name(name: &str) -> bool {
    let Some((ns, verb)) = name.split_once('.') else {
        return false;
    };
    let mut ns_chars = ns.chars();
    let ns_ok = matches!(ns_chars.next(), Some(c) if c.is_ascii_lowercase())
        && ns_chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    let mut verb_chars = verb.chars();
    let verb_ok = matches!(verb_chars.next(), Some(c) if c.is_ascii_alphabetic())
        && verb_chars.all(|c| c.is_ascii_alphanumeric());
    ns_ok && verb_ok
}

/// Split `namespace.verb`; `None` when the name does not match the grammar.
pub fn split_action_name(name: &str) -> Option<(&str, &str)> {
    if is_valid_action_name(name) {
        name.split_once('.')
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_grammar() {
        for good in ["editor.insertText", "operator.delete", "mode.openAbove", "f2.x"] {
            assert!(is_valid_action_name(good), "{good} should be valid");
        }
        for bad in [
            "Editor.insert",
            "editor.",
            ".insert",
            "editor",
            "editor.insert.text",
            "editor.1bad",
            "ed itor.x",
            "",
        ] {
            assert!(!is_valid_action_name(bad), "{bad} should be invalid");
        }
    }

    #[test]
    fn split_names() {
        assert_eq!(
            split_action_name("editor.insertText"),
            Some(("editor", "insertText"))
        );
        assert_eq!(split_action_name("bogus"), None);
    }

    #[test]
    fn effective_count_floors_at_one() {
        assert_eq!(Action::new("cursor.moveDown").effective_count(), 1);
        assert_eq!(
            Action::new("cursor.moveDown").with_count(3).effective_count(),
            3
        );
        assert_eq!(
            Action::new("cursor.moveDown").with_count(-2).effective_count(),
            1
        );
    }

    #[test]
    fn motion_parse_accepts_mnemonics() {
        assert_eq!(Motion::parse("w"), Some(Motion::Word));
        assert_eq!(Motion::parse("word"), Some(Motion::Word));
        assert_eq!(Motion::parse("gg"), Some(Motion::DocumentStart));
        assert_eq!(Motion::parse("zz"), None);
        assert!(Motion::Line.is_linewise());
        assert!(!Motion::WordEnd.is_linewise());
    }

    #[test]
    fn text_object_keys() {
        assert_eq!(TextObject::kind_for_key('b'), Some(TextObjectKind::Paren));
        assert_eq!(
            TextObject::kind_for_key('"'),
            Some(TextObjectKind::Quote('"'))
        );
        assert_eq!(TextObject::kind_for_key('q'), None);
    }
}
