//! Built-in keymap: Vim-flavored defaults over the core action families.
//!
//! Hosts start from this map and layer their own bindings on top (later
//! bindings shadow earlier ones). Operator composition uses the
//! `operator-pending` layer: motions and text objects there resolve to the
//! internal `operator.motion` / `operator.textObject` sentinels which the
//! input front-end folds into the pending operator.

use crate::{Binding, Keymap, Predicate, layer};
use core_events::{ActionArgs, KeyEvent, Motion, TextObject, parse_sequence};

fn seq(keys: &str) -> Vec<KeyEvent> {
    parse_sequence(keys).expect("default keymap key sequence")
}

fn bind(km: &mut Keymap, mode: &str, keys: &str, action: &str) {
    km.bind(mode, Binding::new(seq(keys), action))
        .expect("default keymap binding");
}

fn bind_args(km: &mut Keymap, mode: &str, keys: &str, action: &str, args: ActionArgs) {
    km.bind(mode, Binding::new(seq(keys), action).with_args(args))
        .expect("default keymap binding");
}

fn bind_when(km: &mut Keymap, mode: &str, keys: &str, action: &str, when: &str) {
    km.bind(
        mode,
        Binding::new(seq(keys), action).with_when(Predicate::parse(when).expect("default keymap predicate")),
    )
    .expect("default keymap binding");
}

fn bind_motions(km: &mut Keymap, mode: &str) {
    for (keys, action) in [
        ("h", "cursor.moveLeft"),
        ("l", "cursor.moveRight"),
        ("j", "cursor.moveDown"),
        ("k", "cursor.moveUp"),
        ("<Left>", "cursor.moveLeft"),
        ("<Right>", "cursor.moveRight"),
        ("<Down>", "cursor.moveDown"),
        ("<Up>", "cursor.moveUp"),
        ("w", "cursor.wordForward"),
        ("b", "cursor.wordBack"),
        ("e", "cursor.wordEnd"),
        ("0", "cursor.lineStart"),
        ("<Home>", "cursor.lineStart"),
        ("$", "cursor.lineEnd"),
        ("<End>", "cursor.lineEnd"),
        ("^", "cursor.firstNonBlank"),
        ("G", "cursor.documentEnd"),
        ("g g", "cursor.documentStart"),
        ("}", "cursor.paragraphForward"),
        ("{", "cursor.paragraphBack"),
    ] {
        bind(km, mode, keys, action);
    }
}

/// The stock keymap.
pub fn default_keymap() -> Keymap {
    let mut km = Keymap::new();

    // ---- normal ---------------------------------------------------------
    let n = layer::NORMAL;
    bind_motions(&mut km, n);
    for (keys, action) in [
        ("i", "mode.insert"),
        ("a", "mode.append"),
        ("A", "mode.appendLine"),
        ("I", "mode.insertLineStart"),
        ("o", "mode.openBelow"),
        ("O", "mode.openAbove"),
        ("R", "mode.replace"),
        (":", "mode.command"),
        ("v", "mode.visual"),
        ("V", "mode.visualLine"),
        ("<C-v>", "mode.visualBlock"),
        ("<Esc>", "mode.normal"),
        ("d", "operator.delete"),
        ("y", "operator.yank"),
        ("c", "operator.change"),
        (">", "operator.indent"),
        ("<lt>", "operator.outdent"),
        ("g u", "operator.lowercase"),
        ("g U", "operator.uppercase"),
        ("g ~", "operator.toggleCase"),
        ("g q", "operator.format"),
        ("x", "editor.deleteChar"),
        ("X", "editor.deleteCharBack"),
        ("D", "editor.deleteToEnd"),
        ("p", "editor.pasteAfter"),
        ("P", "editor.pasteBefore"),
        ("u", "editor.undo"),
        ("<C-r>", "editor.redo"),
        (".", "editor.repeatLast"),
        ("n", "search.next"),
        ("N", "search.prev"),
    ] {
        bind(&mut km, n, keys, action);
    }
    bind_args(
        &mut km,
        n,
        "C",
        "operator.change",
        ActionArgs::motion(Motion::LineEnd),
    );
    // Macro recording: `q` alone stops, `q <reg>` starts. The predicates keep
    // exactly one of the two shapes live at a time so `q` fires immediately
    // while recording.
    bind_when(&mut km, n, "q", "macro.stopRecord", "macroRecording");
    for reg in 'a'..='z' {
        km.bind(
            n,
            Binding::new(
                vec![KeyEvent::rune('q'), KeyEvent::rune(reg)],
                "macro.startRecord",
            )
            .with_args(ActionArgs {
                register: Some(reg),
                ..ActionArgs::default()
            })
            .with_when(Predicate::parse("!macroRecording").expect("default keymap predicate")),
        )
        .expect("default keymap binding");
        km.bind(
            n,
            Binding::new(vec![KeyEvent::rune('@'), KeyEvent::rune(reg)], "macro.play").with_args(
                ActionArgs {
                    register: Some(reg),
                    ..ActionArgs::default()
                },
            ),
        )
        .expect("default keymap binding");
    }
    bind(&mut km, n, "@ @", "macro.playLast");

    // ---- visual layers --------------------------------------------------
    for v in [layer::VISUAL, layer::VISUAL_LINE, layer::VISUAL_BLOCK] {
        bind_motions(&mut km, v);
        for (keys, action) in [
            ("<Esc>", "mode.normal"),
            ("v", "mode.normal"),
            ("V", "mode.visualLine"),
            ("<C-v>", "mode.visualBlock"),
            ("d", "operator.delete"),
            ("x", "operator.delete"),
            ("y", "operator.yank"),
            ("c", "operator.change"),
            (">", "operator.indent"),
            ("<lt>", "operator.outdent"),
            ("u", "operator.lowercase"),
            ("U", "operator.uppercase"),
            ("~", "operator.toggleCase"),
            ("p", "editor.pasteAfter"),
        ] {
            bind(&mut km, v, keys, action);
        }
    }

    // ---- operator-pending ----------------------------------------------
    let op = layer::OPERATOR_PENDING;
    bind(&mut km, op, "<Esc>", "mode.normal");
    for (keys, motion) in [
        ("w", Motion::Word),
        ("e", Motion::WordEnd),
        ("b", Motion::WordBack),
        ("$", Motion::LineEnd),
        ("<End>", Motion::LineEnd),
        ("0", Motion::LineStart),
        ("<Home>", Motion::LineStart),
        ("^", Motion::FirstNonBlank),
        ("}", Motion::Paragraph),
        ("{", Motion::ParagraphBack),
        ("G", Motion::DocumentEnd),
        ("g g", Motion::DocumentStart),
    ] {
        bind_args(&mut km, op, keys, "operator.motion", ActionArgs::motion(motion));
    }
    // Doubled operator key selects whole lines (`d d`, `y y`, …).
    for (keys, operator) in [
        ("d", "operator.delete"),
        ("y", "operator.yank"),
        ("c", "operator.change"),
        (">", "operator.indent"),
        ("<lt>", "operator.outdent"),
    ] {
        km.bind(
            op,
            Binding::new(seq(keys), "operator.motion")
                .with_args(ActionArgs::motion(Motion::Line))
                .with_when(
                    Predicate::parse(&format!("pendingOperator == {operator}"))
                        .expect("default keymap predicate"),
                ),
        )
        .expect("default keymap binding");
    }
    // Text objects: `i`/`a` + object key.
    for key in [
        'w', 'W', 's', 'p', 'b', 'B', 't', '(', ')', '[', ']', '{', '}', '<', '>', '"', '\'', '`',
    ] {
        let kind = TextObject::kind_for_key(key).expect("default keymap object key");
        for (prefix, around) in [('i', false), ('a', true)] {
            km.bind(
                op,
                Binding::new(
                    vec![KeyEvent::rune(prefix), KeyEvent::rune(key)],
                    "operator.textObject",
                )
                .with_args(ActionArgs::text_object(TextObject { kind, around })),
            )
            .expect("default keymap binding");
        }
    }

    // ---- insert ---------------------------------------------------------
    let ins = layer::INSERT;
    for (keys, action) in [
        ("<Esc>", "mode.normal"),
        ("<CR>", "editor.insertNewline"),
        ("<BS>", "editor.deleteCharBack"),
        ("<Del>", "editor.deleteChar"),
        ("<Tab>", "editor.insertTab"),
        ("<Left>", "cursor.moveLeft"),
        ("<Right>", "cursor.moveRight"),
        ("<Up>", "cursor.moveUp"),
        ("<Down>", "cursor.moveDown"),
        ("<Home>", "cursor.lineStart"),
        ("<End>", "cursor.lineEnd"),
    ] {
        bind(&mut km, ins, keys, action);
    }

    // ---- replace --------------------------------------------------------
    let rep = layer::REPLACE;
    for (keys, action) in [
        ("<Esc>", "mode.normal"),
        ("<BS>", "cursor.moveLeft"),
        ("<Left>", "cursor.moveLeft"),
        ("<Right>", "cursor.moveRight"),
        ("<Up>", "cursor.moveUp"),
        ("<Down>", "cursor.moveDown"),
    ] {
        bind(&mut km, rep, keys, action);
    }

    // ---- command --------------------------------------------------------
    bind(&mut km, layer::COMMAND, "<Esc>", "mode.normal");

    km
}
