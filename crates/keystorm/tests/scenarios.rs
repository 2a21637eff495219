//! End-to-end scenarios: raw keystrokes (or a single action) in, buffer +
//! mode + register state out.

use core_events::TextObjectKind;
use core_state::{RegisterContent, Selection};
use core_text::{BufferEngine, EngineReader};
use keystorm::{Action, ActionArgs, Editor, ModeId, Motion, Redraw, TextObject};
use pretty_assertions::assert_eq;

#[test]
fn insert_hi_from_normal_mode() {
    let mut ed = Editor::new("");
    ed.feed_keys("i h i <Esc>").unwrap();
    assert_eq!(ed.text(), "hi");
    assert_eq!(ed.mode(), ModeId::Normal);
    assert_eq!(ed.model().cursors.primary(), Selection::cursor(2));
}

#[test]
fn delete_word_forward() {
    let mut ed = Editor::new("foo bar baz");
    let result = ed.dispatch(
        Action::new("operator.delete")
            .with_args(ActionArgs::motion(Motion::Word))
            .with_count(1),
    );
    assert!(result.is_ok());
    assert_eq!(ed.text(), "bar baz");
    assert_eq!(ed.model().cursors.primary(), Selection::cursor(0));
    let reg = ed.model().registers.read('"').unwrap();
    assert_eq!(reg.text, "foo ");
    assert!(!reg.linewise);
}

#[test]
fn delete_word_forward_via_keys() {
    let mut ed = Editor::new("foo bar baz");
    ed.feed_keys("d w").unwrap();
    assert_eq!(ed.text(), "bar baz");
    assert_eq!(ed.mode(), ModeId::Normal);
}

#[test]
fn change_inside_parens() {
    let mut ed = Editor::new("call(alpha, beta)");
    // Caret on the comma after "alpha".
    ed.model_mut()
        .cursors
        .set_all(vec![Selection::cursor(10)])
        .unwrap();
    let result = ed.dispatch(
        Action::new("operator.change").with_args(ActionArgs::text_object(TextObject::inner(
            TextObjectKind::Paren,
        ))),
    );
    assert!(result.is_ok());
    assert_eq!(ed.text(), "call()");
    assert_eq!(ed.mode(), ModeId::Insert);
    assert_eq!(ed.model().registers.read('"').unwrap().text, "alpha, beta");
    assert_eq!(ed.model().cursors.primary(), Selection::cursor(5));
}

#[test]
fn change_inside_parens_via_keys() {
    let mut ed = Editor::new("call(alpha, beta)");
    ed.model_mut()
        .cursors
        .set_all(vec![Selection::cursor(10)])
        .unwrap();
    ed.feed_keys("c i b").unwrap();
    assert_eq!(ed.text(), "call()");
    assert_eq!(ed.mode(), ModeId::Insert);
}

#[test]
fn indent_two_lines_with_two_cursors() {
    let mut ed = Editor::new("foo\nbar");
    ed.model_mut()
        .cursors
        .set_all(vec![Selection::cursor(0), Selection::cursor(4)])
        .unwrap();
    let result = ed.dispatch(Action::new("editor.indent").with_count(1));
    assert!(result.is_ok());
    assert_eq!(ed.text(), "    foo\n    bar");
    assert_eq!(
        ed.model().cursors.all(),
        vec![Selection::cursor(4), Selection::cursor(12)],
        "cursors shift right by the inserted bytes"
    );
    assert_eq!(result.redraw, Redraw::lines([0, 1]));
}

#[test]
fn macro_record_and_replay_with_count() {
    let mut ed = Editor::new("l0\nl1\nl2\nl3\nl4\nl5");
    ed.feed_keys("q a j q").unwrap();
    let after_recording = ed
        .model()
        .engine()
        .offset_to_point(ed.model().cursors.primary().head)
        .unwrap();
    assert_eq!(after_recording.line, 1, "recording itself moved one line");
    let recorded = ed.model().macros.get('a').unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].name, "cursor.moveDown");

    ed.feed_keys("3 @ a").unwrap();
    let after_replay = ed
        .model()
        .engine()
        .offset_to_point(ed.model().cursors.primary().head)
        .unwrap();
    assert_eq!(after_replay.line, 4, "replay with count 3 moves three lines lower");
}

#[test]
fn paste_linewise_after_last_line_without_trailing_newline() {
    let mut ed = Editor::new("abc");
    ed.model_mut()
        .cursors
        .set_all(vec![Selection::cursor(3)])
        .unwrap();
    ed.model_mut()
        .registers
        .write('"', RegisterContent::linewise("xyz\n"))
        .unwrap();
    let result = ed.dispatch(Action::new("editor.pasteAfter").with_count(1));
    assert!(result.is_ok());
    assert_eq!(ed.text(), "abc\nxyz\n");
    assert_eq!(
        ed.model().cursors.primary(),
        Selection::cursor(4),
        "cursor at the start of the pasted line"
    );
}

#[test]
fn visual_selection_delete_via_keys() {
    let mut ed = Editor::new("foo bar baz");
    ed.feed_keys("v w d").unwrap();
    assert_eq!(ed.text(), "bar baz");
    assert_eq!(ed.mode(), ModeId::Normal);
}

#[test]
fn counts_multiply_through_operators() {
    let mut ed = Editor::new("a1 a2 a3 a4 a5 a6 a7");
    ed.feed_keys("2 d 3 w").unwrap();
    assert_eq!(ed.text(), "a7");
}

#[test]
fn doubled_operator_deletes_line() {
    let mut ed = Editor::new("one\ntwo\nthree");
    ed.feed_keys("j d d").unwrap();
    assert_eq!(ed.text(), "one\nthree");
    let reg = ed.model().registers.read('"').unwrap();
    assert_eq!(reg.text, "two\n");
    assert!(reg.linewise);
}

#[test]
fn undo_redo_round_trip_via_keys() {
    let mut ed = Editor::new("stable ");
    ed.model_mut()
        .cursors
        .set_all(vec![Selection::cursor(7)])
        .unwrap();
    ed.feed_keys("i m o r e <Esc>").unwrap();
    assert_eq!(ed.text(), "stable more");
    ed.feed_keys("u u u u").unwrap();
    assert_eq!(ed.text(), "stable ");
    ed.feed_keys("<C-r>").unwrap();
    assert!(ed.text().starts_with("stable m"));
}

#[test]
fn named_register_yank_then_paste() {
    let mut ed = Editor::new("keep this line\n");
    ed.feed_keys("\" a y y").unwrap();
    assert_eq!(ed.model().registers.read('a').unwrap().text, "keep this line\n");
    ed.feed_keys("\" a p").unwrap();
    assert_eq!(ed.text(), "keep this line\nkeep this line\n");
}

#[test]
fn read_only_buffer_blocks_edits_but_not_motion() {
    let mut ed = Editor::new("abc def");
    ed.model_mut().engine_mut().set_read_only(true);
    let results = ed.feed_keys("x").unwrap();
    assert_eq!(results[0].status, keystorm::Status::NoOp, "guard cancels");
    assert_eq!(ed.text(), "abc def");
    ed.feed_keys("w").unwrap();
    assert_eq!(ed.model().cursors.primary().head, 4, "motion still works");
}

#[test]
fn every_result_upholds_selection_invariants() {
    let mut ed = Editor::new("alpha βeta γamma\nsecond line\n");
    for keys in [
        "w", "d w", "i x <Esc>", "V d", "3 l", "y y", "p", "g g", "G", "u",
    ] {
        ed.feed_keys(keys).unwrap();
        ed.model().validate_selections().unwrap_or_else(|e| {
            panic!("invariant broken after {keys:?}: {e}");
        });
    }
}
