//! Per-mode interpretation of keys the keymap did not claim.

use crate::front_end::Pending;
use core_events::{Action, ActionArgs, KeyEvent, NamedKey};
use core_state::ModeId;
use tracing::trace;

/// Interpret one unmapped event for the current mode, possibly producing an
/// action.
pub(crate) fn handle(st: &mut Pending, event: KeyEvent, out: &mut Vec<Action>) {
    match st.mode {
        // Literal runes become buffer text.
        ModeId::Insert => {
            if let Some(c) = event.plain_rune() {
                out.push(
                    Action::new("editor.insertText").with_args(ActionArgs::text(c.to_string())),
                );
            }
        }
        // Replace mode overwrites as it types; the handler advances the
        // cursor because the mode says so.
        ModeId::Replace => {
            if let Some(c) = event.plain_rune() {
                out.push(
                    Action::new("editor.replaceChar").with_args(ActionArgs::text(c.to_string())),
                );
            }
        }
        ModeId::Command => {
            let Some(line) = st.command_line.as_mut() else {
                return;
            };
            if let Some(c) = event.plain_rune() {
                line.push(c);
            } else if event.is(NamedKey::Backspace) {
                line.pop();
            } else if event.is(NamedKey::Enter) {
                let line = st.command_line.take().unwrap_or_default();
                st.mode = ModeId::Normal;
                out.push(
                    Action::new("palette.run").with_args(ActionArgs::text(line)),
                );
            }
        }
        ModeId::Normal => {
            // `r` arms the single-rune replace; digits dislodged from a
            // broken sequence still feed the count.
            match event.plain_rune() {
                Some('r') => st.pending_replace = true,
                Some(c) if c.is_ascii_digit() && (c != '0' || st.count > 0) => {
                    let digit = c as i32 - '0' as i32;
                    st.count = st.count.saturating_mul(10).saturating_add(digit).min(999_999);
                }
                _ => {
                    trace!(target: "input.unmapped", key = %event, "ignored in normal mode");
                }
            }
        }
        // An unmapped key cancels the pending operator.
        ModeId::OperatorPending => {
            st.operator = None;
            st.operator_register = None;
            st.post_count = 0;
            st.count = 0;
            st.mode = ModeId::Normal;
            out.push(Action::new("mode.normal"));
        }
        ModeId::Visual | ModeId::VisualLine | ModeId::VisualBlock => {
            trace!(target: "input.unmapped", key = %event, "ignored in visual mode");
        }
    }
}
