//! Selections and the multi-cursor set.
//!
//! A selection is an `(anchor, head)` byte-offset pair, half-open on the
//! right; `anchor == head` is a bare cursor. The cursor set keeps an ordered
//! sequence of selections with the primary at index 0 and enforces two
//! invariants on every replace: the set is never empty, and no two
//! selections overlap (touching at one offset is allowed).

use core_text::Edit;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    /// The caret end.
    pub head: usize,
}

impl Selection {
    pub fn cursor(at: usize) -> Self {
        Self { anchor: at, head: at }
    }

    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn range(&self) -> (usize, usize) {
        (self.start(), self.end())
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    pub fn is_reversed(&self) -> bool {
        self.head < self.anchor
    }

    pub fn collapsed_to_start(&self) -> Self {
        Self::cursor(self.start())
    }

    pub fn with_head(&self, head: usize) -> Self {
        Self {
            anchor: self.anchor,
            head,
        }
    }
}

/// Offset adjustment produced by one already-applied edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDelta {
    pub start: usize,
    pub removed: usize,
    pub inserted: usize,
}

impl EditDelta {
    pub fn of(edit: &Edit) -> Self {
        Self {
            start: edit.start,
            removed: edit.old_text.len(),
            inserted: edit.new_text.len(),
        }
    }

    /// Map a pre-edit offset into post-edit coordinates. Offsets inside the
    /// removed span clamp to its start; an offset exactly at a pure
    /// insertion point moves past the inserted text.
    pub fn adjust(&self, offset: usize) -> usize {
        if offset < self.start {
            offset
        } else if offset >= self.start + self.removed {
            offset - self.removed + self.inserted
        } else {
            self.start
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("cursor set cannot be empty")]
    Empty,
}

/// Ordered selection set with interior locking. `all` hands out a snapshot
/// and `set_all` replaces wholesale, so callers never iterate under the
/// lock.
pub struct CursorSet {
    inner: Mutex<Vec<Selection>>,
}

impl Default for CursorSet {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorSet {
    /// Single cursor at offset 0.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(vec![Selection::cursor(0)]),
        }
    }

    pub fn with(primary: Selection) -> Self {
        Self {
            inner: Mutex::new(vec![primary]),
        }
    }

    /// Snapshot of all selections, primary first.
    pub fn all(&self) -> Vec<Selection> {
        self.inner.lock().expect("cursor lock poisoned").clone()
    }

    pub fn primary(&self) -> Selection {
        self.inner.lock().expect("cursor lock poisoned")[0]
    }

    pub fn count(&self) -> usize {
        self.inner.lock().expect("cursor lock poisoned").len()
    }

    /// Replace every selection. Overlapping selections are merged (union
    /// range, earliest anchor, latest head; a merger of two reversed
    /// selections stays reversed). The result is ordered by start offset.
    pub fn set_all(&self, selections: Vec<Selection>) -> Result<(), SelectionError> {
        if selections.is_empty() {
            return Err(SelectionError::Empty);
        }
        let merged = merge_overlapping(selections);
        *self.inner.lock().expect("cursor lock poisoned") = merged;
        Ok(())
    }

    /// Collapse to the primary selection only.
    pub fn collapse_to_primary(&self) {
        let mut guard = self.inner.lock().expect("cursor lock poisoned");
        let primary = guard[0];
        *guard = vec![primary];
    }

    /// Shift every selection through the offset deltas of already-applied
    /// edits, then re-merge. Deltas must be in application order.
    pub fn apply_deltas(&self, deltas: &[EditDelta]) {
        let mut sels = self.all();
        for sel in &mut sels {
            for d in deltas {
                sel.anchor = d.adjust(sel.anchor);
                sel.head = d.adjust(sel.head);
            }
        }
        // Non-empty input stays non-empty through merging.
        let _ = self.set_all(sels);
    }
}

fn merge_two(a: Selection, b: Selection) -> Selection {
    if a.is_reversed() && b.is_reversed() {
        Selection::new(a.anchor.max(b.anchor), a.head.min(b.head))
    } else {
        Selection::new(a.anchor.min(b.anchor), a.head.max(b.head))
    }
}

fn merge_overlapping(mut sels: Vec<Selection>) -> Vec<Selection> {
    sels.sort_by_key(|s| (s.start(), s.end()));
    let mut out: Vec<Selection> = Vec::with_capacity(sels.len());
    for sel in sels {
        match out.last_mut() {
            // Strict overlap only: touching at a single offset stays split,
            // but two bare cursors on the same offset collapse into one.
            Some(prev) if sel.start() < prev.end() || sel == *prev => {
                *prev = merge_two(*prev, sel)
            }
            _ => out.push(sel),
        }
    }
    out
}
