//! Splicing accepted prediction text into the document.

use crate::document::DocumentView;
use crate::prediction::Prediction;
use crate::render::InlineRenderer;
use crate::segment::{char_len, char_slice, normalize_range};

/// What a commit of `[start, end)` would do to the prediction text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPlan {
    /// The normalized char range actually taken, including a swallowed
    /// trailing space.
    pub range: (usize, usize),
    /// Text to insert before the overlay.
    pub inserted: String,
    /// What stays offered afterwards. Empty when the prediction is used up.
    pub remainder: String,
}

/// Plan a commit without touching anything. `None` for an empty range.
pub fn plan(text: &str, start: usize, end: usize) -> Option<CommitPlan> {
    let len = char_len(text);
    let (lo, hi) = normalize_range(start.min(len), end.min(len));
    if text.is_empty() || lo == hi {
        return None;
    }

    // A single space right after the range goes with it.
    let mut hi = hi;
    if hi < len && text.chars().nth(hi) == Some(' ') {
        hi += 1;
    }

    let mut inserted = char_slice(text, lo, hi).to_string();
    if !inserted.ends_with(char::is_whitespace) {
        inserted.push(' ');
    }

    Some(CommitPlan {
        range: (lo, hi),
        inserted,
        remainder: char_slice(text, hi, len).to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing to do: no prediction, no overlay, or an empty range.
    Ignored,
    /// Part of the prediction was accepted; the rest is still on offer.
    Partial,
    /// The prediction was used up and the overlay removed.
    Completed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptanceCommitter;

impl AcceptanceCommitter {
    pub fn new() -> Self {
        Self
    }

    pub fn commit<D: DocumentView + ?Sized>(
        &self,
        doc: &mut D,
        renderer: &mut InlineRenderer,
        prediction: &mut Prediction,
        start: usize,
        end: usize,
    ) -> CommitOutcome {
        if prediction.is_empty() || !doc.overlay_attached() {
            return CommitOutcome::Ignored;
        }
        let Some(plan) = plan(prediction.text(), start, end) else {
            return CommitOutcome::Ignored;
        };
        let Some(caret) = doc.insert_text_before_overlay(&plan.inserted) else {
            return CommitOutcome::Ignored;
        };
        doc.set_caret(caret);

        tracing::debug!(
            from = plan.range.0,
            to = plan.range.1,
            remaining = char_len(&plan.remainder),
            "Committed prediction text"
        );

        if plan.remainder.is_empty() {
            renderer.remove(doc, prediction);
            doc.dispatch_input();
            return CommitOutcome::Completed;
        }

        prediction.replace(plan.remainder);
        renderer.render(doc, prediction.text(), None, false, false);
        if let Some(at) = doc.overlay_position() {
            renderer.set_anchor(at);
        }
        CommitOutcome::Partial
    }
}
