//! The inline ghost-text renderer.
//!
//! Owns the overlay's lifecycle (lazy creation, attachment at the prediction
//! anchor, removal) and turns the prediction plus the current highlight into
//! styled runs: a full three-segment redraw, or append-only growth with a
//! staggered reveal while a stream is arriving.

use std::ops::Range;
use std::time::Duration;

use crate::document::{Caret, DocumentView, RunStyle, StyledRun};
use crate::prediction::Prediction;
use crate::segment::{char_slice, normalize_range};

/// Char ranges of the three overlay segments. Contiguous and
/// non-overlapping, together covering the whole prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments {
    pub pre: Range<usize>,
    pub accept: Range<usize>,
    pub remain: Range<usize>,
}

/// Split a prediction of `len` chars around the highlighted range.
pub fn segments(len: usize, highlight: Option<(usize, usize)>) -> Segments {
    match highlight {
        Some((a, b)) => {
            let (a, b) = normalize_range(a.min(len), b.min(len));
            Segments {
                pre: 0..a,
                accept: a..b,
                remain: b..len,
            }
        }
        None => Segments {
            pre: 0..0,
            accept: 0..0,
            remain: 0..len,
        },
    }
}

#[derive(Debug, Clone)]
pub struct InlineRenderer {
    anchor: Option<Caret>,
    rendered: String,
    reveal_stagger: Duration,
}

impl InlineRenderer {
    pub fn new(reveal_stagger: Duration) -> Self {
        Self {
            anchor: None,
            rendered: String::new(),
            reveal_stagger,
        }
    }

    pub fn anchor(&self) -> Option<Caret> {
        self.anchor
    }

    /// Record where the overlay belongs. Called right before a request is
    /// issued and after a partial commit.
    pub fn set_anchor(&mut self, caret: Caret) {
        self.anchor = Some(caret);
    }

    /// Attach the overlay at the anchor (or the caret when no anchor is
    /// recorded) unless it is already in the document.
    pub fn insert<D: DocumentView + ?Sized>(&mut self, doc: &mut D) {
        if doc.overlay_attached() {
            return;
        }
        let at = self.anchor.unwrap_or_else(|| doc.caret());
        doc.attach_overlay(at);
        self.anchor = Some(at);
        self.rendered.clear();
    }

    /// Detach the overlay and forget the prediction. Idempotent.
    pub fn remove<D: DocumentView + ?Sized>(&mut self, doc: &mut D, prediction: &mut Prediction) {
        doc.detach_overlay();
        prediction.clear();
        self.anchor = None;
        self.rendered.clear();
    }

    /// Draw `text` into the overlay.
    ///
    /// Streaming growth is only used while nothing is highlighted and SELECT
    /// mode is off; any highlight needs the exact three-segment layout.
    pub fn render<D: DocumentView + ?Sized>(
        &mut self,
        doc: &mut D,
        text: &str,
        highlight: Option<(usize, usize)>,
        select_active: bool,
        streaming: bool,
    ) {
        if !doc.overlay_attached() {
            return;
        }
        if streaming && highlight.is_none() && !select_active {
            self.append_streamed(doc, text);
        } else {
            self.redraw(doc, text, highlight);
        }
    }

    fn redraw<D: DocumentView + ?Sized>(
        &mut self,
        doc: &mut D,
        text: &str,
        highlight: Option<(usize, usize)>,
    ) {
        let len = text.chars().count();
        let seg = segments(len, highlight);
        let runs = [
            (seg.pre, RunStyle::Pre),
            (seg.accept, RunStyle::Accept),
            (seg.remain, RunStyle::Remain),
        ]
        .into_iter()
        .filter(|(range, _)| !range.is_empty())
        .map(|(range, style)| StyledRun::new(char_slice(text, range.start, range.end), style))
        .collect();
        doc.set_overlay_runs(runs);
        self.rendered = text.to_string();
    }

    fn append_streamed<D: DocumentView + ?Sized>(&mut self, doc: &mut D, text: &str) {
        let fresh = match text.strip_prefix(self.rendered.as_str()) {
            Some(rest) if doc.overlay_text() == self.rendered => rest,
            _ => {
                // Stream restarted or was cleared under us.
                doc.set_overlay_runs(Vec::new());
                text
            }
        };
        for (i, ch) in fresh.chars().enumerate() {
            let delay = self.reveal_stagger * i as u32;
            doc.append_overlay_run(StyledRun::reveal(ch.to_string(), delay));
        }
        self.rendered = text.to_string();
    }
}
