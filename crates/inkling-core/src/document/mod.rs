//! The editable document as seen by the prediction engine.
//!
//! The engine never walks a concrete tree. Everything it needs from the host
//! surface (plain-text serialization, the overlay node, caret handling and the
//! geometry used for hit testing) goes through [`DocumentView`].

mod virtual_doc;

pub use virtual_doc::{Node, VirtualDocument};

use std::time::Duration;

use crate::geometry::{Point, Rect};

/// A collapsed caret position measured in document units. The overlay has
/// no width in this space: the positions immediately before and after it
/// are the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Caret(pub usize);

/// A resolved position from hit testing: either a document caret or a char
/// offset inside one of the overlay's runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocPosition {
    Document(Caret),
    Overlay { run: usize, offset: usize },
}

/// Visual role of an overlay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStyle {
    /// Prediction text before the accept-candidate.
    Pre,
    /// The span that would be committed if the user acted now.
    Accept,
    /// Everything after the accept-candidate.
    Remain,
    /// A streamed character still fading in.
    Reveal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub text: String,
    pub style: RunStyle,
    pub reveal_delay: Option<Duration>,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
            reveal_delay: None,
        }
    }

    pub fn reveal(text: impl Into<String>, delay: Duration) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::Reveal,
            reveal_delay: Some(delay),
        }
    }
}

/// Host surface the engine renders into.
///
/// Implementations own the document content, the single non-editable
/// overlay node and the layout that backs hit testing.
pub trait DocumentView {
    /// Plain text of the document with block children joined by newlines.
    /// The overlay is never part of the output.
    fn serialize(&self) -> String;

    /// Replace the whole document, e.g. when a saved document is loaded.
    /// Detaches the overlay.
    fn load_text(&mut self, text: &str);

    /// Native typing at the caret. Text typed right at the overlay lands
    /// before it.
    fn insert_at_caret(&mut self, text: &str);

    fn caret(&self) -> Caret;

    fn set_caret(&mut self, caret: Caret);

    fn overlay_attached(&self) -> bool;

    /// Insert the overlay at `at`. No-op when already attached.
    fn attach_overlay(&mut self, at: Caret);

    /// Remove the overlay and its runs. Safe to call when detached.
    fn detach_overlay(&mut self);

    /// Where the overlay sits, when attached.
    fn overlay_position(&self) -> Option<Caret>;

    fn overlay_runs(&self) -> &[StyledRun];

    /// Full redraw of the overlay content.
    fn set_overlay_runs(&mut self, runs: Vec<StyledRun>);

    /// Append-only growth used while streaming.
    fn append_overlay_run(&mut self, run: StyledRun);

    /// Insert `text` as a new plain text node right before the overlay and
    /// return the caret position immediately after it. `None` when the
    /// overlay is detached.
    fn insert_text_before_overlay(&mut self, text: &str) -> Option<Caret>;

    /// Fire a synthetic input notification, as if the user had typed.
    fn dispatch_input(&mut self);

    /// Platform caret-from-point. `None` when unsupported or unresolvable.
    fn caret_position_from_point(&self, point: Point) -> Option<DocPosition>;

    /// Box of the `index`-th char of overlay run `run`.
    fn overlay_char_rect(&self, run: usize, index: usize) -> Option<Rect>;

    /// Boxes of every overlay char in prediction order, one entry per char.
    /// Layout-backed views should override this to measure once.
    fn overlay_char_rects(&self) -> Vec<Option<Rect>> {
        self.overlay_runs()
            .iter()
            .enumerate()
            .flat_map(|(run, r)| (0..r.text.chars().count()).map(move |i| (run, i)))
            .map(|(run, i)| self.overlay_char_rect(run, i))
            .collect()
    }

    /// One rectangle per line box spanned by the overlay content.
    fn overlay_client_rects(&self) -> Vec<Rect>;

    /// The live native text selection as (anchor, focus), if any.
    fn native_selection(&self) -> Option<(DocPosition, DocPosition)>;

    fn caret_before_overlay(&self) -> bool {
        self.overlay_position() == Some(self.caret())
    }

    fn overlay_text(&self) -> String {
        self.overlay_runs().iter().map(|r| r.text.as_str()).collect()
    }
}
