//! The editing surface with its ghost text attached.
//!
//! [`Editor`] wires the document, the current prediction, the renderer, the
//! interaction controller and the committer together. It is synchronous:
//! anything that needs the network or a timer is reported back as
//! [`Effects`] for the runtime to carry out.

use crate::commit::{AcceptanceCommitter, CommitOutcome};
use crate::config::Settings;
use crate::document::{DocumentView, StyledRun};
use crate::geometry::{OffsetResolver, Point};
use crate::interaction::{InteractionController, InteractionEvent, InteractionMode};
use crate::prediction::Prediction;
use crate::render::InlineRenderer;

/// Follow-up work an editor operation asks of its driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effects {
    /// The host should suppress the event's default action.
    pub consumed: bool,
    /// Abort the in-flight completion.
    pub cancel_stream: bool,
    /// Restart the debounce countdown.
    pub schedule_prediction: bool,
    pub outcome: Option<CommitOutcome>,
}

/// Point-in-time view of the editor, published to hosts after each step.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub document: String,
    pub prediction: String,
    pub streaming: bool,
    pub mode: InteractionMode,
    pub highlight: Option<(usize, usize)>,
    pub confirm_enabled: bool,
    pub runs: Vec<StyledRun>,
    /// Screen center of each prediction char, in order.
    pub glyph_centers: Vec<Point>,
}

pub struct Editor<D: DocumentView> {
    doc: D,
    prediction: Prediction,
    renderer: InlineRenderer,
    controller: InteractionController,
    committer: AcceptanceCommitter,
}

impl<D: DocumentView> Editor<D> {
    pub fn new(doc: D, settings: &Settings) -> Self {
        Self {
            doc,
            prediction: Prediction::new(),
            renderer: InlineRenderer::new(settings.prediction.reveal_stagger()),
            controller: InteractionController::new(),
            committer: AcceptanceCommitter::new(),
        }
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn into_document(self) -> D {
        self.doc
    }

    pub fn prediction(&self) -> &Prediction {
        &self.prediction
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn renderer(&self) -> &InlineRenderer {
        &self.renderer
    }

    pub fn serialize(&self) -> String {
        self.doc.serialize()
    }

    /// Native typing at the caret.
    pub fn type_text(&mut self, text: &str) -> Effects {
        self.doc.insert_at_caret(text);
        self.input_changed()
    }

    /// The document changed under us. The ghost text no longer fits, so it
    /// goes away and a new prediction is scheduled.
    pub fn input_changed(&mut self) -> Effects {
        self.dismiss();
        Effects {
            cancel_stream: true,
            schedule_prediction: true,
            ..Effects::default()
        }
    }

    pub fn load_text(&mut self, text: &str) -> Effects {
        self.dismiss();
        self.doc.load_text(text);
        Effects {
            cancel_stream: true,
            ..Effects::default()
        }
    }

    /// Start collecting a fresh prediction at the caret. The overlay is only
    /// created once the first delta arrives.
    pub fn begin_prediction(&mut self) {
        self.dismiss();
        self.renderer.set_anchor(self.doc.caret());
        self.prediction.begin_stream();
    }

    /// Feed one streamed delta. Returns false when no stream is active.
    pub fn apply_delta(&mut self, delta: &str) -> bool {
        if !self.prediction.push_delta(delta) {
            tracing::debug!("Dropped delta for inactive prediction");
            return false;
        }
        if self.prediction.is_empty() {
            return true;
        }
        self.renderer.insert(&mut self.doc);
        self.redraw();
        true
    }

    pub fn finish_prediction(&mut self) {
        if !self.prediction.is_streaming() {
            return;
        }
        self.prediction.finish_stream();
        if self.prediction.is_empty() {
            self.renderer.remove(&mut self.doc, &mut self.prediction);
        } else {
            self.redraw();
        }
    }

    /// The stream failed: no ghost text this cycle.
    pub fn fail_prediction(&mut self, message: &str) {
        tracing::warn!("Prediction stream failed: {}", message);
        self.dismiss();
    }

    /// Route a pointer or key event through the interaction controller and
    /// apply whatever it decides.
    pub fn handle(&mut self, event: InteractionEvent) -> Effects {
        let reaction = {
            let probe = OffsetResolver::new(&self.doc);
            self.controller
                .handle(event, &probe, self.prediction.text())
        };

        let mut effects = Effects {
            consumed: reaction.consumed,
            ..Effects::default()
        };

        if reaction.dismiss {
            self.dismiss();
            effects.cancel_stream = true;
            return effects;
        }

        if let Some((start, end)) = reaction.commit {
            let outcome = self.committer.commit(
                &mut self.doc,
                &mut self.renderer,
                &mut self.prediction,
                start,
                end,
            );
            match outcome {
                CommitOutcome::Ignored => {
                    if reaction.redraw {
                        self.redraw();
                    }
                }
                CommitOutcome::Partial => {
                    self.controller.reset_offsets();
                    self.redraw();
                    effects.cancel_stream = true;
                }
                CommitOutcome::Completed => {
                    self.controller.reset();
                    effects.cancel_stream = true;
                    effects.schedule_prediction = true;
                }
            }
            effects.outcome = Some(outcome);
            return effects;
        }

        if reaction.redraw {
            self.redraw();
        }
        effects
    }

    pub fn snapshot(&self) -> Snapshot {
        let runs = self.doc.overlay_runs().to_vec();
        let glyph_centers = self
            .doc
            .overlay_char_rects()
            .into_iter()
            .flatten()
            .map(|rect| rect.center())
            .collect();

        Snapshot {
            document: self.doc.serialize(),
            prediction: self.prediction.text().to_string(),
            streaming: self.prediction.is_streaming(),
            mode: self.controller.mode(),
            highlight: self.controller.highlight(self.prediction.text()),
            confirm_enabled: self.controller.confirm_enabled(),
            runs,
            glyph_centers,
        }
    }

    fn dismiss(&mut self) {
        self.renderer.remove(&mut self.doc, &mut self.prediction);
        self.controller.reset();
    }

    fn redraw(&mut self) {
        if !self.doc.overlay_attached() {
            return;
        }
        let highlight = self.controller.highlight(self.prediction.text());
        self.renderer.render(
            &mut self.doc,
            self.prediction.text(),
            highlight,
            self.controller.in_select_mode(),
            self.prediction.is_streaming(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocPosition, RunStyle, VirtualDocument};
    use crate::interaction::{Key, PointerInfo};

    fn editor_with(text: &str) -> Editor<VirtualDocument> {
        let settings = Settings::default();
        let doc = VirtualDocument::with_text(text, settings.layout.clone());
        Editor::new(doc, &settings)
    }

    fn stream(editor: &mut Editor<VirtualDocument>, deltas: &[&str]) {
        editor.begin_prediction();
        for d in deltas {
            editor.apply_delta(d);
        }
    }

    #[test]
    fn test_overlay_created_on_first_delta() {
        let mut editor = editor_with("The sun was setting ");
        editor.begin_prediction();
        assert!(!editor.document().overlay_attached());
        editor.apply_delta("Golden");
        assert!(editor.document().overlay_attached());
        editor.apply_delta(" light");
        assert_eq!(editor.document().overlay_text(), "Golden light");
        assert!(editor
            .document()
            .overlay_runs()
            .iter()
            .all(|r| r.style == RunStyle::Reveal));
    }

    #[test]
    fn test_finish_settles_runs() {
        let mut editor = editor_with("The sun ");
        stream(&mut editor, &["Golden", " light"]);
        editor.finish_prediction();
        assert_eq!(
            editor.document().overlay_runs(),
            &[StyledRun::new("Golden light", RunStyle::Remain)]
        );
        assert!(!editor.apply_delta(" late"));
    }

    #[test]
    fn test_empty_stream_leaves_no_overlay() {
        let mut editor = editor_with("The sun ");
        editor.begin_prediction();
        editor.finish_prediction();
        assert!(!editor.document().overlay_attached());
    }

    #[test]
    fn test_typing_dismisses_and_schedules() {
        let mut editor = editor_with("The sun ");
        stream(&mut editor, &["Golden"]);
        let effects = editor.type_text("x");
        assert!(effects.cancel_stream);
        assert!(effects.schedule_prediction);
        assert!(!editor.document().overlay_attached());
        assert!(editor.prediction().is_empty());
        assert_eq!(editor.serialize(), "The sun x");
    }

    #[test]
    fn test_tab_accepts_everything() {
        let mut editor = editor_with("The sun ");
        stream(&mut editor, &["Golden light"]);
        editor.finish_prediction();
        let effects = editor.handle(InteractionEvent::Key(Key::Tab));
        assert!(effects.consumed);
        assert_eq!(effects.outcome, Some(CommitOutcome::Completed));
        assert!(effects.schedule_prediction);
        assert_eq!(editor.serialize(), "The sun Golden light ");
        assert_eq!(editor.document().input_events(), 1);
    }

    #[test]
    fn test_escape_dismisses() {
        let mut editor = editor_with("The sun ");
        stream(&mut editor, &["Golden light"]);
        let effects = editor.handle(InteractionEvent::Key(Key::Escape));
        assert!(effects.cancel_stream);
        assert!(!editor.document().overlay_attached());
        assert_eq!(editor.serialize(), "The sun ");
    }

    #[test]
    fn test_click_accepts_exact_native_selection() {
        let mut editor = editor_with("The sun ");
        stream(&mut editor, &["Golden light poured"]);
        editor.finish_prediction();
        editor.document_mut().set_selection(
            DocPosition::Overlay { run: 0, offset: 12 },
            DocPosition::Overlay { run: 0, offset: 7 },
        );
        let center = editor.snapshot().glyph_centers[0];
        let effects = editor.handle(InteractionEvent::PointerUp(PointerInfo::mouse(center)));
        assert_eq!(effects.outcome, Some(CommitOutcome::Partial));
        assert_eq!(editor.serialize(), "The sun light ");
        assert_eq!(editor.prediction().text(), "poured");
        assert_eq!(editor.document().overlay_text(), "poured");
    }

    #[test]
    fn test_snapshot_tracks_glyphs() {
        let mut editor = editor_with("The sun ");
        stream(&mut editor, &["Golden"]);
        let snap = editor.snapshot();
        assert_eq!(snap.prediction, "Golden");
        assert!(snap.streaming);
        assert_eq!(snap.glyph_centers.len(), 6);
        assert_eq!(snap.mode, InteractionMode::Normal);

        // Hovering the first glyph highlights "Golden".
        editor.handle(InteractionEvent::PointerMove(PointerInfo::mouse(
            snap.glyph_centers[0],
        )));
        assert_eq!(editor.snapshot().highlight, Some((0, 6)));
    }
}
