use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::Settings;
use crate::context::RequestContext;
use crate::debounce::Debouncer;
use crate::document::DocumentView;
use crate::editor::{Editor, Effects, Snapshot};
use crate::interaction::InteractionEvent;
use crate::stream::{CompletionSource, PredictionStreamClient, StreamEvent, TaggedEvent};

/// Input from the host surface.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Native typing at the caret.
    Type(String),
    /// The host changed the document by other means.
    Input,
    Interaction(InteractionEvent),
    /// Replace the document wholesale.
    Load(String),
    Shutdown,
}

/// Owns an [`Editor`] on a single task and drives it from host events,
/// the debounce deadline and the completion stream.
pub struct EditorRuntime<D: DocumentView> {
    editor: Editor<D>,
    client: PredictionStreamClient,
    debouncer: Debouncer,
    context: RequestContext,
    stream_rx: mpsc::UnboundedReceiver<TaggedEvent>,
    observer: Option<mpsc::UnboundedSender<Snapshot>>,
}

impl<D: DocumentView> EditorRuntime<D> {
    pub fn new(editor: Editor<D>, source: Arc<dyn CompletionSource>, settings: &Settings) -> Self {
        let (stream_tx, stream_rx) = mpsc::unbounded_channel();
        Self {
            editor,
            client: PredictionStreamClient::new(source, stream_tx, settings.prediction.clone()),
            debouncer: Debouncer::new(settings.prediction.debounce()),
            context: settings.request_context(),
            stream_rx,
            observer: None,
        }
    }

    /// Publish a [`Snapshot`] after every handled event.
    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<Snapshot>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    pub fn editor(&self) -> &Editor<D> {
        &self.editor
    }

    /// Run until `Shutdown` or until every UI sender is dropped. Hands the
    /// editor back so the caller can inspect or persist the document.
    pub async fn run(mut self, mut ui_rx: mpsc::UnboundedReceiver<UiEvent>) -> Editor<D> {
        self.publish();
        loop {
            tokio::select! {
                event = ui_rx.recv() => {
                    match event {
                        Some(UiEvent::Shutdown) | None => break,
                        Some(event) => self.on_ui(event),
                    }
                }
                Some(tagged) = self.stream_rx.recv() => {
                    self.on_stream(tagged);
                }
                _ = tokio::time::sleep_until(self.debouncer.deadline()), if self.debouncer.is_armed() => {
                    self.debouncer.cancel();
                    self.fire();
                }
            }
            self.publish();
        }
        self.client.cancel();
        self.editor
    }

    fn on_ui(&mut self, event: UiEvent) {
        let effects = match event {
            UiEvent::Type(text) => self.editor.type_text(&text),
            UiEvent::Input => self.editor.input_changed(),
            UiEvent::Interaction(event) => self.editor.handle(event),
            UiEvent::Load(text) => self.editor.load_text(&text),
            UiEvent::Shutdown => return,
        };
        self.apply(effects);
    }

    fn apply(&mut self, effects: Effects) {
        if effects.cancel_stream {
            self.client.cancel();
        }
        if effects.schedule_prediction {
            self.debouncer.arm();
        }
    }

    /// Debounce elapsed: request a completion for the document as it is now.
    fn fire(&mut self) {
        let text = self.editor.serialize();
        if self.client.request_prediction(&text, &self.context).is_some() {
            self.editor.begin_prediction();
        }
    }

    fn on_stream(&mut self, tagged: TaggedEvent) {
        if !self.client.is_current(tagged.generation) || !self.editor.prediction().is_streaming() {
            tracing::debug!(generation = tagged.generation, "Ignoring stale stream event");
            return;
        }
        match tagged.event {
            StreamEvent::TextDelta(delta) => {
                self.editor.apply_delta(&delta);
            }
            StreamEvent::Done => {
                self.client.finish(tagged.generation);
                self.editor.finish_prediction();
                tracing::info!(generation = tagged.generation, "Prediction complete");
            }
            StreamEvent::Error(message) => {
                self.client.finish(tagged.generation);
                self.editor.fail_prediction(&message);
            }
        }
    }

    fn publish(&self) {
        if let Some(ref observer) = self.observer {
            let _ = observer.send(self.editor.snapshot());
        }
    }
}
