use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{CompletionRequest, CompletionSource, StreamEvent};
use crate::config::PredictionSettings;
use crate::context::{tail_chars, RequestContext};

/// A stream event labelled with the request generation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedEvent {
    pub generation: u64,
    pub event: StreamEvent,
}

/// Single-flight prediction requests.
///
/// Every request bumps the generation and aborts the task serving the
/// previous one, so at most one completion is in flight. Events already
/// queued from an older generation are recognised as stale by
/// [`PredictionStreamClient::is_current`].
pub struct PredictionStreamClient {
    source: Arc<dyn CompletionSource>,
    events: mpsc::UnboundedSender<TaggedEvent>,
    settings: PredictionSettings,
    generation: u64,
    active: Option<JoinHandle<()>>,
}

impl PredictionStreamClient {
    pub fn new(
        source: Arc<dyn CompletionSource>,
        events: mpsc::UnboundedSender<TaggedEvent>,
        settings: PredictionSettings,
    ) -> Self {
        Self {
            source,
            events,
            settings,
            generation: 0,
            active: None,
        }
    }

    /// Whether an event from `generation` still belongs to the live request.
    pub fn is_current(&self, generation: u64) -> bool {
        self.active.is_some() && generation == self.generation
    }

    /// Request a prediction for `source_text`. Returns the new generation,
    /// or `None` when the text is too short to be worth completing.
    pub fn request_prediction(
        &mut self,
        source_text: &str,
        context: &RequestContext,
    ) -> Option<u64> {
        self.cancel();
        if source_text.trim().chars().count() < self.settings.min_source_chars {
            tracing::debug!("Source text below minimum length, no prediction requested");
            return None;
        }
        let text = tail_chars(source_text, self.settings.context_chars);
        Some(self.start(CompletionRequest::new(text, context.clone())))
    }

    fn start(&mut self, request: CompletionRequest) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let source = Arc::clone(&self.source);
        let tx = self.events.clone();

        tracing::info!(generation, chars = request.text.chars().count(), "Requesting prediction");

        let handle = tokio::spawn(async move {
            let mut rx = match source.stream(&request).await {
                Ok(rx) => rx,
                Err(e) => {
                    let _ = tx.send(TaggedEvent {
                        generation,
                        event: StreamEvent::Error(e.to_string()),
                    });
                    return;
                }
            };

            while let Some(event) = rx.next().await {
                let terminal = event.is_terminal();
                if tx.send(TaggedEvent { generation, event }).is_err() || terminal {
                    return;
                }
            }
            // Producer went away without an explicit end marker.
            let _ = tx.send(TaggedEvent {
                generation,
                event: StreamEvent::Done,
            });
        });

        self.active = Some(handle);
        generation
    }

    /// Abort the in-flight request, if any. Silent by contract: no event is
    /// emitted for an aborted request.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.abort();
            tracing::debug!(generation = self.generation, "Aborted in-flight prediction");
        }
    }

    /// Mark `generation` finished after its terminal event was consumed.
    pub fn finish(&mut self, generation: u64) {
        if generation == self.generation {
            self.active = None;
        }
    }
}

impl Drop for PredictionStreamClient {
    fn drop(&mut self) {
        self.cancel();
    }
}
