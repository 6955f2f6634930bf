//! Prediction streaming: request types, the completion source seam, the
//! event-stream decoder and the single-flight client that feeds the editor.

mod client;
mod http;
pub mod sse;

pub use client::{PredictionStreamClient, TaggedEvent};
pub use http::HttpCompletionSource;

use futures::channel::mpsc;
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::error::Result;

/// Body POSTed to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub text: String,
    #[serde(flatten)]
    pub context: RequestContext,
}

impl CompletionRequest {
    pub fn new(text: impl Into<String>, context: RequestContext) -> Self {
        Self {
            text: text.into(),
            context,
        }
    }
}

/// Events emitted while a completion streams in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    TextDelta(String),
    Done,
    Error(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error(_))
    }
}

/// Where completions come from. Implementations open one streamed
/// completion per call and stop producing once the receiver is dropped.
#[async_trait::async_trait]
pub trait CompletionSource: Send + Sync {
    async fn stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<mpsc::UnboundedReceiver<StreamEvent>>;
}
