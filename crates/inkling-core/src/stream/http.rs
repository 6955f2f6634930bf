use std::time::Duration;

use futures::channel::mpsc;

use super::sse::{SseDecoder, SseFrame};
use super::{CompletionRequest, CompletionSource, StreamEvent};
use crate::config::Settings;
use crate::error::{InklingError, Result};

/// Completion source backed by an HTTP endpoint answering with an
/// event stream.
pub struct HttpCompletionSource {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpCompletionSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(settings.endpoint.connect_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            url: settings.endpoint.url.clone(),
            api_key: settings.api_key(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Forward a decoded frame. Returns false once the stream is over or the
/// receiver is gone.
fn forward(tx: &mpsc::UnboundedSender<StreamEvent>, frame: SseFrame) -> bool {
    match frame {
        SseFrame::Delta(text) => tx.unbounded_send(StreamEvent::TextDelta(text)).is_ok(),
        SseFrame::Done => {
            let _ = tx.unbounded_send(StreamEvent::Done);
            false
        }
    }
}

#[async_trait::async_trait]
impl CompletionSource for HttpCompletionSource {
    async fn stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<mpsc::UnboundedReceiver<StreamEvent>> {
        let mut builder = self
            .client
            .post(&self.url)
            .header("Accept", "text/event-stream")
            .json(request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(InklingError::status(status, text));
        }

        let (tx, rx) = mpsc::unbounded();

        let mut stream = response.bytes_stream();
        tokio::spawn(async move {
            use futures::StreamExt;
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.unbounded_send(StreamEvent::Error(e.to_string()));
                        return;
                    }
                };

                for frame in decoder.push(&chunk) {
                    if !forward(&tx, frame) {
                        return;
                    }
                }
                // Receiver dropped: the request was superseded.
                if tx.is_closed() {
                    return;
                }
            }

            for frame in decoder.finish() {
                if !forward(&tx, frame) {
                    return;
                }
            }
            let _ = tx.unbounded_send(StreamEvent::Done);
        });

        Ok(rx)
    }
}
