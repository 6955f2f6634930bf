//! Decoder for the completion endpoint's event-stream framing.
//!
//! Frames are lines of the form `data: <json>` or `data: [DONE]`. Each JSON
//! frame carries a text delta at `choices[0].delta.content`. Anything else is
//! skipped.

use serde_json::Value;

use crate::constants::sse::{DATA_PREFIX, DONE_SENTINEL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    Delta(String),
    Done,
}

/// Incremental line decoder. Bytes are buffered until a full line is
/// available, so frames split across network chunks (including in the middle
/// of a multi-byte char) decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one chunk and return every complete frame it finished.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            self.decode_line(&line, &mut frames);
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        frames
    }

    /// Flush a trailing line left without a newline when the transport closes.
    pub fn finish(&mut self) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.decode_line(&line, &mut frames);
        }
        frames
    }

    fn decode_line(&mut self, raw: &[u8], frames: &mut Vec<SseFrame>) {
        if self.done {
            return;
        }
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let Some(data) = line.strip_prefix(DATA_PREFIX) else {
            return;
        };
        let data = data.trim_start();
        if data == DONE_SENTINEL {
            self.done = true;
            frames.push(SseFrame::Done);
            return;
        }
        if let Some(delta) = parse_delta(data) {
            if !delta.is_empty() {
                frames.push(SseFrame::Delta(delta));
            }
        }
    }
}

/// Extract `choices[0].delta.content` from one JSON frame.
pub fn parse_delta(data: &str) -> Option<String> {
    let event: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("Skipping malformed stream frame: {e}");
            return None;
        }
    };
    event
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({ "choices": [{ "delta": { "content": content } }] })
        )
    }

    #[test]
    fn test_decodes_deltas_and_done() {
        let mut decoder = SseDecoder::new();
        let payload = format!("{}{}data: [DONE]\n\n", frame("Golden"), frame(" light"));
        let frames = decoder.push(payload.as_bytes());
        assert_eq!(
            frames,
            vec![
                SseFrame::Delta("Golden".into()),
                SseFrame::Delta(" light".into()),
                SseFrame::Done,
            ]
        );
        assert!(decoder.is_done());
    }

    #[test]
    fn test_frame_split_across_chunks_and_utf8() {
        let mut decoder = SseDecoder::new();
        let payload = frame("café");
        let bytes = payload.as_bytes();
        // Split inside the two-byte 'é'.
        let cut = payload.find('é').unwrap() + 1;
        assert!(decoder.push(&bytes[..cut]).is_empty());
        assert_eq!(decoder.push(&bytes[cut..]), vec![SseFrame::Delta("café".into())]);
    }

    #[test]
    fn test_malformed_and_foreign_lines_are_skipped() {
        let mut decoder = SseDecoder::new();
        let payload = format!(
            ": keep-alive\nevent: ping\ndata: {{not json\ndata: {{\"choices\":[]}}\n{}",
            frame("ok")
        );
        assert_eq!(decoder.push(payload.as_bytes()), vec![SseFrame::Delta("ok".into())]);
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        let payload = frame("tail");
        let trimmed = payload.trim_end();
        assert!(decoder.push(trimmed.as_bytes()).is_empty());
        assert_eq!(decoder.finish(), vec![SseFrame::Delta("tail".into())]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_nothing_after_done() {
        let mut decoder = SseDecoder::new();
        let payload = format!("data: [DONE]\n{}", frame("late"));
        assert_eq!(decoder.push(payload.as_bytes()), vec![SseFrame::Done]);
        assert!(decoder.push(frame("later").as_bytes()).is_empty());
    }

    #[test]
    fn test_data_prefix_without_space() {
        assert_eq!(
            parse_delta(r#"{"choices":[{"delta":{"content":"x"}}]}"#),
            Some("x".to_string())
        );
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"data:{\"choices\":[{\"delta\":{\"content\":\"y\"}}]}\n");
        assert_eq!(frames, vec![SseFrame::Delta("y".into())]);
    }
}
