use crate::segment::char_len;

/// The ghost text currently offered to the user.
///
/// The text only grows while a stream is feeding it. Partial acceptance
/// replaces it wholesale with the unaccepted remainder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prediction {
    text: String,
    streaming: bool,
}

impl Prediction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Start a fresh prediction that a stream will fill.
    pub fn begin_stream(&mut self) {
        self.text.clear();
        self.streaming = true;
    }

    /// Append a streamed delta. Ignored unless a stream is active.
    pub fn push_delta(&mut self, delta: &str) -> bool {
        if !self.streaming {
            return false;
        }
        self.text.push_str(delta);
        true
    }

    pub fn finish_stream(&mut self) {
        self.streaming = false;
    }

    /// Keep only `remainder` after a partial commit. No further deltas are
    /// accepted for this prediction.
    pub fn replace(&mut self, remainder: impl Into<String>) {
        self.text = remainder.into();
        self.streaming = false;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.streaming = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deltas_only_accepted_while_streaming() {
        let mut p = Prediction::new();
        assert!(!p.push_delta("lost"));
        p.begin_stream();
        assert!(p.push_delta("Golden"));
        assert!(p.push_delta(" light"));
        assert_eq!(p.text(), "Golden light");
        p.finish_stream();
        assert!(!p.push_delta(" late"));
        assert_eq!(p.len(), 12);
    }

    #[test]
    fn test_replace_stops_stream() {
        let mut p = Prediction::new();
        p.begin_stream();
        p.push_delta("héllo wörld");
        p.replace("wörld");
        assert!(!p.is_streaming());
        assert_eq!(p.len(), 5);
        p.clear();
        assert!(p.is_empty());
    }
}
