//! Request context: opaque identifiers that collaborators attach to a
//! completion request, plus the document-tail trimming applied to the
//! source text before it is sent.

use serde::{Deserialize, Serialize};

/// Identifiers furnished by the surrounding application (a session and any
/// "anchor" documents that contribute extra system instructions server-side).
/// The engine never interprets them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchor_ids: Vec<String>,
}

impl RequestContext {
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_anchor(mut self, anchor_id: impl Into<String>) -> Self {
        self.anchor_ids.push(anchor_id.into());
        self
    }
}

/// Keep the last `max_chars` characters of `text`.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    let skip = total - max_chars;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_chars_short_text_untouched() {
        assert_eq!(tail_chars("hello", 10), "hello");
    }

    #[test]
    fn test_tail_chars_respects_char_boundaries() {
        assert_eq!(tail_chars("héllo wörld", 5), "wörld");
        assert_eq!(tail_chars("abc", 0), "");
    }

    #[test]
    fn test_context_builder() {
        let ctx = RequestContext::default()
            .with_session("s-1")
            .with_anchor("a-1")
            .with_anchor("a-2");
        assert_eq!(ctx.session_id.as_deref(), Some("s-1"));
        assert_eq!(ctx.anchor_ids, vec!["a-1", "a-2"]);
    }
}
