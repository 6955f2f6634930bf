//! Word and range segmentation over prediction text.
//!
//! All offsets are char offsets (Unicode scalar values), never byte indices.

/// A word located around an offset: `start..end` in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
}

impl WordSpan {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Find the run of non-whitespace chars touching `offset`.
///
/// Scans left while the preceding char is not whitespace and right while the
/// current char is not whitespace. Returns `None` when `offset` is past the
/// end of `text`. An offset sitting between two spaces yields an empty span.
pub fn word_boundaries(text: &str, offset: usize) -> Option<WordSpan> {
    let chars: Vec<char> = text.chars().collect();
    if offset > chars.len() {
        return None;
    }

    let mut start = offset;
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }

    let mut end = offset;
    while end < chars.len() && !chars[end].is_whitespace() {
        end += 1;
    }

    Some(WordSpan { start, end })
}

/// Order two raw endpoints into a half-open `[min, max)` range.
pub fn normalize_range(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Slice `text` by char offsets, clamping both ends to the text length.
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |n: usize| {
        text.char_indices()
            .nth(n)
            .map(|(idx, _)| idx)
            .unwrap_or(text.len())
    };
    let (start, end) = normalize_range(start, end);
    &text[byte_at(start)..byte_at(end)]
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREDICTION: &str = "Golden light poured across the fields";

    #[test]
    fn test_word_inside_light() {
        let span = word_boundaries(PREDICTION, 7).unwrap();
        assert_eq!(span, WordSpan { start: 7, end: 12 });
        assert_eq!(char_slice(PREDICTION, span.start, span.end), "light");
    }

    #[test]
    fn test_word_at_text_edges() {
        assert_eq!(word_boundaries(PREDICTION, 0), Some(WordSpan { start: 0, end: 6 }));
        let len = char_len(PREDICTION);
        let span = word_boundaries(PREDICTION, len).unwrap();
        assert_eq!(span, WordSpan { start: 31, end: 37 });
        assert!(span.end <= len);
        assert_eq!(char_slice(PREDICTION, span.start, span.end), "fields");
        assert_eq!(word_boundaries(PREDICTION, len + 1), None);
    }

    #[test]
    fn test_offset_at_word_end_extends_left() {
        // Offset 6 is the space after "Golden": nothing to the right, word to the left.
        assert_eq!(word_boundaries(PREDICTION, 6), Some(WordSpan { start: 0, end: 6 }));
    }

    #[test]
    fn test_between_spaces_is_empty() {
        let span = word_boundaries("a  b", 2).unwrap();
        assert!(span.is_empty());
    }

    #[test]
    fn test_unicode_whitespace_and_wide_chars() {
        let text = "naïve\u{00A0}café";
        assert_eq!(word_boundaries(text, 2), Some(WordSpan { start: 0, end: 5 }));
        assert_eq!(word_boundaries(text, 7), Some(WordSpan { start: 6, end: 10 }));
    }

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize_range(39, 13), (13, 39));
        assert_eq!(normalize_range(4, 4), (4, 4));
    }

    #[test]
    fn test_char_slice_clamps() {
        assert_eq!(char_slice("héllo", 1, 99), "éllo");
        assert_eq!(char_slice("héllo", 3, 1), "él");
    }
}
