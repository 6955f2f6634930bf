use crate::config::LayoutSettings;
use crate::constants::layout::IMAGE_CELLS;
use crate::geometry::{Point, Rect};

use super::{Caret, DocPosition, DocumentView, StyledRun};

/// A child of the in-memory document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    LineBreak,
    Image { alt: String },
}

impl Node {
    /// Width in document units: one per char for text, one for any other
    /// inline element.
    fn units(&self) -> usize {
        match self {
            Node::Text(s) => s.chars().count(),
            Node::LineBreak | Node::Image { .. } => 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    pos: DocPosition,
    rect: Rect,
    line: usize,
}

/// Monospace layout cursor. Wraps to the next line when a cell would cross
/// the column limit.
struct LayoutCursor<'a> {
    settings: &'a LayoutSettings,
    col: usize,
    line: usize,
    glyphs: Vec<Glyph>,
}

impl<'a> LayoutCursor<'a> {
    fn new(settings: &'a LayoutSettings) -> Self {
        Self {
            settings,
            col: 0,
            line: 0,
            glyphs: Vec::new(),
        }
    }

    fn place(&mut self, cells: usize, pos: DocPosition) {
        let columns = self.settings.columns.max(1);
        if self.col > 0 && self.col + cells > columns {
            self.line += 1;
            self.col = 0;
        }
        let rect = Rect::new(
            self.col as f64 * self.settings.char_width,
            self.line as f64 * self.settings.line_height,
            cells as f64 * self.settings.char_width,
            self.settings.line_height,
        );
        self.glyphs.push(Glyph {
            pos,
            rect,
            line: self.line,
        });
        self.col += cells;
    }

    fn line_break(&mut self, pos: DocPosition) {
        let rect = Rect::new(
            self.col as f64 * self.settings.char_width,
            self.line as f64 * self.settings.line_height,
            0.0,
            self.settings.line_height,
        );
        self.glyphs.push(Glyph {
            pos,
            rect,
            line: self.line,
        });
        self.line += 1;
        self.col = 0;
    }
}

/// In-memory [`DocumentView`] with a deterministic monospace layout.
///
/// Used by the CLI host and by tests in place of a rendering surface.
#[derive(Debug, Clone)]
pub struct VirtualDocument {
    nodes: Vec<Node>,
    caret: Caret,
    overlay: Option<Caret>,
    runs: Vec<StyledRun>,
    selection: Option<(DocPosition, DocPosition)>,
    layout: LayoutSettings,
    input_events: usize,
}

impl Default for VirtualDocument {
    fn default() -> Self {
        Self::new(LayoutSettings::default())
    }
}

impl VirtualDocument {
    pub fn new(layout: LayoutSettings) -> Self {
        Self {
            nodes: Vec::new(),
            caret: Caret(0),
            overlay: None,
            runs: Vec::new(),
            selection: None,
            layout,
            input_events: 0,
        }
    }

    pub fn with_text(text: &str, layout: LayoutSettings) -> Self {
        let mut doc = Self::new(layout);
        doc.load_text(text);
        doc
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn text_nodes(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of synthetic input notifications dispatched so far.
    pub fn input_events(&self) -> usize {
        self.input_events
    }

    pub fn len_units(&self) -> usize {
        self.nodes.iter().map(Node::units).sum()
    }

    pub fn insert_image(&mut self, alt: impl Into<String>) {
        let unit = self.caret.0.min(self.len_units());
        let idx = self.split_at(unit);
        self.nodes.insert(idx, Node::Image { alt: alt.into() });
        self.shift_overlay(unit, 1);
        self.caret = Caret(unit + 1);
        self.selection = None;
    }

    pub fn set_selection(&mut self, anchor: DocPosition, focus: DocPosition) {
        self.selection = Some((anchor, focus));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Center of the overlay glyph showing prediction char `offset`.
    pub fn overlay_char_center(&self, offset: usize) -> Option<Point> {
        self.layout_glyphs()
            .into_iter()
            .filter(|g| matches!(g.pos, DocPosition::Overlay { .. }))
            .nth(offset)
            .map(|g| g.rect.center())
    }

    /// Ensure a node boundary at `unit` and return the index a new node
    /// should be inserted at.
    fn split_at(&mut self, unit: usize) -> usize {
        let mut acc = 0;
        for i in 0..self.nodes.len() {
            if acc == unit {
                return i;
            }
            let len = self.nodes[i].units();
            if unit < acc + len {
                if let Node::Text(s) = &mut self.nodes[i] {
                    let byte = byte_index(s, unit - acc);
                    let right = s.split_off(byte);
                    self.nodes.insert(i + 1, Node::Text(right));
                    return i + 1;
                }
            }
            acc += len;
        }
        self.nodes.len()
    }

    /// Insert `text` at `unit`, turning newlines into line breaks. With
    /// `merge`, single-line text joins the text node it touches; otherwise
    /// it becomes its own node. Returns the number of units inserted.
    fn insert_inline(&mut self, unit: usize, text: &str, merge: bool) -> usize {
        let mut parts = Vec::new();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                parts.push(Node::LineBreak);
            }
            if !line.is_empty() {
                parts.push(Node::Text(line.to_string()));
            }
        }
        let inserted: usize = parts.iter().map(Node::units).sum();

        if merge && parts.len() == 1 {
            if let Node::Text(t) = &parts[0] {
                let mut acc = 0;
                for node in self.nodes.iter_mut() {
                    let len = node.units();
                    if let Node::Text(s) = node {
                        if acc <= unit && unit <= acc + len {
                            let byte = byte_index(s, unit - acc);
                            s.insert_str(byte, t);
                            return inserted;
                        }
                    }
                    acc += len;
                }
            }
        }

        let idx = self.split_at(unit);
        self.nodes.splice(idx..idx, parts);
        inserted
    }

    fn shift_overlay(&mut self, unit: usize, by: usize) {
        if let Some(pos) = self.overlay.as_mut() {
            if unit <= pos.0 {
                pos.0 += by;
            }
        }
    }

    fn layout_glyphs(&self) -> Vec<Glyph> {
        let mut cursor = LayoutCursor::new(&self.layout);
        let overlay_at = self.overlay.map(|c| c.0);
        let mut overlay_done = overlay_at.is_none();
        let mut unit = 0;

        let emit_overlay = |cursor: &mut LayoutCursor<'_>| {
            for (run, r) in self.runs.iter().enumerate() {
                for offset in 0..r.text.chars().count() {
                    cursor.place(1, DocPosition::Overlay { run, offset });
                }
            }
        };

        for node in &self.nodes {
            let cells: Vec<(usize, bool)> = match node {
                Node::Text(s) => s.chars().map(|_| (1, false)).collect(),
                Node::LineBreak => vec![(0, true)],
                Node::Image { .. } => vec![(IMAGE_CELLS, false)],
            };
            for (width, is_break) in cells {
                if !overlay_done && overlay_at == Some(unit) {
                    emit_overlay(&mut cursor);
                    overlay_done = true;
                }
                let pos = DocPosition::Document(Caret(unit));
                if is_break {
                    cursor.line_break(pos);
                } else {
                    cursor.place(width, pos);
                }
                unit += 1;
            }
        }
        if !overlay_done {
            emit_overlay(&mut cursor);
        }
        cursor.glyphs
    }
}

impl DocumentView for VirtualDocument {
    fn serialize(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Text(s) => out.push_str(s),
                Node::LineBreak => out.push('\n'),
                Node::Image { .. } => {}
            }
        }
        out
    }

    fn load_text(&mut self, text: &str) {
        self.nodes.clear();
        self.overlay = None;
        self.runs.clear();
        self.selection = None;
        let inserted = self.insert_inline(0, text, false);
        self.caret = Caret(inserted);
    }

    fn insert_at_caret(&mut self, text: &str) {
        let unit = self.caret.0.min(self.len_units());
        let inserted = self.insert_inline(unit, text, true);
        self.shift_overlay(unit, inserted);
        self.caret = Caret(unit + inserted);
        self.selection = None;
    }

    fn caret(&self) -> Caret {
        self.caret
    }

    fn set_caret(&mut self, caret: Caret) {
        self.caret = Caret(caret.0.min(self.len_units()));
        self.selection = None;
    }

    fn overlay_attached(&self) -> bool {
        self.overlay.is_some()
    }

    fn attach_overlay(&mut self, at: Caret) {
        if self.overlay.is_none() {
            self.overlay = Some(Caret(at.0.min(self.len_units())));
        }
    }

    fn detach_overlay(&mut self) {
        self.overlay = None;
        self.runs.clear();
        self.selection = None;
    }

    fn overlay_position(&self) -> Option<Caret> {
        self.overlay
    }

    fn overlay_runs(&self) -> &[StyledRun] {
        &self.runs
    }

    fn set_overlay_runs(&mut self, runs: Vec<StyledRun>) {
        self.runs = runs;
        self.selection = None;
    }

    fn append_overlay_run(&mut self, run: StyledRun) {
        self.runs.push(run);
    }

    fn insert_text_before_overlay(&mut self, text: &str) -> Option<Caret> {
        let at = self.overlay?.0;
        let inserted = self.insert_inline(at, text, false);
        self.shift_overlay(at, inserted);
        self.selection = None;
        self.overlay
    }

    fn dispatch_input(&mut self) {
        self.input_events += 1;
    }

    fn caret_position_from_point(&self, point: Point) -> Option<DocPosition> {
        if !self.layout.native_caret_api || point.y < 0.0 {
            return None;
        }
        let line = (point.y / self.layout.line_height).floor() as usize;
        let glyphs = self.layout_glyphs();
        let best = glyphs
            .iter()
            .filter(|g| g.line == line && g.rect.has_area())
            .min_by(|a, b| {
                let da = (a.rect.center().x - point.x).abs();
                let db = (b.rect.center().x - point.x).abs();
                da.total_cmp(&db)
            })?;

        let after = usize::from(point.x >= best.rect.center().x);
        Some(match best.pos {
            DocPosition::Document(Caret(unit)) => DocPosition::Document(Caret(unit + after)),
            DocPosition::Overlay { run, offset } => DocPosition::Overlay {
                run,
                offset: offset + after,
            },
        })
    }

    fn overlay_char_rect(&self, run: usize, index: usize) -> Option<Rect> {
        let target = DocPosition::Overlay { run, offset: index };
        self.layout_glyphs()
            .into_iter()
            .find(|g| g.pos == target)
            .map(|g| g.rect)
    }

    fn overlay_char_rects(&self) -> Vec<Option<Rect>> {
        self.layout_glyphs()
            .into_iter()
            .filter(|g| matches!(g.pos, DocPosition::Overlay { .. }))
            .map(|g| Some(g.rect))
            .collect()
    }

    fn overlay_client_rects(&self) -> Vec<Rect> {
        let mut rects: Vec<(usize, Rect)> = Vec::new();
        for glyph in self.layout_glyphs() {
            if !matches!(glyph.pos, DocPosition::Overlay { .. }) {
                continue;
            }
            match rects.last_mut() {
                Some((line, rect)) if *line == glyph.line => *rect = rect.union(&glyph.rect),
                _ => rects.push((glyph.line, glyph.rect)),
            }
        }
        rects.into_iter().map(|(_, r)| r).collect()
    }

    fn native_selection(&self) -> Option<(DocPosition, DocPosition)> {
        self.selection
    }
}

fn byte_index(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RunStyle;

    fn layout() -> LayoutSettings {
        LayoutSettings {
            char_width: 10.0,
            line_height: 20.0,
            columns: 40,
            native_caret_api: true,
        }
    }

    fn doc_with_overlay(text: &str, ghost: &str) -> VirtualDocument {
        let mut doc = VirtualDocument::with_text(text, layout());
        let caret = doc.caret();
        doc.attach_overlay(caret);
        doc.set_overlay_runs(vec![StyledRun::new(ghost, RunStyle::Remain)]);
        doc
    }

    #[test]
    fn test_serialize_joins_lines_and_skips_images_and_overlay() {
        let mut doc = VirtualDocument::with_text("first\nsecond", layout());
        doc.insert_image("logo");
        doc.insert_at_caret(" tail");
        doc.attach_overlay(doc.caret());
        doc.set_overlay_runs(vec![StyledRun::new("ghost", RunStyle::Remain)]);
        assert_eq!(doc.serialize(), "first\nsecond tail");
    }

    #[test]
    fn test_typing_at_overlay_lands_before_it() {
        let mut doc = doc_with_overlay("Hello", " world");
        assert!(doc.caret_before_overlay());
        doc.insert_at_caret("!");
        assert_eq!(doc.serialize(), "Hello!");
        assert_eq!(doc.overlay_position(), Some(Caret(6)));
        assert!(doc.caret_before_overlay());
    }

    #[test]
    fn test_insert_before_overlay_creates_own_text_node() {
        let mut doc = doc_with_overlay("The sun ", "was setting");
        let caret = doc.insert_text_before_overlay("was ").unwrap();
        assert_eq!(caret, Caret(12));
        assert_eq!(doc.text_nodes(), vec!["The sun ", "was "]);
        assert_eq!(doc.overlay_position(), Some(Caret(12)));
    }

    #[test]
    fn test_insert_before_overlay_in_middle_splits_text() {
        let mut doc = VirtualDocument::with_text("abcdef", layout());
        doc.attach_overlay(Caret(3));
        doc.insert_text_before_overlay("XY").unwrap();
        assert_eq!(doc.text_nodes(), vec!["abc", "XY", "def"]);
        assert_eq!(doc.serialize(), "abcXYdef");
    }

    #[test]
    fn test_detached_insert_returns_none() {
        let mut doc = VirtualDocument::with_text("abc", layout());
        assert!(doc.insert_text_before_overlay("x").is_none());
        assert_eq!(doc.serialize(), "abc");
    }

    #[test]
    fn test_caret_from_point_inside_overlay() {
        // "Hi" occupies cells 0..2, the overlay starts at cell 2.
        let doc = doc_with_overlay("Hi", "there");
        let pos = doc.caret_position_from_point(Point::new(31.0, 10.0));
        assert_eq!(pos, Some(DocPosition::Overlay { run: 0, offset: 1 }));
        let pos = doc.caret_position_from_point(Point::new(36.0, 10.0));
        assert_eq!(pos, Some(DocPosition::Overlay { run: 0, offset: 2 }));
    }

    #[test]
    fn test_caret_from_point_disabled() {
        let mut settings = layout();
        settings.native_caret_api = false;
        let mut doc = VirtualDocument::with_text("Hi", settings);
        doc.attach_overlay(doc.caret());
        doc.set_overlay_runs(vec![StyledRun::new("there", RunStyle::Remain)]);
        assert!(doc.caret_position_from_point(Point::new(31.0, 10.0)).is_none());
        assert!(doc.overlay_char_rect(0, 0).is_some());
    }

    #[test]
    fn test_overlay_wraps_into_multiple_client_rects() {
        let mut settings = layout();
        settings.columns = 5;
        let mut doc = VirtualDocument::with_text("abc", settings);
        doc.attach_overlay(doc.caret());
        doc.set_overlay_runs(vec![StyledRun::new("defgh", RunStyle::Remain)]);
        let rects = doc.overlay_client_rects();
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0], Rect::new(30.0, 0.0, 20.0, 20.0));
        assert_eq!(rects[1], Rect::new(0.0, 20.0, 30.0, 20.0));
    }

    #[test]
    fn test_overlay_char_rects_match_per_char_lookup() {
        let mut doc = VirtualDocument::with_text("ab\ncd", layout());
        doc.attach_overlay(Caret(3));
        doc.set_overlay_runs(vec![
            StyledRun::new("xy", RunStyle::Pre),
            StyledRun::new("z", RunStyle::Remain),
        ]);
        let rects = doc.overlay_char_rects();
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[0], doc.overlay_char_rect(0, 0));
        assert_eq!(rects[1], doc.overlay_char_rect(0, 1));
        assert_eq!(rects[2], doc.overlay_char_rect(1, 0));
        assert_eq!(rects[0], Some(Rect::new(0.0, 20.0, 10.0, 20.0)));
    }

    #[test]
    fn test_load_text_detaches_overlay() {
        let mut doc = doc_with_overlay("abc", "def");
        doc.load_text("new body");
        assert!(!doc.overlay_attached());
        assert!(doc.overlay_runs().is_empty());
        assert_eq!(doc.caret(), Caret(8));
    }
}
