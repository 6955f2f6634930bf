//! Offset ↔ screen geometry for the prediction overlay.
//!
//! `OffsetResolver` turns pointer coordinates into char offsets inside the
//! overlay text. It prefers the document's caret-from-point support and falls
//! back to probing per-character rectangles when that is unavailable or lands
//! outside the overlay.

use crate::document::{DocPosition, DocumentView};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Edges are inclusive so a point on the boundary between two adjacent
    /// glyphs hits both.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }
}

/// Maps between screen points and char offsets within the overlay.
pub struct OffsetResolver<'a, D: DocumentView + ?Sized> {
    doc: &'a D,
}

impl<'a, D: DocumentView + ?Sized> OffsetResolver<'a, D> {
    pub fn new(doc: &'a D) -> Self {
        Self { doc }
    }

    pub fn document(&self) -> &'a D {
        self.doc
    }

    /// Total char length of the text currently shown in the overlay.
    pub fn overlay_len(&self) -> usize {
        self.doc
            .overlay_runs()
            .iter()
            .map(|r| r.text.chars().count())
            .sum()
    }

    /// Char offset within the overlay for `point`, or `None` when nothing in
    /// the overlay can be resolved (e.g. the overlay is empty).
    pub fn point_to_offset(&self, point: Point) -> Option<usize> {
        if !self.doc.overlay_attached() {
            return None;
        }
        if let Some(offset) = self
            .doc
            .caret_position_from_point(point)
            .and_then(|pos| self.position_to_offset(pos))
        {
            return Some(offset.min(self.overlay_len()));
        }
        self.probe_nearest(point)
    }

    /// Measure the overlay text from its start up to `pos`. `None` for
    /// positions outside the overlay.
    pub fn position_to_offset(&self, pos: DocPosition) -> Option<usize> {
        let DocPosition::Overlay { run, offset } = pos else {
            return None;
        };
        let runs = self.doc.overlay_runs();
        let target = runs.get(run)?;
        let before: usize = runs[..run].iter().map(|r| r.text.chars().count()).sum();
        Some(before + offset.min(target.text.chars().count()))
    }

    /// Rectangle probe: the char whose center is nearest to `point`, then the
    /// caret side of that char the point falls on. Yields offsets in
    /// `0..=len` so it agrees with the caret-from-point path.
    fn probe_nearest(&self, point: Point) -> Option<usize> {
        let rects = self.doc.overlay_char_rects();
        let len = rects.len();
        let (index, rect) = rects
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.filter(Rect::has_area).map(|r| (i, r)))
            .min_by(|(_, a), (_, b)| {
                a.center()
                    .distance(point)
                    .total_cmp(&b.center().distance(point))
            })?;
        let after = usize::from(point.x >= rect.center().x);
        Some((index + after).min(len))
    }

    pub fn is_point_within_prediction(&self, point: Point) -> bool {
        self.doc.overlay_attached()
            && self
                .doc
                .overlay_client_rects()
                .iter()
                .any(|r| r.contains(point))
    }

    /// The live native selection as prediction offsets, when both ends lie
    /// inside the overlay and the span is non-empty.
    pub fn selection_span(&self) -> Option<(usize, usize)> {
        let (anchor, focus) = self.doc.native_selection()?;
        let a = self.position_to_offset(anchor)?;
        let b = self.position_to_offset(focus)?;
        (a != b).then_some((a, b))
    }
}
