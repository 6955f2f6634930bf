//! Gesture interpretation for the ghost text.
//!
//! One state machine decides what a pointer, touch or key event means given
//! the current mode:
//!
//! - NORMAL: hover highlights the word under the pointer, a click/tap
//!   accepts everything through that word (or exactly a native selection),
//!   Tab accepts everything (or up to the active offset), ArrowRight reveals
//!   one more char.
//! - SELECT: two gesture hits (or one press-drag-release) fix an arbitrary
//!   range which is then committed by an explicit confirm.
//!
//! The controller never touches the document. It reports what should happen
//! through a [`Reaction`] and reads geometry through [`OverlayProbe`].

use crate::document::DocumentView;
use crate::geometry::{OffsetResolver, Point};
use crate::segment::{char_len, normalize_range, word_boundaries};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInfo {
    pub kind: PointerKind,
    /// Secondary pointers (extra fingers, synthetic duplicates) are ignored.
    pub primary: bool,
    pub point: Point,
}

impl PointerInfo {
    pub fn mouse(point: Point) -> Self {
        Self {
            kind: PointerKind::Mouse,
            primary: true,
            point,
        }
    }

    pub fn touch(point: Point) -> Self {
        Self {
            kind: PointerKind::Touch,
            primary: true,
            point,
        }
    }

    /// Touch screens have no hover.
    fn hovers(&self) -> bool {
        self.kind != PointerKind::Touch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    ArrowRight,
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionEvent {
    PointerMove(PointerInfo),
    PointerDown(PointerInfo),
    PointerUp(PointerInfo),
    PointerLeave,
    Key(Key),
    ToggleSelectMode,
    /// The explicit confirm button.
    Confirm,
    /// Leave SELECT mode from outside (focus loss, toolbar).
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Normal,
    Select,
}

/// Progress of a SELECT-mode range that is not fixed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingPhase {
    /// First press is down; `dragged` once it has left the start word.
    FirstPress { dragged: bool },
    /// First hit complete, waiting for the second.
    Released,
    /// Second press is down.
    SecondPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    /// NORMAL mode with the pointer over the word `word_start..offset`.
    Hovering { word_start: usize, offset: usize },
    /// SELECT mode before the first hit; `preview` follows a hovering mouse.
    SelectArmed { preview: Option<usize> },
    SelectPending {
        start: usize,
        preview: usize,
        phase: PendingPhase,
    },
    SelectFixed { start: usize, end: usize },
}

/// What the editor must do in response to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reaction {
    pub redraw: bool,
    /// Raw (unordered) endpoints to commit.
    pub commit: Option<(usize, usize)>,
    /// The host should suppress the event's default action.
    pub consumed: bool,
    /// Drop the current prediction.
    pub dismiss: bool,
}

impl Reaction {
    pub fn none() -> Self {
        Self::default()
    }

    fn redraw() -> Self {
        Self {
            redraw: true,
            consumed: true,
            ..Self::default()
        }
    }

    fn commit(start: usize, end: usize) -> Self {
        Self {
            commit: Some((start, end)),
            consumed: true,
            ..Self::default()
        }
    }
}

/// Geometry queries the controller needs about the overlay.
pub trait OverlayProbe {
    fn offset_at(&self, point: Point) -> Option<usize>;
    fn contains(&self, point: Point) -> bool;
    /// A live, non-empty native selection inside the overlay.
    fn selection_span(&self) -> Option<(usize, usize)>;
    fn caret_before_overlay(&self) -> bool;
}

impl<D: DocumentView + ?Sized> OverlayProbe for OffsetResolver<'_, D> {
    fn offset_at(&self, point: Point) -> Option<usize> {
        self.point_to_offset(point)
    }

    fn contains(&self, point: Point) -> bool {
        self.is_point_within_prediction(point)
    }

    fn selection_span(&self) -> Option<(usize, usize)> {
        OffsetResolver::selection_span(self)
    }

    fn caret_before_overlay(&self) -> bool {
        self.document().caret_before_overlay()
    }
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    state: InteractionState,
    navigation_offset: usize,
    confirm_enabled: bool,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            state: InteractionState::Idle,
            navigation_offset: 0,
            confirm_enabled: false,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn mode(&self) -> InteractionMode {
        match self.state {
            InteractionState::Idle | InteractionState::Hovering { .. } => InteractionMode::Normal,
            _ => InteractionMode::Select,
        }
    }

    pub fn in_select_mode(&self) -> bool {
        self.mode() == InteractionMode::Select
    }

    pub fn navigation_offset(&self) -> usize {
        self.navigation_offset
    }

    pub fn hover_offset(&self) -> usize {
        match self.state {
            InteractionState::Hovering { offset, .. } => offset,
            _ => 0,
        }
    }

    pub fn confirm_enabled(&self) -> bool {
        self.confirm_enabled
    }

    /// The normalized SELECT range, pending or fixed.
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        match self.state {
            InteractionState::SelectPending { start, preview, .. } => {
                Some(normalize_range(start, preview))
            }
            InteractionState::SelectFixed { start, end } => Some(normalize_range(start, end)),
            _ => None,
        }
    }

    /// NORMAL-mode acceptance bound: keyboard navigation wins over hover.
    fn active_offset(&self) -> usize {
        if self.navigation_offset > 0 {
            self.navigation_offset
        } else {
            self.hover_offset()
        }
    }

    /// The span to draw as the accept-candidate, if any.
    pub fn highlight(&self, text: &str) -> Option<(usize, usize)> {
        let range = match self.state {
            InteractionState::SelectArmed { preview: Some(p) } => {
                word_boundaries(text, p).map(|w| (w.start, w.end))
            }
            InteractionState::SelectPending { .. } | InteractionState::SelectFixed { .. } => {
                self.selection_range()
            }
            InteractionState::SelectArmed { preview: None } => None,
            InteractionState::Idle | InteractionState::Hovering { .. } => {
                if self.navigation_offset > 0 {
                    Some((0, self.navigation_offset))
                } else if let InteractionState::Hovering { word_start, offset } = self.state {
                    Some((word_start, offset))
                } else {
                    None
                }
            }
        };
        range.filter(|(a, b)| a != b)
    }

    /// Forget all offsets for a new or shortened prediction, staying in the
    /// current mode.
    pub fn reset_offsets(&mut self) {
        self.navigation_offset = 0;
        self.confirm_enabled = false;
        self.state = match self.mode() {
            InteractionMode::Normal => InteractionState::Idle,
            InteractionMode::Select => InteractionState::SelectArmed { preview: None },
        };
    }

    /// Back to NORMAL with everything cleared.
    pub fn reset(&mut self) {
        self.navigation_offset = 0;
        self.confirm_enabled = false;
        self.state = InteractionState::Idle;
    }

    pub fn handle<P: OverlayProbe + ?Sized>(
        &mut self,
        event: InteractionEvent,
        probe: &P,
        text: &str,
    ) -> Reaction {
        match event {
            InteractionEvent::ToggleSelectMode => {
                if self.in_select_mode() {
                    self.exit_select()
                } else {
                    self.enter_select()
                }
            }
            InteractionEvent::Cancel => {
                if self.in_select_mode() {
                    self.exit_select()
                } else {
                    Reaction::none()
                }
            }
            _ if text.is_empty() => Reaction::none(),
            InteractionEvent::PointerMove(p) if p.primary => self.on_move(p, probe, text),
            InteractionEvent::PointerDown(p) if p.primary => self.on_down(p, probe, text),
            InteractionEvent::PointerUp(p) if p.primary => self.on_up(p, probe, text),
            InteractionEvent::PointerMove(_)
            | InteractionEvent::PointerDown(_)
            | InteractionEvent::PointerUp(_) => Reaction::none(),
            InteractionEvent::PointerLeave => self.on_leave(),
            InteractionEvent::Key(key) => self.on_key(key, probe, text),
            InteractionEvent::Confirm => self.confirm(),
        }
    }

    fn enter_select(&mut self) -> Reaction {
        self.navigation_offset = 0;
        self.confirm_enabled = false;
        self.state = InteractionState::SelectArmed { preview: None };
        Reaction::redraw()
    }

    fn exit_select(&mut self) -> Reaction {
        self.reset();
        Reaction::redraw()
    }

    fn set_state(&mut self, next: InteractionState) -> Reaction {
        if next == self.state {
            return Reaction::none();
        }
        self.state = next;
        Reaction::redraw()
    }

    fn on_leave(&mut self) -> Reaction {
        match self.state {
            InteractionState::Hovering { .. } => self.set_state(InteractionState::Idle),
            InteractionState::SelectArmed { preview: Some(_) } => {
                self.set_state(InteractionState::SelectArmed { preview: None })
            }
            _ => Reaction::none(),
        }
    }

    fn on_move<P: OverlayProbe + ?Sized>(
        &mut self,
        p: PointerInfo,
        probe: &P,
        text: &str,
    ) -> Reaction {
        match self.state {
            InteractionState::Idle | InteractionState::Hovering { .. } => {
                if !p.hovers() {
                    return Reaction::none();
                }
                if !probe.contains(p.point) {
                    return self.on_leave();
                }
                let Some(offset) = probe.offset_at(p.point) else {
                    return Reaction::none();
                };
                let (word_start, end) = word_span(text, offset);
                if end == 0 {
                    return self.set_state(InteractionState::Idle);
                }
                self.set_state(InteractionState::Hovering {
                    word_start,
                    offset: end,
                })
            }
            InteractionState::SelectArmed { .. } => {
                if !p.hovers() {
                    return Reaction::none();
                }
                let preview = if probe.contains(p.point) {
                    probe.offset_at(p.point)
                } else {
                    None
                };
                self.set_state(InteractionState::SelectArmed { preview })
            }
            InteractionState::SelectPending {
                start,
                preview,
                phase,
            } => {
                let pressed = matches!(
                    phase,
                    PendingPhase::FirstPress { .. } | PendingPhase::SecondPress
                );
                // A released touch pointer cannot hover; a released mouse
                // previews only while over the overlay.
                if !pressed && (!p.hovers() || !probe.contains(p.point)) {
                    return Reaction::none();
                }
                let Some(offset) = probe.offset_at(p.point) else {
                    return Reaction::none();
                };
                let next_preview = directional_preview(text, start, offset);
                let phase = match phase {
                    PendingPhase::FirstPress { dragged } => PendingPhase::FirstPress {
                        dragged: dragged || word_span(text, offset).0 != start,
                    },
                    other => other,
                };
                if next_preview == preview && phase == self.pending_phase() {
                    return Reaction::none();
                }
                self.set_state(InteractionState::SelectPending {
                    start,
                    preview: next_preview,
                    phase,
                })
            }
            InteractionState::SelectFixed { .. } => Reaction::none(),
        }
    }

    fn pending_phase(&self) -> PendingPhase {
        match self.state {
            InteractionState::SelectPending { phase, .. } => phase,
            _ => PendingPhase::Released,
        }
    }

    fn on_down<P: OverlayProbe + ?Sized>(
        &mut self,
        p: PointerInfo,
        probe: &P,
        text: &str,
    ) -> Reaction {
        if !self.in_select_mode() || !probe.contains(p.point) {
            return Reaction::none();
        }
        let Some(offset) = probe.offset_at(p.point) else {
            return Reaction::none();
        };
        match self.state {
            InteractionState::SelectArmed { .. } | InteractionState::SelectFixed { .. } => {
                // First hit, or a fresh selection after a fixed one.
                let (start, end) = word_span(text, offset);
                self.confirm_enabled = false;
                self.set_state(InteractionState::SelectPending {
                    start,
                    preview: end,
                    phase: PendingPhase::FirstPress { dragged: false },
                });
                Reaction::redraw()
            }
            InteractionState::SelectPending {
                start,
                phase: PendingPhase::Released,
                ..
            } => {
                self.set_state(InteractionState::SelectPending {
                    start,
                    preview: directional_preview(text, start, offset),
                    phase: PendingPhase::SecondPress,
                });
                Reaction::redraw()
            }
            _ => Reaction::none(),
        }
    }

    fn on_up<P: OverlayProbe + ?Sized>(
        &mut self,
        p: PointerInfo,
        probe: &P,
        text: &str,
    ) -> Reaction {
        match self.state {
            InteractionState::Idle | InteractionState::Hovering { .. } => {
                if let Some((a, b)) = probe.selection_span() {
                    let (a, b) = normalize_range(a, b);
                    return Reaction::commit(a, b);
                }
                if !probe.contains(p.point) {
                    return Reaction::none();
                }
                let Some(offset) = probe.offset_at(p.point) else {
                    return Reaction::none();
                };
                let (_, end) = word_span(text, offset);
                Reaction::commit(0, end)
            }
            InteractionState::SelectPending {
                start,
                preview,
                phase,
            } => {
                let finishes = matches!(
                    phase,
                    PendingPhase::FirstPress { dragged: true } | PendingPhase::SecondPress
                );
                if !finishes {
                    if phase == (PendingPhase::FirstPress { dragged: false }) {
                        self.state = InteractionState::SelectPending {
                            start,
                            preview,
                            phase: PendingPhase::Released,
                        };
                        return Reaction {
                            consumed: true,
                            ..Reaction::none()
                        };
                    }
                    return Reaction::none();
                }
                let end = probe
                    .offset_at(p.point)
                    .map(|offset| directional_preview(text, start, offset))
                    .unwrap_or(preview);
                self.state = InteractionState::SelectFixed { start, end };
                self.confirm_enabled = start != end;
                Reaction::redraw()
            }
            _ => Reaction::none(),
        }
    }

    fn on_key<P: OverlayProbe + ?Sized>(&mut self, key: Key, probe: &P, text: &str) -> Reaction {
        let len = char_len(text);
        match (key, self.mode()) {
            (Key::Tab, InteractionMode::Normal) => {
                let end = match self.active_offset() {
                    0 => len,
                    offset => offset,
                };
                Reaction::commit(0, end)
            }
            (Key::ArrowRight, InteractionMode::Normal) => {
                if probe.caret_before_overlay() && self.navigation_offset < len {
                    self.navigation_offset += 1;
                    Reaction::redraw()
                } else {
                    Reaction::none()
                }
            }
            (Key::Enter, InteractionMode::Select) => self.confirm(),
            (Key::Escape, InteractionMode::Select) => self.exit_select(),
            (Key::Escape, InteractionMode::Normal) => Reaction {
                dismiss: true,
                consumed: true,
                ..Reaction::none()
            },
            _ => Reaction::none(),
        }
    }

    fn confirm(&mut self) -> Reaction {
        let InteractionState::SelectFixed { start, end } = self.state else {
            return Reaction::none();
        };
        if !self.confirm_enabled || start == end {
            return Reaction::none();
        }
        let (a, b) = normalize_range(start, end);
        self.reset();
        Reaction {
            redraw: true,
            commit: Some((a, b)),
            consumed: true,
            dismiss: false,
        }
    }
}

/// Word around `offset`, or the bare offset when it sits in whitespace.
fn word_span(text: &str, offset: usize) -> (usize, usize) {
    match word_boundaries(text, offset) {
        Some(w) if !w.is_empty() => (w.start, w.end),
        _ => (offset, offset),
    }
}

/// Where the second endpoint lands for a hit at `offset`: the word's end
/// when it lies after `start`, otherwise the word's start.
fn directional_preview(text: &str, start: usize, offset: usize) -> usize {
    let (word_start, word_end) = word_span(text, offset);
    if word_end > start {
        word_end
    } else {
        word_start
    }
}
