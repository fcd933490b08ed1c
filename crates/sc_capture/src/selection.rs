//! Mouse-drag rectangle selection as an explicit state machine.
//!
//! The platform window feeds button/move events in screen coordinates and
//! draws whatever [`RubberBand`] updates come back.

use crate::rect::CaptureRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        anchor: ScreenPoint,
        /// Last pointer position drawn, `None` until the pointer first moves.
        current: Option<ScreenPoint>,
    },
}

/// Outline changes to apply on screen after a pointer move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RubberBand {
    pub erase: Option<CaptureRect>,
    pub draw: CaptureRect,
}

#[derive(Debug, Clone, Default)]
pub struct DragSelection {
    state: DragState,
    finished: bool,
    outcome: Option<CaptureRect>,
}

impl DragSelection {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> DragState {
        self.state
    }

    /// True once the button was released or the selection was cancelled.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The dragged rectangle, corners in the order they were picked.
    #[inline]
    pub fn outcome(&self) -> Option<CaptureRect> {
        self.outcome
    }

    pub fn press(&mut self, at: ScreenPoint) {
        if self.finished {
            return;
        }
        if let DragState::Idle = self.state {
            self.state = DragState::Dragging {
                anchor: at,
                current: None,
            };
        }
    }

    pub fn move_to(&mut self, at: ScreenPoint) -> Option<RubberBand> {
        let DragState::Dragging { anchor, current } = self.state else {
            return None;
        };
        if current == Some(at) {
            return None;
        }

        self.state = DragState::Dragging {
            anchor,
            current: Some(at),
        };
        Some(RubberBand {
            erase: current.map(|prev| span(anchor, prev)),
            draw: span(anchor, at),
        })
    }

    /// Finish the selection. Returns the outline still on screen, if any.
    pub fn release(&mut self) -> Option<CaptureRect> {
        let drawn = self.drawn();
        self.outcome = drawn;
        self.finish();
        drawn
    }

    /// Abandon the selection (window closed, Escape). Returns the outline to erase.
    pub fn cancel(&mut self) -> Option<CaptureRect> {
        let drawn = self.drawn();
        self.outcome = None;
        self.finish();
        drawn
    }

    fn drawn(&self) -> Option<CaptureRect> {
        match self.state {
            DragState::Dragging {
                anchor,
                current: Some(current),
            } => Some(span(anchor, current)),
            _ => None,
        }
    }

    fn finish(&mut self) {
        self.state = DragState::Idle;
        self.finished = true;
    }
}

#[inline]
fn span(a: ScreenPoint, b: ScreenPoint) -> CaptureRect {
    CaptureRect::from_corners(a.x, a.y, b.x, b.y)
}
