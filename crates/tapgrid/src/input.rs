//! Input handling for tapgrid.
//!
//! Converts raw pointer events into semantic [`InputAction`]s. A press that
//! is released without travelling further than the tap slop is a tap; any
//! longer travel turns into a pan.

use crate::coords::ScreenPos;

/// Raw pointer input, in chart-area pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed(ScreenPos),
    Moved(ScreenPos),
    Released(ScreenPos),
    /// The platform took the pointer away (e.g. touch cancel).
    Cancelled,
}

/// Semantic actions produced from pointer input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    /// Pointer left the tap slop; carries the travel since the press.
    PanStart { dx: f64, dy: f64 },
    /// Pointer moved during a pan.
    PanMove { dx: f64, dy: f64 },
    /// Pointer released (or cancelled) after a pan.
    PanEnd,
    /// Press and release within the tap slop.
    Tap(ScreenPos),
    /// Pointer moved with no button held.
    CursorMoved(ScreenPos),
}

/// Tracks press state to tell taps from drags.
#[derive(Debug, Clone)]
pub struct InputHandler {
    tap_slop: f64,
    press_origin: Option<ScreenPos>,
    last_pos: Option<ScreenPos>,
    dragging: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new(6.0)
    }
}

impl InputHandler {
    /// `tap_slop` is the travel in pixels below which a press still counts as a tap.
    #[must_use]
    pub fn new(tap_slop: f64) -> Self {
        Self {
            tap_slop: tap_slop.max(0.0),
            press_origin: None,
            last_pos: None,
            dragging: false,
        }
    }

    /// Handle one pointer event.
    #[must_use]
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<InputAction> {
        match event {
            PointerEvent::Pressed(pos) => {
                self.press_origin = Some(pos);
                self.last_pos = Some(pos);
                self.dragging = false;
                None
            }
            PointerEvent::Moved(pos) => self.handle_moved(pos),
            PointerEvent::Released(pos) => {
                let origin = self.press_origin.take();
                self.last_pos = None;
                if std::mem::take(&mut self.dragging) {
                    Some(InputAction::PanEnd)
                } else {
                    origin.map(|_| InputAction::Tap(pos))
                }
            }
            PointerEvent::Cancelled => {
                self.press_origin = None;
                self.last_pos = None;
                std::mem::take(&mut self.dragging).then_some(InputAction::PanEnd)
            }
        }
    }

    fn handle_moved(&mut self, pos: ScreenPos) -> Option<InputAction> {
        let Some(origin) = self.press_origin else {
            return Some(InputAction::CursorMoved(pos));
        };

        if self.dragging {
            let last = self.last_pos.unwrap_or(origin);
            self.last_pos = Some(pos);
            return Some(InputAction::PanMove {
                dx: pos.x - last.x,
                dy: pos.y - last.y,
            });
        }

        if origin.distance_to(pos) <= self.tap_slop {
            return None;
        }
        self.dragging = true;
        self.last_pos = Some(pos);
        Some(InputAction::PanStart {
            dx: pos.x - origin.x,
            dy: pos.y - origin.y,
        })
    }

    /// Forget any press in progress.
    pub fn reset(&mut self) {
        self.press_origin = None;
        self.last_pos = None;
        self.dragging = false;
    }

    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.press_origin.is_some()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}
