//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and wheel events from the host page into a
//! unified `InputEvent` consumed by the editor. Coordinates are CSS pixels
//! relative to the map container's top-left corner.

/// Keyboard modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    /// Left mouse button, touch, or pen contact.
    #[default]
    Primary,
    Middle,
    Secondary,
}

impl Button {
    /// Map a DOM `PointerEvent.button` index.
    pub fn from_dom(index: i16) -> Self {
        match index {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// A normalized input event from any pointing device.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed. `time_ms` is the host clock, used to age placements.
    PointerDown {
        x: f64,
        y: f64,
        button: Button,
        time_ms: f64,
    },

    PointerMove { x: f64, y: f64 },

    PointerUp { x: f64, y: f64, time_ms: f64 },

    /// Pointer left the map container.
    PointerLeave,

    /// Scroll wheel / pinch. Positive `delta_y` scrolls down (zoom out).
    Wheel { x: f64, y: f64, delta_y: f64 },

    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn pointer_down(x: f64, y: f64, time_ms: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            button: Button::Primary,
            time_ms,
        }
    }

    pub fn pointer_up(x: f64, y: f64, time_ms: f64) -> Self {
        Self::PointerUp { x, y, time_ms }
    }
}
