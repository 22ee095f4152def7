#![forbid(unsafe_code)]

//! Deterministic, JSON-friendly input schema for the marquee.
//!
//! The web host (JS/TS) is expected to provide:
//! - CSS pixel coordinates relative to the viewport for touch and pointer
//!   events,
//! - the raw `deltaY` of wheel events, and
//! - a millisecond timestamp on touch events (used for fling velocity).
//!
//! Everything a session reacts to can be expressed as an [`InputEvent`], so a
//! recorded trace replays to the same offsets.

use serde::{Deserialize, Serialize};

use crate::ambient::Viewport;

/// Phase for touch events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// Phase for document-level pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Move,
    Leave,
    Enter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub dy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchInput {
    pub phase: TouchPhase,
    pub x: f64,
    pub y: f64,
    pub time_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollInput {
    /// Scroll offset the host observed on the container.
    pub scroll_left: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub phase: PointerPhase,
    pub x: f64,
    pub y: f64,
}

/// Canonical input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Wheel(WheelInput),
    Touch(TouchInput),
    Scroll(ScrollInput),
    Pointer(PointerInput),
    /// Pointer entered (`true`) or left (`false`) the scroll container.
    Hover(bool),
    Resize(Viewport),
}

impl InputEvent {
    #[must_use]
    pub fn wheel(dy: f64) -> Self {
        Self::Wheel(WheelInput { dy })
    }

    #[must_use]
    pub fn touch(phase: TouchPhase, x: f64, y: f64, time_ms: f64) -> Self {
        Self::Touch(TouchInput {
            phase,
            x,
            y,
            time_ms,
        })
    }

    #[must_use]
    pub fn scroll(scroll_left: f64) -> Self {
        Self::Scroll(ScrollInput { scroll_left })
    }

    #[must_use]
    pub fn pointer(phase: PointerPhase, x: f64, y: f64) -> Self {
        Self::Pointer(PointerInput { phase, x, y })
    }

    /// Whether this event drives the scroll offset (as opposed to the
    /// ambient embellishments only).
    #[must_use]
    pub fn affects_motion(&self) -> bool {
        matches!(self, Self::Wheel(_) | Self::Touch(_) | Self::Scroll(_))
    }

    /// Encode this event as a stable JSON string.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&InputEventJson::from(self))
    }

    /// Decode a previously encoded event JSON string.
    ///
    /// Errors occur if the JSON does not match the expected schema.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let json: InputEventJson = serde_json::from_str(s)?;
        Ok(Self::from(json))
    }
}

/// JSON encoding used by the web frontend and recorded traces.
///
/// A `kind` tag plus the minimum semantic fields needed for replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEventJson {
    Wheel {
        dy: f64,
    },
    Touch {
        phase: TouchPhase,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        t: f64,
    },
    Scroll {
        left: f64,
    },
    Pointer {
        phase: PointerPhase,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    Hover {
        inside: bool,
    },
    Resize {
        width: f64,
        height: f64,
    },
}

impl From<&InputEvent> for InputEventJson {
    fn from(value: &InputEvent) -> Self {
        match *value {
            InputEvent::Wheel(WheelInput { dy }) => Self::Wheel { dy },
            InputEvent::Touch(TouchInput {
                phase,
                x,
                y,
                time_ms,
            }) => Self::Touch {
                phase,
                x,
                y,
                t: time_ms,
            },
            InputEvent::Scroll(ScrollInput { scroll_left }) => Self::Scroll { left: scroll_left },
            InputEvent::Pointer(PointerInput { phase, x, y }) => Self::Pointer { phase, x, y },
            InputEvent::Hover(inside) => Self::Hover { inside },
            InputEvent::Resize(Viewport { width, height }) => Self::Resize { width, height },
        }
    }
}

impl From<InputEventJson> for InputEvent {
    fn from(value: InputEventJson) -> Self {
        match value {
            InputEventJson::Wheel { dy } => Self::wheel(dy),
            InputEventJson::Touch { phase, x, y, t } => Self::touch(phase, x, y, t),
            InputEventJson::Scroll { left } => Self::scroll(left),
            InputEventJson::Pointer { phase, x, y } => Self::pointer(phase, x, y),
            InputEventJson::Hover { inside } => Self::Hover(inside),
            InputEventJson::Resize { width, height } => Self::Resize(Viewport::new(width, height)),
        }
    }
}
