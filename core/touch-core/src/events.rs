//! Pointer events produced by the gesture machine.
//!
//! Events are the gesture-level view (`Click` at a point). [`PointerEvent::reports`]
//! lowers one into the absolute-axis/key/sync sequence an input device would
//! receive.

use serde::{Deserialize, Serialize};
use tuio_protocol::Blob;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl From<&Blob> for Position {
    fn from(blob: &Blob) -> Self {
        Self::new(blob.x, blob.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PointerEvent {
    Move(Position),
    /// Left button down.
    Press(Position),
    /// Left button up.
    Release(Position),
    /// Left press and release at one point.
    Click(Position),
    /// Right press and release at one point.
    RightClick(Position),
}

impl PointerEvent {
    pub fn position(&self) -> Position {
        match *self {
            PointerEvent::Move(pos)
            | PointerEvent::Press(pos)
            | PointerEvent::Release(pos)
            | PointerEvent::Click(pos)
            | PointerEvent::RightClick(pos) => pos,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PointerEvent::Move(_) => "move",
            PointerEvent::Press(_) => "press",
            PointerEvent::Release(_) => "release",
            PointerEvent::Click(_) => "click",
            PointerEvent::RightClick(_) => "right_click",
        }
    }

    /// Device report sequence for this event.
    pub fn reports(&self) -> Vec<InputReport> {
        let pos = self.position();
        let mut out = vec![InputReport::AbsX(pos.x), InputReport::AbsY(pos.y)];
        match self {
            PointerEvent::Move(_) => {}
            PointerEvent::Press(_) => out.push(InputReport::key(Button::Left, true)),
            PointerEvent::Release(_) => out.push(InputReport::key(Button::Left, false)),
            PointerEvent::Click(_) => {
                out.push(InputReport::key(Button::Left, true));
                out.push(InputReport::Sync);
                out.push(InputReport::key(Button::Left, false));
            }
            PointerEvent::RightClick(_) => {
                out.push(InputReport::key(Button::Right, true));
                out.push(InputReport::Sync);
                out.push(InputReport::key(Button::Right, false));
            }
        }
        out.push(InputReport::Sync);
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum InputReport {
    AbsX(i64),
    AbsY(i64),
    Key { button: Button, pressed: bool },
    Sync,
}

impl InputReport {
    pub fn key(button: Button, pressed: bool) -> Self {
        InputReport::Key { button, pressed }
    }
}
