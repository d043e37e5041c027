//! Gesture recognition over snapshot diffs.
//!
//! One [`GestureMachine`] turns the stream of per-bundle diffs into pointer
//! events. It runs in one of two modes sharing the same states:
//!
//! - **Timed**: a touch that stays put past the drag delay presses the button
//!   (drag); one that lifts before it clicks; one that moves after the move
//!   delay becomes a hover that never clicks; a second finger arms a right
//!   click that fires when either finger lifts.
//! - **Tap**: no timers. Movement presses immediately and drags; lifting
//!   without movement clicks.
//!
//! Deadlines are instants compared against the clock reading passed to each
//! step, so the machine only observes time at bundle boundaries.
//!
//! ```text
//!            new blob                   primary dead
//!   Idle ─────────────────▶ Tracking ─────────────────▶ Idle   (click)
//!                             │  │ │
//!        drag deadline passed │  │ └─ moved after move deadline ─▶ Hover
//!                             ▼  └─── second new blob ──────────▶ TwoBlobs
//!                          Dragging
//! ```

mod machine;
mod types;

pub use machine::GestureMachine;
pub use types::{GestureState, GestureStateKind};
