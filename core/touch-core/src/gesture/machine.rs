use std::time::{Duration, Instant};

use tracing::debug;

use super::types::{expired, GestureState, GestureStateKind};
use crate::config::{GestureConfig, GestureMode};
use crate::diff::Diff;
use crate::events::PointerEvent;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone)]
pub struct GestureMachine {
    mode: GestureMode,
    drag_delay: Duration,
    move_delay: Duration,
    state: GestureState,
}

impl GestureMachine {
    pub fn new(config: &GestureConfig) -> Self {
        Self::with_timings(config.mode, config.drag_delay(), config.move_delay())
    }

    pub fn with_timings(mode: GestureMode, drag_delay: Duration, move_delay: Duration) -> Self {
        Self {
            mode,
            drag_delay,
            move_delay,
            state: GestureState::default(),
        }
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn kind(&self) -> GestureStateKind {
        self.state.kind
    }

    /// Back to `Idle` with both deadlines expired.
    pub fn reset(&mut self) {
        self.state = GestureState::default();
    }

    /// Runs one transition for a completed bundle.
    ///
    /// `current` is the snapshot the diff was computed against; it is used to
    /// look up the live position of a tracked blob that did not move.
    pub fn step(&mut self, diff: &Diff<'_>, current: &Snapshot, now: Instant) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        let from = self.state.kind;

        let next = match (from, self.state.primary) {
            (GestureStateKind::Idle, _) => self.on_idle(diff, now, &mut events),
            (GestureStateKind::Reserved, _) => GestureStateKind::Reserved,
            // Tracked states always carry a primary id.
            (_, None) => GestureStateKind::Idle,
            (GestureStateKind::Tracking, Some(primary)) => match self.mode {
                GestureMode::Timed => self.on_tracking(primary, diff, current, now, &mut events),
                GestureMode::Tap => on_tracking_tap(primary, diff, &mut events),
            },
            (GestureStateKind::Dragging, Some(primary)) => on_dragging(primary, diff, &mut events),
            (GestureStateKind::Hover, Some(primary)) => on_hover(primary, diff, &mut events),
            (GestureStateKind::TwoBlobs, Some(primary)) => {
                self.on_two_blobs(primary, diff, current, &mut events)
            }
        };

        if next == GestureStateKind::Idle {
            self.state.primary = None;
            self.state.secondary = None;
        }
        if next != from {
            debug!(
                from = %from,
                to = %next,
                primary = ?self.state.primary,
                secondary = ?self.state.secondary,
                events = events.len(),
                "Gesture state changed"
            );
        }
        self.state.kind = next;
        events
    }

    fn on_idle(
        &mut self,
        diff: &Diff<'_>,
        now: Instant,
        events: &mut Vec<PointerEvent>,
    ) -> GestureStateKind {
        // Several new blobs at once: the first one in snapshot order wins.
        let Some(blob) = diff.new.first().copied() else {
            return GestureStateKind::Idle;
        };

        events.push(PointerEvent::Move(blob.into()));
        self.state.primary = Some(blob.id);
        self.state.secondary = None;
        if self.mode == GestureMode::Timed {
            self.state.drag_deadline = Some(now + self.drag_delay);
            self.state.move_deadline = Some(now + self.move_delay);
        }
        GestureStateKind::Tracking
    }

    fn on_tracking(
        &mut self,
        primary: u64,
        diff: &Diff<'_>,
        current: &Snapshot,
        now: Instant,
        events: &mut Vec<PointerEvent>,
    ) -> GestureStateKind {
        if let Some(dead) = diff.find_dead(primary) {
            events.push(PointerEvent::Click(dead.into()));
            return GestureStateKind::Idle;
        }

        if let Some(moved) = diff.find_moved(primary) {
            events.push(PointerEvent::Move(moved.current.into()));
            return if expired(self.state.move_deadline, now) {
                GestureStateKind::Hover
            } else {
                GestureStateKind::Tracking
            };
        }

        if let Some(second) = diff.new.iter().find(|blob| blob.id != primary) {
            self.state.secondary = Some(second.id);
            return GestureStateKind::TwoBlobs;
        }

        if expired(self.state.drag_deadline, now) {
            if let Some(blob) = current.find(primary) {
                events.push(PointerEvent::Press(blob.into()));
                return GestureStateKind::Dragging;
            }
        }

        GestureStateKind::Tracking
    }

    fn on_two_blobs(
        &mut self,
        primary: u64,
        diff: &Diff<'_>,
        current: &Snapshot,
        events: &mut Vec<PointerEvent>,
    ) -> GestureStateKind {
        let secondary = self.state.secondary;
        let primary_dead = diff.find_dead(primary);
        let secondary_dead = secondary.and_then(|id| diff.find_dead(id));
        if primary_dead.is_none() && secondary_dead.is_none() {
            return GestureStateKind::TwoBlobs;
        }

        let survivor = if secondary_dead.is_some() {
            current.find(primary)
        } else {
            secondary.and_then(|id| current.find(id))
        };
        // Both fingers lifted in the same bundle: click where the primary was.
        match survivor.or(primary_dead).or(secondary_dead) {
            Some(blob) => events.push(PointerEvent::RightClick(blob.into())),
            None => debug!(primary, secondary = ?secondary, "Right click target vanished"),
        }
        GestureStateKind::Idle
    }
}

fn on_tracking_tap(primary: u64, diff: &Diff<'_>, events: &mut Vec<PointerEvent>) -> GestureStateKind {
    if let Some(dead) = diff.find_dead(primary) {
        events.push(PointerEvent::Click(dead.into()));
        return GestureStateKind::Idle;
    }

    if let Some(moved) = diff.find_moved(primary) {
        events.push(PointerEvent::Press(moved.previous.into()));
        events.push(PointerEvent::Move(moved.current.into()));
        return GestureStateKind::Dragging;
    }

    GestureStateKind::Tracking
}

fn on_dragging(primary: u64, diff: &Diff<'_>, events: &mut Vec<PointerEvent>) -> GestureStateKind {
    if let Some(dead) = diff.find_dead(primary) {
        events.push(PointerEvent::Release(dead.into()));
        return GestureStateKind::Idle;
    }

    if let Some(moved) = diff.find_moved(primary) {
        events.push(PointerEvent::Move(moved.current.into()));
    }
    GestureStateKind::Dragging
}

fn on_hover(primary: u64, diff: &Diff<'_>, events: &mut Vec<PointerEvent>) -> GestureStateKind {
    if diff.find_dead(primary).is_some() {
        // The click was forfeited when the move deadline passed.
        return GestureStateKind::Idle;
    }

    if let Some(moved) = diff.find_moved(primary) {
        events.push(PointerEvent::Move(moved.current.into()));
    }
    GestureStateKind::Hover
}
