use std::time::Instant;

use serde::Serialize;

/// Discrete gesture states. The numeric codes are stable and show up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureStateKind {
    Idle,
    Tracking,
    Dragging,
    Hover,
    TwoBlobs,
    /// Placeholder for scrolling; no transitions in or out.
    Reserved,
}

impl GestureStateKind {
    pub fn code(self) -> u8 {
        match self {
            GestureStateKind::Idle => 0,
            GestureStateKind::Tracking => 1,
            GestureStateKind::Dragging => 2,
            GestureStateKind::Hover => 3,
            GestureStateKind::TwoBlobs => 4,
            GestureStateKind::Reserved => 5,
        }
    }

    /// Inverse of [`code`](Self::code). `None` means a corrupted state value.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(GestureStateKind::Idle),
            1 => Some(GestureStateKind::Tracking),
            2 => Some(GestureStateKind::Dragging),
            3 => Some(GestureStateKind::Hover),
            4 => Some(GestureStateKind::TwoBlobs),
            5 => Some(GestureStateKind::Reserved),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GestureStateKind::Idle => "idle",
            GestureStateKind::Tracking => "tracking",
            GestureStateKind::Dragging => "dragging",
            GestureStateKind::Hover => "hover",
            GestureStateKind::TwoBlobs => "two_blobs",
            GestureStateKind::Reserved => "reserved",
        }
    }
}

impl std::fmt::Display for GestureStateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the machine carries between bundles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureState {
    pub kind: GestureStateKind,
    /// Blob driving the pointer. Set in every state except `Idle`.
    pub primary: Option<u64>,
    /// Second finger; only meaningful in `TwoBlobs`.
    pub secondary: Option<u64>,
    /// `None` once expired or never armed.
    pub drag_deadline: Option<Instant>,
    pub move_deadline: Option<Instant>,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            kind: GestureStateKind::Idle,
            primary: None,
            secondary: None,
            drag_deadline: None,
            move_deadline: None,
        }
    }
}

/// A deadline has expired once `now` is strictly past it.
pub(crate) fn expired(deadline: Option<Instant>, now: Instant) -> bool {
    deadline.map_or(true, |at| now > at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn codes_round_trip() {
        for code in 0..=5 {
            let kind = GestureStateKind::from_code(code).expect("valid code");
            assert_eq!(kind.code(), code);
        }
        assert_eq!(GestureStateKind::from_code(6), None);
    }

    #[test]
    fn unarmed_deadline_counts_as_expired() {
        let now = Instant::now();
        assert!(expired(None, now));
        assert!(!expired(Some(now), now));
        assert!(expired(Some(now), now + Duration::from_nanos(1)));
    }
}
