//! Line-at-a-time driver: decode, assemble, diff, recognize, rotate.

use serde::Serialize;
use tracing::{debug, trace, warn};
use tuio_protocol::{DecodeError, Decoder, Update};

use crate::clock::{Clock, SystemClock};
use crate::config::TouchConfig;
use crate::diff::diff;
use crate::events::PointerEvent;
use crate::gesture::{GestureMachine, GestureStateKind};
use crate::snapshot::{BlobStateStore, Snapshot};

/// What one completed bundle produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleReport {
    pub fseq: i64,
    pub blobs: usize,
    pub events: Vec<PointerEvent>,
    pub state: GestureStateKind,
    /// Ids declared alive but never `set`; only filled when alive checking is on.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_alive: Vec<u64>,
}

/// Owns all per-stream state. One pipeline per input stream.
#[derive(Debug)]
pub struct Pipeline<C: Clock = SystemClock> {
    decoder: Decoder,
    store: BlobStateStore,
    machine: GestureMachine,
    jitter: u32,
    verify_alive: bool,
    clock: C,
}

impl Pipeline<SystemClock> {
    pub fn new(config: &TouchConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Pipeline<C> {
    pub fn with_clock(config: &TouchConfig, clock: C) -> Self {
        Self {
            decoder: Decoder::new(config.decoder.profile.clone()),
            store: BlobStateStore::new(),
            machine: GestureMachine::new(&config.gesture),
            jitter: config.gesture.jitter_threshold,
            verify_alive: config.decoder.verify_alive,
            clock,
        }
    }

    pub fn machine(&self) -> &GestureMachine {
        &self.machine
    }

    pub fn store(&self) -> &BlobStateStore {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Feeds one line. Returns a report when the line completed a bundle.
    ///
    /// On a decode error the bundle in progress is discarded up to and
    /// including its `fseq`: no report, no gesture step, and the previous
    /// snapshot and gesture state are left as they were.
    pub fn try_process_line(&mut self, line: &str) -> Result<Option<BundleReport>, DecodeError> {
        if self.store.is_discarding() {
            return self.skip_line(line);
        }

        let update = match self.decoder.decode(line, self.store.current_mut()) {
            Ok(update) => update,
            Err(err) => {
                self.store.discard_current();
                return Err(err);
            }
        };

        match update {
            Update::Alive(ids) => {
                trace!(count = ids.len(), "Alive");
                self.store.record_alive(ids);
                Ok(None)
            }
            Update::Set(blob) => {
                trace!(id = blob.id, x = blob.x, y = blob.y, "Set");
                Ok(None)
            }
            Update::Complete(fseq) => Ok(Some(self.complete(fseq))),
        }
    }

    /// Consumes a line of a discarded bundle, watching only for its terminator.
    fn skip_line(&mut self, line: &str) -> Result<Option<BundleReport>, DecodeError> {
        let mut scratch = Snapshot::new();
        if let Update::Complete(fseq) = self.decoder.decode(line, &mut scratch)? {
            debug!(fseq, "Skipped bundle after decode error");
            self.store.finish_discard();
        }
        Ok(None)
    }

    /// Like [`try_process_line`](Self::try_process_line) but logs and swallows
    /// decode errors.
    pub fn process_line(&mut self, line: &str) -> Option<BundleReport> {
        match self.try_process_line(line) {
            Ok(report) => report,
            Err(err) => {
                warn!(code = err.code(), error = %err, "Dropped bundle after decode error");
                None
            }
        }
    }

    fn complete(&mut self, fseq: i64) -> BundleReport {
        let missing_alive = if self.verify_alive {
            let missing = self.store.missing_alive();
            if !missing.is_empty() {
                warn!(fseq, missing = ?missing, "Alive ids without a set message");
            }
            missing
        } else {
            Vec::new()
        };

        let now = self.clock.now();
        let events = {
            let changes = diff(self.store.previous(), self.store.current(), self.jitter);
            self.machine.step(&changes, self.store.current(), now)
        };
        let blobs = self.store.current().len();
        self.store.commit();

        if !events.is_empty() {
            debug!(fseq, events = events.len(), state = %self.machine.kind(), "Bundle produced events");
        }

        BundleReport {
            fseq,
            blobs,
            events,
            state: self.machine.kind(),
            missing_alive,
        }
    }
}
