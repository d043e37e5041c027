//! Blob snapshots and the previous/current pair the pipeline works on.
//!
//! A snapshot is the full set of live blobs at one bundle boundary. The store
//! keeps the last completed one (`previous`) and the one being assembled from
//! `set` lines (`current`). Completing a bundle rotates current into previous;
//! a decode failure throws current away and leaves previous alone.

use tuio_protocol::{Blob, BlobSink, DecodeError, MAX_ALIVE_BLOBS};

/// Bounded, ordered set of blobs with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    blobs: Vec<Blob>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self {
            blobs: Vec::with_capacity(MAX_ALIVE_BLOBS),
        }
    }

    /// Builds a snapshot through the same path `set` lines take.
    pub fn from_blobs(blobs: impl IntoIterator<Item = Blob>) -> Result<Self, DecodeError> {
        let mut snapshot = Self::new();
        for blob in blobs {
            snapshot.put(blob)?;
        }
        Ok(snapshot)
    }

    pub fn capacity(&self) -> usize {
        MAX_ALIVE_BLOBS
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Blob> {
        self.blobs.iter()
    }

    pub fn as_slice(&self) -> &[Blob] {
        &self.blobs
    }

    pub fn find(&self, id: u64) -> Option<&Blob> {
        self.blobs.iter().find(|blob| blob.id == id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.find(id).is_some()
    }

    pub fn clear(&mut self) {
        self.blobs.clear();
    }
}

impl BlobSink for Snapshot {
    /// A repeated id within one bundle replaces the earlier position.
    fn put(&mut self, blob: Blob) -> Result<(), DecodeError> {
        if let Some(existing) = self.blobs.iter_mut().find(|b| b.id == blob.id) {
            *existing = blob;
            return Ok(());
        }
        if self.blobs.len() >= MAX_ALIVE_BLOBS {
            return Err(DecodeError::Overflow {
                capacity: MAX_ALIVE_BLOBS,
            });
        }
        self.blobs.push(blob);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Blob;
    type IntoIter = std::slice::Iter<'a, Blob>;

    fn into_iter(self) -> Self::IntoIter {
        self.blobs.iter()
    }
}

#[derive(Debug, Default)]
pub struct BlobStateStore {
    previous: Snapshot,
    current: Snapshot,
    alive: Option<Vec<u64>>,
    /// Set after a decode error; the rest of the bundle is ignored.
    discarding: bool,
}

impl BlobStateStore {
    pub fn new() -> Self {
        Self {
            previous: Snapshot::new(),
            current: Snapshot::new(),
            alive: None,
            discarding: false,
        }
    }

    pub fn previous(&self) -> &Snapshot {
        &self.previous
    }

    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Snapshot {
        &mut self.current
    }

    /// Remembers the latest `alive` declaration of the bundle in progress.
    pub fn record_alive(&mut self, ids: Vec<u64>) {
        self.alive = Some(ids);
    }

    /// Ids declared alive in this bundle that have no blob in `current`.
    /// Empty when no `alive` line was seen.
    pub fn missing_alive(&self) -> Vec<u64> {
        self.alive
            .as_deref()
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|id| !self.current.contains(*id))
            .collect()
    }

    /// Drops the bundle in progress. Everything up to its terminator is
    /// skipped; see [`finish_discard`](Self::finish_discard).
    pub fn discard_current(&mut self) {
        self.current.clear();
        self.alive = None;
        self.discarding = true;
    }

    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Ends a discarded bundle at its terminator. `previous` is untouched.
    pub fn finish_discard(&mut self) {
        self.current.clear();
        self.alive = None;
        self.discarding = false;
    }

    /// Freezes `current` as the new `previous` and starts an empty bundle.
    pub fn commit(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.current);
        self.current.clear();
        self.alive = None;
    }
}
