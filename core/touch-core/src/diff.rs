//! Partition of two consecutive snapshots into new, dead and moved blobs.

use tuio_protocol::Blob;

use crate::snapshot::Snapshot;

/// A blob present in both snapshots whose position changed beyond jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moved<'a> {
    pub current: &'a Blob,
    pub previous: &'a Blob,
}

/// Result of comparing `previous` with `current`.
///
/// Every previous blob lands in exactly one of dead, moved or unchanged
/// (unchanged blobs are not listed); every current blob lands in exactly one
/// of new, moved or unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff<'a> {
    pub new: Vec<&'a Blob>,
    pub dead: Vec<&'a Blob>,
    pub moved: Vec<Moved<'a>>,
}

impl<'a> Diff<'a> {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.dead.is_empty() && self.moved.is_empty()
    }

    pub fn find_new(&self, id: u64) -> Option<&'a Blob> {
        self.new.iter().copied().find(|blob| blob.id == id)
    }

    pub fn find_dead(&self, id: u64) -> Option<&'a Blob> {
        self.dead.iter().copied().find(|blob| blob.id == id)
    }

    pub fn find_moved(&self, id: u64) -> Option<Moved<'a>> {
        self.moved.iter().copied().find(|moved| moved.current.id == id)
    }
}

/// Compares two snapshots. A matched blob counts as moved when either axis
/// changed by more than `jitter`; `0` makes any displacement a move.
///
/// Quadratic in the snapshot sizes, which are bounded by `MAX_ALIVE_BLOBS`.
pub fn diff<'a>(previous: &'a Snapshot, current: &'a Snapshot, jitter: u32) -> Diff<'a> {
    let jitter = u64::from(jitter);
    let mut result = Diff {
        new: Vec::with_capacity(current.len()),
        dead: Vec::with_capacity(previous.len()),
        moved: Vec::with_capacity(previous.len().min(current.len())),
    };

    for before in previous {
        match current.iter().find(|after| after.id == before.id) {
            Some(after) => {
                if before.x.abs_diff(after.x) > jitter || before.y.abs_diff(after.y) > jitter {
                    result.moved.push(Moved {
                        current: after,
                        previous: before,
                    });
                }
            }
            None => result.dead.push(before),
        }
    }

    for after in current {
        if !previous.contains(after.id) {
            result.new.push(after);
        }
    }

    result
}
