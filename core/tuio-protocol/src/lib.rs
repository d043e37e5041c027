//! Text-line protocol shared by the touchmouse producer and consumer.
//!
//! TUIO cursor messages arrive from the network as OSC messages and are
//! flattened into one ASCII line each:
//!
//! ```text
//! /tuio/2Dcur alive 4 7
//! /tuio/2Dcur set 4 0.482812 0.412500 0.000000 0.000000 -7.122507
//! /tuio/2Dcur fseq 1482
//! ```
//!
//! This crate owns both directions of that grammar: [`format`] composes a line
//! from a path and typed OSC arguments, [`decode`] turns a line back into a
//! typed [`Update`] against the snapshot being assembled.

use serde::{Deserialize, Serialize};

pub mod decode;
pub mod format;

pub use decode::{BlobSink, DecodeError, Decoder, Update};
pub use format::{compose_line, parse_args, FormatError, OscArg};

/// Profile prefix of 2D cursor messages.
pub const PROFILE_2DCUR: &str = "/tuio/2Dcur";

/// Upper bound on blobs tracked in one snapshot.
pub const MAX_ALIVE_BLOBS: usize = 20;

/// Size of the line buffer shared with the network-side formatter.
pub const MAX_LINE_BYTES: usize = 1024;

/// One tracked touch point.
///
/// Coordinates are the integer part of the reported position; see
/// [`decode`] for how fractional digits are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blob {
    pub id: u64,
    pub x: i64,
    pub y: i64,
}

impl Blob {
    pub fn new(id: u64, x: i64, y: i64) -> Self {
        Self { id, x, y }
    }
}
