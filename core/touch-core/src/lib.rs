//! # touch-core
//!
//! Turns a stream of TUIO cursor lines into pointer events.
//!
//! ## Layout
//!
//! - [`snapshot`]: the previous/current blob snapshots a bundle is assembled in.
//! - [`diff`]: new, dead and moved blobs between two snapshots.
//! - [`gesture`]: the state machine that maps diffs to clicks, drags and moves.
//! - [`pipeline`]: drives the three above, one line at a time.
//! - [`channel`]: the overwrite-on-full ring that carries lines between threads.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. The only threads are the caller's.
//! - **No globals**: A [`Pipeline`] owns its decoder, snapshots, machine and clock.
//! - **Malformed input is not fatal**: a bad line drops the bundle it belongs to.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use touch_core::{Pipeline, TouchConfig};
//!
//! let mut pipeline = Pipeline::new(&TouchConfig::default());
//! for line in lines {
//!     if let Some(report) = pipeline.process_line(&line) {
//!         println!("{:?}", report.events);
//!     }
//! }
//! ```

pub mod channel;
pub mod clock;
pub mod config;
pub mod diff;
pub mod error;
pub mod events;
pub mod gesture;
pub mod pipeline;
pub mod snapshot;

pub use channel::{ReadSession, RingChannel, WriteSession, DEFAULT_RING_DEPTH, FRAME_CAPACITY};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::*;
pub use diff::{diff, Diff, Moved};
pub use error::{ChannelError, Result, SessionKind, TouchError};
pub use events::{Button, InputReport, PointerEvent, Position};
pub use gesture::{GestureMachine, GestureState, GestureStateKind};
pub use pipeline::{BundleReport, Pipeline};
pub use snapshot::{BlobStateStore, Snapshot};

pub use tuio_protocol::{Blob, DecodeError};
