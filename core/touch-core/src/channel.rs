//! Bounded byte-message ring between one producer and one consumer.
//!
//! The ring holds a fixed number of frame slots. A full ring never rejects a
//! write: the writer reclaims the slot holding the oldest unread message and
//! advances the read cursor past it. Reads block until a message arrives
//! unless the session is switched to non-blocking mode.
//!
//! Each slot is guarded by its own state word:
//!
//! ```text
//!   EMPTY ──writer──▶ WRITING ──publish──▶ READY ──reader──▶ READING ──▶ EMPTY
//!                        ▲                   │                  │
//!                        └──── reclaim ──────┘                  └──▶ READY (buffer too small)
//! ```
//!
//! Whoever moves a slot into `WRITING` or `READING` owns its payload until it
//! moves the slot out again. The mutex/condvar pair only parks the reader.
//!
//! A ring of depth 1 behaves as a single slot where the last write wins.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use tracing::{debug, trace};

use crate::error::{ChannelError, SessionKind};

/// Slots in a ring built from the default configuration.
pub const DEFAULT_RING_DEPTH: usize = 20;

/// Largest message a slot can carry, in bytes.
pub const FRAME_CAPACITY: usize = 256;

const EMPTY: u8 = 0;
const READY: u8 = 1;
const READING: u8 = 2;
const WRITING: u8 = 3;

struct Slot {
    state: AtomicU8,
    len: AtomicUsize,
    payload: UnsafeCell<[u8; FRAME_CAPACITY]>,
}

// SAFETY: `payload` is only touched by the thread that moved `state` into
// WRITING or READING, and that thread publishes its accesses with a Release
// store of the next state. Other threads never dereference the cell.
unsafe impl Sync for Slot {}

impl Slot {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(EMPTY),
            len: AtomicUsize::new(0),
            payload: UnsafeCell::new([0; FRAME_CAPACITY]),
        }
    }

    fn claim(&self, from: u8, to: u8) -> bool {
        self.state
            .compare_exchange(from, to, Ordering::Acquire, Ordering::Acquire)
            .is_ok()
    }
}

pub struct RingChannel {
    slots: Box<[Slot]>,
    /// Sequence number of the next message to write. Slot index is `seq % depth`.
    write_seq: AtomicUsize,
    /// Sequence number of the oldest unread message.
    read_seq: AtomicUsize,
    reader_open: AtomicBool,
    writer_open: AtomicBool,
    interrupted: AtomicBool,
    dropped: AtomicU64,
    park: Mutex<()>,
    wake: Condvar,
}

impl std::fmt::Debug for RingChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingChannel")
            .field("depth", &self.depth())
            .field("len", &self.len())
            .field("dropped", &self.dropped())
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

impl Default for RingChannel {
    fn default() -> Self {
        Self::new(DEFAULT_RING_DEPTH)
    }
}

impl RingChannel {
    /// Creates a ring with every slot empty. A depth of zero is raised to one.
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            slots: (0..depth).map(|_| Slot::new()).collect(),
            write_seq: AtomicUsize::new(0),
            read_seq: AtomicUsize::new(0),
            reader_open: AtomicBool::new(false),
            writer_open: AtomicBool::new(false),
            interrupted: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            park: Mutex::new(()),
            wake: Condvar::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    /// Unread messages currently queued.
    pub fn len(&self) -> usize {
        let read = self.read_seq.load(Ordering::Acquire);
        let write = self.write_seq.load(Ordering::Acquire);
        write.saturating_sub(read).min(self.depth())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Messages discarded so far because the ring was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn open_reader(self: &Arc<Self>) -> Result<ReadSession, ChannelError> {
        if self.reader_open.swap(true, Ordering::AcqRel) {
            return Err(ChannelError::Busy(SessionKind::Reader));
        }
        Ok(ReadSession {
            channel: Arc::clone(self),
            nonblocking: false,
        })
    }

    pub fn open_writer(self: &Arc<Self>) -> Result<WriteSession, ChannelError> {
        if self.writer_open.swap(true, Ordering::AcqRel) {
            return Err(ChannelError::Busy(SessionKind::Writer));
        }
        Ok(WriteSession {
            channel: Arc::clone(self),
        })
    }

    /// Makes blocked and future reads on an empty ring return `Interrupted`.
    ///
    /// Queued messages are still delivered. The flag stays raised until
    /// [`clear_interrupt`](Self::clear_interrupt).
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);
        let _guard = self.park.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.wake.notify_all();
    }

    pub fn clear_interrupt(&self) {
        self.interrupted.store(false, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    fn slot(&self, seq: usize) -> &Slot {
        &self.slots[seq % self.slots.len()]
    }

    fn write(&self, bytes: &[u8]) -> Result<(), ChannelError> {
        if bytes.len() > FRAME_CAPACITY {
            return Err(ChannelError::OversizeMessage {
                len: bytes.len(),
                max: FRAME_CAPACITY,
            });
        }

        // Only the single writer session advances write_seq.
        let seq = self.write_seq.load(Ordering::Relaxed);
        let slot = self.slot(seq);
        loop {
            if slot.claim(EMPTY, WRITING) {
                break;
            }
            if slot.claim(READY, WRITING) {
                self.reclaim_oldest(seq);
                break;
            }
            // The reader holds this slot; it releases it without blocking.
            std::thread::yield_now();
        }

        // SAFETY: the slot is in WRITING, owned by this thread.
        unsafe {
            let payload = &mut *slot.payload.get();
            payload[..bytes.len()].copy_from_slice(bytes);
        }
        slot.len.store(bytes.len(), Ordering::Relaxed);
        slot.state.store(READY, Ordering::Release);
        self.write_seq.store(seq.wrapping_add(1), Ordering::Release);
        trace!(seq, len = bytes.len(), "Message queued");

        let _guard = self.park.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.wake.notify_one();
        Ok(())
    }

    /// The slot at `seq` still held message `seq - depth`; skip the reader past it.
    fn reclaim_oldest(&self, seq: usize) {
        let oldest = seq.wrapping_sub(self.depth());
        if self
            .read_seq
            .compare_exchange(
                oldest,
                oldest.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(seq = oldest, dropped = total, "Ring full; dropped oldest message");
        }
    }

    fn read(&self, buf: &mut [u8], nonblocking: bool) -> Result<usize, ChannelError> {
        loop {
            let seq = self.read_seq.load(Ordering::Acquire);
            let slot = self.slot(seq);

            if slot.claim(READY, READING) {
                // The writer may have reclaimed this slot between the cursor
                // load and the claim; then it holds a newer message.
                if self.read_seq.load(Ordering::Acquire) != seq {
                    slot.state.store(READY, Ordering::Release);
                    continue;
                }

                let len = slot.len.load(Ordering::Relaxed);
                if buf.len() < len {
                    slot.state.store(READY, Ordering::Release);
                    return Err(ChannelError::BufferTooSmall {
                        needed: len,
                        available: buf.len(),
                    });
                }

                // SAFETY: the slot is in READING, owned by this thread.
                unsafe {
                    let payload = &*slot.payload.get();
                    buf[..len].copy_from_slice(&payload[..len]);
                }
                slot.len.store(0, Ordering::Relaxed);
                // Advance before releasing, so a writer that sees EMPTY also
                // sees the cursor past this message.
                self.read_seq.store(seq.wrapping_add(1), Ordering::Release);
                slot.state.store(EMPTY, Ordering::Release);
                trace!(seq, len, "Message delivered");
                return Ok(len);
            }

            match slot.state.load(Ordering::Acquire) {
                EMPTY => {}
                _ => {
                    // Mid-write; the writer finishes without blocking.
                    std::thread::yield_now();
                    continue;
                }
            }

            if nonblocking {
                return Err(ChannelError::WouldBlock);
            }
            if self.is_interrupted() {
                return Err(ChannelError::Interrupted);
            }

            let guard = self.park.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if self.slot(self.read_seq.load(Ordering::Acquire)).state.load(Ordering::Acquire)
                == EMPTY
                && !self.is_interrupted()
            {
                drop(
                    self.wake
                        .wait(guard)
                        .unwrap_or_else(|poisoned| poisoned.into_inner()),
                );
            }
        }
    }
}

/// Exclusive read access to a [`RingChannel`]. Dropping it closes the session.
#[derive(Debug)]
pub struct ReadSession {
    channel: Arc<RingChannel>,
    nonblocking: bool,
}

impl ReadSession {
    /// Copies the oldest unread message into `buf` and returns its length.
    ///
    /// Blocks on an empty ring unless non-blocking. A buffer shorter than the
    /// message fails with `BufferTooSmall` and leaves the message queued.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        self.channel.read(buf, self.nonblocking)
    }

    pub fn set_nonblocking(&mut self, nonblocking: bool) {
        self.nonblocking = nonblocking;
    }

    pub fn is_nonblocking(&self) -> bool {
        self.nonblocking
    }

    pub fn channel(&self) -> &Arc<RingChannel> {
        &self.channel
    }

    pub fn close(self) {}
}

impl Drop for ReadSession {
    fn drop(&mut self) {
        self.channel.reader_open.store(false, Ordering::Release);
    }
}

/// Exclusive write access to a [`RingChannel`]. Dropping it closes the session.
#[derive(Debug)]
pub struct WriteSession {
    channel: Arc<RingChannel>,
}

impl WriteSession {
    /// Queues one message of at most [`FRAME_CAPACITY`] bytes, dropping the
    /// oldest unread message when the ring is full.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        self.channel.write(bytes)
    }

    pub fn channel(&self) -> &Arc<RingChannel> {
        &self.channel
    }

    pub fn close(self) {}
}

impl Drop for WriteSession {
    fn drop(&mut self) {
        self.channel.writer_open.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_string(reader: &mut ReadSession) -> Result<String, ChannelError> {
        let mut buf = [0u8; FRAME_CAPACITY];
        let len = reader.read(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
    }

    #[test]
    fn messages_come_out_in_write_order() {
        let channel = Arc::new(RingChannel::new(4));
        let mut writer = channel.open_writer().unwrap();
        let mut reader = channel.open_reader().unwrap();
        reader.set_nonblocking(true);

        writer.write(b"one").unwrap();
        writer.write(b"two").unwrap();
        assert_eq!(channel.len(), 2);
        assert_eq!(read_string(&mut reader).unwrap(), "one");
        assert_eq!(read_string(&mut reader).unwrap(), "two");
        assert_eq!(read_string(&mut reader), Err(ChannelError::WouldBlock));
        assert!(channel.is_empty());
    }

    #[test]
    fn full_ring_drops_oldest() {
        let channel = Arc::new(RingChannel::new(3));
        let mut writer = channel.open_writer().unwrap();
        let mut reader = channel.open_reader().unwrap();
        reader.set_nonblocking(true);

        for msg in ["m1", "m2", "m3", "m4", "m5"] {
            writer.write(msg.as_bytes()).unwrap();
        }
        assert_eq!(channel.len(), 3);
        assert_eq!(channel.dropped(), 2);

        let got: Vec<String> = (0..3).map(|_| read_string(&mut reader).unwrap()).collect();
        assert_eq!(got, vec!["m3", "m4", "m5"]);
        assert_eq!(read_string(&mut reader), Err(ChannelError::WouldBlock));
    }

    #[test]
    fn one_write_past_capacity_drops_exactly_the_oldest() {
        let channel = Arc::new(RingChannel::new(3));
        let mut writer = channel.open_writer().unwrap();
        let mut reader = channel.open_reader().unwrap();
        reader.set_nonblocking(true);

        for msg in ["M1", "M2", "M3", "M4"] {
            writer.write(msg.as_bytes()).unwrap();
        }
        assert_eq!(channel.len(), 3);
        assert_eq!(channel.dropped(), 1);

        let got: Vec<String> = (0..3).map(|_| read_string(&mut reader).unwrap()).collect();
        assert_eq!(got, vec!["M2", "M3", "M4"]);
        assert_eq!(read_string(&mut reader), Err(ChannelError::WouldBlock));
    }

    #[test]
    fn depth_one_keeps_last_write() {
        let channel = Arc::new(RingChannel::new(1));
        let mut writer = channel.open_writer().unwrap();
        let mut reader = channel.open_reader().unwrap();
        reader.set_nonblocking(true);

        writer.write(b"first").unwrap();
        writer.write(b"second").unwrap();
        assert_eq!(read_string(&mut reader).unwrap(), "second");
        assert_eq!(channel.dropped(), 1);
    }

    #[test]
    fn zero_depth_is_raised_to_one() {
        assert_eq!(RingChannel::new(0).depth(), 1);
    }

    #[test]
    fn oversize_write_leaves_ring_untouched() {
        let channel = Arc::new(RingChannel::new(2));
        let mut writer = channel.open_writer().unwrap();
        let err = writer.write(&[b'x'; FRAME_CAPACITY + 1]).unwrap_err();
        assert_eq!(
            err,
            ChannelError::OversizeMessage {
                len: FRAME_CAPACITY + 1,
                max: FRAME_CAPACITY
            }
        );
        assert!(channel.is_empty());

        writer.write(&[b'x'; FRAME_CAPACITY]).unwrap();
        assert_eq!(channel.len(), 1);
    }

    #[test]
    fn short_buffer_keeps_message_queued() {
        let channel = Arc::new(RingChannel::new(2));
        let mut writer = channel.open_writer().unwrap();
        let mut reader = channel.open_reader().unwrap();
        writer.write(b"hello world").unwrap();

        let mut small = [0u8; 4];
        assert_eq!(
            reader.read(&mut small),
            Err(ChannelError::BufferTooSmall {
                needed: 11,
                available: 4
            })
        );
        assert_eq!(channel.len(), 1);
        assert_eq!(read_string(&mut reader).unwrap(), "hello world");
    }

    #[test]
    fn sessions_are_exclusive_until_closed() {
        let channel = Arc::new(RingChannel::default());
        let reader = channel.open_reader().unwrap();
        let writer = channel.open_writer().unwrap();

        assert_eq!(
            channel.open_reader().unwrap_err(),
            ChannelError::Busy(SessionKind::Reader)
        );
        assert_eq!(
            channel.open_writer().unwrap_err(),
            ChannelError::Busy(SessionKind::Writer)
        );

        reader.close();
        drop(writer);
        assert!(channel.open_reader().is_ok());
        assert!(channel.open_writer().is_ok());
    }

    #[test]
    fn interrupt_only_fires_on_empty_ring() {
        let channel = Arc::new(RingChannel::new(4));
        let mut writer = channel.open_writer().unwrap();
        let mut reader = channel.open_reader().unwrap();

        writer.write(b"queued").unwrap();
        channel.interrupt();
        assert_eq!(read_string(&mut reader).unwrap(), "queued");
        assert_eq!(read_string(&mut reader), Err(ChannelError::Interrupted));
        // Sticky until cleared.
        assert_eq!(read_string(&mut reader), Err(ChannelError::Interrupted));

        channel.clear_interrupt();
        reader.set_nonblocking(true);
        assert_eq!(read_string(&mut reader), Err(ChannelError::WouldBlock));
    }
}
