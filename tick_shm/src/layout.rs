//! Shared board region layout.
//!
//! Defines the single `#[repr(C)]` allocation all processes map: a 64-byte
//! cache-line-aligned header, one ring buffer per commodity series, and the
//! shared event FIFO. The layout is pinned with compile-time assertions and
//! a layout hash in the header; a producer built against a different layout
//! refuses to attach.
//!
//! Every mutating operation in this module is only ever invoked while the
//! `mutex` semaphore is held, so no interior locking exists here.

use crate::error::{IpcError, IpcResult};
use static_assertions::{const_assert, const_assert_eq};
use tick::consts::{FIFO_MAX_CAPACITY, HISTORY_LEN, SERIES_COUNT};

/// Magic bytes identifying a valid board region: `"TICKBRD\0"`.
pub const BOARD_MAGIC: [u8; 8] = *b"TICKBRD\0";

/// Mapped region size: one page, comfortably larger than [`BoardRegion`].
pub const REGION_SIZE: usize = 4096;

/// Compile-time version hash for struct compatibility detection.
///
/// Computes a hash from `size_of::<T>()` and `align_of::<T>()`. If the
/// region layout changes, the hash changes, and attaching processes refuse
/// to connect.
///
/// **Known limitation**: does not detect field reordering within the same
/// total size/alignment. Acceptable because `#[repr(C)]` structs with
/// explicit padding have deterministic field order.
pub const fn struct_version_hash<T>() -> u32 {
    let size = core::mem::size_of::<T>() as u32;
    let align = core::mem::align_of::<T>() as u32;
    size.wrapping_mul(0x9E3779B9) ^ align.wrapping_mul(0x517CC1B7)
}

/// Board region header — 64 bytes, cache-line aligned.
///
/// Written once by the consumer at creation; producers validate `magic`,
/// `layout_hash` and `capacity` on attach and treat any mismatch as a fatal
/// misconfiguration.
#[derive(Debug, Clone, Copy)]
#[repr(C, align(64))]
pub struct RegionHeader {
    /// Magic bytes: must be [`BOARD_MAGIC`].
    pub magic: [u8; 8],
    /// Compile-time hash of the [`BoardRegion`] layout.
    pub layout_hash: u32,
    /// Event FIFO capacity the region was created with.
    pub capacity: u32,
    /// PID of the consumer process that created the region.
    pub creator_pid: u32,
    /// Number of series slots in the region.
    pub series_count: u32,
    /// Padding to fill 64 bytes total.
    pub _padding: [u8; 40],
}

const_assert_eq!(core::mem::size_of::<RegionHeader>(), 64);
const_assert_eq!(core::mem::align_of::<RegionHeader>(), 64);

impl RegionHeader {
    /// Create a header for a fresh region.
    pub fn new(capacity: u32, creator_pid: u32) -> Self {
        Self {
            magic: BOARD_MAGIC,
            layout_hash: struct_version_hash::<BoardRegion>(),
            capacity,
            creator_pid,
            series_count: SERIES_COUNT as u32,
            _padding: [0u8; 40],
        }
    }

    /// Validate the magic bytes.
    #[inline]
    pub fn is_magic_valid(&self) -> bool {
        self.magic == BOARD_MAGIC
    }
}

/// Fixed-capacity ring buffer of the last [`HISTORY_LEN`] samples of one series.
///
/// `write_cursor` always points at the slot that will be overwritten next;
/// the most recently written sample therefore sits one slot behind it,
/// wrapping around.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct SeriesSlot {
    /// Last [`HISTORY_LEN`] raw samples, oldest overwritten first.
    pub history: [f64; HISTORY_LEN],
    /// Index of the next slot to write, in `[0, HISTORY_LEN)`.
    pub write_cursor: u32,
    /// Explicit padding for a deterministic C layout.
    pub _pad: u32,
}

impl SeriesSlot {
    /// Store `value` at the cursor and advance it, wrapping modulo the
    /// history length. Caller must hold the mutex.
    pub fn record(&mut self, value: f64) {
        self.history[self.write_cursor as usize] = value;
        self.write_cursor = (self.write_cursor + 1) % HISTORY_LEN as u32;
    }

    /// The most recently written sample.
    ///
    /// With the wrap-around cursor convention this is the slot at
    /// `(cursor + K - 1) % K`; in particular a cursor of 0 means the last
    /// slot, not an empty sentinel. Before the first `record` this returns
    /// the unwritten (zero-valued) last slot — a cold-start artifact, not an
    /// error.
    #[inline]
    pub fn latest(&self) -> f64 {
        let k = HISTORY_LEN as u32;
        self.history[((self.write_cursor + k - 1) % k) as usize]
    }

    /// Arithmetic mean of all history slots.
    ///
    /// Unwritten slots participate in the sum as zero, which biases the
    /// average low until the ring has fully wrapped once. Accepted
    /// limitation: no population tracking is kept; gate on [`Self::is_warm`]
    /// where the bias matters.
    pub fn rolling_average(&self) -> f64 {
        self.history.iter().sum::<f64>() / HISTORY_LEN as f64
    }

    /// Whether `value` is present anywhere in the retained history.
    ///
    /// With events queued behind a fast producer, a dequeued sample is
    /// older than [`Self::latest`] yet still sits somewhere in the ring;
    /// only a value in neither position indicates a torn write.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.history.contains(&value)
    }

    /// Cheap proxy for "the ring has been fully populated at least once":
    /// the slot about to be overwritten holds a non-zero sample.
    #[inline]
    pub fn is_warm(&self) -> bool {
        self.history[self.write_cursor as usize] != 0.0
    }
}

/// One event handed from a producer to the consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct FifoEntry {
    /// The sample value.
    pub value: f64,
    /// Index of the series the sample belongs to.
    pub series: u32,
    /// Explicit padding for a deterministic C layout.
    pub _pad: u32,
}

const_assert_eq!(core::mem::size_of::<FifoEntry>(), 16);

/// Shared circular queue of `(value, series)` events.
///
/// Producers enqueue, the single consumer dequeues each entry exactly once.
/// Flow control lives entirely in the `available`/`filled` semaphores; the
/// count checks here exist to surface protocol violations, not to block.
#[derive(Debug)]
#[repr(C)]
pub struct EventFifo {
    /// Entry storage, sized for the hard capacity ceiling.
    pub entries: [FifoEntry; FIFO_MAX_CAPACITY as usize],
    /// Index of the oldest entry.
    pub front: u32,
    /// Index one past the newest entry: `(front + count) % capacity`.
    pub rear: u32,
    /// Number of entries currently queued, `0 ..= capacity`.
    pub count: u32,
    /// Operator-configured capacity, `1 ..= FIFO_MAX_CAPACITY`.
    pub capacity: u32,
}

impl EventFifo {
    /// Reset the queue to empty with the given capacity.
    pub fn init(&mut self, capacity: u32) {
        self.entries = [FifoEntry::default(); FIFO_MAX_CAPACITY as usize];
        self.front = 0;
        self.rear = 0;
        self.count = 0;
        self.capacity = capacity;
    }

    /// Enqueue one event. Caller must hold the mutex.
    ///
    /// # Errors
    ///
    /// [`IpcError::FifoOverrun`] when the queue is full — a condition the
    /// `available` semaphore makes impossible in a correct run.
    pub fn push(&mut self, value: f64, series: u32) -> IpcResult<()> {
        if self.count == self.capacity {
            return Err(IpcError::FifoOverrun {
                capacity: self.capacity,
            });
        }
        self.entries[self.rear as usize] = FifoEntry {
            value,
            series,
            _pad: 0,
        };
        self.rear = (self.rear + 1) % self.capacity;
        self.count += 1;
        Ok(())
    }

    /// Dequeue the oldest event. Caller must hold the mutex.
    ///
    /// # Errors
    ///
    /// [`IpcError::FifoUnderrun`] when the queue is empty — impossible in a
    /// correct run given the `filled` semaphore.
    pub fn pop(&mut self) -> IpcResult<FifoEntry> {
        if self.count == 0 {
            return Err(IpcError::FifoUnderrun);
        }
        let entry = self.entries[self.front as usize];
        self.front = (self.front + 1) % self.capacity;
        self.count -= 1;
        Ok(entry)
    }

    /// Number of entries currently queued.
    #[inline]
    pub fn len(&self) -> u32 {
        self.count
    }

    /// True when no entries are queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// The complete shared allocation: header, per-series rings, event FIFO.
#[derive(Debug)]
#[repr(C)]
pub struct BoardRegion {
    /// Region header, validated by every attaching process.
    pub header: RegionHeader,
    /// One ring buffer per predefined series, indexed by series id.
    pub series: [SeriesSlot; SERIES_COUNT],
    /// The shared event FIFO.
    pub fifo: EventFifo,
}

const_assert!(core::mem::size_of::<BoardRegion>() <= REGION_SIZE);

impl BoardRegion {
    /// Initialize a freshly mapped (zero-filled) region in place.
    pub fn init(&mut self, capacity: u32, creator_pid: u32) {
        self.header = RegionHeader::new(capacity, creator_pid);
        self.series = [SeriesSlot {
            history: [0.0; HISTORY_LEN],
            write_cursor: 0,
            _pad: 0,
        }; SERIES_COUNT];
        self.fifo.init(capacity);
    }
}
