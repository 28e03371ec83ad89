//! # Tickboard Shared Board Core
//!
//! Process-shared bounded-buffer coordination for the commodity ticker
//! board: a fixed-layout shared memory region plus three POSIX named
//! counting semaphores mediating concurrent producers and a single consumer.
//!
//! ## Protocol
//!
//! The region holds one ring buffer per commodity series and a single
//! event FIFO. Three semaphores implement the classic bounded-buffer
//! handshake:
//!
//! - `mutex` (binary) protects every mutation of the region,
//! - `available` counts free FIFO slots,
//! - `filled` counts pending FIFO entries.
//!
//! Producers: `wait(available)` → `wait(mutex)` → ring write + FIFO push
//! (one atomic unit) → `post(mutex)` → `post(filled)`.
//!
//! Consumer: `wait(filled)` → `wait(mutex)` → FIFO pop + recompute →
//! `post(mutex)` → `post(available)`.
//!
//! The acquisition order is fixed and must never be reversed: a process
//! blocked on `available` or `filled` holds nothing, so the lock is always
//! eventually acquirable and the handshake is deadlock-free. A producer
//! dying while *holding* `mutex` permanently deadlocks the board — known
//! limitation, there is no lease or timeout recovery.
//!
//! ## Lifecycle
//!
//! The consumer is the sole lifecycle owner: [`BoardOwner::create`] builds
//! the region and semaphores, and its `Drop` destroys them on every exit
//! path. Producers use [`BoardClient::attach`], which validates the region
//! header (magic, layout hash, FIFO capacity) and only ever detaches.
//!
//! ```rust,no_run
//! use tick_shm::{BoardClient, BoardOwner};
//!
//! # fn main() -> tick_shm::IpcResult<()> {
//! // Consumer
//! let owner = BoardOwner::create("tickboard_quotes", "/tickboard", 10)?;
//!
//! // Producer (separate process)
//! let client = BoardClient::attach("tickboard_quotes", "/tickboard", 10)?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod layout;
pub mod region;
pub mod sem;

pub use error::{IpcError, IpcResult};
pub use layout::{BOARD_MAGIC, BoardRegion, EventFifo, FifoEntry, REGION_SIZE, SeriesSlot};
pub use region::{BoardClient, BoardOwner};
pub use sem::{SemSet, Semaphore};
