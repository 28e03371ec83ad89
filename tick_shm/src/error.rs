//! Error types for the shared board core.
//!
//! The variants follow the four-way failure taxonomy of the protocol:
//! configuration errors, stale-resource errors, synchronization primitive
//! failures, and internal consistency violations. All of them are terminal
//! for the process that hits them — there are no retries in the core.

use thiserror::Error;

/// Errors that can occur during board region and semaphore operations.
#[derive(Error, Debug)]
pub enum IpcError {
    /// A stale board region was found where a fresh one should be created.
    ///
    /// The stale region file and semaphores have already been removed when
    /// this is returned, so the next run starts clean.
    #[error("stale board region found (and removed): {name} - rerun to create a fresh one")]
    StaleRegion {
        /// Region name
        name: String,
    },

    /// Board region not found; the consumer has not created it yet.
    #[error("board region not found: {name} - start the consumer first")]
    NotFound {
        /// Region name
        name: String,
    },

    /// Region file exists but does not carry a valid board layout.
    #[error("region {name} has an incompatible layout (magic or layout hash mismatch)")]
    LayoutMismatch {
        /// Region name
        name: String,
    },

    /// FIFO capacity requested at startup is outside the allowed range.
    #[error("invalid FIFO capacity {capacity} (must be 1-{max})")]
    InvalidCapacity {
        /// Requested capacity
        capacity: u32,
        /// Hard ceiling
        max: u32,
    },

    /// Producer capacity does not match the capacity the region was created with.
    #[error("FIFO capacity mismatch: region was created with {region}, requested {requested}")]
    CapacityMismatch {
        /// Capacity recorded in the region header
        region: u32,
        /// Capacity requested by this process
        requested: u32,
    },

    /// Push onto a full FIFO.
    ///
    /// Cannot happen while `available` is correctly tracked; its occurrence
    /// is a protocol violation, not a flow-control event.
    #[error("FIFO overrun: push with count == capacity ({capacity}) - available semaphore miscounted")]
    FifoOverrun {
        /// Configured FIFO capacity
        capacity: u32,
    },

    /// Pop from an empty FIFO.
    ///
    /// Cannot happen while `filled` is correctly tracked; same protocol
    /// violation treatment as [`IpcError::FifoOverrun`].
    #[error("FIFO underrun: pop with count == 0 - filled semaphore miscounted")]
    FifoUnderrun,

    /// A popped entry addresses a series index outside the predefined set.
    ///
    /// Producers only ever enqueue valid indices, so this means the region
    /// was corrupted. Same treatment as the other consistency violations.
    #[error("unknown series id {series} popped from the FIFO - region corrupted")]
    UnknownSeries {
        /// The out-of-range series index
        series: u32,
    },

    /// Semaphore syscall failure.
    ///
    /// Indicates a broken environment; unrecoverable in-process.
    #[error("semaphore operation {op} failed: {source}")]
    Sem {
        /// The libc operation that failed
        op: &'static str,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// IO error from region file or mapping operations.
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },
}

/// Result type for board operations.
pub type IpcResult<T> = Result<T, IpcError>;
