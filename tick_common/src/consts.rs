//! System-wide constants for the tickboard workspace.
//!
//! Single source of truth for all numeric limits and well-known resource
//! names. Imported by all crates — no duplication permitted.

/// Number of samples retained per series ring buffer.
pub const HISTORY_LEN: usize = 5;

/// Number of predefined commodity series.
pub const SERIES_COUNT: usize = 11;

/// Hard ceiling on the event FIFO capacity.
///
/// The FIFO capacity is chosen by the operator at consumer startup; any
/// request above this limit is rejected before the region is created.
pub const FIFO_MAX_CAPACITY: u32 = 40;

/// Well-known shared region file name under `/dev/shm`.
///
/// Producers and the consumer derive the region location from this fixed
/// name, so no side channel is needed to find each other.
pub const BOARD_SHM_NAME: &str = "tickboard_quotes";

/// Well-known name prefix for the three flow-control semaphores.
///
/// The full names are `{prefix}.mutex`, `{prefix}.available` and
/// `{prefix}.filled`.
pub const BOARD_SEM_PREFIX: &str = "/tickboard";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(HISTORY_LEN > 0);
        assert!(SERIES_COUNT > 0 && SERIES_COUNT <= 16);
        assert!(FIFO_MAX_CAPACITY > 0);
    }

    #[test]
    fn sem_prefix_is_posix_name() {
        // POSIX semaphore names must start with a single slash.
        assert!(BOARD_SEM_PREFIX.starts_with('/'));
        assert_eq!(BOARD_SEM_PREFIX.matches('/').count(), 1);
    }
}
