//! Board region lifecycle: create/attach/detach/destroy.
//!
//! Exactly one process — the consumer — owns the region: it creates the
//! backing file and semaphores and destroys them on shutdown. Producers only
//! attach and detach; destroying a region while producers hold references
//! would be unsafe, so a client is structurally unable to do it.

use crate::error::{IpcError, IpcResult};
use crate::layout::{BoardRegion, REGION_SIZE, struct_version_hash};
use crate::sem::SemSet;
use memmap2::{MmapMut, MmapOptions};
use nix::unistd::getpid;
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use tick::consts::FIFO_MAX_CAPACITY;
use tracing::{info, warn};

fn region_path(name: &str) -> String {
    format!("/dev/shm/{name}")
}

/// Owning handle to the board: creates everything, destroys everything.
///
/// Teardown runs on `Drop`, so every exit path of the consumer — normal
/// shutdown, signal-driven shutdown, error propagation — detaches and
/// removes the region file and all three semaphores.
pub struct BoardOwner {
    mmap: MmapMut,
    sems: SemSet,
    name: String,
    sem_prefix: String,
}

impl BoardOwner {
    /// Create the shared region and semaphore set exclusively.
    ///
    /// # Errors
    ///
    /// - [`IpcError::InvalidCapacity`] if `capacity` is outside
    ///   `1..=FIFO_MAX_CAPACITY`.
    /// - [`IpcError::StaleRegion`] if a region file already exists. The
    ///   stale file and any same-name semaphores are removed before
    ///   returning, so the next run starts clean instead of silently reusing
    ///   stale state.
    pub fn create(name: &str, sem_prefix: &str, capacity: u32) -> IpcResult<Self> {
        if capacity == 0 || capacity > FIFO_MAX_CAPACITY {
            return Err(IpcError::InvalidCapacity {
                capacity,
                max: FIFO_MAX_CAPACITY,
            });
        }

        let path = region_path(name);
        if Path::new(&path).exists() {
            warn!("stale board region at {path}, removing it");
            std::fs::remove_file(&path)?;
            SemSet::unlink(sem_prefix)?;
            return Err(IpcError::StaleRegion {
                name: name.to_string(),
            });
        }

        let file = OpenOptions::new()
            .create_new(true)
            .read(true)
            .write(true)
            .mode(0o600)
            .open(&path)?;
        file.set_len(REGION_SIZE as u64)?;

        let mut mmap = unsafe { MmapOptions::new().map_mut(&file)? };
        {
            let region = unsafe { &mut *(mmap.as_mut_ptr() as *mut BoardRegion) };
            region.init(capacity, getpid().as_raw() as u32);
        }

        let sems = match SemSet::create(sem_prefix, capacity) {
            Ok(sems) => sems,
            Err(e) => {
                // Don't leave a half-created board behind.
                let _ = std::fs::remove_file(&path);
                return Err(e);
            }
        };

        info!(
            name,
            capacity,
            pid = getpid().as_raw(),
            "board region created"
        );

        Ok(Self {
            mmap,
            sems,
            name: name.to_string(),
            sem_prefix: sem_prefix.to_string(),
        })
    }

    /// Shared view of the region.
    pub fn region(&self) -> &BoardRegion {
        unsafe { &*(self.mmap.as_ptr() as *const BoardRegion) }
    }

    /// Mutable view of the region. Only valid to use while `mutex` is held.
    pub fn region_mut(&mut self) -> &mut BoardRegion {
        unsafe { &mut *(self.mmap.as_mut_ptr() as *mut BoardRegion) }
    }

    /// The flow-control semaphores.
    pub fn sems(&self) -> &SemSet {
        &self.sems
    }

    /// Explicit teardown. Equivalent to dropping, but logs the intent.
    pub fn destroy(self) {
        info!(name = %self.name, "destroying board region and semaphores");
        // Drop does the actual work.
    }
}

impl Drop for BoardOwner {
    fn drop(&mut self) {
        let path = region_path(&self.name);
        if let Err(e) = std::fs::remove_file(&path) {
            warn!("failed to remove board region {path}: {e}");
        }
        if let Err(e) = SemSet::unlink(&self.sem_prefix) {
            warn!("failed to unlink board semaphores: {e}");
        }
    }
}

/// Attaching handle used by producers.
///
/// Never creates and never destroys: `Drop` merely unmaps the region and
/// closes this process's semaphore handles.
pub struct BoardClient {
    mmap: MmapMut,
    sems: SemSet,
    name: String,
}

impl BoardClient {
    /// Attach to an existing board region.
    ///
    /// # Errors
    ///
    /// - [`IpcError::NotFound`] if the consumer has not created the region.
    /// - [`IpcError::LayoutMismatch`] if the file is not a board region or
    ///   was produced by an incompatible build.
    /// - [`IpcError::CapacityMismatch`] if `capacity` differs from the value
    ///   the consumer was started with — a fatal misconfiguration.
    pub fn attach(name: &str, sem_prefix: &str, capacity: u32) -> IpcResult<Self> {
        let path = region_path(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    IpcError::NotFound {
                        name: name.to_string(),
                    }
                } else {
                    IpcError::Io { source: e }
                }
            })?;

        let mmap = unsafe { MmapOptions::new().map_mut(&file)? };
        if mmap.len() < REGION_SIZE {
            return Err(IpcError::LayoutMismatch {
                name: name.to_string(),
            });
        }

        {
            let region = unsafe { &*(mmap.as_ptr() as *const BoardRegion) };
            let header = &region.header;
            if !header.is_magic_valid() || header.layout_hash != struct_version_hash::<BoardRegion>()
            {
                return Err(IpcError::LayoutMismatch {
                    name: name.to_string(),
                });
            }
            if header.capacity != capacity {
                return Err(IpcError::CapacityMismatch {
                    region: header.capacity,
                    requested: capacity,
                });
            }
        }

        let sems = SemSet::open(sem_prefix)?;

        info!(name, capacity, pid = getpid().as_raw(), "attached to board");

        Ok(Self {
            mmap,
            sems,
            name: name.to_string(),
        })
    }

    /// Shared view of the region.
    pub fn region(&self) -> &BoardRegion {
        unsafe { &*(self.mmap.as_ptr() as *const BoardRegion) }
    }

    /// Mutable view of the region. Only valid to use while `mutex` is held.
    pub fn region_mut(&mut self) -> &mut BoardRegion {
        unsafe { &mut *(self.mmap.as_mut_ptr() as *mut BoardRegion) }
    }

    /// The flow-control semaphores.
    pub fn sems(&self) -> &SemSet {
        &self.sems
    }

    /// Region name, for logging.
    pub fn name(&self) -> &str {
        &self.name
    }
}
