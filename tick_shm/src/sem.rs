//! POSIX named counting semaphores.
//!
//! Safe RAII wrapper over `sem_open`/`sem_wait`/`sem_post` plus the
//! three-semaphore set implementing the bounded-buffer handshake. Waits use
//! the OS blocking primitive — never a spin loop — so a blocked process
//! consumes no CPU across the wait.
//!
//! Any syscall failure maps to [`IpcError::Sem`] and is treated as fatal by
//! the callers: an inconsistent semaphore state is unrecoverable in-process.

use crate::error::{IpcError, IpcResult};
use std::ffi::CString;
use std::io;
use std::time::Duration;

/// A single named counting semaphore.
///
/// `wait` blocks until the counter is positive, then decrements it;
/// `post` increments it and wakes one waiter. Closing (`Drop`) releases this
/// process's handle only; the name persists until [`Semaphore::unlink`].
pub struct Semaphore {
    raw: *mut libc::sem_t,
    name: CString,
}

// sem_t operations are async-signal-safe and thread-safe; the handle itself
// is just a pointer into the kernel-shared object.
unsafe impl Send for Semaphore {}
unsafe impl Sync for Semaphore {}

impl Semaphore {
    /// Create a new named semaphore with an initial value.
    ///
    /// Fails with `EEXIST` (mapped to [`IpcError::Sem`]) if the name is
    /// already in use: creation is exclusive, the lifecycle owner must
    /// unlink leftovers first.
    pub fn create(name: &str, initial: u32) -> IpcResult<Self> {
        let c_name = c_name(name)?;
        let raw = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                0o600 as libc::c_uint,
                initial as libc::c_uint,
            )
        };
        if raw == libc::SEM_FAILED {
            return Err(sem_err("sem_open(O_CREAT|O_EXCL)"));
        }
        Ok(Self { raw, name: c_name })
    }

    /// Open an existing named semaphore. Never creates.
    pub fn open(name: &str) -> IpcResult<Self> {
        let c_name = c_name(name)?;
        let raw = unsafe { libc::sem_open(c_name.as_ptr(), 0) };
        if raw == libc::SEM_FAILED {
            return Err(sem_err("sem_open"));
        }
        Ok(Self { raw, name: c_name })
    }

    /// Block until the counter is positive, then decrement it.
    ///
    /// Restarts transparently on `EINTR`.
    pub fn wait(&self) -> IpcResult<()> {
        loop {
            if unsafe { libc::sem_wait(self.raw) } == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(IpcError::Sem {
                op: "sem_wait",
                source: err,
            });
        }
    }

    /// Like [`Self::wait`], but gives up after `timeout`.
    ///
    /// Returns `Ok(true)` when the semaphore was acquired, `Ok(false)` on
    /// timeout. Restarts transparently on `EINTR`.
    pub fn wait_timeout(&self, timeout: Duration) -> IpcResult<bool> {
        let deadline = absolute_deadline(timeout)?;
        loop {
            if unsafe { libc::sem_timedwait(self.raw, &deadline) } == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::ETIMEDOUT) => return Ok(false),
                Some(libc::EINTR) => continue,
                _ => {
                    return Err(IpcError::Sem {
                        op: "sem_timedwait",
                        source: err,
                    });
                }
            }
        }
    }

    /// Increment the counter and wake one waiter if any. Never blocks.
    pub fn post(&self) -> IpcResult<()> {
        if unsafe { libc::sem_post(self.raw) } == 0 {
            Ok(())
        } else {
            Err(sem_err("sem_post"))
        }
    }

    /// Current counter value (diagnostics and tests only).
    ///
    /// On Linux this never reports negative values; a contended semaphore
    /// reads as 0.
    pub fn value(&self) -> IpcResult<i32> {
        let mut value: libc::c_int = 0;
        if unsafe { libc::sem_getvalue(self.raw, &mut value) } == 0 {
            Ok(value)
        } else {
            Err(sem_err("sem_getvalue"))
        }
    }

    /// Remove a semaphore name from the system.
    ///
    /// A missing name is not an error: unlink is part of teardown and
    /// stale-resource cleanup, both of which must be idempotent.
    pub fn unlink(name: &str) -> IpcResult<()> {
        let c_name = c_name(name)?;
        if unsafe { libc::sem_unlink(c_name.as_ptr()) } == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ENOENT) {
            return Ok(());
        }
        Err(IpcError::Sem {
            op: "sem_unlink",
            source: err,
        })
    }

    /// The semaphore's name, for logging.
    pub fn name(&self) -> &str {
        // Constructed from valid UTF-8 in c_name().
        self.name.to_str().unwrap_or("<invalid>")
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        // Close this process's handle; the name itself survives until
        // unlinked by the lifecycle owner.
        unsafe {
            libc::sem_close(self.raw);
        }
    }
}

fn c_name(name: &str) -> IpcResult<CString> {
    CString::new(name).map_err(|_| IpcError::Sem {
        op: "sem_open",
        source: io::Error::new(io::ErrorKind::InvalidInput, "semaphore name contains NUL"),
    })
}

fn sem_err(op: &'static str) -> IpcError {
    IpcError::Sem {
        op,
        source: io::Error::last_os_error(),
    }
}

fn absolute_deadline(timeout: Duration) -> IpcResult<libc::timespec> {
    let mut now = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // sem_timedwait deadlines are absolute CLOCK_REALTIME times.
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut now) } != 0 {
        return Err(sem_err("clock_gettime"));
    }
    let nanos = now.tv_nsec as i64 + timeout.subsec_nanos() as i64;
    Ok(libc::timespec {
        tv_sec: now.tv_sec + timeout.as_secs() as libc::time_t + (nanos / 1_000_000_000) as libc::time_t,
        tv_nsec: nanos % 1_000_000_000,
    })
}

/// The three flow-control semaphores of the bounded-buffer protocol.
///
/// Initial values on creation: `mutex = 1`, `available = capacity`,
/// `filled = 0`. Acquisition order is fixed: producers wait on `available`
/// then `mutex`; the consumer waits on `filled` then `mutex`. Both release
/// `mutex` before posting the complementary counter, so a process blocked on
/// `available` or `filled` never holds the lock.
pub struct SemSet {
    /// Binary semaphore protecting the shared region.
    pub mutex: Semaphore,
    /// Counts free FIFO slots.
    pub available: Semaphore,
    /// Counts pending FIFO entries.
    pub filled: Semaphore,
}

impl SemSet {
    /// Create the three semaphores with bounded-buffer initial values.
    ///
    /// Same-name leftovers from a crashed run are unlinked first; the loud
    /// staleness check belongs to the region file, not the semaphores.
    pub fn create(prefix: &str, capacity: u32) -> IpcResult<Self> {
        Self::unlink(prefix)?;
        let [mutex_name, available_name, filled_name] = Self::names(prefix);
        Ok(Self {
            mutex: Semaphore::create(&mutex_name, 1)?,
            available: Semaphore::create(&available_name, capacity)?,
            filled: Semaphore::create(&filled_name, 0)?,
        })
    }

    /// Open the three semaphores of an existing board. Never creates.
    pub fn open(prefix: &str) -> IpcResult<Self> {
        let [mutex_name, available_name, filled_name] = Self::names(prefix);
        Ok(Self {
            mutex: Semaphore::open(&mutex_name)?,
            available: Semaphore::open(&available_name)?,
            filled: Semaphore::open(&filled_name)?,
        })
    }

    /// Unlink all three names. Idempotent.
    pub fn unlink(prefix: &str) -> IpcResult<()> {
        for name in Self::names(prefix) {
            Semaphore::unlink(&name)?;
        }
        Ok(())
    }

    fn names(prefix: &str) -> [String; 3] {
        [
            format!("{prefix}.mutex"),
            format!("{prefix}.available"),
            format!("{prefix}.filled"),
        ]
    }
}
