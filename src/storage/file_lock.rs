use std::fs::{File, OpenOptions};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use log::debug;
use crate::core::error::{Error, Result};
use crate::storage::directory::DirectoryLock;

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Single writer guarantee: advisory exclusive `flock` on a lock file.
pub struct FileLock {
    pub file: File,
}

impl FileLock {
    /// `Ok(None)` when another holder has the lock.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_EX, LOCK_NB};

            let fd = file.as_raw_fd();
            unsafe {
                if flock(fd, LOCK_EX | LOCK_NB) != 0 {
                    let err = std::io::Error::last_os_error();
                    return match err.raw_os_error() {
                        Some(code) if code == libc::EWOULDBLOCK => Ok(None),
                        _ => Err(err.into()),
                    };
                }
            }
        }

        Ok(Some(FileLock { file }))
    }

    pub fn acquire(path: &Path, timeout: Option<Duration>) -> Result<Self> {
        poll_lock(timeout, || Self::try_acquire(path))
            .map_err(|e| if e.is_lock_held() {
                Error::lock_held(format!("{} is held by another writer", path.display()))
            } else {
                e
            })
    }
}

impl DirectoryLock for FileLock {}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_UN};

            let fd = self.file.as_raw_fd();
            unsafe {
                flock(fd, LOCK_UN);
            }
        }
    }
}

/// Retry `try_lock` until it succeeds or `timeout` elapses. No timeout means
/// a single attempt.
pub fn poll_lock<T, F>(timeout: Option<Duration>, mut try_lock: F) -> Result<T>
where
    F: FnMut() -> Result<Option<T>>,
{
    let deadline = timeout.map(|t| Instant::now() + t);
    loop {
        if let Some(lock) = try_lock()? {
            debug!("write lock acquired");
            return Ok(lock);
        }
        match deadline {
            Some(deadline) if Instant::now() < deadline => thread::sleep(LOCK_POLL_INTERVAL),
            _ => return Err(Error::lock_held("write lock is held by another writer")),
        }
    }
}
