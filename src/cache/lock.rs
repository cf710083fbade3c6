//! Advisory inter-process lock guarding the cache file.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::core::errors::BomError;

const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Exclusive advisory lock on a sidecar file, released on drop.
///
/// Concurrent extraction workers may share one cache file; the lock
/// serializes read-modify-write cycles across processes.
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquires the lock, retrying until `timeout` elapses. A lock held
    /// past the timeout yields [`BomError::LockTimeout`] rather than
    /// blocking forever.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, BomError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match fs2::FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(Self { file }),
                Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                    if Instant::now() >= deadline {
                        return Err(BomError::LockTimeout {
                            timeout_ms: timeout.as_millis() as u64,
                        });
                    }
                    std::thread::sleep(RETRY_INTERVAL);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}
