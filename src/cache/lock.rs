//! Scoped exclusive locking for cache files.

use std::fs::File;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use super::error::CacheError;

/// Poll interval while waiting for a contended lock
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// An exclusive advisory lock on an open file.
///
/// The lock is released when the guard is dropped, on every exit path.
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Block until the exclusive lock on `file` is acquired.
    pub fn acquire(file: File) -> io::Result<FileLock> {
        file.lock_exclusive()?;
        Ok(FileLock { file })
    }

    /// Acquire the exclusive lock, polling until `timeout` elapses.
    pub fn acquire_timeout(file: File, timeout: Duration) -> Result<FileLock, CacheError> {
        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(FileLock { file }),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(CacheError::LockTimeout(timeout));
                    }
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// The locked file handle, for reading or writing under the lock.
    pub fn file(&mut self) -> &mut File {
        &mut self.file
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Closing the descriptor would also release the lock; unlock
        // explicitly so the guard's lifetime is the lock's lifetime.
        let _ = self.file.unlock();
    }
}
