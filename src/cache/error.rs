use std::time::Duration;

use thiserror::Error;

/// Failures that can occur while loading or saving a cache file.
///
/// Log lines pair [`kind`](CacheError::kind) with the display form, so the
/// variants stay prefix-free and defer to their source's message.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error("timed out after {0:?} waiting for the cache file lock")]
    LockTimeout(Duration),
}

impl CacheError {
    /// Short name of the failure kind, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::Io(_) => "Io",
            CacheError::Serde(_) => "Serde",
            CacheError::LockTimeout(_) => "LockTimeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_kind_and_message_do_not_duplicate() {
        let inner = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let err = CacheError::from(inner);

        assert_eq!(err.kind(), "Io");
        // Display defers to the source; the kind is the only prefix.
        assert_eq!(err.to_string(), "no such file");
        assert_eq!(format!("{}: {}", err.kind(), err), "Io: no such file");
    }

    #[test]
    fn test_lock_timeout_message() {
        let err = CacheError::LockTimeout(Duration::from_secs(5));
        assert_eq!(err.kind(), "LockTimeout");
        assert!(err.to_string().contains("waiting for the cache file lock"));
    }
}
