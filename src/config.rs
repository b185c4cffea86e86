//! Cache file path resolution.
//!
//! Cache files live at `<cache dir>/sightcache/cache/<name>.cache`, where
//! `<cache dir>` is the platform cache directory (e.g. `~/.cache` on Linux).

use std::path::{Path, PathBuf};

use anyhow::Result;

/// Application name used for cache directory paths
const APP_NAME: &str = "sightcache";

/// Subdirectory holding the cache files
const CACHE_SUBDIR: &str = "cache";

/// File extension for cache files
const CACHE_EXT: &str = "cache";

/// Resolve the on-disk path for a named cache under the platform cache
/// directory.
pub fn cache_file(name: &str) -> Result<PathBuf> {
    let base = dirs::cache_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
    Ok(cache_file_in(&base.join(APP_NAME), name))
}

/// Resolve the path for a named cache under an explicit base directory.
pub(crate) fn cache_file_in(base_dir: &Path, name: &str) -> PathBuf {
    base_dir
        .join(CACHE_SUBDIR)
        .join(format!("{}.{}", name, CACHE_EXT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_file_in_layout() {
        let path = cache_file_in(Path::new("/tmp/base"), "abc");
        assert_eq!(path, PathBuf::from("/tmp/base/cache/abc.cache"));
    }
}
