//! On-disk cache for resolved runtime binaries.
//!
//! The cache is an explicit key-value store backed by the filesystem: the
//! key is a normalized version tag plus target architecture, the value is
//! the path of the extracted binary. Existence of that path is the cache-hit
//! signal; entries persist across process runs and are never evicted.

use super::Architecture;
use std::path::{Path, PathBuf};

/// Name of the runtime executable inside each cache entry.
pub const RUNTIME_BINARY_NAME: &str = "spin";

/// Key identifying one cached runtime binary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Normalized (`v`-prefixed) version tag
    pub version: String,
    /// Target CPU architecture
    pub architecture: Architecture,
}

/// Filesystem-backed cache of extracted runtime binaries.
#[derive(Debug, Clone)]
pub struct BinaryCache {
    root: PathBuf,
}

impl BinaryCache {
    /// Creates a cache rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a cache at the well-known location under the system temp dir.
    pub fn default_location() -> Self {
        Self::new(std::env::temp_dir().join("spin-lambda-bundler"))
    }

    /// Root directory of the cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the extracted archive for one key.
    pub fn entry_dir(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(format!("spin_{}_{}", key.version, key.architecture.release_suffix()))
    }

    /// Path the extracted runtime binary is expected at for one key.
    pub fn binary_path(&self, key: &CacheKey) -> PathBuf {
        self.entry_dir(key).join(RUNTIME_BINARY_NAME)
    }

    /// Returns the cached binary path if the entry already exists on disk.
    pub fn lookup(&self, key: &CacheKey) -> Option<PathBuf> {
        let path = self.binary_path(key);
        path.is_file().then_some(path)
    }
}
