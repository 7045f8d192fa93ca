//! Runtime binary resolution.
//!
//! Resolves a semantic version plus target architecture to a local path of
//! the `spin` runtime executable, downloading and extracting the release
//! archive on first use and reusing the on-disk [`BinaryCache`] thereafter.

mod cache;

pub use cache::{BinaryCache, CacheKey, RUNTIME_BINARY_NAME};

use crate::error::{Error, Result};
use std::io::Cursor;
use std::path::PathBuf;
use std::str::FromStr;

/// Base URL of the runtime's GitHub release downloads.
pub const DOWNLOAD_BASE_URL: &str = "https://github.com/fermyon/spin/releases/download";

/// Target CPU architecture of the deployed function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// 64-bit x86 (`amd64` release assets)
    X86_64,
    /// 64-bit ARM (`aarch64` release assets)
    Arm64,
}

impl Architecture {
    /// Architecture component of the release asset file name.
    pub fn release_suffix(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "amd64",
            Architecture::Arm64 => "aarch64",
        }
    }
}

impl FromStr for Architecture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x86_64" | "amd64" => Ok(Architecture::X86_64),
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            other => Err(Error::UnsupportedArchitecture(other.to_string())),
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.release_suffix())
    }
}

/// Normalizes a version string to the release tag form (`v`-prefixed).
///
/// Idempotent: `2.4.2` and `v2.4.2` both normalize to `v2.4.2`. The bare
/// version must parse as a semantic version.
pub fn normalize_version(version: &str) -> Result<String> {
    let bare = version.strip_prefix('v').unwrap_or(version);
    semver::Version::parse(bare).map_err(|source| Error::InvalidVersion {
        version: version.to_string(),
        source,
    })?;
    Ok(format!("v{bare}"))
}

/// Resolves runtime binaries, downloading release archives on cache miss.
#[derive(Debug, Clone)]
pub struct SpinResolver {
    cache: BinaryCache,
}

impl SpinResolver {
    /// Creates a resolver backed by the default cache location.
    pub fn new() -> Self {
        Self::with_cache(BinaryCache::default_location())
    }

    /// Creates a resolver backed by a specific cache.
    pub fn with_cache(cache: BinaryCache) -> Self {
        Self { cache }
    }

    /// Resolves the given version and architecture to a local binary path.
    ///
    /// On cache hit no network access is performed. On miss the release
    /// archive is downloaded and unpacked into the cache entry directory.
    /// Concurrent first-time resolution of the same key is a race the caller
    /// must serialize; distinct keys are safe.
    pub async fn resolve(&self, version: &str, architecture: Architecture) -> Result<PathBuf> {
        let tag = normalize_version(version)?;
        let key = CacheKey {
            version: tag.clone(),
            architecture,
        };

        if let Some(path) = self.cache.lookup(&key) {
            log::debug!("runtime binary cache hit: {}", path.display());
            return Ok(path);
        }

        let archive_name = format!("spin-{tag}-linux-{}.tar.gz", architecture.release_suffix());
        let url = format!("{DOWNLOAD_BASE_URL}/{tag}/{archive_name}");
        log::info!("downloading {url}");

        let response = reqwest::get(&url).await.map_err(|e| Error::DownloadFailed {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if !response.status().is_success() {
            return Err(Error::DownloadFailed {
                url,
                reason: format!("HTTP {}", response.status()),
            });
        }
        let bytes = response.bytes().await.map_err(|e| Error::DownloadFailed {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let entry_dir = self.cache.entry_dir(&key);
        tokio::fs::create_dir_all(&entry_dir).await?;

        // Unpack is CPU-bound; keep it off the async runtime.
        let unpack_archive = archive_name.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let decoder = flate2::read::GzDecoder::new(Cursor::new(bytes));
            let mut archive = tar::Archive::new(decoder);
            archive.unpack(&entry_dir).map_err(|e| Error::ExtractionFailed {
                archive: unpack_archive,
                reason: e.to_string(),
            })
        })
        .await
        .map_err(|e| Error::ExtractionFailed {
            archive: archive_name.clone(),
            reason: format!("extraction task failed: {e}"),
        })??;

        let binary = self.cache.binary_path(&key);
        if !binary.is_file() {
            return Err(Error::ExtractionFailed {
                archive: archive_name,
                reason: format!("archive did not contain a {RUNTIME_BINARY_NAME} executable"),
            });
        }

        log::info!("cached runtime binary at {}", binary.display());
        Ok(binary)
    }
}

impl Default for SpinResolver {
    fn default() -> Self {
        Self::new()
    }
}
