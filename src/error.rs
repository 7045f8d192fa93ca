//! Error types for bundling operations.
//!
//! Every error is terminal to the packaging call that produced it; nothing
//! is retried internally. Failures from external commands always carry the
//! command string and exit code for diagnosis.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bundler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for all bundling operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Spin manifest file does not exist at the expected location.
    #[error("spin manifest not found at {path}")]
    ManifestNotFound {
        /// Path where the manifest was expected
        path: PathBuf,
    },

    /// Spin manifest exists but is not valid TOML.
    #[error("failed to parse spin manifest at {path}: {source}")]
    ManifestParse {
        /// Path to the manifest file
        path: PathBuf,
        /// The underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// Target CPU architecture is not one the runtime distributes binaries for.
    #[error("unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    /// Runtime version string is not a valid semantic version.
    #[error("invalid runtime version '{version}': {source}")]
    InvalidVersion {
        /// Version string as supplied by the caller
        version: String,
        /// The underlying semver error
        #[source]
        source: semver::Error,
    },

    /// Downloading the runtime binary release archive failed.
    #[error("failed to download {url}: {reason}")]
    DownloadFailed {
        /// URL that was being fetched
        url: String,
        /// Reason for the failure
        reason: String,
    },

    /// Unpacking the runtime binary release archive failed.
    #[error("failed to extract {archive}: {reason}")]
    ExtractionFailed {
        /// Name of the archive being extracted
        archive: String,
        /// Reason for the failure
        reason: String,
    },

    /// A stage of the composed bundling pipeline exited non-zero.
    #[error("bundling failed at stage '{stage}' with exit code {exit_code}: {command}")]
    BundlingFailed {
        /// Name of the pipeline stage that failed
        stage: &'static str,
        /// The underlying command that was run
        command: String,
        /// Exit code reported by the command (-1 if killed by signal)
        exit_code: i32,
    },

    /// An external command could not be spawned at all.
    #[error("failed to run command {command}: {source}")]
    CommandSpawn {
        /// Command that failed to start
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Generic I/O error.
    #[error("{0}")]
    Io(#[from] io::Error),
}
