//! # Spin Lambda Bundler
//!
//! Packages a Spin WebAssembly component application into a deployable
//! artifact directory for AWS Lambda behind the web-adapter layer.
//!
//! The pipeline builds the project (`spin build`), collects the component
//! binaries declared in `spin.toml`, copies the manifest, optional runtime
//! config and the `spin` runtime binary into the output directory, and
//! synthesizes an executable `run.sh` launcher. Execution happens natively
//! when a working `spin` toolchain is present on the host, and inside an
//! ephemeral container otherwise (or when forced).
//!
//! ## Features
//!
//! - **Runtime binary resolution**: versioned release download with a
//!   persistent on-disk cache keyed by version and architecture
//! - **Typed command plans**: the pipeline is an inspectable sequence of
//!   stages, deterministic for identical inputs
//! - **Native/container selection**: one toolchain probe per process,
//!   shared as an explicit capability object
//! - **Content-hashed output**: SHA-256 identity of the artifact tree for
//!   upload deduplication

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod bundler;
pub mod error;
pub mod manifest;
pub mod plan;
pub mod runtime;
pub mod toolchain;

// Re-export main types for public API
pub use bundler::{
    AssetHashType, BundledArtifact, Bundler, BundlingRequest, BundlingRequestBuilder,
    LocalFailurePolicy,
};
pub use error::{Error, Result};
pub use plan::{CommandHooks, CommandPlan, PlanInputs, PlannedCommand, Stage};
pub use runtime::{Architecture, BinaryCache, CacheKey, SpinResolver};
pub use toolchain::SpinToolchain;
