//! Artifact packaging pipeline.
//!
//! Turns one [`BundlingRequest`] into a deployable output directory: the
//! manifest is inspected, the execution mode (native or container) is
//! decided through the shared [`SpinToolchain`] capability, the command
//! plan is composed and executed, and the output tree is content-hashed.
//!
//! ```no_run
//! use spin_lambda_bundler::{AssetHashType, Bundler, BundlingRequest, SpinToolchain};
//! # async fn example() -> spin_lambda_bundler::Result<()> {
//! let request = BundlingRequest::builder("my-app", "/tmp/spin-cache/spin")
//!     .runtime_config_path("my-app/config.toml")
//!     .asset_hash(AssetHashType::Output)
//!     .build();
//!
//! let toolchain = SpinToolchain::new();
//! let artifact = Bundler::new(&toolchain)
//!     .bundle(&request, "target/lambda".as_ref())
//!     .await?;
//! println!("bundled {} ({})", artifact.output_dir.display(), artifact.asset_hash);
//! # Ok(())
//! # }
//! ```

mod container;
mod hash;
mod local;

pub use container::{CONTAINER_INPUT_DIR, CONTAINER_OUTPUT_DIR, DEFAULT_CONTAINER_IMAGE};
pub use hash::hash_directory;

use crate::error::{Error, Result};
use crate::manifest;
use crate::plan::CommandHooks;
use crate::toolchain::SpinToolchain;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How the output asset hash is derived.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssetHashType {
    /// Hash the produced output tree (content-addressed identity)
    #[default]
    Output,
    /// Use a caller-supplied hash verbatim
    Custom(String),
}

/// Policy applied when local execution was chosen and then failed.
///
/// The container decision is made once, up front; this policy makes the
/// behavior after a local failure an explicit caller choice instead of a
/// silent terminal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalFailurePolicy {
    /// Report the failure to the caller (no retry)
    #[default]
    Fail,
    /// Retry the whole plan once inside a container
    FallBackToContainer,
}

/// One packaging invocation. Immutable after construction.
#[derive(Debug, Clone)]
pub struct BundlingRequest {
    manifest_dir: PathBuf,
    runtime_binary_path: PathBuf,
    runtime_config_path: Option<PathBuf>,
    launcher_command: Option<String>,
    environment: BTreeMap<String, String>,
    hooks: CommandHooks,
    force_container: bool,
    container_image: Option<String>,
    asset_hash: AssetHashType,
    on_local_failure: LocalFailurePolicy,
}

impl BundlingRequest {
    /// Starts building a request for the given project directory (the one
    /// containing `spin.toml`) and runtime binary path.
    pub fn builder(
        manifest_dir: impl Into<PathBuf>,
        runtime_binary_path: impl Into<PathBuf>,
    ) -> BundlingRequestBuilder {
        BundlingRequestBuilder {
            request: BundlingRequest {
                manifest_dir: manifest_dir.into(),
                runtime_binary_path: runtime_binary_path.into(),
                runtime_config_path: None,
                launcher_command: None,
                environment: BTreeMap::new(),
                hooks: CommandHooks::default(),
                force_container: false,
                container_image: None,
                asset_hash: AssetHashType::default(),
                on_local_failure: LocalFailurePolicy::default(),
            },
        }
    }

    /// Directory containing the `spin.toml` manifest.
    pub fn manifest_dir(&self) -> &Path {
        &self.manifest_dir
    }

    /// Path of the runtime binary shipped inside the artifact.
    pub fn runtime_binary_path(&self) -> &Path {
        &self.runtime_binary_path
    }

    /// Optional runtime config file, copied by base name into the artifact.
    pub fn runtime_config_path(&self) -> Option<&Path> {
        self.runtime_config_path.as_deref()
    }

    /// Optional launcher body overriding the default invocation.
    pub fn launcher_command(&self) -> Option<&str> {
        self.launcher_command.as_deref()
    }

    /// Environment overrides applied to every pipeline command.
    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// Pre/post command hooks.
    pub fn hooks(&self) -> &CommandHooks {
        &self.hooks
    }

    /// Whether containerized execution is forced regardless of toolchain.
    pub fn force_container(&self) -> bool {
        self.force_container
    }

    /// Container image override for containerized execution.
    pub fn container_image(&self) -> Option<&str> {
        self.container_image.as_deref()
    }

    /// Asset hash strategy for the produced directory.
    pub fn asset_hash(&self) -> &AssetHashType {
        &self.asset_hash
    }

    /// Policy applied when local execution fails.
    pub fn on_local_failure(&self) -> LocalFailurePolicy {
        self.on_local_failure
    }
}

/// Builder producing an immutable [`BundlingRequest`].
#[derive(Debug)]
pub struct BundlingRequestBuilder {
    request: BundlingRequest,
}

impl BundlingRequestBuilder {
    /// Sets the runtime config file shipped with the artifact.
    pub fn runtime_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.runtime_config_path = Some(path.into());
        self
    }

    /// Overrides the launcher script body.
    pub fn launcher_command(mut self, command: impl Into<String>) -> Self {
        self.request.launcher_command = Some(command.into());
        self
    }

    /// Adds one environment override for pipeline commands.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.environment.insert(key.into(), value.into());
        self
    }

    /// Adds a command run before the build stage.
    pub fn before_bundling(mut self, command: impl Into<String>) -> Self {
        self.request.hooks.before_bundling.push(command.into());
        self
    }

    /// Adds a command run after the launcher script is written.
    pub fn after_bundling(mut self, command: impl Into<String>) -> Self {
        self.request.hooks.after_bundling.push(command.into());
        self
    }

    /// Forces containerized execution regardless of local toolchain.
    pub fn force_container(mut self, force: bool) -> Self {
        self.request.force_container = force;
        self
    }

    /// Names the container image used for containerized execution.
    pub fn container_image(mut self, image: impl Into<String>) -> Self {
        self.request.container_image = Some(image.into());
        self
    }

    /// Selects the asset hash strategy.
    pub fn asset_hash(mut self, hash: AssetHashType) -> Self {
        self.request.asset_hash = hash;
        self
    }

    /// Selects the policy applied when local execution fails.
    pub fn on_local_failure(mut self, policy: LocalFailurePolicy) -> Self {
        self.request.on_local_failure = policy;
        self
    }

    /// Finalizes the immutable request.
    pub fn build(self) -> BundlingRequest {
        self.request
    }
}

/// A produced artifact directory plus its identity hash.
#[derive(Debug, Clone)]
pub struct BundledArtifact {
    /// Directory containing the flattened artifact layout
    pub output_dir: PathBuf,
    /// Content hash per the request's [`AssetHashType`]
    pub asset_hash: String,
    /// Whether the artifact was built inside a container
    pub container_built: bool,
}

/// Executes bundling requests against a shared toolchain capability.
#[derive(Debug)]
pub struct Bundler<'t> {
    toolchain: &'t SpinToolchain,
}

impl<'t> Bundler<'t> {
    /// Creates a bundler borrowing the process-wide toolchain capability.
    pub fn new(toolchain: &'t SpinToolchain) -> Self {
        Self { toolchain }
    }

    /// Packages one request into `output_dir`.
    ///
    /// A failed attempt leaves any partial output in place; a fresh attempt
    /// overwrites it, or the caller pre-clears the directory.
    pub async fn bundle(
        &self,
        request: &BundlingRequest,
        output_dir: &Path,
    ) -> Result<BundledArtifact> {
        let component_sources = manifest::component_sources(request.manifest_dir())?;
        log::info!(
            "bundling {} ({} component artifact(s))",
            request.manifest_dir().display(),
            component_sources.len()
        );

        let in_container = self
            .toolchain
            .should_build_in_container(request.force_container())
            .await;

        tokio::fs::create_dir_all(output_dir).await?;

        let container_built = if in_container {
            container::run(request, &component_sources, output_dir).await?;
            true
        } else {
            match local::run(request, &component_sources, output_dir).await {
                Ok(()) => false,
                Err(err @ Error::BundlingFailed { .. })
                    if request.on_local_failure() == LocalFailurePolicy::FallBackToContainer =>
                {
                    log::warn!("local bundling failed ({err}), retrying in container");
                    container::run(request, &component_sources, output_dir).await?;
                    true
                }
                Err(err) => return Err(err),
            }
        };

        let asset_hash = match request.asset_hash() {
            AssetHashType::Output => hash_directory(output_dir)?,
            AssetHashType::Custom(hash) => hash.clone(),
        };

        Ok(BundledArtifact {
            output_dir: output_dir.to_path_buf(),
            asset_hash,
            container_built,
        })
    }
}
