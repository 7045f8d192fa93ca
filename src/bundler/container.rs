//! Containerized execution of a composed bundling plan.
//!
//! Runs the identical pipeline inside an ephemeral container: the project
//! directory is mounted as the working volume, the output directory and the
//! runtime binary are mounted alongside it, and caller environment overrides
//! are injected explicitly. The container requires `bash`, `cpio` and the
//! `spin` CLI in the image.

use super::BundlingRequest;
use crate::error::{Error, Result};
use crate::plan::{CommandPlan, PlanInputs};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use uuid::Uuid;

/// Mount point of the project directory inside the container.
pub const CONTAINER_INPUT_DIR: &str = "/asset-input";

/// Mount point of the output directory inside the container.
pub const CONTAINER_OUTPUT_DIR: &str = "/asset-output";

/// In-container path the host runtime binary is mounted at.
const CONTAINER_RUNTIME_BINARY: &str = "/opt/spin-runtime/spin";

/// Image used when the request does not name one. Real projects should
/// supply an image with the spin CLI preinstalled; there is no official
/// build image for it.
pub const DEFAULT_CONTAINER_IMAGE: &str = "rust:1-bookworm";

/// Removes the container on abnormal termination. `--rm` covers the normal
/// exit path; removing an already-gone container is harmless.
struct ContainerGuard {
    name: String,
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        let _ = std::process::Command::new("docker")
            .args(["rm", "-f", &self.name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
}

pub(super) async fn run(
    request: &BundlingRequest,
    component_sources: &[String],
    output_dir: &Path,
) -> Result<()> {
    let runtime_binary = PathBuf::from(CONTAINER_RUNTIME_BINARY);
    let inputs = PlanInputs {
        output_dir: Path::new(CONTAINER_OUTPUT_DIR),
        component_sources,
        runtime_binary_path: &runtime_binary,
        runtime_config_path: request.runtime_config_path(),
        launcher_command: request.launcher_command(),
        hooks: request.hooks(),
    };
    let pipeline = CommandPlan::compose(&inputs).to_shell();

    let manifest_dir = absolute(request.manifest_dir())?;
    let output_dir = absolute(output_dir)?;
    let host_binary = absolute(request.runtime_binary_path())?;

    let container_name = format!("spin-bundle-{}", Uuid::new_v4());
    let _guard = ContainerGuard {
        name: container_name.clone(),
    };

    let mut args = vec![
        "run".to_string(),
        "--name".to_string(),
        container_name,
        "--rm".to_string(),
        "-v".to_string(),
        format!("{}:{CONTAINER_INPUT_DIR}", manifest_dir.display()),
        "-v".to_string(),
        format!("{}:{CONTAINER_OUTPUT_DIR}", output_dir.display()),
        "-v".to_string(),
        format!("{}:{CONTAINER_RUNTIME_BINARY}:ro", host_binary.display()),
        "-w".to_string(),
        CONTAINER_INPUT_DIR.to_string(),
    ];
    for (key, value) in request.environment() {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }
    args.push(
        request
            .container_image()
            .unwrap_or(DEFAULT_CONTAINER_IMAGE)
            .to_string(),
    );
    args.push("bash".to_string());
    args.push("-c".to_string());
    args.push(pipeline.clone());

    log::debug!("docker {}", args.join(" "));

    let output = Command::new("docker")
        .args(&args)
        .output()
        .await
        .map_err(|source| Error::CommandSpawn {
            command: format!("docker {}", args.join(" ")),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            log::error!("container bundling stderr:\n{}", stderr.trim_end());
        }
        return Err(Error::BundlingFailed {
            stage: "container",
            command: pipeline,
            exit_code: output.status.code().unwrap_or(-1),
        });
    }

    Ok(())
}

/// Resolves a path for a bind mount. Canonicalization can fail on network
/// mounts; fall back to an absolute path and let the container runtime
/// resolve symlinks.
fn absolute(path: &Path) -> Result<PathBuf> {
    match path.canonicalize() {
        Ok(resolved) => Ok(resolved),
        Err(_) if path.is_absolute() => Ok(path.to_path_buf()),
        Err(_) => Ok(std::env::current_dir()?.join(path)),
    }
}
