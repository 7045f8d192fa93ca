//! Local (host) execution of a composed bundling plan.
//!
//! Stages run one at a time through `bash -c` with the project directory as
//! working directory and the caller's environment overrides merged over the
//! inherited process environment. Per-stage execution is what lets a failure
//! name the exact stage and command that broke.

use super::BundlingRequest;
use crate::error::{Error, Result};
use crate::plan::{CommandPlan, PlanInputs};
use std::path::Path;
use tokio::process::Command;

pub(super) async fn run(
    request: &BundlingRequest,
    component_sources: &[String],
    output_dir: &Path,
) -> Result<()> {
    let inputs = PlanInputs {
        output_dir,
        component_sources,
        runtime_binary_path: request.runtime_binary_path(),
        runtime_config_path: request.runtime_config_path(),
        launcher_command: request.launcher_command(),
        hooks: request.hooks(),
    };
    let plan = CommandPlan::compose(&inputs);

    for planned in plan.commands() {
        log::debug!("[{}] {}", planned.stage.name(), planned.command);

        let status = Command::new("bash")
            .arg("-c")
            .arg(&planned.command)
            .current_dir(request.manifest_dir())
            .envs(request.environment())
            .status()
            .await
            .map_err(|source| Error::CommandSpawn {
                command: planned.command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(Error::BundlingFailed {
                stage: planned.stage.name(),
                command: planned.command.clone(),
                exit_code: status.code().unwrap_or(-1),
            });
        }
    }

    Ok(())
}
