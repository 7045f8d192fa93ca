//! Composition of the bundling command pipeline.
//!
//! A [`CommandPlan`] is a typed, ordered sequence of pipeline stages, each
//! carrying the shell command it renders to. The plan is a pure function of
//! its inputs: identical inputs compose to byte-identical plans, which is
//! what makes content-hash based output caching meaningful upstream. The
//! stages are only joined into a single textual pipeline at the execution
//! boundary ([`CommandPlan::to_shell`]) when the target environment requires
//! one string.

use crate::manifest::MANIFEST_FILE_NAME;
use crate::runtime::RUNTIME_BINARY_NAME;
use std::path::Path;

/// File name of the generated launcher script.
pub const LAUNCHER_FILE_NAME: &str = "run.sh";

/// Default launcher body: the runtime binary with fixed flags, as expected
/// by the web-adapter layer fronting the function.
pub const DEFAULT_LAUNCHER_COMMAND: &str =
    "./spin up --listen 127.0.0.1:8080 --log-dir \"\" --state-dir /tmp --disable-pooling";

/// Identity of one stage in the bundling pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Caller-supplied command run before the build
    PreHook,
    /// `spin build` in the input directory
    Build,
    /// Stream-copy of one component artifact into the output directory
    CollectComponent,
    /// Copy of the manifest file into the output directory
    CopyManifest,
    /// Copy of the runtime config file into the output directory
    CopyRuntimeConfig,
    /// Copy of the runtime binary into the output directory
    CopyRuntimeBinary,
    /// Emission of the executable launcher script
    WriteLauncher,
    /// Caller-supplied command run after bundling
    PostHook,
}

impl Stage {
    /// Stable stage name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::PreHook => "pre-hook",
            Stage::Build => "build",
            Stage::CollectComponent => "collect-component",
            Stage::CopyManifest => "copy-manifest",
            Stage::CopyRuntimeConfig => "copy-runtime-config",
            Stage::CopyRuntimeBinary => "copy-runtime-binary",
            Stage::WriteLauncher => "write-launcher",
            Stage::PostHook => "post-hook",
        }
    }
}

/// One composed command, tagged with the stage it implements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCommand {
    /// Pipeline stage this command implements
    pub stage: Stage,
    /// Shell command line for this stage
    pub command: String,
}

/// Caller-supplied commands run around the core pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandHooks {
    /// Commands run before `spin build`
    pub before_bundling: Vec<String>,
    /// Commands run after the launcher script is written
    pub after_bundling: Vec<String>,
}

/// Concrete inputs one plan is composed from.
///
/// All commands run with the project (manifest) directory as working
/// directory; only the output side appears in the commands themselves.
#[derive(Debug, Clone)]
pub struct PlanInputs<'a> {
    /// Output directory the artifact is assembled into
    pub output_dir: &'a Path,
    /// Component artifact paths discovered in the manifest
    pub component_sources: &'a [String],
    /// Path of the runtime binary to ship, as visible to the executing shell
    pub runtime_binary_path: &'a Path,
    /// Optional runtime config file; copied by base name only
    pub runtime_config_path: Option<&'a Path>,
    /// Optional launcher body overriding the default invocation
    pub launcher_command: Option<&'a str>,
    /// Pre/post hook commands
    pub hooks: &'a CommandHooks,
}

/// Ordered command sequence for one bundling attempt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    commands: Vec<PlannedCommand>,
}

impl CommandPlan {
    /// Composes the full pipeline for the given inputs.
    ///
    /// Stages with no applicable content (no hooks, no runtime config) are
    /// omitted rather than emitted as no-ops.
    pub fn compose(inputs: &PlanInputs<'_>) -> Self {
        let out = inputs.output_dir.display();
        let mut commands = Vec::new();

        for hook in &inputs.hooks.before_bundling {
            commands.push(PlannedCommand {
                stage: Stage::PreHook,
                command: hook.clone(),
            });
        }

        commands.push(PlannedCommand {
            stage: Stage::Build,
            command: "spin build".to_string(),
        });

        for source in inputs.component_sources {
            // cpio recreates the relative path under the output root and
            // tolerates the build output being a pipe or special file.
            commands.push(PlannedCommand {
                stage: Stage::CollectComponent,
                command: format!("echo {source} | cpio -pdm --quiet {out}"),
            });
        }

        commands.push(PlannedCommand {
            stage: Stage::CopyManifest,
            command: format!("cp {MANIFEST_FILE_NAME} {out}"),
        });

        if let Some(name) = runtime_config_name(inputs.runtime_config_path) {
            commands.push(PlannedCommand {
                stage: Stage::CopyRuntimeConfig,
                command: format!("cp {name} {out}"),
            });
        }

        commands.push(PlannedCommand {
            stage: Stage::CopyRuntimeBinary,
            command: format!(
                "cp {} {out}/{RUNTIME_BINARY_NAME}",
                inputs.runtime_binary_path.display()
            ),
        });

        let launcher = match inputs.launcher_command {
            Some(body) => body.to_string(),
            None => default_launcher_command(inputs.runtime_config_path),
        };
        let script = format!("#!/bin/bash\n\n{launcher}\n");
        commands.push(PlannedCommand {
            stage: Stage::WriteLauncher,
            command: format!(
                "echo '{script}' > {out}/{LAUNCHER_FILE_NAME} && chmod +x {out}/{LAUNCHER_FILE_NAME}"
            ),
        });

        for hook in &inputs.hooks.after_bundling {
            commands.push(PlannedCommand {
                stage: Stage::PostHook,
                command: hook.clone(),
            });
        }

        Self { commands }
    }

    /// The composed commands in execution order.
    pub fn commands(&self) -> &[PlannedCommand] {
        &self.commands
    }

    /// Number of commands implementing the given stage.
    pub fn stage_count(&self, stage: Stage) -> usize {
        self.commands.iter().filter(|c| c.stage == stage).count()
    }

    /// Joins all stages into a single "all must succeed" shell chain.
    pub fn to_shell(&self) -> String {
        self.commands
            .iter()
            .map(|c| c.command.as_str())
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

fn runtime_config_name(path: Option<&Path>) -> Option<String> {
    path.and_then(|p| p.file_name())
        .map(|name| name.to_string_lossy().into_owned())
}

fn default_launcher_command(runtime_config_path: Option<&Path>) -> String {
    match runtime_config_name(runtime_config_path) {
        Some(name) => format!("{DEFAULT_LAUNCHER_COMMAND} --runtime-config-file {name}"),
        None => DEFAULT_LAUNCHER_COMMAND.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn inputs<'a>(
        sources: &'a [String],
        runtime_config: Option<&'a Path>,
        hooks: &'a CommandHooks,
    ) -> PlanInputs<'a> {
        PlanInputs {
            output_dir: Path::new("/out"),
            component_sources: sources,
            runtime_binary_path: Path::new("/cache/spin"),
            runtime_config_path: runtime_config,
            launcher_command: None,
            hooks,
        }
    }

    #[test]
    fn one_collect_stage_per_string_source() {
        let hooks = CommandHooks::default();
        let sources = vec!["a.wasm".to_string(), "b/b.wasm".to_string()];
        let plan = CommandPlan::compose(&inputs(&sources, None, &hooks));

        assert_eq!(plan.stage_count(Stage::CollectComponent), 2);
        assert_eq!(
            plan.commands()[1].command,
            "echo a.wasm | cpio -pdm --quiet /out"
        );
    }

    #[test]
    fn no_sources_means_no_collect_stages() {
        let hooks = CommandHooks::default();
        let plan = CommandPlan::compose(&inputs(&[], None, &hooks));
        assert_eq!(plan.stage_count(Stage::CollectComponent), 0);
    }

    #[test]
    fn compose_is_deterministic() {
        let hooks = CommandHooks {
            before_bundling: vec!["make prepare".to_string()],
            after_bundling: vec!["ls /out".to_string()],
        };
        let sources = vec!["a.wasm".to_string()];
        let config = PathBuf::from("/a/b/config.toml");
        let first = CommandPlan::compose(&inputs(&sources, Some(&config), &hooks));
        let second = CommandPlan::compose(&inputs(&sources, Some(&config), &hooks));

        assert_eq!(first, second);
        assert_eq!(first.to_shell(), second.to_shell());
    }

    #[test]
    fn runtime_config_is_flattened_to_base_name() {
        let hooks = CommandHooks::default();
        let config = PathBuf::from("/a/b/config.toml");
        let plan = CommandPlan::compose(&inputs(&[], Some(&config), &hooks));

        let copy = plan
            .commands()
            .iter()
            .find(|c| c.stage == Stage::CopyRuntimeConfig)
            .expect("copy-runtime-config stage");
        assert_eq!(copy.command, "cp config.toml /out");
        assert!(!plan.to_shell().contains("/a/b/config.toml"));
    }

    #[test]
    fn omitted_runtime_config_omits_the_stage() {
        let hooks = CommandHooks::default();
        let plan = CommandPlan::compose(&inputs(&[], None, &hooks));
        assert_eq!(plan.stage_count(Stage::CopyRuntimeConfig), 0);
    }

    #[test]
    fn default_launcher_references_runtime_config_when_supplied() {
        let hooks = CommandHooks::default();
        let config = PathBuf::from("/a/b/config.toml");
        let plan = CommandPlan::compose(&inputs(&[], Some(&config), &hooks));

        let launcher = plan
            .commands()
            .iter()
            .find(|c| c.stage == Stage::WriteLauncher)
            .expect("write-launcher stage");
        assert!(launcher.command.contains("--runtime-config-file config.toml"));
        assert!(launcher.command.starts_with("echo '#!/bin/bash"));
        assert!(launcher.command.ends_with("chmod +x /out/run.sh"));
    }

    #[test]
    fn launcher_override_replaces_default_body() {
        let hooks = CommandHooks::default();
        let sources: Vec<String> = Vec::new();
        let plan = CommandPlan::compose(&PlanInputs {
            output_dir: Path::new("/out"),
            component_sources: &sources,
            runtime_binary_path: Path::new("/cache/spin"),
            runtime_config_path: None,
            launcher_command: Some("./spin up --listen 0.0.0.0:3000"),
            hooks: &hooks,
        });

        let launcher = plan
            .commands()
            .iter()
            .find(|c| c.stage == Stage::WriteLauncher)
            .expect("write-launcher stage");
        assert!(launcher.command.contains("./spin up --listen 0.0.0.0:3000"));
        assert!(!launcher.command.contains("--disable-pooling"));
    }

    #[test]
    fn hooks_bracket_the_pipeline() {
        let hooks = CommandHooks {
            before_bundling: vec!["make prepare".to_string()],
            after_bundling: vec!["ls /out".to_string()],
        };
        let plan = CommandPlan::compose(&inputs(&[], None, &hooks));

        let commands = plan.commands();
        assert_eq!(commands.first().map(|c| c.stage), Some(Stage::PreHook));
        assert_eq!(commands.last().map(|c| c.stage), Some(Stage::PostHook));
        assert!(plan.to_shell().starts_with("make prepare && spin build && "));
    }
}
