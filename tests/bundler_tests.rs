#[cfg(test)]
mod tests {
    use spin_lambda_bundler::{
        AssetHashType, Bundler, BundlingRequest, Error, LocalFailurePolicy, SpinToolchain,
    };
    use std::path::Path;

    fn write_project(dir: &Path) {
        std::fs::write(
            dir.join("spin.toml"),
            r#"
spin_manifest_version = 2

[component.a]
source = "a.wasm"

[component.b]
source = { registry = "ghcr.io/x", package = "b", version = "1.0.0" }
"#,
        )
        .expect("write manifest");
        std::fs::write(dir.join("a.wasm"), b"\0asm fake module").expect("write component");
        std::fs::write(dir.join("config.toml"), b"[variables]\n").expect("write runtime config");
    }

    #[cfg(unix)]
    fn write_stub_spin(dir: &Path) {
        use std::os::unix::fs::PermissionsExt;

        let stub = dir.join("spin");
        std::fs::write(&stub, "#!/bin/bash\nexit 0\n").expect("write stub");
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755))
            .expect("chmod stub");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn end_to_end_local_bundle_produces_flattened_artifact() {
        let _ = env_logger::builder().is_test(true).try_init();

        // The local pipeline shells out to bash and cpio.
        if which::which("bash").is_err() || which::which("cpio").is_err() {
            eprintln!("skipping: bash/cpio not available");
            return;
        }

        let project = tempfile::tempdir().expect("tempdir");
        write_project(project.path());

        let stub_bin = tempfile::tempdir().expect("tempdir");
        write_stub_spin(stub_bin.path());

        let runtime_dir = tempfile::tempdir().expect("tempdir");
        let runtime_binary = runtime_dir.path().join("spin");
        std::fs::write(&runtime_binary, b"fake runtime binary").expect("write runtime binary");

        let path_override = format!(
            "{}:{}",
            stub_bin.path().display(),
            std::env::var("PATH").unwrap_or_default()
        );
        let request = BundlingRequest::builder(project.path(), &runtime_binary)
            .runtime_config_path(project.path().join("config.toml"))
            .env("PATH", path_override)
            .asset_hash(AssetHashType::Output)
            .build();

        let toolchain = SpinToolchain::with_availability(true);
        let bundler = Bundler::new(&toolchain);

        let out = tempfile::tempdir().expect("tempdir");
        let artifact = bundler
            .bundle(&request, out.path())
            .await
            .expect("bundle should succeed");

        assert!(!artifact.container_built);
        assert_eq!(artifact.asset_hash.len(), 64);

        // Flattened layout: manifest, runtime config, runtime binary,
        // launcher, and only the string-sourced component.
        assert!(out.path().join("a.wasm").is_file());
        assert!(out.path().join("spin.toml").is_file());
        assert!(out.path().join("config.toml").is_file());
        assert!(out.path().join("spin").is_file());
        assert!(out.path().join("run.sh").is_file());
        assert!(!out.path().join("b").exists());
        assert!(!out.path().join("b.wasm").exists());

        let launcher = std::fs::read_to_string(out.path().join("run.sh")).expect("read run.sh");
        assert!(launcher.starts_with("#!/bin/bash"));
        assert!(launcher.contains("--disable-pooling"));
        assert!(launcher.contains("--runtime-config-file config.toml"));

        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(out.path().join("run.sh"))
            .expect("launcher metadata")
            .permissions()
            .mode();
        assert_ne!(mode & 0o111, 0, "launcher must be executable");

        // Identical inputs bundle to an identical content hash.
        let out_again = tempfile::tempdir().expect("tempdir");
        let again = bundler
            .bundle(&request, out_again.path())
            .await
            .expect("second bundle should succeed");
        assert_eq!(artifact.asset_hash, again.asset_hash);
    }

    fn is_container_attempt(err: &Error) -> bool {
        match err {
            Error::BundlingFailed { stage, .. } => *stage == "container",
            Error::CommandSpawn { command, .. } => command.starts_with("docker "),
            _ => false,
        }
    }

    #[tokio::test]
    async fn force_container_never_attempts_local_execution() {
        let project = tempfile::tempdir().expect("tempdir");
        write_project(project.path());

        // Toolchain reports available; the force flag must still win. The
        // container attempt itself fails in this environment, and the error
        // must be attributed to the container path, never to a local stage.
        let toolchain = SpinToolchain::with_availability(true);
        let request = BundlingRequest::builder(project.path(), "/nonexistent/spin")
            .force_container(true)
            .build();

        let out = tempfile::tempdir().expect("tempdir");
        let err = Bundler::new(&toolchain)
            .bundle(&request, out.path())
            .await
            .expect_err("container attempt should fail here");
        assert!(is_container_attempt(&err), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn unavailable_toolchain_selects_container_execution() {
        let project = tempfile::tempdir().expect("tempdir");
        write_project(project.path());

        let toolchain = SpinToolchain::with_availability(false);
        let request = BundlingRequest::builder(project.path(), "/nonexistent/spin").build();

        let out = tempfile::tempdir().expect("tempdir");
        let err = Bundler::new(&toolchain)
            .bundle(&request, out.path())
            .await
            .expect_err("container attempt should fail here");
        assert!(is_container_attempt(&err), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn local_failure_falls_back_to_container_when_policy_allows() {
        if which::which("bash").is_err() {
            eprintln!("skipping: bash not available");
            return;
        }

        let project = tempfile::tempdir().expect("tempdir");
        write_project(project.path());

        // Toolchain is available, so local execution is chosen first. The
        // pre-hook guarantees the local attempt fails, and the fallback
        // policy mandates one container retry. That retry fails in this
        // environment, so the resulting error must be attributed to the
        // container attempt rather than the failing local stage.
        let toolchain = SpinToolchain::with_availability(true);
        let request = BundlingRequest::builder(project.path(), "/nonexistent/spin")
            .before_bundling("exit 7")
            .on_local_failure(LocalFailurePolicy::FallBackToContainer)
            .build();

        let out = tempfile::tempdir().expect("tempdir");
        let err = Bundler::new(&toolchain)
            .bundle(&request, out.path())
            .await
            .expect_err("container attempt should fail here");
        assert!(is_container_attempt(&err), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn local_failure_is_terminal_under_default_policy() {
        if which::which("bash").is_err() {
            eprintln!("skipping: bash not available");
            return;
        }

        let project = tempfile::tempdir().expect("tempdir");
        write_project(project.path());

        let toolchain = SpinToolchain::with_availability(true);
        let request = BundlingRequest::builder(project.path(), "/nonexistent/spin")
            .before_bundling("exit 7")
            .build();

        let out = tempfile::tempdir().expect("tempdir");
        let err = Bundler::new(&toolchain)
            .bundle(&request, out.path())
            .await
            .expect_err("local attempt should fail");
        match err {
            Error::BundlingFailed {
                stage, exit_code, ..
            } => {
                assert_eq!(stage, "pre-hook");
                assert_eq!(exit_code, 7);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_manifest_fails_before_any_execution() {
        let project = tempfile::tempdir().expect("tempdir");

        let toolchain = SpinToolchain::with_availability(false);
        let request = BundlingRequest::builder(project.path(), "/nonexistent/spin")
            .force_container(true)
            .build();

        let out = tempfile::tempdir().expect("tempdir");
        let err = Bundler::new(&toolchain)
            .bundle(&request, out.path())
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::ManifestNotFound { .. }));
    }
}
