//! Local spin toolchain capability probing.
//!
//! Decides whether packaging runs natively on the host or inside a
//! container. The probe runs at most once per [`SpinToolchain`] instance;
//! the orchestrator constructs one per process and shares it by reference,
//! so toolchain presence is assumed stable for the process lifetime.
//! Callers installing the toolchain mid-run must construct a fresh instance.

use std::sync::OnceLock;
use tokio::process::Command;

/// Name of the component build tool probed on the host.
pub const SPIN_PROGRAM: &str = "spin";

/// Write-once capability record of local `spin` availability.
#[derive(Debug, Default)]
pub struct SpinToolchain {
    probe: OnceLock<bool>,
}

impl SpinToolchain {
    /// Creates an unprobed toolchain; the first availability query probes.
    pub fn new() -> Self {
        Self {
            probe: OnceLock::new(),
        }
    }

    /// Creates a toolchain with a pre-seeded probe result.
    ///
    /// Useful for tests and for callers that have already established
    /// toolchain availability by other means.
    pub fn with_availability(available: bool) -> Self {
        let probe = OnceLock::new();
        let _ = probe.set(available);
        Self { probe }
    }

    /// Whether a working `spin` toolchain is available on the host.
    ///
    /// Probed by invoking `spin --version`; a non-zero exit or a spawn
    /// failure degrades to "unavailable" rather than surfacing an error.
    /// Concurrent first calls may probe more than once but converge on a
    /// single stored result.
    pub async fn available(&self) -> bool {
        if let Some(available) = self.probe.get() {
            return *available;
        }
        let available = probe_spin_version().await;
        *self.probe.get_or_init(|| available)
    }

    /// Whether packaging should run inside a container.
    ///
    /// Forced containerization short-circuits without probing.
    pub async fn should_build_in_container(&self, force_container: bool) -> bool {
        if force_container {
            return true;
        }
        !self.available().await
    }
}

async fn probe_spin_version() -> bool {
    // Not on PATH: unavailable without spawning anything.
    if which::which(SPIN_PROGRAM).is_err() {
        log::debug!("{SPIN_PROGRAM} not found on PATH, preferring container build");
        return false;
    }

    match Command::new(SPIN_PROGRAM).arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(e) => {
            log::debug!("probing {SPIN_PROGRAM} failed: {e}");
            false
        }
    }
}
