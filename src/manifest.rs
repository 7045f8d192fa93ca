//! Spin manifest inspection.
//!
//! Discovers the component artifact paths a project declares in its
//! `spin.toml`. Only string-valued `source` fields participate in artifact
//! collection; pre-built registry references and other non-path sources are
//! skipped.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::io;
use std::path::Path;

/// File name of the Spin build manifest inside the project directory.
pub const MANIFEST_FILE_NAME: &str = "spin.toml";

#[derive(Debug, Deserialize)]
struct SpinManifest {
    #[serde(default)]
    component: toml::Table,
}

/// Lists the component `source` paths declared in `{manifest_dir}/spin.toml`,
/// in declaration order.
///
/// The manifest is re-read on every call; manifests are small and rarely
/// change within a single run, so there is no caching layer.
///
/// # Errors
///
/// Returns [`Error::ManifestNotFound`] if the manifest file is missing and
/// [`Error::ManifestParse`] if its content is not valid TOML.
pub fn component_sources(manifest_dir: &Path) -> Result<Vec<String>> {
    let path = manifest_dir.join(MANIFEST_FILE_NAME);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::ManifestNotFound { path });
        }
        Err(e) => return Err(e.into()),
    };

    let manifest: SpinManifest =
        toml::from_str(&contents).map_err(|source| Error::ManifestParse { path, source })?;

    Ok(manifest
        .component
        .values()
        .filter_map(|descriptor| descriptor.get("source"))
        .filter_map(|source| source.as_str())
        .map(str::to_string)
        .collect())
}
