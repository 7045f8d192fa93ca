//! Deterministic content hashing of output directories.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::io;
use std::path::Path;

/// Computes a SHA-256 hex digest over a directory tree.
///
/// Entries are visited in sorted order; each feeds the digest with its
/// relative path, the content length, and the content itself, so the hash
/// is a stable identity of the tree suitable for upload deduplication.
/// The length prefix keeps the path/content boundary unambiguous: without
/// it, `x` containing `yz` and `xy` containing `z` would digest the same
/// byte stream.
pub fn hash_directory(dir: &Path) -> Result<String> {
    let mut hasher = Sha256::new();

    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel_path = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or_else(|_| entry.path());
        let contents = std::fs::read(entry.path())?;
        hasher.update(rel_path.to_string_lossy().as_bytes());
        hasher.update((contents.len() as u64).to_le_bytes());
        hasher.update(&contents);
    }

    Ok(hex::encode(hasher.finalize()))
}
