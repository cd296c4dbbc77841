//! Content-addressed file storage under the configured upload root.
//!
//! Blobs are named `<sha256>.<ext>` inside a per-purpose subdirectory, so
//! identical content stored twice resolves to the same path and the second
//! write is a no-op. Blobs are shared between records and are never deleted
//! when a referencing record goes away.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::{StoreError, StoreResult};
use crate::files::detect;

#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store bytes under `subdir`, naming the blob by its content hash.
    ///
    /// Returns the root-relative path (`subdir/<sha256>.<ext>`), which is
    /// what gets persisted on records. The extension comes from sniffing the
    /// bytes, never from a caller-supplied name. Storing the same content
    /// twice returns the same path without rewriting the blob.
    pub fn store(&self, data: &[u8], subdir: &str) -> StoreResult<String> {
        let mime = detect::sniff_mime(data);
        let hash = content_hash(data);
        let file_name = format!("{}.{}", hash, detect::extension_for(mime));

        let dir = self.root.join(subdir);
        std::fs::create_dir_all(&dir)?;

        let target = dir.join(&file_name);
        if !target.exists() {
            std::fs::write(&target, data)?;
            debug!(path = %target.display(), size = data.len(), "stored blob");
        }

        Ok(format!("{}/{}", subdir, file_name))
    }

    /// Resolve a stored relative path to an absolute path inside the root.
    ///
    /// Rejects absolute paths and any traversal component before touching the
    /// filesystem, then re-checks containment on the canonicalized result so
    /// a symlinked entry cannot point outside the upload root.
    pub fn resolve(&self, rel_path: &str) -> StoreResult<PathBuf> {
        let rel = Path::new(rel_path);
        if rel.is_absolute() {
            return Err(StoreError::PathEscape(rel_path.to_string()));
        }
        for component in rel.components() {
            match component {
                std::path::Component::Normal(_) => {}
                _ => return Err(StoreError::PathEscape(rel_path.to_string())),
            }
        }

        let candidate = self.root.join(rel);
        if !candidate.is_file() {
            return Err(StoreError::NotFound(rel_path.to_string()));
        }

        let root = self.root.canonicalize()?;
        let resolved = candidate.canonicalize()?;
        if !resolved.starts_with(&root) {
            return Err(StoreError::PathEscape(rel_path.to_string()));
        }

        Ok(resolved)
    }

    /// Read a stored blob back by its relative path.
    pub fn read(&self, rel_path: &str) -> StoreResult<Vec<u8>> {
        let path = self.resolve(rel_path)?;
        Ok(std::fs::read(path)?)
    }
}

/// Lowercase hex sha-256 of the content.
pub fn content_hash(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
