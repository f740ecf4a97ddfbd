//! # ac-storage-local
//! altchan/crates/ac-plugins/ac-storage-local/src/lib.rs
//! Local filesystem implementation of `MediaStore`.
//! Files live flat in one directory under the name the service generated.

use ac_core::traits::MediaStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./images")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/images")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self {
            root_path: root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Creates the upload directory if it does not exist yet.
    pub async fn init(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.root_path).await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    fn path_for(&self, filename: &str) -> anyhow::Result<PathBuf> {
        // Names are generated by the service, but never let one escape the root.
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            anyhow::bail!("refusing to store upload under {filename:?}");
        }
        Ok(self.root_path.join(filename))
    }
}

/// Best-effort removal of a temporary file left by a failed save.
async fn discard_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(file = %path.display(), error = %err, "could not remove partial upload");
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Writes to a temporary sibling first and renames it into place, so a
    /// half-written file is never visible under its final name.
    async fn save_upload(&self, filename: &str, data: Bytes) -> anyhow::Result<()> {
        let target_path = self.path_for(filename)?;
        let partial_path = self.root_path.join(format!(".{filename}.part"));

        fs::create_dir_all(&self.root_path).await?;
        let written = match fs::write(&partial_path, &data).await {
            Ok(()) => fs::rename(&partial_path, &target_path).await,
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            discard_partial(&partial_path).await;
            return Err(err.into());
        }

        tracing::debug!(file = %target_path.display(), bytes = data.len(), "upload stored");
        Ok(())
    }

    async fn remove_upload(&self, filename: &str) -> anyhow::Result<()> {
        let target_path = self.path_for(filename)?;
        match fs::remove_file(&target_path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn get_url(&self, filename: &str) -> String {
        format!("{}/{}", self.url_prefix, filename)
    }
}
