//! Managed local store
//!
//! Loose uploads that belong to no task or version (pasted images,
//! generated files) land here: a fresh sharded path under the storage
//! root, written atomically, identified from then on by its link string.

use std::path::PathBuf;

use dailies_core::artifact::StoredArtifact;
use dailies_core::config::{file_extension, MediaConfig};
use dailies_core::error::MediaResult;
use tokio::io::AsyncRead;

use crate::paths::StoragePaths;
use crate::writer;

#[derive(Clone, Debug)]
pub struct MediaStore {
    paths: StoragePaths,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            paths: StoragePaths::new(config.storage_root.clone()),
        }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Store a payload under a fresh sharded path, keeping the extension of
    /// `original_filename`, and return the artifact identified by its link.
    pub async fn put<R>(
        &self,
        source: &mut R,
        original_filename: &str,
    ) -> MediaResult<StoredArtifact>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let extension = file_extension(original_filename);
        let (dir, filename) = self.paths.new_sharded_name(&extension);
        let written = writer::write(source, &dir, &filename).await?;
        let link = self.paths.to_relative(&written)?;

        tracing::info!(link = %link, original_filename, "stored unattached upload");
        Ok(StoredArtifact::new(link, original_filename))
    }

    /// Absolute filesystem path for a link string.
    pub fn resolve(&self, link: &str) -> MediaResult<PathBuf> {
        self.paths.to_absolute(link)
    }
}
