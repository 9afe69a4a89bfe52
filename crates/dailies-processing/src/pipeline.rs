//! Upload pipeline.
//!
//! End-to-end flow for reference and version-output uploads: persist the
//! original under the owner's folder, render the web version and the
//! thumbnail into scratch space, move both into their fixed subfolders,
//! link the three artifacts into a chain, and attach the chain root to the
//! owner. The attach happens last; an owner never sees a chain whose
//! renditions are missing.
//!
//! When a rendition step fails, the already-written original stays on disk
//! and nothing is attached. The error carries what broke; the caller
//! decides whether to retry or surface it.

use std::path::{Path, PathBuf};

use dailies_core::constants::{
    FOR_WEB_FOLDER, OUTPUTS_FOLDER, REFERENCES_FOLDER, THUMBNAIL_FOLDER, VENDOR_MARKER,
};
use dailies_core::{MediaConfig, MediaError, MediaOwner, MediaResult, StoredArtifact};
use dailies_storage::writer;
use tempfile::TempDir;
use tokio::io::AsyncRead;

use crate::render::{MediaKind, MediaRenderer};

/// Uploads media for an owning entity and derives its renditions.
#[derive(Debug, Clone)]
pub struct UploadPipeline {
    config: MediaConfig,
    renderer: MediaRenderer,
}

impl UploadPipeline {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            renderer: MediaRenderer::new(config.clone()),
            config,
        }
    }

    /// Uploads a reference for `owner` and attaches the derived chain.
    ///
    /// The original lands under `References/` in the owner's folder, the
    /// web version under `References/<vendor>/ForWeb/`, the thumbnail under
    /// `References/<vendor>/Thumbnail/`.
    pub async fn upload_reference<O, R>(
        &self,
        owner: &mut O,
        source: &mut R,
        filename: &str,
    ) -> MediaResult<StoredArtifact>
    where
        O: MediaOwner,
        R: AsyncRead + Unpin + ?Sized,
    {
        self.upload_into(owner, source, filename, REFERENCES_FOLDER)
            .await
    }

    /// Uploads a version output for `owner`. Same flow as a reference,
    /// rooted at `Outputs/` instead.
    pub async fn upload_version_output<O, R>(
        &self,
        owner: &mut O,
        source: &mut R,
        filename: &str,
    ) -> MediaResult<StoredArtifact>
    where
        O: MediaOwner,
        R: AsyncRead + Unpin + ?Sized,
    {
        self.upload_into(owner, source, filename, OUTPUTS_FOLDER)
            .await
    }

    #[tracing::instrument(skip(self, owner, source))]
    async fn upload_into<O, R>(
        &self,
        owner: &mut O,
        source: &mut R,
        filename: &str,
        area: &str,
    ) -> MediaResult<StoredArtifact>
    where
        O: MediaOwner,
        R: AsyncRead + Unpin + ?Sized,
    {
        // Reject unsupported media before anything touches the disk.
        MediaKind::detect(&self.config, filename)?;

        let base_dir = owner.absolute_path().join(area).join(VENDOR_MARKER);
        let original_path = writer::write(source, &base_dir, filename).await?;
        tracing::info!(path = %original_path.display(), "stored original");

        let web_scratch = TempDir::new()?;
        let web_rendered = self
            .renderer
            .render_web_version(&original_path, web_scratch.path())
            .await?;
        let web_path = move_into(&web_rendered, &base_dir.join(FOR_WEB_FOLDER)).await?;
        tracing::info!(path = %web_path.display(), "rendered web version");

        let thumb_scratch = TempDir::new()?;
        let thumb_rendered = self
            .renderer
            .render_thumbnail(&original_path, thumb_scratch.path())
            .await?;
        let thumb_path = move_into(&thumb_rendered, &base_dir.join(THUMBNAIL_FOLDER)).await?;
        tracing::info!(path = %thumb_path.display(), "rendered thumbnail");

        let original_link = owner.make_relative(&original_path)?;
        let web_link = owner.make_relative(&web_path)?;
        let thumb_link = owner.make_relative(&thumb_path)?;

        let mut web = StoredArtifact::new(web_link, filename);
        web.set_thumbnail(StoredArtifact::new(thumb_link, filename))?;
        let mut original = StoredArtifact::new(original_link, filename);
        original.set_thumbnail(web)?;

        owner.attach(original.clone());
        tracing::info!(link = %original.repo_relative_path, "attached media chain");
        Ok(original)
    }
}

/// Moves a rendered file into `dir`, keeping its name. Rename first; when
/// the scratch space sits on another filesystem, fall back to copy and
/// remove.
async fn move_into(src: &Path, dir: &Path) -> MediaResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let name = src
        .file_name()
        .ok_or_else(|| MediaError::invalid_path(src, "missing file name"))?;
    let dest = dir.join(name);
    match tokio::fs::rename(src, &dest).await {
        Ok(()) => Ok(dest),
        Err(_) => {
            tokio::fs::copy(src, &dest).await?;
            tokio::fs::remove_file(src).await?;
            Ok(dest)
        }
    }
}
