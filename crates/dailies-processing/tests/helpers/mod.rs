//! Test helpers: a stub owning entity and media fixtures.

pub mod fixtures;

use std::path::{Path, PathBuf};

use dailies_core::{MediaError, MediaOwner, MediaResult, StoredArtifact};

/// Owning entity backed by a plain directory, standing in for a tracker
/// task or version. Links are made relative to `repo_root`, the way the
/// surrounding tracker would express them.
pub struct StubOwner {
    repo_root: PathBuf,
    folder: PathBuf,
    pub attached: Vec<StoredArtifact>,
}

impl StubOwner {
    pub fn new(repo_root: impl Into<PathBuf>, folder: impl AsRef<Path>) -> Self {
        let repo_root = repo_root.into();
        let folder = repo_root.join(folder.as_ref());
        Self {
            repo_root,
            folder,
            attached: Vec::new(),
        }
    }
}

impl MediaOwner for StubOwner {
    fn absolute_path(&self) -> PathBuf {
        self.folder.clone()
    }

    fn make_relative(&self, path: &Path) -> MediaResult<String> {
        let rest = path
            .strip_prefix(&self.repo_root)
            .map_err(|_| MediaError::invalid_path(path, "outside the repository"))?;
        rest.to_str()
            .map(str::to_string)
            .ok_or_else(|| MediaError::invalid_path(path, "not valid UTF-8"))
    }

    fn attach(&mut self, artifact: StoredArtifact) {
        self.attached.push(artifact);
    }
}
