//! Owning-entity contract
//!
//! The engine attaches derived media chains to tasks and versions that live
//! in the surrounding tracker. It never sees those entities directly; it
//! only needs the three capabilities below.

use std::path::{Path, PathBuf};

use crate::artifact::StoredArtifact;
use crate::error::MediaResult;

pub trait MediaOwner {
    /// Absolute folder the owner's files are stored under.
    fn absolute_path(&self) -> PathBuf;

    /// Express `path` relative to the owner's repository root. This is the
    /// repository handle the tracker exposes; the result becomes an
    /// artifact's canonical identity.
    fn make_relative(&self, path: &Path) -> MediaResult<String>;

    /// Append an uploaded artifact chain root to the owner's ordered
    /// reference/output collection.
    fn attach(&mut self, artifact: StoredArtifact);
}
