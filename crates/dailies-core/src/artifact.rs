//! Stored-artifact model
//!
//! A [`StoredArtifact`] is one physical file under management: the original
//! upload, its web rendition, or its thumbnail. The three are linked into a
//! strict forward chain, `original -> web version -> thumbnail`, never
//! longer than [`MAX_CHAIN_DEPTH`](crate::constants::MAX_CHAIN_DEPTH) tiers
//! and never cyclic; growth past the bound is rejected at link time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_CHAIN_DEPTH;
use crate::error::{MediaError, MediaResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredArtifact {
    pub id: Uuid,
    /// Canonical identity: the repository-relative link string other
    /// subsystems parse. On-disk names are randomly generated; this path
    /// is the only way the artifact is referenced outside the filesystem.
    pub repo_relative_path: String,
    /// Name supplied by the uploader. Kept for display, never used for
    /// on-disk naming.
    pub original_filename: String,
    pub created_at: DateTime<Utc>,
    thumbnail: Option<Box<StoredArtifact>>,
}

impl StoredArtifact {
    pub fn new(
        repo_relative_path: impl Into<String>,
        original_filename: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            repo_relative_path: repo_relative_path.into(),
            original_filename: original_filename.into(),
            created_at: Utc::now(),
            thumbnail: None,
        }
    }

    /// Number of artifacts in this chain, counting self.
    pub fn chain_depth(&self) -> usize {
        1 + self.thumbnail.as_ref().map_or(0, |t| t.chain_depth())
    }

    pub fn thumbnail(&self) -> Option<&StoredArtifact> {
        self.thumbnail.as_deref()
    }

    /// Links `thumbnail` (and any chain hanging off it) as the next tier
    /// of this artifact.
    ///
    /// Chains are built bottom-up, so the check here bounds the whole
    /// resulting chain when the receiver is its root.
    pub fn set_thumbnail(&mut self, thumbnail: StoredArtifact) -> MediaResult<()> {
        let depth = 1 + thumbnail.chain_depth();
        if depth > MAX_CHAIN_DEPTH {
            return Err(MediaError::ChainTooDeep { depth });
        }
        self.thumbnail = Some(Box::new(thumbnail));
        Ok(())
    }
}
