//! Sharded path derivation and link-string conversion
//!
//! Every managed file lives under the configured storage root at
//! `<root>/<xx>/<yy>/<32-hex-id><ext>`, where `xx`/`yy` are the first two
//! shard levels of the random identifier. Outside the raw filesystem the
//! same file is referenced by its link string,
//! `media/<xx>/<yy>/<32-hex-id><ext>`; the two representations convert
//! bijectively.

use std::path::{Path, PathBuf};

use dailies_core::constants::STORAGE_MARKER;
use dailies_core::error::{MediaError, MediaResult};
use uuid::Uuid;

/// Pure path arithmetic over the configured storage root.
#[derive(Clone, Debug)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fresh shard directory and filename for a new stored file.
    ///
    /// Identifiers are random 128-bit values, so collisions are vanishingly
    /// rare; callers must still treat an existing file at the derived path
    /// as a possible event, not an impossible one.
    pub fn new_sharded_name(&self, extension: &str) -> (PathBuf, String) {
        let id = Uuid::new_v4().simple().to_string();
        let filename = format!("{}{}", id, extension);
        let dir = self.root.join(&filename[..2]).join(&filename[2..4]);
        (dir, filename)
    }

    /// Fresh absolute path for a new stored file.
    pub fn new_storage_path(&self, extension: &str) -> PathBuf {
        let (dir, filename) = self.new_sharded_name(extension);
        dir.join(filename)
    }

    /// Convert an absolute path under the storage root to its link string.
    pub fn to_relative(&self, path: &Path) -> MediaResult<String> {
        let rest = path.strip_prefix(&self.root).map_err(|_| {
            MediaError::invalid_path(
                path,
                format!("not under storage root {}", self.root.display()),
            )
        })?;
        let rest = rest
            .to_str()
            .ok_or_else(|| MediaError::invalid_path(path, "not valid UTF-8"))?;
        Ok(format!("{}/{}", STORAGE_MARKER, rest))
    }

    /// Convert a link string back to an absolute path under the root.
    pub fn to_absolute(&self, link: &str) -> MediaResult<PathBuf> {
        let rest = link
            .strip_prefix(STORAGE_MARKER)
            .and_then(|r| r.strip_prefix('/'))
            .ok_or_else(|| {
                MediaError::invalid_path(
                    link,
                    format!("link must start with \"{}/\"", STORAGE_MARKER),
                )
            })?;
        if rest.is_empty() || rest.starts_with('/') || rest.split('/').any(|c| c == "..") {
            return Err(MediaError::invalid_path(link, "link escapes the storage root"));
        }
        Ok(self.root.join(rest))
    }
}
