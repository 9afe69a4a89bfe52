//! Atomic streaming writes
//!
//! Payloads stream through a sibling temporary file and are published by
//! linking the finished temp file to its final name. link(2) fails when
//! the destination already exists, so a taken name is detected atomically
//! and can never be overwritten; a reader never observes a partially
//! written file at the final path.

use std::path::{Path, PathBuf};

use dailies_core::error::MediaResult;
use tokio::fs;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Streams `source` into `dir/desired_name`, creating `dir` if missing.
///
/// Returns the absolute path of the published file. When `desired_name` is
/// already taken the file is published under a randomized variant of it
/// instead (a short random suffix before the extension), retrying until a
/// free name is found. A failure while streaming leaves the partial
/// temporary file in place for manual cleanup and propagates the error.
pub async fn write<R>(source: &mut R, dir: &Path, desired_name: &str) -> MediaResult<PathBuf>
where
    R: AsyncRead + Unpin + ?Sized,
{
    fs::create_dir_all(dir).await?;

    let stamp = Uuid::new_v4().simple().to_string();
    let temp_path = dir.join(format!("{}.{}.part", desired_name, &stamp[..8]));

    let start = std::time::Instant::now();
    let mut temp_file = fs::File::create(&temp_path).await?;
    let size_bytes = tokio::io::copy(source, &mut temp_file).await?;
    temp_file.sync_all().await?;
    drop(temp_file);

    let mut candidate = desired_name.to_string();
    let final_path = loop {
        let target = dir.join(&candidate);
        match fs::hard_link(&temp_path, &target).await {
            Ok(()) => break target,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                candidate = randomized_variant(desired_name);
            }
            Err(e) => return Err(e.into()),
        }
    };

    if let Err(e) = fs::remove_file(&temp_path).await {
        tracing::warn!(
            path = %temp_path.display(),
            error = %e,
            "failed to remove temp file after publish"
        );
    }

    tracing::info!(
        path = %final_path.display(),
        size_bytes,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "stored file"
    );

    Ok(final_path)
}

/// `name` with `_` and four random hex characters inserted before the
/// extension.
fn randomized_variant(name: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    let suffix = &hex[..4];
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}_{}{}", &name[..dot], suffix, &name[dot..]),
        _ => format!("{}_{}", name, suffix),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_write_round_trip() {
        let dir = tempdir().unwrap();
        let payload = b"frame data".to_vec();

        let path = write(&mut Cursor::new(payload.clone()), dir.path(), "plate.png")
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("plate.png"));
        assert_eq!(fs::read(&path).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_creates_missing_destination_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("References").join("Dailies");

        let path = write(&mut Cursor::new(b"x".to_vec()), &nested, "ref.jpg")
            .await
            .unwrap();

        assert!(path.starts_with(&nested));
        assert!(fs::try_exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_existing_file_is_never_overwritten() {
        let dir = tempdir().unwrap();
        let existing = dir.path().join("plate.png");
        fs::write(&existing, b"first").await.unwrap();

        let path = write(&mut Cursor::new(b"second".to_vec()), dir.path(), "plate.png")
            .await
            .unwrap();

        assert_ne!(path, existing);
        assert_eq!(fs::read(&existing).await.unwrap(), b"first");
        assert_eq!(fs::read(&path).await.unwrap(), b"second");

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("plate_"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), "plate_abcd.png".len());
    }

    #[tokio::test]
    async fn test_no_temp_file_left_after_publish() {
        let dir = tempdir().unwrap();
        write(&mut Cursor::new(b"x".to_vec()), dir.path(), "a.png")
            .await
            .unwrap();

        let mut entries = fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["a.png".to_string()]);
    }

    #[tokio::test]
    async fn test_streams_larger_than_one_chunk() {
        let dir = tempdir().unwrap();
        let payload = vec![0xA7u8; 1 << 20];

        let path = write(&mut Cursor::new(payload.clone()), dir.path(), "big.bin")
            .await
            .unwrap();

        assert_eq!(fs::read(&path).await.unwrap(), payload);
    }

    #[test]
    fn test_randomized_variant_keeps_extension() {
        let variant = randomized_variant("plate.png");
        assert!(variant.starts_with("plate_"));
        assert!(variant.ends_with(".png"));
        assert_eq!(variant.len(), "plate_abcd.png".len());
    }

    #[test]
    fn test_randomized_variant_without_extension() {
        let variant = randomized_variant("noext");
        assert!(variant.starts_with("noext_"));
        assert_eq!(variant.len(), "noext_abcd".len());
    }

    #[test]
    fn test_randomized_variant_dotfile() {
        let variant = randomized_variant(".hidden");
        assert!(variant.starts_with(".hidden_"));
    }
}
