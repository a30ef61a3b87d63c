use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::errors::AppError;

/// A file that has been written to media storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path relative to the media root, with `/` separators.
    pub name: String,
    /// Byte length of the written content.
    pub size: i64,
}

/// Local file storage rooted at the configured media directory.
#[derive(Clone, Debug)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a relative storage name onto the filesystem. Names that would
    /// escape the media root are refused.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(name);
        let escapes = relative.components().any(|component| {
            !matches!(component, Component::Normal(_) | Component::CurDir)
        });
        if name.trim().is_empty() || escapes {
            return Err(AppError::Validation(format!(
                "Invalid storage path: {}",
                name
            )));
        }
        Ok(self.root.join(relative))
    }

    /// Writes `content` under `name` unless a file is already there.
    /// Returns `None` when the name is taken; the check and the create are one
    /// filesystem operation.
    pub async fn create_new(&self, name: &str, content: &[u8]) -> Result<Option<StoredFile>, AppError> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = write_all(&mut file, content).await {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }
        log::info!("stored {} ({} bytes)", name, content.len());

        Ok(Some(StoredFile {
            name: name.to_string(),
            size: content.len() as i64,
        }))
    }

    /// Removes a stored file. A file that is already gone is not an error.
    pub async fn delete(&self, name: &str) -> Result<(), AppError> {
        let path = self.resolve(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("removed {}", name);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("{} already removed", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_all(file: &mut tokio::fs::File, content: &[u8]) -> io::Result<()> {
    file.write_all(content).await?;
    file.flush().await
}

/// `n`-th alternative for a taken name: `images/Film/a.png` -> `images/Film/a_1.png`.
pub fn candidate_name(name: &str, n: usize) -> String {
    if n == 0 {
        return name.to_string();
    }
    let (dir, file) = match name.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, name),
    };
    let renamed = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, n, ext),
        _ => format!("{}_{}", file, n),
    };
    match dir {
        Some(dir) => format!("{}/{}", dir, renamed),
        None => renamed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_new_writes_once_and_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());

        let stored = storage
            .create_new("images/Vinyl film/sample.png", b"\x89PNG data")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "images/Vinyl film/sample.png");
        assert_eq!(stored.size, 9);

        let again = storage
            .create_new("images/Vinyl film/sample.png", b"other")
            .await
            .unwrap();
        assert!(again.is_none());
        let on_disk = std::fs::read(dir.path().join("images/Vinyl film/sample.png")).unwrap();
        assert_eq!(on_disk, b"\x89PNG data");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        storage.create_new("images/a/b.jpg", b"abc").await.unwrap();

        storage.delete("images/a/b.jpg").await.unwrap();
        storage.delete("images/a/b.jpg").await.unwrap();
        assert!(!dir.path().join("images/a/b.jpg").exists());
    }

    #[test]
    fn candidate_names_keep_directory_and_extension() {
        assert_eq!(candidate_name("images/Film/a.png", 0), "images/Film/a.png");
        assert_eq!(candidate_name("images/Film/a.png", 2), "images/Film/a_2.png");
        assert_eq!(candidate_name("images/Film/archive.tar.gz", 1), "images/Film/archive.tar_1.gz");
        assert_eq!(candidate_name("images/Film/README", 1), "images/Film/README_1");
        assert_eq!(candidate_name("images/v1.2/a.png", 1), "images/v1.2/a_1.png");
    }

    #[test]
    fn resolve_refuses_escaping_paths() {
        let storage = MediaStorage::new("/srv/media");
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("images/../../x").is_err());
        assert!(storage.resolve("").is_err());
        assert_eq!(
            storage.resolve("images/7/a.png").unwrap(),
            PathBuf::from("/srv/media/images/7/a.png")
        );
    }
}
