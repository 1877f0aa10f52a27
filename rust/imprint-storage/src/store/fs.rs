use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use async_trait::async_trait;

use super::ArtifactStore;
use crate::StorageError;

/// A basic file-system-based [ArtifactStore] implementation. Every artifact is
/// stored as a file below a root directory, at the path spelled by its key
/// (so `ns/f/x.pdf` lives at `<root>/ns/f/x.pdf`).
///
/// Keys must stay inside the root: empty, `.` and `..` segments, as well as
/// absolute keys, are rejected with [StorageError::InvalidKey].
#[derive(Clone, Debug)]
pub struct FileSystemStore {
    root_dir: PathBuf,
}

impl FileSystemStore {
    /// Creates a new [`FileSystemStore`] that stores files in `root_dir`.
    pub async fn new<Pathlike>(root_dir: Pathlike) -> Result<Self, StorageError>
    where
        Pathlike: AsRef<Path>,
    {
        let root_dir = root_dir.as_ref().to_owned();
        tokio::fs::create_dir_all(&root_dir).await?;
        Ok(Self { root_dir })
    }

    /// The directory artifacts are stored under
    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn make_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty()
            || key
                .split('/')
                .any(|segment| matches!(segment, "" | "." | ".."))
        {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }

        let relative = Path::new(key);
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }

        Ok(self.root_dir.join(relative))
    }
}

#[async_trait]
impl ArtifactStore for FileSystemStore {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.make_path(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            // A file where a directory was expected (e.g. `a/b` when `a` is
            // an artifact) means the key cannot exist either.
            Err(error) if error.kind() == ErrorKind::NotADirectory => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let path = self.make_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write next to the destination and rename into place, so that a
        // concurrent reader never observes a partially written artifact.
        let staging = path.with_file_name(format!(
            ".{}.{:016x}.tmp",
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            rand::random::<u64>()
        ));

        tokio::fs::write(&staging, bytes).await?;
        if let Err(error) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(error.into());
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.make_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) if error.kind() == ErrorKind::NotADirectory => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}
