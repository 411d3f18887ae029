//! The file I/O capability (§6): `Files.write(path, bytes)`, `Files.mkdir_p(dir)`.
//!
//! Unlike the other collaborators, the filesystem is not an external network
//! service, so a real implementation ([`LocalFilesystem`]) ships alongside
//! the trait rather than being left entirely to the caller.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilesError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait Files: Send + Sync {
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), FilesError>;
    async fn mkdir_p(&self, dir: &Path) -> Result<(), FilesError>;
}

/// The default `Files` implementation, backed by `tokio::fs`.
pub struct LocalFilesystem;

#[async_trait]
impl Files for LocalFilesystem {
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), FilesError> {
        tokio::fs::write(path, bytes).await.map_err(|source| FilesError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    async fn mkdir_p(&self, dir: &Path) -> Result<(), FilesError> {
        tokio::fs::create_dir_all(dir).await.map_err(|source| FilesError::Io {
            path: dir.display().to_string(),
            source,
        })
    }
}

/// In-memory `Files` for tests: records every write without touching disk.
#[derive(Default)]
pub struct MockFiles {
    writes: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn written(&self, path: &Path) -> Option<Vec<u8>> {
        self.writes.lock().unwrap().get(&path.display().to_string()).cloned()
    }
}

#[async_trait]
impl Files for MockFiles {
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), FilesError> {
        self.writes
            .lock()
            .unwrap()
            .insert(path.display().to_string(), bytes.to_vec());
        Ok(())
    }

    async fn mkdir_p(&self, _dir: &Path) -> Result<(), FilesError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_files_records_writes() {
        let files = MockFiles::new();
        files.write(Path::new("/docs/poem.txt"), b"hello").await.unwrap();
        assert_eq!(files.written(Path::new("/docs/poem.txt")), Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn local_filesystem_writes_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("sub").join("poem.txt");
        let fs = LocalFilesystem;
        fs.mkdir_p(target.parent().unwrap()).await.unwrap();
        fs.write(&target, b"autumn leaves").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"autumn leaves");
    }
}
