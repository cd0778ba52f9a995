//! Flat file storage backing the `/files/:name` routes.
//!
//! Every file lives directly under one root directory. Names are validated
//! before any filesystem call so a request can never address a path outside
//! the root.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tokio::fs;

/// Errors returned by [`FileStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid file name: {name:?}")]
    InvalidName { name: String },

    #[error("file not found: {name}")]
    NotFound { name: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A directory of named files.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`. The directory is not touched.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| StorageError::Io {
                path: root.clone(),
                source,
            })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads the whole file called `name`.
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidName`] for a rejected name,
    /// [`StorageError::NotFound`] when no such file exists, and
    /// [`StorageError::Io`] for any other failure.
    pub async fn read(&self, name: &str) -> Result<Bytes, StorageError> {
        let path = self.resolve(name)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound {
                name: name.to_owned(),
            }),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    /// Creates or truncates the file called `name` and writes `data` to it.
    pub async fn write(&self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        fs::write(&path, data)
            .await
            .map_err(|source| StorageError::Io { path, source })
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        if is_valid_name(name) {
            Ok(self.root.join(name))
        } else {
            Err(StorageError::InvalidName {
                name: name.to_owned(),
            })
        }
    }
}

/// Returns `false` for names that are empty, are `.`, contain `..`, or contain
/// a path separator.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}
