use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, warn};

/// A file accepted by a [`FileStorage`] backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// Path relative to the storage root; may differ from the requested path on collision.
    pub path: String,
    pub url: String,
    pub size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("stored file '{0}' not found")]
    NotFound(String),
    #[error("storage path '{0}' is not a relative path inside the media root")]
    InvalidPath(String),
    #[error("storage i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Byte storage for resource payloads. Saving never overwrites: a taken path gets a numeric
/// suffix before the extension.
pub trait FileStorage: Send + Sync {
    fn save(&self, path: &str, bytes: &[u8]) -> Result<StoredFile, StorageError>;
    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;
    fn delete(&self, path: &str) -> Result<(), StorageError>;
}

fn validate(path: &str) -> Result<(), StorageError> {
    let relative = Path::new(path);
    let valid = !path.is_empty()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidPath(path.to_string()))
    }
}

/// `path`, then `stem_1.ext`, `stem_2.ext`, ...
fn candidates(path: &str) -> impl Iterator<Item = String> + '_ {
    let (dir, name) = match path.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, path),
    };
    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (name, None),
    };

    std::iter::once(path.to_string()).chain((1u32..).map(move |n| {
        let file = match extension {
            Some(extension) => format!("{stem}_{n}.{extension}"),
            None => format!("{stem}_{n}"),
        };
        match dir {
            Some(dir) => format!("{dir}/{file}"),
            None => file,
        }
    }))
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// Writes `bytes` into a freshly created file, removing `target` again if the write fails so a
/// truncated payload never occupies the path.
fn write_or_discard(target: &Path, file: &mut impl Write, bytes: &[u8]) -> std::io::Result<()> {
    if let Err(err) = file.write_all(bytes).and_then(|()| file.flush()) {
        if let Err(cleanup) = fs::remove_file(target) {
            warn!(path = %target.display(), error = %cleanup, "failed to remove partial file");
        }
        return Err(err);
    }
    Ok(())
}

/// Files under a media root directory, served from `base_url`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn io_error(path: PathBuf, source: std::io::Error) -> StorageError {
        StorageError::Io { path, source }
    }
}

impl FileStorage for LocalFileStorage {
    fn save(&self, path: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        validate(path)?;

        for candidate in candidates(path) {
            let target = self.root.join(&candidate);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|err| Self::io_error(parent.to_path_buf(), err))?;
            }

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(Self::io_error(target, err)),
            };
            write_or_discard(&target, &mut file, bytes)
                .map_err(|err| Self::io_error(target.clone(), err))?;

            debug!(path = %candidate, size = bytes.len(), "stored file");
            return Ok(StoredFile {
                url: join_url(&self.base_url, &candidate),
                path: candidate,
                size: bytes.len() as u64,
            });
        }

        Err(StorageError::Unavailable(format!("no free path for {path}")))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        validate(path)?;
        let target = self.root.join(path);
        fs::read(&target).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => Self::io_error(target, err),
        })
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        validate(path)?;
        let target = self.root.join(path);
        fs::remove_file(&target).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => Self::io_error(target, err),
        })
    }
}

#[derive(Debug)]
pub struct InMemoryFileStorage {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    base_url: String,
}

impl Default for InMemoryFileStorage {
    fn default() -> Self {
        Self::new("/media/")
    }
}

impl InMemoryFileStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            base_url: base_url.into(),
        }
    }

    pub fn paths(&self) -> Vec<String> {
        self.files
            .lock()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn files(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>, StorageError> {
        self.files
            .lock()
            .map_err(|_| StorageError::Unavailable("file storage mutex poisoned".to_string()))
    }
}

impl FileStorage for InMemoryFileStorage {
    fn save(&self, path: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        validate(path)?;
        let mut files = self.files()?;
        let candidate = candidates(path)
            .find(|candidate| !files.contains_key(candidate))
            .ok_or_else(|| StorageError::Unavailable(format!("no free path for {path}")))?;
        files.insert(candidate.clone(), bytes.to_vec());

        Ok(StoredFile {
            url: join_url(&self.base_url, &candidate),
            path: candidate,
            size: bytes.len() as u64,
        })
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.files()?
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.files()?
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}
