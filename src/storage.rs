//! Blog image storage.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::RwLock;

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// URL prefix the local store is served under.
pub const PUBLIC_PREFIX: &str = "/uploads/blog-images";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Writes `bytes` under `path`. Existing files are never overwritten.
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    fn public_url(&self, path: &str) -> String;
}

/// Reject anything that could escape the storage root.
pub fn is_safe_path(path: &str) -> bool {
    !path.is_empty()
        && !path.contains("..")
        && !path.contains('/')
        && !path.contains('\\')
        && !path.contains('\0')
}

pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: 52 49 46 46 ... 57 45 42 50
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

/// Lowercased extension of an uploaded file name, if it is an allowed image type.
pub fn image_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Images live in one directory on disk and are served statically.
pub struct LocalFileStore {
    root: PathBuf,
    base_url: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if !is_safe_path(path) {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        tokio::fs::create_dir_all(&self.root).await?;

        let file_path = self.root.join(path);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await?;
        tokio::io::AsyncWriteExt::write_all(&mut file, bytes).await?;

        tracing::info!(path = %path, size = bytes.len(), "image stored");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}{}/{}", self.base_url, PUBLIC_PREFIX, path)
    }
}

/// Keeps uploads in memory. Used by tests.
#[derive(Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(path).cloned()
    }

    pub async fn file_count(&self) -> usize {
        self.files.read().await.len()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if !is_safe_path(path) {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        let mut files = self.files.write().await;
        if files.contains_key(path) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                path.to_string(),
            )));
        }
        files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}", path)
    }
}
