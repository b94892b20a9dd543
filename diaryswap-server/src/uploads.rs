//! Image storage on local disk
//!
//! Uploaded images are written to `<resources>/images/` under a random name
//! and served back through the `/resources` static mount.

use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::RngCore;

/// Sub-directory of the resources root holding uploaded images
const IMAGES_DIR: &str = "images";

/// URL prefix the resources root is mounted at
pub const RESOURCES_MOUNT: &str = "/resources";

/// Random bytes per generated filename (rendered as 32 hex chars)
const TOKEN_BYTES: usize = 16;

/// Longest file extension carried over from the client's filename
const MAX_EXTENSION_LEN: usize = 10;

/// Upload error type
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Image written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub file_name: String,
    pub path: PathBuf,
    /// Public URL, relative to the server root
    pub url: String,
}

/// Writes uploaded images under the resources directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    resources_dir: PathBuf,
}

impl ImageStore {
    pub fn new(resources_dir: impl Into<PathBuf>) -> Self {
        Self {
            resources_dir: resources_dir.into(),
        }
    }

    pub fn resources_dir(&self) -> &Path {
        &self.resources_dir
    }

    pub fn images_dir(&self) -> PathBuf {
        self.resources_dir.join(IMAGES_DIR)
    }

    /// Create the images directory (and the resources root) if missing.
    pub async fn ensure_dirs(&self) -> Result<(), UploadError> {
        let dir = self.images_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| UploadError::Io { path: dir, source })
    }

    /// Store image bytes under a fresh random name.
    ///
    /// The extension of `original_name` is kept when it looks like one
    /// (short, ASCII alphanumeric); anything else is dropped.
    pub async fn save(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredImage, UploadError> {
        let file_name = match original_name.and_then(extension_of) {
            Some(ext) => format!("{}.{}", random_token(), ext),
            None => random_token(),
        };

        let path = self.images_dir().join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| UploadError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!(file = %file_name, size = bytes.len(), "image stored");

        Ok(StoredImage {
            url: format!("{}/{}/{}", RESOURCES_MOUNT, IMAGES_DIR, file_name),
            file_name,
            path,
        })
    }
}

/// Hex-encoded token from the OS CSPRNG
fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn extension_of(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
