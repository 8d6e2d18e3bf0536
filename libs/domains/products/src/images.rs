//! Image upload policy and file persistence

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

/// Largest accepted image, in bytes
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Room left in the request body limit for the text fields and part headers
pub const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Numbered variants tried when a file name is already taken
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Content types an uploaded image may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
pub enum ImageMimeType {
    #[strum(serialize = "image/jpeg")]
    Jpeg,
    #[strum(serialize = "image/png")]
    Png,
}

/// Accept the declared content type only if it is exactly `image/jpeg` or `image/png`.
///
/// The error is the human readable rejection reason.
pub fn screen_upload(content_type: Option<&str>) -> Result<ImageMimeType, String> {
    match content_type {
        Some(declared) => ImageMimeType::from_str(declared).map_err(|_| {
            format!(
                "Unsupported content type '{}', only {} and {} are accepted",
                declared,
                ImageMimeType::Jpeg,
                ImageMimeType::Png
            )
        }),
        None => Err("Missing content type, only image/jpeg and image/png are accepted".to_string()),
    }
}

/// `<ISO-8601 UTC timestamp with millis><original file name>`
///
/// Only the last component of `original` is kept, so a client cannot
/// address a location outside the upload directory.
pub fn image_file_name(now: DateTime<Utc>, original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("image");

    format!("{}{}", now.to_rfc3339_opts(SecondsFormat::Millis, true), base)
}

/// `lamp.png` -> `lamp-<n>.png`; names without a plain extension get `-<n>` appended.
fn numbered_file_name(file_name: &str, n: u32) -> String {
    let is_extension = |ext: &str| {
        (1..=4).contains(&ext.len())
            && ext.starts_with(|c: char| c.is_ascii_alphabetic())
            && ext.chars().all(|c| c.is_ascii_alphanumeric())
    };

    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && is_extension(ext) => format!("{stem}-{n}.{ext}"),
        _ => format!("{file_name}-{n}"),
    }
}

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("Failed to write image {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to remove image {path}: {source}")]
    Remove {
        path: String,
        source: std::io::Error,
    },
}

/// Persists accepted image bytes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` under `file_name`, returning the path recorded on the product.
    ///
    /// An existing file is never overwritten; the returned path names the file
    /// written by this call only.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, ImageStoreError>;

    /// Delete a file previously returned by [`ImageStore::save`].
    async fn remove(&self, path: &str) -> Result<(), ImageStoreError>;
}

/// Flat directory of images on the local file system
#[derive(Debug, Clone)]
pub struct DiskImageStore {
    root: PathBuf,
}

impl DiskImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, ImageStoreError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = match attempt {
                0 => file_name.to_string(),
                n => numbered_file_name(file_name, n),
            };
            let path = self.root.join(&name);
            let display_path = path.to_string_lossy().into_owned();

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    tracing::debug!(path = %display_path, "Image name taken, trying next");
                    continue;
                }
                Err(source) => return Err(ImageStoreError::Write { path: display_path, source }),
            };

            let written = match file.write_all(bytes).await {
                Ok(()) => file.flush().await,
                Err(e) => Err(e),
            };
            if let Err(source) = written {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(path = %display_path, error = %e, "Could not remove partial image");
                }
                return Err(ImageStoreError::Write { path: display_path, source });
            }

            tracing::info!(path = %display_path, "Image stored");
            return Ok(display_path);
        }

        Err(ImageStoreError::Write {
            path: self.root.join(file_name).to_string_lossy().into_owned(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "no free file name left",
            ),
        })
    }

    #[instrument(skip(self))]
    async fn remove(&self, path: &str) -> Result<(), ImageStoreError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|source| ImageStoreError::Remove {
                path: path.to_string(),
                source,
            })?;

        tracing::info!(path, "Image removed");
        Ok(())
    }
}
