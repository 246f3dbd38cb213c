//! PhotoService composes the extractor, the object store and the metadata
//! store into the three request flows: upload, list and edit.

use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::photo::NewPhotoMetadata;

use super::{
    image_service::{self, ImageServiceError},
    metadata_store::MetadataStore,
    object_store::{ObjectStore, ObjectStoreError, StoredObject},
};

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error(transparent)]
    Image(#[from] ImageServiceError),
    #[error(transparent)]
    Store(#[from] ObjectStoreError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type PhotoResult<T> = Result<T, PhotoError>;

/// Filters accepted by the edit flow. Absent or `null` flags are off.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EditOptions {
    #[serde(default)]
    pub convert_bw: Option<bool>,
}

impl EditOptions {
    pub fn convert_bw(&self) -> bool {
        self.convert_bw.unwrap_or(false)
    }
}

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct PhotoService {
    pub metadata: MetadataStore,
    pub objects: Arc<dyn ObjectStore>,
}

impl PhotoService {
    pub fn new(metadata: MetadataStore, objects: Arc<dyn ObjectStore>) -> Self {
        Self { metadata, objects }
    }

    /// Extract metadata, store the bytes under `key`, then record the row.
    ///
    /// The object is written before the row; a database failure after a
    /// successful put leaves the object in place.
    pub async fn upload(&self, key: &str, author: &str, body: Bytes) -> PhotoResult<StoredObject> {
        let raw = body.clone();
        let image =
            tokio::task::spawn_blocking(move || image_service::extract_metadata(&raw)).await??;
        let content_type = image.content_type.clone();

        let stored = self.objects.put(key, body, Some(&content_type)).await?;
        let row = self
            .metadata
            .insert(NewPhotoMetadata {
                key: key.to_string(),
                author: author.to_string(),
                image,
            })
            .await
            .inspect_err(|err| warn!("object `{}` stored but metadata insert failed: {}", key, err))?;

        info!(
            id = row.id,
            key = %row.key,
            author = %row.author,
            etag = stored.etag.as_deref().unwrap_or("-"),
            "photo uploaded"
        );
        Ok(stored)
    }

    pub async fn list_keys(&self) -> PhotoResult<Vec<String>> {
        Ok(self.metadata.list_keys().await?)
    }

    /// Fetch the photo stored under `key` and apply the requested filters,
    /// re-uploading under the same key when anything changed.
    pub async fn edit(&self, key: &str, options: &EditOptions) -> PhotoResult<()> {
        let original = self.objects.get(key).await?;

        if !options.convert_bw() {
            info!(key, "edit requested with no filters");
            return Ok(());
        }

        let edited =
            tokio::task::spawn_blocking(move || image_service::convert_bw(&original)).await??;
        self.objects
            .put(key, Bytes::from(edited.bytes), Some(edited.content_type))
            .await?;

        info!(key, "photo converted to black and white");
        Ok(())
    }
}

/// Object key for an uploaded filename: the last path component, or `None`
/// when nothing usable is left.
pub fn key_from_filename(filename: &str) -> Option<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}
