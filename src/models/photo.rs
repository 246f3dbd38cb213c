//! Represents one uploaded photo as recorded in the metadata table.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::image_metadata::ImageMetadata;

/// A row of `photo_metadata`.
///
/// The row is written once per successful upload and never updated. Several
/// rows may share the same `key` when a filename is uploaded more than once.
#[derive(Clone, FromRow, Debug)]
pub struct PhotoMetadata {
    /// Autoincrement primary key.
    pub id: i64,

    /// Object-store key (the uploaded filename).
    pub key: String,

    /// Free-text name of the uploader.
    pub author: String,

    /// Short format name, e.g. "png" or "jpeg".
    pub format: String,

    /// MIME type derived from the format.
    pub content_type: String,

    pub width: i64,
    pub height: i64,

    /// Pixel layout, e.g. "rgb8" or "l8".
    pub color: String,

    /// Camera manufacturer (EXIF `Make`).
    pub make: Option<String>,

    /// Camera model (EXIF `Model`).
    pub model: Option<String>,

    /// EXIF photographic sensitivity.
    pub iso: Option<i64>,

    /// EXIF `DateTimeOriginal`, as written by the camera.
    pub date_time: Option<String>,

    /// Size of the uploaded payload in bytes.
    pub size_bytes: i64,

    /// When the row was inserted.
    pub created_at: DateTime<Utc>,
}

/// Values needed to insert a new `photo_metadata` row.
#[derive(Clone, Debug)]
pub struct NewPhotoMetadata {
    pub key: String,
    pub author: String,
    pub image: ImageMetadata,
}
