//! Descriptive attributes extracted from raw image bytes.

/// Attributes captured at upload time, before the bytes reach the object store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageMetadata {
    pub format: String,
    pub content_type: String,
    pub width: u32,
    pub height: u32,
    pub color: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub iso: Option<u32>,
    pub date_time: Option<String>,
    pub size_bytes: u64,
}
