//! Object store abstraction for raw photo bytes.
//!
//! Handlers only see `Arc<dyn ObjectStore>`; the concrete backend (S3 or the
//! local filesystem) is picked once at startup from configuration.

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("invalid object key `{0}`")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("object store request failed: {0}")]
    Backend(String),
}

pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

/// Result of a successful `put`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    /// Entity tag reported by the backend, without surrounding quotes.
    pub etag: Option<String>,
    /// Where the object can be fetched from (URL or filesystem path).
    pub location: String,
}

/// Key-addressed binary storage bound to a single bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key`, replacing any existing object.
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> ObjectStoreResult<StoredObject>;

    /// Fetch the full payload stored under `key`.
    async fn get(&self, key: &str) -> ObjectStoreResult<Bytes>;

    /// Cheap reachability check used by `/readyz`.
    async fn check(&self) -> ObjectStoreResult<()>;
}

/// Join a base URL (or path) and a key with exactly one `/` between them.
pub(crate) fn join_location(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_location_normalizes_slashes() {
        assert_eq!(
            join_location("https://cdn.example.com/", "cat.png"),
            "https://cdn.example.com/cat.png"
        );
        assert_eq!(join_location("/srv/photos", "/cat.png"), "/srv/photos/cat.png");
    }
}
