//! src/services/local_store.rs
//!
//! Filesystem-backed `ObjectStore`. Payloads are sharded beneath
//! `base_path/{bucket}/{shard}/{shard}/{key}` so that a single directory
//! never accumulates every upload.

use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

use super::object_store::{
    ObjectStore, ObjectStoreError, ObjectStoreResult, StoredObject, join_location,
};

const MAX_OBJECT_KEY_LEN: usize = 1024;

#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    /// Root directory holding one folder per bucket.
    base_path: PathBuf,

    bucket: String,

    /// Prefix for returned locations; falls back to the on-disk path.
    public_base_url: Option<String>,
}

impl LocalObjectStore {
    pub fn new(
        base_path: impl Into<PathBuf>,
        bucket: impl Into<String>,
        public_base_url: Option<String>,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            bucket: bucket.into(),
            public_base_url,
        }
    }

    /// Rejects empty or oversized keys, absolute keys, `.`/`..` path
    /// segments and control characters. Dots inside a name are fine.
    fn ensure_key_safe(key: &str) -> ObjectStoreResult<()> {
        let invalid = key.is_empty()
            || key.len() > MAX_OBJECT_KEY_LEN
            || key.starts_with('/')
            || key.split('/').any(|segment| segment == "." || segment == "..")
            || key
                .bytes()
                .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0');
        if invalid {
            return Err(ObjectStoreError::InvalidKey(key.to_string()));
        }
        Ok(())
    }

    fn bucket_root(&self) -> PathBuf {
        self.base_path.join(&self.bucket)
    }

    /// Two-level shard directories from MD5(bucket/key), as lowercase hex.
    fn object_shards(bucket: &str, key: &str) -> (String, String) {
        let digest = md5::compute(format!("{}/{}", bucket, key));
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    fn object_path(&self, key: &str) -> PathBuf {
        let (shard_a, shard_b) = Self::object_shards(&self.bucket, key);
        let mut path = self.bucket_root();
        path.push(shard_a);
        path.push(shard_b);
        path.push(key);
        path
    }

    fn location(&self, key: &str, path: &Path) -> String {
        match &self.public_base_url {
            Some(base) => join_location(base, key),
            None => path.display().to_string(),
        }
    }

    async fn write_tmp(tmp_path: &Path, body: &[u8]) -> io::Result<()> {
        let mut file = File::create(tmp_path).await?;
        file.write_all(body).await?;
        file.flush().await?;
        file.sync_all().await
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    /// Writes to a temp file next to the target, fsyncs, then renames over
    /// any existing object.
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        _content_type: Option<&str>,
    ) -> ObjectStoreResult<StoredObject> {
        Self::ensure_key_safe(key)?;

        let file_path = self.object_path(key);
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            ObjectStoreError::Io(io::Error::new(
                ErrorKind::Other,
                "object path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        if let Err(err) = Self::write_tmp(&tmp_path, &body).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(ObjectStoreError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(ObjectStoreError::Io(err));
            }
        }
        debug!("stored {} bytes at {}", body.len(), file_path.display());

        Ok(StoredObject {
            key: key.to_string(),
            etag: Some(format!("{:x}", md5::compute(&body))),
            location: self.location(key, &file_path),
        })
    }

    async fn get(&self, key: &str) -> ObjectStoreResult<Bytes> {
        Self::ensure_key_safe(key)?;
        match fs::read(self.object_path(key)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(ObjectStoreError::NotFound(key.to_string()))
            }
            Err(err) => Err(ObjectStoreError::Io(err)),
        }
    }

    /// Best-effort write/read/delete of a scratch file under the bucket root.
    async fn check(&self) -> ObjectStoreResult<()> {
        let root = self.bucket_root();
        fs::create_dir_all(&root).await?;

        let scratch = root.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&scratch, b"readyz").await?;
        let read_back = fs::read(&scratch).await;
        let _ = fs::remove_file(&scratch).await;
        if read_back? != b"readyz" {
            return Err(ObjectStoreError::Io(io::Error::new(
                ErrorKind::InvalidData,
                "readiness file content mismatch",
            )));
        }
        Ok(())
    }
}
