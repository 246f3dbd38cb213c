//! `ObjectStore` backed by an S3 (or S3-compatible) bucket.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, error::DisplayErrorContext, primitives::ByteStream};
use bytes::Bytes;
use tracing::debug;

use super::object_store::{
    ObjectStore, ObjectStoreError, ObjectStoreResult, StoredObject, join_location,
};

#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    location_base: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>, location_base: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            location_base: location_base.into(),
        }
    }

    /// Build a client from the ambient AWS configuration (env vars, profile,
    /// instance metadata). A custom `endpoint` switches to path-style
    /// addressing for S3-compatible servers.
    pub async fn from_env(
        bucket: &str,
        endpoint: Option<&str>,
        public_base_url: Option<&str>,
    ) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        let location_base = public_base_url
            .map(str::to_string)
            .unwrap_or_else(|| default_location_base(bucket, endpoint));
        Self::new(client, bucket, location_base)
    }
}

/// Public URL prefix for objects when no explicit base is configured.
fn default_location_base(bucket: &str, endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) => join_location(endpoint, bucket),
        None => format!("https://{}.s3.amazonaws.com", bucket),
    }
}

fn backend_error<E: std::error::Error>(err: E) -> ObjectStoreError {
    ObjectStoreError::Backend(DisplayErrorContext(&err).to_string())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> ObjectStoreResult<StoredObject> {
        let size = body.len();
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        let output = request.send().await.map_err(backend_error)?;
        debug!("uploaded {} bytes to s3://{}/{}", size, self.bucket, key);

        Ok(StoredObject {
            key: key.to_string(),
            etag: output.e_tag().map(|tag| tag.trim_matches('"').to_string()),
            location: join_location(&self.location_base, key),
        })
    }

    async fn get(&self, key: &str) -> ObjectStoreResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    ObjectStoreError::NotFound(key.to_string())
                } else {
                    backend_error(err)
                }
            })?;

        let data = output.body.collect().await.map_err(backend_error)?;
        Ok(data.into_bytes())
    }

    async fn check(&self) -> ObjectStoreResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}
