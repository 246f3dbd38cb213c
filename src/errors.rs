use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::{
    image_service::ImageServiceError, object_store::ObjectStoreError, photo_service::PhotoError,
};

/// HTTP-facing error: a status code plus a message rendered as
/// `{"status": "error", "message": ...}`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), "{}", self.message);
        } else {
            tracing::warn!(status = self.status.as_u16(), "{}", self.message);
        }

        let body = Json(json!({
            "status": "error",
            "message": self.message,
        }));

        (self.status, body).into_response()
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        let status = match &err {
            PhotoError::Store(ObjectStoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            PhotoError::Store(ObjectStoreError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
            PhotoError::Store(ObjectStoreError::Backend(_)) => StatusCode::BAD_GATEWAY,
            PhotoError::Store(ObjectStoreError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            PhotoError::Image(
                ImageServiceError::UnsupportedFormat | ImageServiceError::Decode(_),
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            PhotoError::Image(ImageServiceError::Encode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            PhotoError::Database(_) | PhotoError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::from(PhotoError::Store(ObjectStoreError::NotFound("x.png".into())));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "object `x.png` not found");
    }

    #[test]
    fn undecodable_upload_maps_to_422() {
        let err = AppError::from(PhotoError::Image(ImageServiceError::UnsupportedFormat));
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn failed_image_task_maps_to_500() {
        let join_err = tokio::task::spawn_blocking::<_, ()>(|| panic!("decoder blew up"))
            .await
            .unwrap_err();
        let err = AppError::from(PhotoError::Task(join_err));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.starts_with("image task failed"));
    }

    #[test]
    fn database_failure_maps_to_500() {
        let err = AppError::from(PhotoError::Database(sqlx::Error::RowNotFound));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
