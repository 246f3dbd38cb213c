//! HTTP handlers for photo upload, listing and editing.
//! Storage and image work is delegated to `PhotoService`.

use crate::{
    errors::AppError,
    services::photo_service::{EditOptions, PhotoService, key_from_filename},
};
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError, rejection::JsonRejection},
    response::IntoResponse,
};
use bytes::Bytes;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub status: &'static str,
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::new(err.status(), err.body_text())
}

/// POST `/photo` - multipart upload with `file` and `author` fields.
///
/// Responds with the stored object's location as plain text.
pub async fn upload_photo(
    State(service): State<PhotoService>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file: Option<(Option<String>, Bytes)> = None;
    let mut author: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, data));
            }
            Some("author") => {
                author = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let (filename, data) = file.ok_or_else(|| AppError::bad_request("missing `file` field"))?;
    let author = author.ok_or_else(|| AppError::bad_request("missing `author` field"))?;
    let key = filename
        .as_deref()
        .and_then(key_from_filename)
        .ok_or_else(|| AppError::bad_request("uploaded file has no filename"))?;

    let stored = service.upload(&key, &author, data).await?;
    Ok(stored.location)
}

/// GET `/photos` - every stored key as a JSON array of strings.
pub async fn list_photos(
    State(service): State<PhotoService>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(service.list_keys().await?))
}

/// POST `/edit-photo/{id}` - apply filters to the photo stored under `id`.
pub async fn edit_photo(
    State(service): State<PhotoService>,
    Path(id): Path<String>,
    payload: Result<Json<EditOptions>, JsonRejection>,
) -> Result<Json<EditResponse>, AppError> {
    let Json(options) =
        payload.map_err(|rejection| AppError::new(rejection.status(), rejection.body_text()))?;

    service.edit(&id, &options).await?;
    Ok(Json(EditResponse { status: "success" }))
}
