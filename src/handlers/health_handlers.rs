//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the database and the object store

use crate::services::photo_service::PhotoService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /healthz`
///
/// Always 200 with `{"status":"ok"}`; performs no I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Checks that SQLite answers and the schema is applied, and asks the
/// object store for a reachability check. HTTP 200 when both pass, 503
/// otherwise.
pub async fn readyz(State(service): State<PhotoService>) -> impl IntoResponse {
    let database = match service.metadata.ping().await {
        Ok(()) => CheckStatus::ok(),
        Err(e) => CheckStatus::failed(format!("error: {}", e)),
    };
    let object_store = match service.objects.check().await {
        Ok(()) => CheckStatus::ok(),
        Err(e) => CheckStatus::failed(format!("error: {}", e)),
    };

    let overall_ok = database.ok && object_store.ok;

    let mut checks = HashMap::new();
    checks.insert("database", database);
    checks.insert("object_store", object_store);

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            ok: false,
            error: Some(error),
        }
    }
}
