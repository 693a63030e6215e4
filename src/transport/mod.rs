//! HTTP JSON transport layer.
//!
//! Exposes the engine as the service's REST surface:
//!
//! | Method | Path            | Success        |
//! |--------|-----------------|----------------|
//! | POST   | /students       | 201 + record   |
//! | GET    | /students       | 200 + array    |
//! | GET    | /students/:id   | 200 + record   |
//! | PUT    | /students/:id   | 200 + record   |
//! | DELETE | /students/:id   | 204            |
//! | GET    | /health         | 200            |
//!
//! Errors map to status codes via the error taxonomy: validation → 400,
//! not-found → 404, duplicate → 409, storage unavailable → 503, anything
//! else → 500, always with an `{"error": "..."}` body.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::cancel::CancelToken;
use crate::engine::Gradebook;
use crate::error::GradebookError;
use crate::record::{StudentDraft, StudentRecord};

/// Maximum size of an inbound request body. Student payloads are tiny;
/// anything bigger is abuse.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// JSON error body, matching the original service shape.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

/// A transport-level failure: a status code plus an error body.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<GradebookError> for ApiError {
    fn from(err: GradebookError) -> Self {
        Self {
            status: status_for(&err),
            message: err.to_string(),
        }
    }
}

fn status_for(err: &GradebookError) -> StatusCode {
    if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_conflict() {
        StatusCode::CONFLICT
    } else if err.is_unavailable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn parse_draft(body: &str) -> Result<StudentDraft, ApiError> {
    serde_json::from_str(body)
        .map_err(|e| ApiError::bad_request(format!("invalid student payload: {e}")))
}

/// Build the service router over a shared engine.
#[must_use]
pub fn router(engine: Arc<Gradebook>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/students", get(list_students).post(create_student))
        .route(
            "/students/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(engine)
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn create_student(
    State(engine): State<Arc<Gradebook>>,
    body: String,
) -> Result<(StatusCode, Json<StudentRecord>), ApiError> {
    let draft = parse_draft(&body)?;
    let record = engine.create(&draft, &CancelToken::new())?;
    tracing::debug!(id = %record.id, "student created");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_students(
    State(engine): State<Arc<Gradebook>>,
) -> Result<Json<Vec<StudentRecord>>, ApiError> {
    let records = engine.list(&CancelToken::new())?;
    Ok(Json(records))
}

async fn get_student(
    State(engine): State<Arc<Gradebook>>,
    Path(id): Path<String>,
) -> Result<Json<StudentRecord>, ApiError> {
    let record = engine.fetch(&id, &CancelToken::new())?;
    Ok(Json(record))
}

async fn update_student(
    State(engine): State<Arc<Gradebook>>,
    Path(id): Path<String>,
    body: String,
) -> Result<Json<StudentRecord>, ApiError> {
    let draft = parse_draft(&body)?;
    let record = engine.update(&id, &draft, &CancelToken::new())?;
    tracing::debug!(id = %record.id, "student updated");
    Ok(Json(record))
}

async fn delete_student(
    State(engine): State<Arc<Gradebook>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    engine.remove(&id, &CancelToken::new())?;
    tracing::debug!(id = %id, "student deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExecutionError, ValidationError};

    #[test]
    fn status_mapping_follows_the_taxonomy() {
        let validation: GradebookError = ValidationError::EmptyId.into();
        assert_eq!(status_for(&validation), StatusCode::BAD_REQUEST);

        let missing: GradebookError = ExecutionError::StudentNotFound {
            id: "S1".to_string(),
        }
        .into();
        assert_eq!(status_for(&missing), StatusCode::NOT_FOUND);

        let duplicate: GradebookError = ExecutionError::DuplicateStudent {
            id: "S1".to_string(),
        }
        .into();
        assert_eq!(status_for(&duplicate), StatusCode::CONFLICT);

        let down: GradebookError = ExecutionError::StorageUnavailable {
            message: "refused".to_string(),
        }
        .into();
        assert_eq!(status_for(&down), StatusCode::SERVICE_UNAVAILABLE);

        let internal = GradebookError::internal("bug");
        assert_eq!(status_for(&internal), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn parse_draft_rejects_malformed_json() {
        let err = parse_draft("{not json").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("invalid student payload"));
    }
}
