//! HTTP surface wrapping [`migrate_engine::MigrationEngine`].
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | Service banner |
//! | GET | `/health` | Liveness probe |
//! | POST | `/migrate` | Submit a one-shot migration |
//! | POST | `/schedule` | Register a periodic migration |
//! | GET | `/status/{job_id}` | Fetch a job's current record |

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use migrate_engine::MigrationEngine;
use migrate_types::{JobRecord, MigrationRequest};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MigrationEngine>,
}

/// Builds the full router, ready to have `with_state` applied by the caller.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/migrate", post(migrate))
        .route("/schedule", post(schedule))
        .route("/status/{job_id}", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct RootResponse {
    status: &'static str,
    service: &'static str,
}

async fn root() -> impl IntoResponse {
    Json(RootResponse {
        status: "online",
        service: "migrate-api",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Process-level liveness; does not inspect any in-flight job.
async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct SubmitResponse {
    job_id: String,
    message: &'static str,
}

async fn migrate(State(state): State<AppState>, Json(request): Json<MigrationRequest>) -> impl IntoResponse {
    let job_id = state.engine.submit(request);
    tracing::info!(job_id = %job_id, "migration job accepted");
    (
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id,
            message: "migration job accepted",
        }),
    )
}

#[derive(Deserialize)]
struct ScheduleQuery {
    interval_minutes: u64,
}

async fn schedule(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
    Json(request): Json<MigrationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = state.engine.schedule(request, query.interval_minutes)?;
    tracing::info!(job_id = %job_id, interval_minutes = query.interval_minutes, "periodic migration registered");
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            job_id,
            message: "periodic migration registered",
        }),
    ))
}

async fn status(State(state): State<AppState>, Path(job_id): Path<String>) -> Json<JobRecord> {
    Json(state.engine.status(&job_id))
}

/// Errors the router can surface to a client, mapped to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] migrate_engine::MigrationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use migrate_engine::MigrationError::*;

        let status = match &self {
            ApiError::Engine(InvalidUrl(_)) => StatusCode::BAD_REQUEST,
            ApiError::Engine(InvalidInterval(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Engine(UnsupportedProvider(_)) => StatusCode::BAD_REQUEST,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();

        tracing::warn!(status = status.as_u16(), error = %message, "request failed");
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrate_types::{MigrationActions, Provider};
    use tower::ServiceExt;

    fn sample_request() -> MigrationRequest {
        MigrationRequest {
            source_type: Provider::GitHub,
            source_token: "tok".to_string(),
            source_repo_url: "https://github.com/acme/widgets".to_string(),
            dest_type: Provider::GitLab,
            dest_token: "tok".to_string(),
            dest_repo_url: "https://gitlab.com/acme/widgets".to_string(),
            actions: MigrationActions::default(),
        }
    }

    fn app() -> Router {
        create_router(AppState {
            engine: Arc::new(MigrationEngine::new(std::env::temp_dir().join("migrate-api-route-tests"))),
        })
    }

    #[tokio::test]
    async fn root_reports_online() {
        let response = app()
            .oneshot(axum::http::Request::builder().uri("/").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(axum::http::Request::builder().uri("/health").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_job_status_reports_not_found_state() {
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/status/does-not-exist")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let record: JobRecord = serde_json::from_slice(&body).unwrap();
        assert_eq!(record.status, migrate_types::JobStatus::NotFound);
    }

    #[tokio::test]
    async fn migrate_accepts_a_well_formed_request() {
        let body = serde_json::to_vec(&sample_request()).unwrap();
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/migrate")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn schedule_rejects_zero_interval_with_unprocessable_entity() {
        let body = serde_json::to_vec(&sample_request()).unwrap();
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/schedule?interval_minutes=0")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
