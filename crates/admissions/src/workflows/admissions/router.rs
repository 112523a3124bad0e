use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{NewSubmission, SubmissionFilter, SubmissionId, ValidationError};
use super::lifecycle::LifecycleState;
use super::repository::AdmissionsStore;
use super::service::{AdmissionsService, ServiceError, TransitionRequest};

type SharedService<S, R> = Arc<AdmissionsService<S, R>>;

/// Body of a transition request as sent by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionPayload {
    #[serde(alias = "status")]
    pub target_state: String,
    #[serde(alias = "changed_by")]
    pub actor: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeletePayload {
    #[serde(alias = "deleted_by")]
    pub actor: String,
}

/// Router exposing one lifecycle's endpoints under `base` (e.g. `/api/v1/applications`).
pub fn admissions_router<S, R>(service: SharedService<S, R>, base: &str) -> Router
where
    S: LifecycleState,
    R: AdmissionsStore<S> + 'static,
{
    let base = base.trim_end_matches('/');
    Router::new()
        .route(base, get(list_handler::<S, R>).post(create_handler::<S, R>))
        .route(&format!("{base}/lifecycle"), get(lifecycle_handler::<S, R>))
        .route(
            &format!("{base}/:submission_id"),
            get(dossier_handler::<S, R>).delete(delete_handler::<S, R>),
        )
        .route(
            &format!("{base}/:submission_id/transition"),
            patch(transition_handler::<S, R>),
        )
        .route(
            &format!("{base}/:submission_id/history"),
            get(history_handler::<S, R>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Query(filter): Query<SubmissionFilter>,
) -> Response
where
    S: LifecycleState,
    R: AdmissionsStore<S> + 'static,
{
    match service.list(&filter) {
        Ok(submissions) => (StatusCode::OK, Json(json!({ "data": submissions }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    payload: Result<Json<NewSubmission>, JsonRejection>,
) -> Response
where
    S: LifecycleState,
    R: AdmissionsStore<S> + 'static,
{
    let Json(intake) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed_body(rejection),
    };

    match service.create(intake) {
        Ok(submission) => (StatusCode::CREATED, Json(json!({ "data": submission }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn lifecycle_handler<S, R>(State(service): State<SharedService<S, R>>) -> Response
where
    S: LifecycleState,
    R: AdmissionsStore<S> + 'static,
{
    (StatusCode::OK, Json(json!({ "data": service.describe() }))).into_response()
}

pub(crate) async fn dossier_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(submission_id): Path<String>,
) -> Response
where
    S: LifecycleState,
    R: AdmissionsStore<S> + 'static,
{
    match service.dossier(&SubmissionId(submission_id)) {
        Ok(dossier) => (StatusCode::OK, Json(json!({ "data": dossier }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn transition_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(submission_id): Path<String>,
    payload: Result<Json<TransitionPayload>, JsonRejection>,
) -> Response
where
    S: LifecycleState,
    R: AdmissionsStore<S> + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed_body(rejection),
    };

    let Some(target) = S::parse(&payload.target_state) else {
        return error_response::<S>(
            ValidationError::UnknownState {
                lifecycle: S::LIFECYCLE,
                value: payload.target_state,
            }
            .into(),
        );
    };

    let request = TransitionRequest {
        target,
        actor: payload.actor,
        comment: payload.comment,
    };

    match service.transition(&SubmissionId(submission_id), request) {
        Ok(submission) => (StatusCode::OK, Json(json!({ "data": submission }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(submission_id): Path<String>,
    payload: Result<Json<DeletePayload>, JsonRejection>,
) -> Response
where
    S: LifecycleState,
    R: AdmissionsStore<S> + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed_body(rejection),
    };

    match service.delete(&SubmissionId(submission_id), &payload.actor) {
        Ok(submission) => (StatusCode::OK, Json(json!({ "data": submission }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn history_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(submission_id): Path<String>,
) -> Response
where
    S: LifecycleState,
    R: AdmissionsStore<S> + 'static,
{
    match service.verified_trail(&SubmissionId(submission_id)) {
        Ok((trail, replayed)) => (
            StatusCode::OK,
            Json(json!({ "data": trail, "replayed_state": replayed })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn malformed_body(rejection: JsonRejection) -> Response {
    let payload = json!({
        "error": ValidationError::MalformedBody(rejection.body_text()).to_string(),
    });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

/// Map service errors onto HTTP statuses and payloads.
pub(crate) fn error_response<S: LifecycleState>(err: ServiceError<S>) -> Response {
    match err {
        ServiceError::InvalidTransition {
            current,
            target,
            allowed,
        } => {
            let payload = json!({
                "error": "invalid status transition",
                "current_state": current,
                "target_state": target,
                "allowed": allowed,
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        ServiceError::NotFound(id) => {
            let payload = json!({
                "error": "submission not found",
                "submission_id": id,
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        ServiceError::Validation(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        conflict @ ServiceError::Conflict { .. } => {
            let payload = json!({ "error": conflict.to_string() });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
