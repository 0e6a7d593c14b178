use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AllocationId, ApplicantId, QuestionId, ReviewerId};
use super::intake::{BulkImportRequest, BulkImporter};
use super::repository::{GrantRepository, NotificationPublisher, RepositoryError};
use super::service::{
    AllocationRequest, ApplicationSubmission, GrantProgramService, GrantServiceError,
    QuestionDraft, ResourceDraft, ScoreSubmission,
};

/// Router builder exposing the program, intake, scoring, and allocation
/// endpoints.
pub fn grant_router<R, N>(service: Arc<GrantProgramService<R, N>>) -> Router
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/programs", post(create_program_handler::<R, N>))
        .route("/api/v1/programs/join", post(join_program_handler::<R, N>))
        .route("/api/v1/programs/:slug", get(program_handler::<R, N>))
        .route(
            "/api/v1/programs/:slug/questions",
            get(list_questions_handler::<R, N>).post(add_question_handler::<R, N>),
        )
        .route(
            "/api/v1/programs/:slug/questions/:question_id",
            put(update_question_handler::<R, N>).delete(delete_question_handler::<R, N>),
        )
        .route("/api/v1/programs/:slug/apply", post(apply_handler::<R, N>))
        .route(
            "/api/v1/programs/:slug/applicants",
            get(list_applicants_handler::<R, N>),
        )
        .route(
            "/api/v1/programs/:slug/applicants/import",
            post(bulk_import_handler::<R, N>),
        )
        .route(
            "/api/v1/programs/:slug/applicants/:applicant_id",
            get(applicant_detail_handler::<R, N>),
        )
        .route(
            "/api/v1/programs/:slug/applicants/:applicant_id/score",
            post(submit_score_handler::<R, N>),
        )
        .route(
            "/api/v1/programs/:slug/resources",
            get(list_resources_handler::<R, N>).post(create_resource_handler::<R, N>),
        )
        .route(
            "/api/v1/programs/:slug/applicants/:applicant_id/allocations",
            post(allocate_handler::<R, N>),
        )
        .route(
            "/api/v1/programs/:slug/applicants/:applicant_id/allocations/:allocation_id",
            delete(deallocate_handler::<R, N>),
        )
        .with_state(service)
}

fn error_response(error: GrantServiceError) -> Response {
    match error {
        GrantServiceError::Validation(errors) => {
            let payload = json!({ "errors": errors });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        GrantServiceError::NotAMember => {
            let payload = json!({ "error": "reviewer is not a member of this program" });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
        GrantServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": "not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        GrantServiceError::Repository(RepositoryError::Conflict) => {
            let payload = json!({ "error": "record already exists" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProgramRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinProgramRequest {
    pub join_code: String,
    pub reviewer: String,
}

pub(crate) async fn create_program_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    axum::Json(request): axum::Json<CreateProgramRequest>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create_program(&request.name) {
        Ok(program) => (StatusCode::CREATED, axum::Json(program)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn join_program_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    axum::Json(request): axum::Json<JoinProgramRequest>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.join_program(&request.join_code, ReviewerId(request.reviewer)) {
        Ok(program) => {
            let payload = json!({ "slug": program.slug, "name": program.name });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn program_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path(slug): Path<String>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.program_view(&slug) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_questions_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path(slug): Path<String>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.questions(&slug) {
        Ok(questions) => (StatusCode::OK, axum::Json(questions)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_question_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path(slug): Path<String>,
    axum::Json(draft): axum::Json<QuestionDraft>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.add_question(&slug, draft) {
        Ok(question) => (StatusCode::CREATED, axum::Json(question)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_question_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path((slug, question_id)): Path<(String, String)>,
    axum::Json(draft): axum::Json<QuestionDraft>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.update_question(&slug, &QuestionId(question_id), draft) {
        Ok(question) => (StatusCode::OK, axum::Json(question)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_question_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path((slug, question_id)): Path<(String, String)>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.delete_question(&slug, &QuestionId(question_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn apply_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path(slug): Path<String>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.apply(&slug, submission) {
        Ok(applicant) => (StatusCode::CREATED, axum::Json(applicant)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bulk_import_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path(slug): Path<String>,
    axum::Json(request): axum::Json<BulkImportRequest>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match BulkImporter::new(service).import(&slug, request) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn list_applicants_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path(slug): Path<String>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.applicant_summaries(&slug) {
        Ok(summaries) => (StatusCode::OK, axum::Json(summaries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn applicant_detail_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path((slug, applicant_id)): Path<(String, String)>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.applicant_detail(&slug, &ApplicantId(applicant_id)) {
        Ok(detail) => (StatusCode::OK, axum::Json(detail)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_score_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path((slug, applicant_id)): Path<(String, String)>,
    axum::Json(submission): axum::Json<ScoreSubmission>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.submit_score(&slug, &ApplicantId(applicant_id), submission) {
        Ok(score) => (StatusCode::OK, axum::Json(score)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_resource_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path(slug): Path<String>,
    axum::Json(draft): axum::Json<ResourceDraft>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create_resource(&slug, draft) {
        Ok(resource) => (StatusCode::CREATED, axum::Json(resource)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_resources_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path(slug): Path<String>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.resource_summaries(&slug) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn allocate_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path((slug, applicant_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<AllocationRequest>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.allocate(&slug, &ApplicantId(applicant_id), request) {
        Ok(allocation) => (StatusCode::CREATED, axum::Json(allocation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn deallocate_handler<R, N>(
    State(service): State<Arc<GrantProgramService<R, N>>>,
    Path((slug, applicant_id, allocation_id)): Path<(String, String, String)>,
) -> Response
where
    R: GrantRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.deallocate(
        &slug,
        &ApplicantId(applicant_id),
        &AllocationId(allocation_id),
    ) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}
