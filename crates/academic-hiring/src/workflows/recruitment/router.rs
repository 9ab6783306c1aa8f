use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::access::Caller;
use super::domain::{
    ApplicationDraft, ApplicationId, CriterionDraft, CriterionId, CriterionUpdate, Decision,
    EvaluationId, EvaluationReport, JuryAssignment, JuryMemberDraft, ListingDraft, ListingId,
    ListingStatus, ListingUpdate, PositionRank, ProfileUpdate, Registration, Role, UserId,
};
use super::error::WorkflowError;
use super::repository::{ApplicationFilter, EvaluationFilter, NotificationPublisher, RecruitmentStore};
use super::service::RecruitmentService;

/// Header carrying the authenticated user id, set by the fronting gateway.
pub const CALLER_HEADER: &str = "x-user-id";

type Shared<S, N> = State<Arc<RecruitmentService<S, N>>>;

/// Router exposing the recruitment workflow under `/api/v1`.
pub fn recruitment_router<S, N>(service: Arc<RecruitmentService<S, N>>) -> Router
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/users",
            get(list_users_handler::<S, N>).post(provision_handler::<S, N>),
        )
        .route("/api/v1/users/register", post(register_handler::<S, N>))
        .route(
            "/api/v1/users/me",
            get(me_handler::<S, N>).put(update_me_handler::<S, N>),
        )
        .route(
            "/api/v1/users/:user_id",
            get(user_handler::<S, N>)
                .put(update_user_handler::<S, N>)
                .delete(delete_user_handler::<S, N>),
        )
        .route(
            "/api/v1/listings",
            get(list_listings_handler::<S, N>).post(create_listing_handler::<S, N>),
        )
        .route(
            "/api/v1/listings/:listing_id",
            get(listing_handler::<S, N>)
                .put(update_listing_handler::<S, N>)
                .delete(delete_listing_handler::<S, N>),
        )
        .route(
            "/api/v1/criteria",
            get(list_criteria_handler::<S, N>).post(add_criterion_handler::<S, N>),
        )
        .route(
            "/api/v1/criteria/:criterion_id",
            put(update_criterion_handler::<S, N>).delete(remove_criterion_handler::<S, N>),
        )
        .route(
            "/api/v1/jury",
            get(list_jury_handler::<S, N>).post(add_jury_handler::<S, N>),
        )
        .route(
            "/api/v1/jury/:user_id",
            axum::routing::delete(remove_jury_handler::<S, N>),
        )
        .route(
            "/api/v1/applications",
            get(list_applications_handler::<S, N>).post(submit_application_handler::<S, N>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler::<S, N>),
        )
        .route(
            "/api/v1/applications/:application_id/criteria",
            get(criteria_check_handler::<S, N>),
        )
        .route(
            "/api/v1/applications/:application_id/review",
            get(review_handler::<S, N>),
        )
        .route(
            "/api/v1/applications/:application_id/decision",
            post(decide_handler::<S, N>),
        )
        .route(
            "/api/v1/applications/:application_id/notes",
            put(annotate_handler::<S, N>),
        )
        .route(
            "/api/v1/evaluations",
            get(list_evaluations_handler::<S, N>).post(assign_jury_handler::<S, N>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id",
            get(evaluation_handler::<S, N>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/report",
            post(submit_evaluation_handler::<S, N>),
        )
        .with_state(service)
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let status = match &self {
            WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
            WorkflowError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            WorkflowError::Unauthenticated => StatusCode::UNAUTHORIZED,
            WorkflowError::InvalidStateTransition { .. }
            | WorkflowError::DuplicateAssignment { .. }
            | WorkflowError::DuplicateApplication { .. }
            | WorkflowError::AlreadyCompleted(_) => StatusCode::CONFLICT,
            WorkflowError::IncompleteDocuments { .. }
            | WorkflowError::DeadlinePassed { .. }
            | WorkflowError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkflowError::Repository(err) => {
                error!(error = %err, "recruitment store failure");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        if status.is_client_error() {
            warn!(kind = self.kind(), error = %self, "workflow request rejected");
        }

        let payload = json!({
            "kind": self.kind(),
            "error": self.to_string(),
        });
        (status, Json(payload)).into_response()
    }
}

/// Resolve the caller from `x-user-id`; the role always comes from the user directory.
pub(crate) fn caller_from_headers<S, N>(
    service: &RecruitmentService<S, N>,
    headers: &HeaderMap,
) -> Result<Caller, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let raw = headers
        .get(CALLER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .ok_or(WorkflowError::Unauthenticated)?;
    let digits = raw.strip_prefix("user-").unwrap_or(raw);
    let id = digits
        .parse::<u64>()
        .map_err(|_| WorkflowError::Unauthenticated)?;
    service.resolve_caller(UserId(id))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProvisionRequest {
    #[serde(flatten)]
    registration: Registration,
    role: Role,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserQuery {
    #[serde(default)]
    role: Option<Role>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListingQuery {
    #[serde(default)]
    status: Option<ListingStatus>,
    /// Admin-only; archived listings are otherwise hidden.
    #[serde(default)]
    include_archived: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CriteriaQuery {
    #[serde(default)]
    rank: Option<PositionRank>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    decision: Decision,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotesRequest {
    #[serde(default)]
    notes: Option<String>,
}

pub(crate) async fn register_handler<S, N>(
    State(service): Shared<S, N>,
    Json(registration): Json<Registration>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let user = service.register(registration)?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub(crate) async fn provision_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Json(request): Json<ProvisionRequest>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let user = service.provision_user(&caller, request.registration, request.role)?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub(crate) async fn me_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    Ok(Json(service.me(&caller)?).into_response())
}

pub(crate) async fn update_me_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    Ok(Json(service.update_me(&caller, update)?).into_response())
}

pub(crate) async fn list_users_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    Ok(Json(service.users(&caller, query.role)?).into_response())
}

pub(crate) async fn user_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(user_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    Ok(Json(service.user(&caller, UserId(user_id))?).into_response())
}

pub(crate) async fn update_user_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(user_id): Path<u64>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    Ok(Json(service.update_user(&caller, UserId(user_id), update)?).into_response())
}

pub(crate) async fn delete_user_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(user_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    service.delete_user(&caller, UserId(user_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn list_listings_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Query(query): Query<ListingQuery>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let listings = if query.include_archived {
        let caller = caller_from_headers(&service, &headers)?;
        service.all_listings(&caller, query.status)?
    } else {
        service.listings(query.status)?
    };
    Ok(Json(listings).into_response())
}

pub(crate) async fn listing_handler<S, N>(
    State(service): Shared<S, N>,
    Path(listing_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    Ok(Json(service.listing(ListingId(listing_id))?).into_response())
}

pub(crate) async fn create_listing_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Json(draft): Json<ListingDraft>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let view = service.create_listing(&caller, draft)?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

pub(crate) async fn update_listing_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(listing_id): Path<u64>,
    Json(update): Json<ListingUpdate>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let view = service.update_listing(&caller, ListingId(listing_id), update)?;
    Ok(Json(view).into_response())
}

pub(crate) async fn delete_listing_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(listing_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let removal = service.delete_listing(&caller, ListingId(listing_id))?;
    Ok(Json(json!({ "outcome": removal })).into_response())
}

pub(crate) async fn list_criteria_handler<S, N>(
    State(service): Shared<S, N>,
    Query(query): Query<CriteriaQuery>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    Ok(Json(service.criteria().list(query.rank)?).into_response())
}

pub(crate) async fn add_criterion_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Json(draft): Json<CriterionDraft>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let criterion = service.criteria().add(&caller, draft)?;
    Ok((StatusCode::CREATED, Json(criterion)).into_response())
}

pub(crate) async fn update_criterion_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(criterion_id): Path<u64>,
    Json(update): Json<CriterionUpdate>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let criterion = service
        .criteria()
        .update(&caller, CriterionId(criterion_id), update)?;
    Ok(Json(criterion).into_response())
}

pub(crate) async fn remove_criterion_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(criterion_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    service.criteria().remove(&caller, CriterionId(criterion_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn list_jury_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    Ok(Json(service.jury_members(&caller)?).into_response())
}

pub(crate) async fn add_jury_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Json(draft): Json<JuryMemberDraft>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let member = service.add_jury_member(&caller, draft)?;
    Ok((StatusCode::CREATED, Json(member)).into_response())
}

pub(crate) async fn remove_jury_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(user_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    service.remove_jury_member(&caller, UserId(user_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn submit_application_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Json(draft): Json<ApplicationDraft>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let application = service.submit_application(&caller, draft)?;
    Ok((StatusCode::CREATED, Json(application)).into_response())
}

pub(crate) async fn list_applications_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Query(filter): Query<ApplicationFilter>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    Ok(Json(service.applications(&caller, filter)?).into_response())
}

pub(crate) async fn application_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let detail = service.application(&caller, ApplicationId(application_id))?;
    Ok(Json(detail).into_response())
}

pub(crate) async fn criteria_check_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let assessment = service.evaluate_criteria(&caller, ApplicationId(application_id))?;
    Ok(Json(assessment).into_response())
}

pub(crate) async fn review_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let summary = service.review_summary(&caller, ApplicationId(application_id))?;
    Ok(Json(summary).into_response())
}

pub(crate) async fn decide_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
    Json(request): Json<DecisionRequest>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let application = service.decide(
        &caller,
        ApplicationId(application_id),
        request.decision,
        request.notes,
    )?;
    Ok(Json(application).into_response())
}

pub(crate) async fn annotate_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(application_id): Path<u64>,
    Json(request): Json<NotesRequest>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let application = service.annotate(&caller, ApplicationId(application_id), request.notes)?;
    Ok(Json(application).into_response())
}

pub(crate) async fn assign_jury_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Json(assignment): Json<JuryAssignment>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let evaluation = service.assign_jury(&caller, assignment)?;
    Ok((StatusCode::CREATED, Json(evaluation)).into_response())
}

pub(crate) async fn list_evaluations_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Query(filter): Query<EvaluationFilter>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    Ok(Json(service.evaluations(&caller, filter)?).into_response())
}

pub(crate) async fn evaluation_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(evaluation_id): Path<u64>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let detail = service.evaluation(&caller, EvaluationId(evaluation_id))?;
    Ok(Json(detail).into_response())
}

pub(crate) async fn submit_evaluation_handler<S, N>(
    State(service): Shared<S, N>,
    headers: HeaderMap,
    Path(evaluation_id): Path<u64>,
    Json(report): Json<EvaluationReport>,
) -> Result<Response, WorkflowError>
where
    S: RecruitmentStore + 'static,
    N: NotificationPublisher + 'static,
{
    let caller = caller_from_headers(&service, &headers)?;
    let evaluation = service.submit_evaluation(&caller, EvaluationId(evaluation_id), report)?;
    Ok(Json(evaluation).into_response())
}
