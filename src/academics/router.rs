use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::catalog::CatalogReader;
use super::domain::{MovementDraft, PlanId, SpaceId, StudentId};
use super::ledger::{AcademicLedger, LedgerError};
use super::rules::{Purpose, RuleSource};
use super::service::{AcademicService, AcademicServiceError};
use super::validation::{MovementRejection, ValidationError};

/// Router builder exposing the eligibility, prerequisite, transcript, and
/// movement-intake endpoints.
pub fn academics_router<L, C, R>(service: Arc<AcademicService<L, C, R>>) -> Router
where
    L: AcademicLedger + 'static,
    C: CatalogReader + 'static,
    R: RuleSource + 'static,
{
    Router::new()
        .route(
            "/api/v1/plans/:plan/spaces/:space/eligibility",
            get(eligibility_handler::<L, C, R>),
        )
        .route(
            "/api/v1/plans/:plan/spaces/:space/prerequisites",
            get(prerequisites_handler::<L, C, R>),
        )
        .route(
            "/api/v1/plans/:plan/students/:student/transcript",
            get(transcript_handler::<L, C, R>),
        )
        .route("/api/v1/movements", post(movement_handler::<L, C, R>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct EligibilityQuery {
    student: String,
    purpose: Purpose,
    #[serde(default)]
    cycle: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PurposeQuery {
    purpose: Purpose,
}

pub(crate) async fn eligibility_handler<L, C, R>(
    State(service): State<Arc<AcademicService<L, C, R>>>,
    Path((plan, space)): Path<(String, String)>,
    Query(query): Query<EligibilityQuery>,
) -> Response
where
    L: AcademicLedger + 'static,
    C: CatalogReader + 'static,
    R: RuleSource + 'static,
{
    let student = StudentId(query.student);
    let plan = PlanId(plan);
    let space = SpaceId(space);
    match service.eligibility(&student, &plan, &space, query.purpose, query.cycle) {
        Ok(verdict) => (StatusCode::OK, axum::Json(verdict)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn prerequisites_handler<L, C, R>(
    State(service): State<Arc<AcademicService<L, C, R>>>,
    Path((plan, space)): Path<(String, String)>,
    Query(query): Query<PurposeQuery>,
) -> Response
where
    L: AcademicLedger + 'static,
    C: CatalogReader + 'static,
    R: RuleSource + 'static,
{
    match service.prerequisites(&PlanId(plan), &SpaceId(space), query.purpose) {
        Ok(rules) => (StatusCode::OK, axum::Json(rules)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn transcript_handler<L, C, R>(
    State(service): State<Arc<AcademicService<L, C, R>>>,
    Path((plan, student)): Path<(String, String)>,
) -> Response
where
    L: AcademicLedger + 'static,
    C: CatalogReader + 'static,
    R: RuleSource + 'static,
{
    match service.transcript(&StudentId(student), &PlanId(plan)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn movement_handler<L, C, R>(
    State(service): State<Arc<AcademicService<L, C, R>>>,
    axum::Json(draft): axum::Json<MovementDraft>,
) -> Response
where
    L: AcademicLedger + 'static,
    C: CatalogReader + 'static,
    R: RuleSource + 'static,
{
    match service.record_movement(draft) {
        Ok(movement) => (StatusCode::CREATED, axum::Json(movement)).into_response(),
        Err(AcademicServiceError::Validation(ValidationError::Rejected(rejection))) => {
            rejection_response(rejection)
        }
        Err(err) => error_response(err),
    }
}

fn rejection_response(rejection: MovementRejection) -> Response {
    let payload = match &rejection {
        MovementRejection::MissingPrerequisites { purpose, unmet } => json!({
            "error": rejection.to_string(),
            "purpose": purpose,
            "missing": unmet,
        }),
        _ => json!({ "error": rejection.to_string() }),
    };
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}

fn error_response(err: AcademicServiceError) -> Response {
    let status = match &err {
        AcademicServiceError::EnrollmentNotFound { .. } => StatusCode::NOT_FOUND,
        AcademicServiceError::Eligibility(inner) => match inner {
            super::eligibility::EligibilityError::EnrollmentNotFound { .. }
            | super::eligibility::EligibilityError::SpaceNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        AcademicServiceError::Validation(inner) => match inner {
            ValidationError::EnrollmentNotFound(_)
            | ValidationError::SpaceNotFound(_)
            | ValidationError::PlanNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        AcademicServiceError::Ledger(LedgerError::Conflict(_)) => StatusCode::CONFLICT,
        AcademicServiceError::Ledger(LedgerError::NotFound) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
