//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use super::dto::{
    CreateProposalResponse, HealthResponse, PresignedUrl, Proposal, ProposalListResponse,
    ResolvedPosition, ValidationReport,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::error::{PhtError, PhtResult};
use crate::models::coordinates::ReferenceFrame;
use crate::models::proposal::ProposalSubmission;
use crate::services::validation::validate_proposal;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Verify the service is running and the proposal archive is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repo_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        repository: repo_status,
    }))
}

// =============================================================================
// Proposals
// =============================================================================

/// GET /proposals/{prsl_id}
pub async fn get_proposal(
    State(state): State<AppState>,
    Path(prsl_id): Path<String>,
) -> HandlerResult<Proposal> {
    let proposal = db_services::get_proposal(state.repository.as_ref(), &prsl_id).await?;
    Ok(Json(proposal))
}

/// GET /proposals/list/{user_id}
///
/// Proposals the user submitted, created or is an investigator on.
pub async fn list_proposals(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> HandlerResult<ProposalListResponse> {
    let proposals =
        db_services::list_proposals_for_user(state.repository.as_ref(), &user_id).await?;
    let total = proposals.len();
    Ok(Json(ProposalListResponse { proposals, total }))
}

/// POST /proposals
///
/// Store a new draft and answer with its identifier.
pub async fn create_proposal(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateProposalResponse>), AppError> {
    let Json(payload) = payload?;
    let stored =
        db_services::create_proposal(state.repository.as_ref(), &state.normalizer, payload)
            .await?;
    let prsl_id = stored
        .prsl_id
        .ok_or_else(|| PhtError::internal("Archive stored a proposal without an identifier"))?;
    Ok((StatusCode::CREATED, Json(CreateProposalResponse { prsl_id })))
}

/// PUT /proposals/{prsl_id}
pub async fn update_proposal(
    State(state): State<AppState>,
    Path(prsl_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> HandlerResult<Proposal> {
    let Json(payload) = payload?;
    let stored = db_services::update_proposal(
        state.repository.as_ref(),
        &state.normalizer,
        &prsl_id,
        payload,
    )
    .await?;
    Ok(Json(stored))
}

/// POST /proposals/validate
pub async fn validate(
    payload: Result<Json<Value>, JsonRejection>,
) -> HandlerResult<ValidationReport> {
    let Json(payload) = payload?;
    let submission = ProposalSubmission::from_json(payload)?;
    Ok(Json(validate_proposal(&submission.proposal_info)))
}

// =============================================================================
// Coordinates
// =============================================================================

/// GET /coordinates/{identifier}/{reference_frame}
pub async fn get_coordinates(
    State(state): State<AppState>,
    Path((identifier, reference_frame)): Path<(String, String)>,
) -> HandlerResult<ResolvedPosition> {
    let frame: ReferenceFrame = reference_frame.parse()?;
    let position = state.resolver.resolve_in_frame(&identifier, frame).await?;
    Ok(Json(position))
}

// =============================================================================
// Attachments
// =============================================================================

/// POST /upload/signedurl/{filename}
pub async fn upload_signed_url(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> HandlerResult<PresignedUrl> {
    let url = state
        .object_store()?
        .sign_upload(&filename, state.url_expiry)
        .await?;
    Ok(Json(url))
}

/// GET /download/signedurl/{filename}
pub async fn download_signed_url(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> HandlerResult<PresignedUrl> {
    let url = state
        .object_store()?
        .sign_download(&filename, state.url_expiry)
        .await?;
    Ok(Json(url))
}

// =============================================================================
// Observatory Static Data
// =============================================================================

/// GET /osd/{cycle_id}
pub async fn get_osd(
    State(state): State<AppState>,
    Path(cycle_id): Path<String>,
) -> HandlerResult<Value> {
    let cycle_id = parse_cycle_id(&cycle_id)?;
    let document = state.osd()?.get_osd(cycle_id).await?;
    Ok(Json(document))
}

fn parse_cycle_id(raw: &str) -> PhtResult<u32> {
    raw.parse()
        .map_err(|_| PhtError::validation(format!("Invalid cycle id: {}", raw)))
}
