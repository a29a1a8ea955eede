//! High-level proposal persistence operations.
//!
//! Repository-agnostic orchestration used by the HTTP handlers: parse,
//! normalize, `add`, `commit`. Handlers should call these rather than the
//! repository directly.

use log::info;
use serde_json::Value;

use super::repository::{ProposalFilter, ProposalRepository};
use crate::error::PhtResult;
use crate::models::proposal::{Proposal, ProposalSubmission};
use crate::services::normalizer::ProposalNormalizer;

// ==================== Health & Connection ====================

/// Check if the archive is reachable.
///
/// This is a simple pass-through to the repository's health check.
pub async fn health_check<R: ProposalRepository + ?Sized>(repo: &R) -> PhtResult<bool> {
    repo.health_check().await
}

// ==================== Proposal Operations ====================

/// Store a new proposal.
///
/// 1. Parse the payload
/// 2. Normalize it as a draft
/// 3. Stage and commit it; the archive assigns the identifier
///
/// # Returns
/// The stored proposal, with its `prsl_id`.
pub async fn create_proposal<R: ProposalRepository + ?Sized>(
    repo: &R,
    normalizer: &ProposalNormalizer,
    payload: Value,
) -> PhtResult<Proposal> {
    let submission = ProposalSubmission::from_json(payload)?;
    let normalized = normalizer.normalize_for_create(submission);
    let stored = repo.add(normalized).await?;
    repo.commit().await?;
    info!(
        "Service layer: created proposal {}",
        stored.prsl_id.as_deref().unwrap_or("<unassigned>")
    );
    Ok(stored)
}

/// Replace the stored proposal `prsl_id` with an edited version.
///
/// The stored record supplies the creation metadata and version, so a
/// client cannot rewrite them.
///
/// # Returns
/// * `Err(PhtError::NotFound)` if `prsl_id` is not stored
/// * `Err(PhtError::ValidationError)` if the body is malformed or names a
///   different proposal
pub async fn update_proposal<R: ProposalRepository + ?Sized>(
    repo: &R,
    normalizer: &ProposalNormalizer,
    prsl_id: &str,
    payload: Value,
) -> PhtResult<Proposal> {
    let mut submission = ProposalSubmission::from_json(payload)?;
    let existing = repo.get(prsl_id).await?;
    submission.metadata = Some(existing.metadata);

    let normalized = normalizer.normalize_for_update(submission, prsl_id)?;
    let stored = repo.add(normalized).await?;
    repo.commit().await?;
    info!(
        "Service layer: updated proposal {} to version {:?}",
        prsl_id, stored.metadata.version
    );
    Ok(stored)
}

/// Retrieve a proposal by id.
pub async fn get_proposal<R: ProposalRepository + ?Sized>(
    repo: &R,
    prsl_id: &str,
) -> PhtResult<Proposal> {
    info!("Service layer: loading proposal {}", prsl_id);
    repo.get(prsl_id).await
}

/// Proposals the user submitted, created or is an investigator on.
pub async fn list_proposals_for_user<R: ProposalRepository + ?Sized>(
    repo: &R,
    user_id: &str,
) -> PhtResult<Vec<Proposal>> {
    info!("Service layer: listing proposals for user {}", user_id);
    repo.query(&ProposalFilter::for_user(user_id)).await
}

#[cfg(test)]
#[path = "services_tests.rs"]
mod services_tests;
