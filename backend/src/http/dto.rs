//! Data Transfer Objects for the HTTP API.
//!
//! Proposal, validation and coordinate bodies reuse the core types, which
//! already derive Serialize/Deserialize.

use serde::{Deserialize, Serialize};

pub use crate::clients::object_store::PresignedUrl;
pub use crate::models::proposal::Proposal;
pub use crate::services::resolver::ResolvedPosition;
pub use crate::services::validation::ValidationReport;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Reachability of the proposal archive
    pub repository: String,
}

/// Response for a newly stored proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProposalResponse {
    pub prsl_id: String,
}

/// Response for proposals involving a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalListResponse {
    pub proposals: Vec<Proposal>,
    pub total: usize,
}
