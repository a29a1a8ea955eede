//! Proposal records as submitted by clients and as handed to the archive.
//!
//! The payload is an explicit schema: required fields are checked when the
//! JSON is parsed, so malformed input fails up front with a path to the
//! offending field. Fields the service does not interpret are collected in
//! `extra` maps and written back unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PhtResult;

/// Identifier clients send for a proposal that has not been stored yet.
pub const NEW_PROPOSAL_ID: &str = "new";

/// Creator recorded when a submission carries no submitter.
pub const DEFAULT_USER: &str = "DefaultUser";

/// Proposal lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Draft,
    Submitted,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
        }
    }
}

/// A coordinate value as it appears in a target: sexagesimal text before
/// normalization, decimal degrees after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AngleValue {
    Degrees(f64),
    Text(String),
}

/// An observing target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub name: String,
    pub right_ascension: AngleValue,
    pub declination: AngleValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_ascension_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declination_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redshift: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Target {
    /// Identifier results refer to; the name when no id was assigned.
    pub fn reference(&self) -> &str {
        self.target_id.as_deref().unwrap_or(&self.name)
    }
}

/// A member of the proposal team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigator {
    pub investigator_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An observation set (array, band, subarray choice).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSet {
    pub observation_set_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A sensitivity-calculator result linking a target to an observation set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_set_ref: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Scientific content of a proposal. Only targets are rewritten by the
/// normalizer; everything else passes through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<Target>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub investigators: Vec<Investigator>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub science_programmes: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub observation_sets: Vec<ObservationSet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<ObservationResult>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProposalInfo {
    /// Investigator ids in team order; duplicates are kept.
    pub fn investigator_ids(&self) -> Vec<String> {
        self.investigators
            .iter()
            .map(|i| i.investigator_id.clone())
            .collect()
    }
}

/// Audit metadata. Creation fields are owned by the archive and are only
/// ever copied from a stored record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_on: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

/// A proposal as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalSubmission {
    #[serde(default)]
    pub prsl_id: Option<String>,
    #[serde(default)]
    pub submitted_by: Option<String>,
    #[serde(default)]
    pub submitted_on: Option<String>,
    /// Ignored; the status is always derived.
    #[serde(default)]
    pub status: Option<String>,
    /// Ignored; re-derived from `proposal_info.investigators`.
    #[serde(default)]
    pub investigators: Vec<String>,
    #[serde(default)]
    pub proposal_info: ProposalInfo,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl ProposalSubmission {
    /// Parse a JSON payload, reporting the path of the first bad field.
    pub fn from_json(value: Value) -> PhtResult<Self> {
        Ok(serde_path_to_error::deserialize(value)?)
    }
}

/// The canonical record produced by the normalizer and stored by the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prsl_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_on: Option<String>,
    pub status: ProposalStatus,
    #[serde(default)]
    pub investigators: Vec<String>,
    #[serde(default)]
    pub proposal_info: ProposalInfo,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Output of the normalizer; identical in shape to a stored proposal.
pub type NormalizedProposal = Proposal;

impl Proposal {
    /// Whether `user_id` created, submitted or is listed on this proposal.
    pub fn involves(&self, user_id: &str) -> bool {
        self.submitted_by.as_deref() == Some(user_id)
            || self.metadata.created_by.as_deref() == Some(user_id)
            || self.investigators.iter().any(|i| i == user_id)
    }
}
