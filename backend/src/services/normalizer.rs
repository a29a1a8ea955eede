//! Proposal normalization.
//!
//! Turns a client submission into the canonical record handed to the
//! archive. Both operations are pure apart from a single read of the
//! injected [`Clock`].

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use log::debug;

use super::clock::{Clock, SystemClock};
use super::coordinates::round_to;
use crate::error::{ErrorContext, PhtError, PhtResult};
use crate::models::coordinates::{check_coordinate_range, parse_angle, parse_degrees, AngleUnit};
use crate::models::proposal::{
    AngleValue, Metadata, NormalizedProposal, ProposalStatus, ProposalSubmission, Target,
    DEFAULT_USER, NEW_PROPOSAL_ID,
};

/// Unit written into targets after normalization.
pub const DEGREES_UNIT: &str = "deg";

/// Naive layouts accepted for `submitted_on`, interpreted as UTC.
const SUBMITTED_ON_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Normalizes submissions using an injected clock.
#[derive(Clone)]
pub struct ProposalNormalizer {
    clock: Arc<dyn Clock>,
}

impl Default for ProposalNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ProposalNormalizer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Prepare a brand new proposal.
    ///
    /// The status is always `draft` and the metadata starts at version 1.
    /// No identifier is assigned; the archive does that on `add`.
    pub fn normalize_for_create(&self, raw: ProposalSubmission) -> NormalizedProposal {
        let now = self.clock.now();
        let creator = raw
            .submitted_by
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_USER.to_string());

        NormalizedProposal {
            prsl_id: None,
            submitted_by: raw.submitted_by,
            submitted_on: None,
            status: ProposalStatus::Draft,
            investigators: raw.proposal_info.investigator_ids(),
            proposal_info: raw.proposal_info,
            metadata: Metadata {
                created_by: Some(creator.clone()),
                created_on: Some(now),
                last_modified_by: Some(creator),
                last_modified_on: Some(now),
                version: Some(1),
            },
        }
    }

    /// Prepare an edit of the stored proposal `existing_id`.
    ///
    /// `raw.metadata` must carry the stored record's metadata; its creation
    /// fields and version are copied through untouched.
    pub fn normalize_for_update(
        &self,
        raw: ProposalSubmission,
        existing_id: &str,
    ) -> PhtResult<NormalizedProposal> {
        let context = || {
            ErrorContext::new("normalize_for_update")
                .with_entity("proposal")
                .with_entity_id(existing_id)
        };

        let prsl_id = raw.prsl_id.as_deref().ok_or_else(|| {
            PhtError::validation_with_context("Missing required field: prsl_id", context())
        })?;
        let submitted_by = raw.submitted_by.clone().ok_or_else(|| {
            PhtError::validation_with_context("Missing required field: submitted_by", context())
        })?;

        let resolved_id = resolve_identifier(prsl_id, existing_id)?;
        let submitted_on = canonical_submitted_on(raw.submitted_on.as_deref());
        let status = if submitted_on.is_some() {
            ProposalStatus::Submitted
        } else {
            ProposalStatus::Draft
        };

        let mut proposal_info = raw.proposal_info;
        for (index, target) in proposal_info.targets.iter_mut().enumerate() {
            normalize_target(target).map_err(|e| {
                e.with_operation(format!("normalize_for_update.targets[{}]", index))
            })?;
        }

        let stored = raw.metadata.unwrap_or_default();
        let metadata = Metadata {
            created_by: stored.created_by,
            created_on: stored.created_on,
            last_modified_by: Some(submitted_by.clone()),
            last_modified_on: Some(self.clock.now()),
            version: stored.version,
        };

        debug!(
            "Normalized proposal {} ({} targets, status {})",
            resolved_id,
            proposal_info.targets.len(),
            status.as_str()
        );

        Ok(NormalizedProposal {
            prsl_id: Some(resolved_id),
            submitted_by: Some(submitted_by),
            submitted_on,
            status,
            investigators: proposal_info.investigator_ids(),
            proposal_info,
            metadata,
        })
    }
}

/// The `"new"` sentinel resolves to the stored id; anything else must match it.
fn resolve_identifier(prsl_id: &str, existing_id: &str) -> PhtResult<String> {
    if prsl_id == NEW_PROPOSAL_ID || prsl_id == existing_id {
        return Ok(existing_id.to_string());
    }
    Err(PhtError::validation_with_context(
        format!(
            "Proposal id mismatch: path has '{}' but body has '{}'",
            existing_id, prsl_id
        ),
        ErrorContext::new("normalize_for_update")
            .with_entity("proposal")
            .with_entity_id(existing_id),
    ))
}

/// Blank means not submitted. Recognised timestamps (RFC 3339, or
/// `YYYY-MM-DD HH:MM:SS` read as UTC) are rewritten as RFC 3339; any other
/// text is kept as sent.
fn canonical_submitted_on(value: Option<&str>) -> Option<String> {
    let text = value.map(str::trim).filter(|t| !t.is_empty())?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::AutoSi, true));
    }
    for format in SUBMITTED_ON_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc().to_rfc3339_opts(SecondsFormat::AutoSi, true));
        }
    }

    debug!("Keeping unrecognised submitted_on '{}' verbatim", text);
    Some(text.to_string())
}

/// Rewrite a target's RA/Dec as decimal degrees rounded to 3 places.
pub fn normalize_target(target: &mut Target) -> PhtResult<()> {
    let ra = angle_in_degrees(
        &target.right_ascension,
        target.right_ascension_unit.as_deref(),
        AngleUnit::HourAngle,
    )?;
    let dec = angle_in_degrees(
        &target.declination,
        target.declination_unit.as_deref(),
        AngleUnit::Degree,
    )?;

    target.right_ascension = AngleValue::Degrees(round_to(ra, 3));
    target.declination = AngleValue::Degrees(round_to(dec, 3));
    target.right_ascension_unit = Some(DEGREES_UNIT.to_string());
    target.declination_unit = Some(DEGREES_UNIT.to_string());
    Ok(())
}

/// Values tagged `deg` are taken as degrees; every other value is read in the
/// field's natural unit. The result must lie in the field's range.
fn angle_in_degrees(value: &AngleValue, unit: Option<&str>, natural: AngleUnit) -> PhtResult<f64> {
    let degrees = match value {
        AngleValue::Degrees(v) if unit == Some(DEGREES_UNIT) => {
            check_coordinate_range(*v, natural, &v.to_string())?
        }
        AngleValue::Degrees(v) => {
            check_coordinate_range(v * natural.degrees_per_unit(), natural, &v.to_string())?
        }
        AngleValue::Text(text) if unit == Some(DEGREES_UNIT) => parse_degrees(text, natural)?,
        AngleValue::Text(text) => parse_angle(text, natural)?,
    };
    Ok(degrees.value())
}

#[cfg(test)]
#[path = "normalizer_tests.rs"]
mod normalizer_tests;
