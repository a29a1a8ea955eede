//! Submission readiness checks.
//!
//! A proposal is ready when it has observation sets, every target has a
//! sensitivity-calculator result, and every observation set appears in at
//! least one result. All problems are reported, not just the first.

use serde::{Deserialize, Serialize};

use crate::models::proposal::ProposalInfo;

/// Outcome of [`validate_proposal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub result: bool,
    pub validation_errors: Vec<String>,
}

pub fn validate_proposal(info: &ProposalInfo) -> ValidationReport {
    let mut errors = Vec::new();

    if info.observation_sets.is_empty() {
        errors.push("Proposal has no observation sets".to_string());
    }

    for target in &info.targets {
        let reference = target.reference();
        let covered = info
            .results
            .iter()
            .any(|r| r.target_ref.as_deref() == Some(reference));
        if !covered {
            errors.push(format!("Target {} has no valid senscalc result", reference));
        }
    }

    for set in &info.observation_sets {
        let covered = info
            .results
            .iter()
            .any(|r| r.observation_set_ref.as_deref() == Some(set.observation_set_id.as_str()));
        if !covered {
            errors.push(format!(
                "Observation Set {} has no Targets in Results",
                set.observation_set_id
            ));
        }
    }

    ValidationReport {
        result: errors.is_empty(),
        validation_errors: errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(value: serde_json::Value) -> ProposalInfo {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_complete_proposal_passes() {
        let report = validate_proposal(&info(json!({
            "targets": [{ "target_id": "m31", "name": "M31", "right_ascension": 10.0, "declination": 41.0 }],
            "observation_sets": [{ "observation_set_id": "mid-001" }],
            "results": [{ "target_ref": "m31", "observation_set_ref": "mid-001" }]
        })));
        assert!(report.result);
        assert!(report.validation_errors.is_empty());
    }

    #[test]
    fn test_empty_proposal_fails() {
        let report = validate_proposal(&ProposalInfo::default());
        assert!(!report.result);
        assert_eq!(report.validation_errors, vec!["Proposal has no observation sets"]);
    }

    #[test]
    fn test_every_problem_is_reported() {
        let report = validate_proposal(&info(json!({
            "targets": [
                { "target_id": "m31", "name": "M31", "right_ascension": 10.0, "declination": 41.0 },
                { "name": "Crab", "right_ascension": 83.6, "declination": 22.0 }
            ],
            "observation_sets": [{ "observation_set_id": "mid-001" }, { "observation_set_id": "low-001" }],
            "results": [{ "target_ref": "m31", "observation_set_ref": "mid-001" }]
        })));
        assert!(!report.result);
        assert_eq!(
            report.validation_errors,
            vec![
                "Target Crab has no valid senscalc result",
                "Observation Set low-001 has no Targets in Results",
            ]
        );
    }
}
