//! Integration tests across the service layer: name resolution feeding the
//! proposal workflow, persisted through the local repository.

mod support;

use std::sync::Arc;

use serde_json::json;

use pht_services::db::repositories::LocalRepository;
use pht_services::db::services::{
    create_proposal, get_proposal, health_check, list_proposals_for_user, update_proposal,
};
use pht_services::error::PhtError;
use pht_services::models::coordinates::ReferenceFrame;
use pht_services::models::proposal::{AngleValue, ProposalStatus};
use pht_services::services::normalizer::ProposalNormalizer;
use pht_services::services::resolver::{CoordinateResolver, ResolvedPosition};
use pht_services::services::validation::validate_proposal;
use support::{fixed_clock, StubCatalog};

fn setup() -> (LocalRepository, ProposalNormalizer, CoordinateResolver) {
    let clock = fixed_clock();
    let resolver = CoordinateResolver::new(
        Arc::new(StubCatalog::new("SIMBAD").with("M1", "05 34 31.94", "+22 00 52.0")),
        Arc::new(StubCatalog::new("NED")),
    );
    (
        LocalRepository::with_clock("default", clock.clone()),
        ProposalNormalizer::new(clock),
        resolver,
    )
}

#[tokio::test]
async fn test_resolved_target_round_trips_through_the_archive() {
    let (repo, normalizer, resolver) = setup();
    assert!(health_check(&repo).await.unwrap());

    let position = match resolver
        .resolve_in_frame("M1", ReferenceFrame::Equatorial)
        .await
        .unwrap()
    {
        ResolvedPosition::Equatorial(position) => position,
        other => panic!("unexpected frame: {:?}", other),
    };
    assert_eq!(position.ra, "05:34:31.940");
    assert_eq!(position.dec, "+22:00:52.000");

    let draft = json!({
        "prsl_id": "new",
        "submitted_by": "alice",
        "proposal_info": {
            "title": "Crab",
            "targets": [{
                "target_id": "m1",
                "name": "M1",
                "right_ascension": position.ra,
                "declination": position.dec
            }],
            "observation_sets": [{ "observation_set_id": "mid-1" }],
            "results": [{ "target_ref": "m1", "observation_set_ref": "mid-1" }],
            "investigators": [{ "investigator_id": "alice" }]
        }
    });
    let created = create_proposal(&repo, &normalizer, draft.clone()).await.unwrap();
    let prsl_id = created.prsl_id.clone().unwrap();

    // Creation keeps the sexagesimal text; only updates convert.
    assert_eq!(
        created.proposal_info.targets[0].right_ascension,
        AngleValue::Text("05:34:31.940".into())
    );
    assert!(validate_proposal(&created.proposal_info).result);

    let mut submit = draft;
    submit["prsl_id"] = json!(prsl_id);
    submit["submitted_on"] = json!("2024-01-18T09:00:00Z");
    let submitted = update_proposal(&repo, &normalizer, &prsl_id, submit)
        .await
        .unwrap();
    assert_eq!(submitted.status, ProposalStatus::Submitted);
    assert_eq!(
        submitted.proposal_info.targets[0].right_ascension,
        AngleValue::Degrees(83.633)
    );

    let loaded = get_proposal(&repo, &prsl_id).await.unwrap();
    assert_eq!(loaded, submitted);
    assert_eq!(loaded.metadata.version, Some(2));
    assert_eq!(list_proposals_for_user(&repo, "alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_object_is_not_found() {
    let (_, _, resolver) = setup();
    let err = resolver
        .resolve_in_frame("Vulcan", ReferenceFrame::Galactic)
        .await
        .unwrap_err();
    assert!(matches!(err, PhtError::NotFound { .. }));
}

#[tokio::test]
async fn test_unhealthy_archive_rejects_writes() {
    let (repo, normalizer, _) = setup();
    repo.set_healthy(false);
    assert!(!health_check(&repo).await.unwrap_or(false));

    let err = create_proposal(&repo, &normalizer, json!({ "submitted_by": "alice" }))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(repo.proposal_count(), 0);
}
