//! Object-name resolution across an ordered pair of catalogs.

use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::coordinates::{convert_equatorial_to_galactic, round_to_milliarcsecond_precision};
use crate::clients::catalog::CatalogClient;
use crate::error::{ErrorContext, PhtError, PhtResult};
use crate::models::coordinates::{GalacticCoordinates, ReferenceFrame, SexagesimalPosition};

/// A resolved position expressed in the requested frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolvedPosition {
    Equatorial(SexagesimalPosition),
    Galactic(GalacticCoordinates),
}

/// Queries the primary catalog, then the secondary on a miss.
#[derive(Clone)]
pub struct CoordinateResolver {
    primary: Arc<dyn CatalogClient>,
    secondary: Arc<dyn CatalogClient>,
}

impl CoordinateResolver {
    pub fn new(primary: Arc<dyn CatalogClient>, secondary: Arc<dyn CatalogClient>) -> Self {
        Self { primary, secondary }
    }

    /// Position of `object_name` as canonical sexagesimal.
    ///
    /// A failure of the primary catalog is returned as is; the secondary is
    /// only consulted when the primary answered without a match.
    pub async fn resolve(&self, object_name: &str) -> PhtResult<SexagesimalPosition> {
        let name = object_name.trim();
        if name.is_empty() {
            return Err(PhtError::validation_with_context(
                "Object name must not be empty",
                ErrorContext::new("resolve").with_entity("coordinate"),
            ));
        }

        for catalog in [&self.primary, &self.secondary] {
            match catalog.query_object(name).await.map_err(as_upstream)? {
                Some(position) => {
                    info!("Resolved '{}' via {}", name, catalog.name());
                    return Ok(position);
                }
                None => debug!("'{}' not known to {}", name, catalog.name()),
            }
        }

        Err(PhtError::not_found_with_context(
            format!(
                "Object '{}' not found in {} or {}",
                name,
                self.primary.name(),
                self.secondary.name()
            ),
            ErrorContext::new("resolve")
                .with_entity("coordinate")
                .with_entity_id(name),
        ))
    }

    /// Resolve and answer in `frame`.
    ///
    /// Equatorial answers are rounded sexagesimal, galactic answers are
    /// decimal degrees. Horizontal output needs a site and an instant, so it
    /// is rejected here.
    pub async fn resolve_in_frame(
        &self,
        object_name: &str,
        frame: ReferenceFrame,
    ) -> PhtResult<ResolvedPosition> {
        let position = match frame {
            ReferenceFrame::Equatorial | ReferenceFrame::Galactic => {
                self.resolve(object_name).await?
            }
            ReferenceFrame::Horizontal => {
                return Err(PhtError::validation_with_context(
                    "Reference frame 'horizontal' is not supported for name resolution",
                    ErrorContext::new("resolve_in_frame").with_entity_id(object_name),
                ))
            }
        };

        match frame {
            ReferenceFrame::Galactic => Ok(ResolvedPosition::Galactic(
                convert_equatorial_to_galactic(&position.ra, &position.dec)?,
            )),
            _ => Ok(ResolvedPosition::Equatorial(
                round_to_milliarcsecond_precision(&position.ra, &position.dec)?,
            )),
        }
    }
}

/// A catalog answering 404 or with a bad shape is still an upstream fault.
fn as_upstream(err: PhtError) -> PhtError {
    match err {
        PhtError::UpstreamError { .. } => err,
        other => {
            let context = other.context().clone();
            PhtError::upstream_with_context(other.message().to_string(), context)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Scripted catalog that records every lookup.
    struct ScriptedCatalog {
        name: &'static str,
        answer: fn() -> PhtResult<Option<SexagesimalPosition>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl CatalogClient for ScriptedCatalog {
        fn name(&self) -> &str {
            self.name
        }

        async fn query_object(&self, object_name: &str) -> PhtResult<Option<SexagesimalPosition>> {
            self.calls.lock().push(format!("{}:{}", self.name, object_name));
            (self.answer)()
        }
    }

    fn m31() -> PhtResult<Option<SexagesimalPosition>> {
        Ok(Some(SexagesimalPosition::new("00:42:44.330", "+41:16:07.500")))
    }

    fn crab() -> PhtResult<Option<SexagesimalPosition>> {
        Ok(Some(SexagesimalPosition::new("05:34:31.940", "+22:00:52.200")))
    }

    fn miss() -> PhtResult<Option<SexagesimalPosition>> {
        Ok(None)
    }

    fn down() -> PhtResult<Option<SexagesimalPosition>> {
        Err(PhtError::upstream("connection refused"))
    }

    fn gone() -> PhtResult<Option<SexagesimalPosition>> {
        Err(PhtError::not_found("endpoint moved"))
    }

    fn resolver(
        primary: fn() -> PhtResult<Option<SexagesimalPosition>>,
        secondary: fn() -> PhtResult<Option<SexagesimalPosition>>,
    ) -> (CoordinateResolver, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let p = ScriptedCatalog {
            name: "simbad",
            answer: primary,
            calls: calls.clone(),
        };
        let s = ScriptedCatalog {
            name: "ned",
            answer: secondary,
            calls: calls.clone(),
        };
        (CoordinateResolver::new(Arc::new(p), Arc::new(s)), calls)
    }

    #[tokio::test]
    async fn test_primary_hit_skips_secondary() {
        let (r, calls) = resolver(m31, crab);
        let pos = r.resolve("M31").await.unwrap();
        assert_eq!(pos.ra, "00:42:44.330");
        assert_eq!(*calls.lock(), vec!["simbad:M31"]);
    }

    #[tokio::test]
    async fn test_primary_miss_falls_back() {
        let (r, calls) = resolver(miss, crab);
        let pos = r.resolve("M1").await.unwrap();
        assert_eq!(pos.dec, "+22:00:52.200");
        assert_eq!(*calls.lock(), vec!["simbad:M1", "ned:M1"]);
    }

    #[tokio::test]
    async fn test_both_miss_is_not_found() {
        let (r, _) = resolver(miss, miss);
        let err = r.resolve("nothing").await.unwrap_err();
        assert!(matches!(err, PhtError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_primary_failure_is_not_masked() {
        let (r, calls) = resolver(down, crab);
        let err = r.resolve("M1").await.unwrap_err();
        assert!(matches!(err, PhtError::UpstreamError { .. }));
        assert!(err.is_retryable());
        assert_eq!(calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_catalog_404_is_upstream() {
        let (r, _) = resolver(gone, crab);
        let err = r.resolve("M1").await.unwrap_err();
        assert!(matches!(err, PhtError::UpstreamError { .. }));
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected() {
        let (r, calls) = resolver(m31, m31);
        assert!(matches!(
            r.resolve("  ").await,
            Err(PhtError::ValidationError { .. })
        ));
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_in_galactic_frame() {
        let (r, _) = resolver(m31, miss);
        match r.resolve_in_frame("M31", ReferenceFrame::Galactic).await.unwrap() {
            ResolvedPosition::Galactic(gal) => {
                assert!((gal.longitude.value() - 121.1744).abs() < 0.01);
                assert!((gal.latitude.value() - -21.5729).abs() < 0.01);
            }
            other => panic!("expected galactic, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_in_horizontal_frame_is_rejected() {
        let (r, calls) = resolver(m31, miss);
        let err = r
            .resolve_in_frame("M31", ReferenceFrame::Horizontal)
            .await
            .unwrap_err();
        assert!(matches!(err, PhtError::ValidationError { .. }));
        assert!(calls.lock().is_empty());
    }
}
