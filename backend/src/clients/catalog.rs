//! Astronomical name-resolution catalogs.
//!
//! Both catalogs report positions in decimal degrees; the clients format them
//! as canonical sexagesimal so the resolver sees one shape regardless of the
//! source.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use qtty::Degrees;
use serde::Deserialize;
use serde_json::Value;

use super::http::{check_status, transport_error, HttpClient};
use crate::error::{ErrorContext, PhtError, PhtResult};
use crate::models::coordinates::{EquatorialCoordinates, SexagesimalPosition};
use crate::services::coordinates::format_equatorial;

pub const DEFAULT_SIMBAD_URL: &str = "https://simbad.cds.unistra.fr/simbad/sim-tap";
pub const DEFAULT_NED_URL: &str = "https://ned.ipac.caltech.edu/srs";

/// NED `ResultCode` for an unambiguous match.
const NED_FOUND: i64 = 3;

/// A service that maps an object name to an ICRS position.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Short name used in logs and error contexts.
    fn name(&self) -> &str;

    /// `Ok(None)` when the catalog answered but does not know the object.
    async fn query_object(&self, object_name: &str) -> PhtResult<Option<SexagesimalPosition>>;
}

fn catalog_context(catalog: &str, object_name: &str) -> ErrorContext {
    ErrorContext::new("query_object")
        .with_entity(catalog)
        .with_entity_id(object_name)
}

// =============================================================================
// SIMBAD
// =============================================================================

/// SIMBAD over its TAP synchronous endpoint.
#[derive(Debug, Clone)]
pub struct SimbadClient {
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct TapResponse {
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

impl SimbadClient {
    pub fn new(base_url: &str, timeout: Duration) -> PhtResult<Self> {
        Ok(Self {
            http: HttpClient::new(base_url, timeout)?,
        })
    }

    /// ADQL selecting the basic position of the object with identifier `name`.
    pub fn adql_for(object_name: &str) -> String {
        format!(
            "SELECT basic.ra, basic.dec FROM basic JOIN ident ON ident.oidref = basic.oid \
             WHERE ident.id = '{}'",
            object_name.replace('\'', "''")
        )
    }
}

/// Extract the first row of a TAP JSON reply.
fn parse_tap_reply(reply: TapResponse, context: &ErrorContext) -> PhtResult<Option<EquatorialCoordinates>> {
    let Some(row) = reply.data.into_iter().next() else {
        return Ok(None);
    };
    match (row.first(), row.get(1)) {
        (Some(Value::Null), _) | (_, Some(Value::Null)) => Ok(None),
        (Some(ra), Some(dec)) => match (ra.as_f64(), dec.as_f64()) {
            (Some(ra), Some(dec)) => Ok(Some(EquatorialCoordinates {
                ra: Degrees::new(ra),
                dec: Degrees::new(dec),
            })),
            _ => Err(PhtError::upstream_with_context(
                "SIMBAD returned non-numeric coordinates",
                context.clone(),
            )),
        },
        _ => Err(PhtError::upstream_with_context(
            "SIMBAD row has fewer than two columns",
            context.clone(),
        )),
    }
}

#[async_trait]
impl CatalogClient for SimbadClient {
    fn name(&self) -> &str {
        "simbad"
    }

    async fn query_object(&self, object_name: &str) -> PhtResult<Option<SexagesimalPosition>> {
        let context = catalog_context(self.name(), object_name);
        let query = Self::adql_for(object_name);
        let response = self
            .http
            .inner()
            .get(self.http.url("/sync"))
            .query(&[
                ("REQUEST", "doQuery"),
                ("LANG", "ADQL"),
                ("FORMAT", "json"),
                ("QUERY", query.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(e, &context))?;
        let reply: TapResponse = check_status(response, &context)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(e, &context))?;

        let position = parse_tap_reply(reply, &context)?;
        debug!("SIMBAD lookup for '{}': {:?}", object_name, position);
        Ok(position.map(format_equatorial))
    }
}

// =============================================================================
// NED
// =============================================================================

/// NED object-lookup service.
#[derive(Debug, Clone)]
pub struct NedClient {
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NedLookupReply {
    result_code: i64,
    #[serde(default)]
    preferred: Option<NedPreferred>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NedPreferred {
    #[serde(default)]
    position: Option<NedPosition>,
}

#[derive(Debug, Deserialize)]
struct NedPosition {
    #[serde(rename = "RA")]
    ra: f64,
    #[serde(rename = "Dec")]
    dec: f64,
}

impl NedClient {
    pub fn new(base_url: &str, timeout: Duration) -> PhtResult<Self> {
        Ok(Self {
            http: HttpClient::new(base_url, timeout)?,
        })
    }
}

fn parse_ned_reply(reply: NedLookupReply, context: &ErrorContext) -> PhtResult<Option<EquatorialCoordinates>> {
    if reply.result_code != NED_FOUND {
        return Ok(None);
    }
    let position = reply
        .preferred
        .and_then(|p| p.position)
        .ok_or_else(|| {
            PhtError::upstream_with_context("NED match carries no position", context.clone())
        })?;
    Ok(Some(EquatorialCoordinates {
        ra: Degrees::new(position.ra),
        dec: Degrees::new(position.dec),
    }))
}

#[async_trait]
impl CatalogClient for NedClient {
    fn name(&self) -> &str {
        "ned"
    }

    async fn query_object(&self, object_name: &str) -> PhtResult<Option<SexagesimalPosition>> {
        let context = catalog_context(self.name(), object_name);
        let payload = serde_json::json!({ "name": { "v": object_name } }).to_string();
        let response = self
            .http
            .inner()
            .post(self.http.url("/ObjectLookup"))
            .form(&[("json", payload.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(e, &context))?;
        let reply: NedLookupReply = check_status(response, &context)
            .await?
            .json()
            .await
            .map_err(|e| transport_error(e, &context))?;

        let position = parse_ned_reply(reply, &context)?;
        debug!("NED lookup for '{}': {:?}", object_name, position);
        Ok(position.map(format_equatorial))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> ErrorContext {
        catalog_context("test", "M31")
    }

    #[test]
    fn test_adql_escapes_quotes() {
        let adql = SimbadClient::adql_for("Barnard's Star");
        assert!(adql.ends_with("WHERE ident.id = 'Barnard''s Star'"));
    }

    #[test]
    fn test_tap_reply_first_row() {
        let reply: TapResponse = serde_json::from_value(json!({
            "metadata": [{ "name": "ra" }, { "name": "dec" }],
            "data": [[10.684708, 41.26875], [0.0, 0.0]]
        }))
        .unwrap();
        let eq = parse_tap_reply(reply, &ctx()).unwrap().unwrap();
        let text = format_equatorial(eq);
        assert_eq!(text.ra, "00:42:44.330");
        assert_eq!(text.dec, "+41:16:07.500");
    }

    #[test]
    fn test_tap_reply_empty_is_none() {
        let reply: TapResponse = serde_json::from_value(json!({ "data": [] })).unwrap();
        assert!(parse_tap_reply(reply, &ctx()).unwrap().is_none());

        let reply: TapResponse = serde_json::from_value(json!({ "data": [[null, null]] })).unwrap();
        assert!(parse_tap_reply(reply, &ctx()).unwrap().is_none());
    }

    #[test]
    fn test_tap_reply_bad_shape_is_upstream() {
        let reply: TapResponse = serde_json::from_value(json!({ "data": [["x", "y"]] })).unwrap();
        let err = parse_tap_reply(reply, &ctx()).unwrap_err();
        assert!(matches!(err, PhtError::UpstreamError { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_ned_reply_found() {
        let reply: NedLookupReply = serde_json::from_value(json!({
            "ResultCode": 3,
            "Preferred": { "Name": "MESSIER 031", "Position": { "RA": 10.6847, "Dec": 41.26904 } }
        }))
        .unwrap();
        let eq = parse_ned_reply(reply, &ctx()).unwrap().unwrap();
        assert_eq!(eq.ra.value(), 10.6847);
    }

    #[test]
    fn test_ned_reply_unknown_is_none() {
        let reply: NedLookupReply =
            serde_json::from_value(json!({ "ResultCode": 0, "Preferred": {} })).unwrap();
        assert!(parse_ned_reply(reply, &ctx()).unwrap().is_none());
    }

    #[test]
    fn test_ned_found_without_position_is_upstream() {
        let reply: NedLookupReply =
            serde_json::from_value(json!({ "ResultCode": 3, "Preferred": {} })).unwrap();
        assert!(matches!(
            parse_ned_reply(reply, &ctx()),
            Err(PhtError::UpstreamError { .. })
        ));
    }
}
