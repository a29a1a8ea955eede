//! Observatory Static Data (OSD) lookups.

use std::time::Duration;

use log::debug;
use serde_json::Value;

use super::http::{check_status, transport_error, HttpClient};
use crate::error::{ErrorContext, PhtError, PhtResult};

/// Read-only client for the OSD API.
#[derive(Debug, Clone)]
pub struct OsdClient {
    http: HttpClient,
}

impl OsdClient {
    /// `base_url` points at the `/osd` resource, e.g.
    /// `http://host/ska-ost-osd/osd/api/v1/osd`.
    pub fn new(base_url: &str, timeout: Duration) -> PhtResult<Self> {
        Ok(Self {
            http: HttpClient::new(base_url, timeout)?,
        })
    }

    /// The OSD document for one proposal cycle.
    ///
    /// An unknown cycle answers `NotFound`; every other failure is upstream.
    pub async fn get_osd(&self, cycle_id: u32) -> PhtResult<Value> {
        let context = ErrorContext::new("get_osd")
            .with_entity("osd")
            .with_entity_id(cycle_id);
        let response = self
            .http
            .inner()
            .get(self.http.base_url())
            .query(&[("cycle_id", cycle_id)])
            .send()
            .await
            .map_err(|e| transport_error(e, &context))?;
        let document: Value = check_status(response, &context)
            .await
            .map_err(|e| match e {
                PhtError::NotFound { context, .. } => PhtError::not_found_with_context(
                    format!("No OSD data for cycle {}", cycle_id),
                    context,
                ),
                other => other,
            })?
            .json()
            .await
            .map_err(|e| transport_error(e, &context))?;
        debug!("Fetched OSD for cycle {}", cycle_id);
        Ok(document)
    }
}
