//! Observation Data Archive repository over its REST API.
//!
//! The ODA commits every request itself, so `add` writes straight through
//! (`POST /prsls` for new proposals, `PUT /prsls/{id}` for edits) and
//! `commit` has nothing left to flush.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};

use crate::clients::http::{read_json, transport_error, HttpClient};
use crate::db::repository::{ProposalFilter, ProposalRepository};
use crate::error::{ErrorContext, PhtResult};
use crate::models::proposal::Proposal;

#[derive(Debug, Clone)]
pub struct OdaRepository {
    http: HttpClient,
}

impl OdaRepository {
    /// `base_url` is the ODA API root, e.g. `http://oda/ska-db-oda/oda/api/v1`.
    pub fn new(base_url: &str, timeout: Duration) -> PhtResult<Self> {
        Ok(Self {
            http: HttpClient::new(base_url, timeout)?,
        })
    }

    fn context(operation: &str) -> ErrorContext {
        ErrorContext::new(operation).with_entity("proposal")
    }
}

#[async_trait]
impl ProposalRepository for OdaRepository {
    async fn health_check(&self) -> PhtResult<bool> {
        match self.http.inner().get(self.http.url("/prsls")).send().await {
            Ok(response) => Ok(!response.status().is_server_error()),
            Err(e) => {
                warn!("ODA health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn get(&self, prsl_id: &str) -> PhtResult<Proposal> {
        self.http
            .get_json(
                self.http.segment_url(&["prsls", prsl_id])?,
                Self::context("get").with_entity_id(prsl_id),
            )
            .await
    }

    async fn query(&self, filter: &ProposalFilter) -> PhtResult<Vec<Proposal>> {
        let context = Self::context("query");
        let mut request = self.http.inner().get(self.http.url("/prsls"));
        if let Some(user) = &filter.user_id {
            request = request.query(&[("user_id", user.as_str())]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, &context))?;
        let proposals: Vec<Proposal> = read_json(response, context).await?;
        // The archive may match more loosely than we do.
        Ok(proposals.into_iter().filter(|p| filter.matches(p)).collect())
    }

    async fn add(&self, proposal: Proposal) -> PhtResult<Proposal> {
        match proposal.prsl_id.clone() {
            None => {
                let stored: Proposal = self
                    .http
                    .post_json(self.http.url("/prsls"), &proposal, Self::context("add"))
                    .await?;
                debug!("ODA created proposal {:?}", stored.prsl_id);
                Ok(stored)
            }
            Some(prsl_id) => {
                let stored: Proposal = self
                    .http
                    .put_json(
                        self.http.segment_url(&["prsls", &prsl_id])?,
                        &proposal,
                        Self::context("add").with_entity_id(&prsl_id),
                    )
                    .await?;
                debug!("ODA updated proposal {}", prsl_id);
                Ok(stored)
            }
        }
    }

    async fn commit(&self) -> PhtResult<()> {
        Ok(())
    }
}
