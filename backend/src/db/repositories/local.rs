//! In-memory local repository implementation.
//!
//! Suitable for unit testing and local development. Proposals live in a
//! `BTreeMap` keyed by id; staged writes are kept apart until `commit`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::RwLock;

use crate::db::repository::{ProposalFilter, ProposalRepository};
use crate::error::{ErrorContext, PhtError, PhtResult};
use crate::models::proposal::{Proposal, DEFAULT_USER};
use crate::services::clock::{Clock, SystemClock};

/// Generator name embedded in ids minted by a default repository.
pub const DEFAULT_GENERATOR: &str = "default";

/// In-memory local repository.
///
/// # Example
/// ```
/// use pht_services::db::repositories::LocalRepository;
/// use pht_services::db::repository::ProposalRepository;
///
/// # async fn demo() -> pht_services::error::PhtResult<()> {
/// let repo = LocalRepository::new();
/// assert!(repo.health_check().await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    generator: String,
    clock: Arc<dyn Clock>,
}

#[derive(Default)]
struct LocalData {
    committed: BTreeMap<String, Proposal>,
    staged: BTreeMap<String, Proposal>,
    next_sequence: u32,
    is_healthy: bool,
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::with_clock(DEFAULT_GENERATOR, Arc::new(SystemClock))
    }

    /// Create a repository with an explicit id generator name and clock.
    pub fn with_clock(generator: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData {
                next_sequence: 1,
                is_healthy: true,
                ..Default::default()
            })),
            generator: generator.into(),
            clock,
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Number of committed proposals.
    pub fn proposal_count(&self) -> usize {
        self.data.read().committed.len()
    }

    /// Number of proposals waiting for `commit`.
    pub fn staged_count(&self) -> usize {
        self.data.read().staged.len()
    }

    /// Drop staged writes without applying them.
    pub fn rollback(&self) {
        self.data.write().staged.clear();
    }

    fn check_health(&self, operation: &str) -> PhtResult<()> {
        if self.data.read().is_healthy {
            Ok(())
        } else {
            Err(PhtError::upstream_with_context(
                "Repository is not healthy",
                ErrorContext::new(operation).with_entity("proposal"),
            ))
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProposalRepository for LocalRepository {
    async fn health_check(&self) -> PhtResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn get(&self, prsl_id: &str) -> PhtResult<Proposal> {
        self.check_health("get")?;
        self.data
            .read()
            .committed
            .get(prsl_id)
            .cloned()
            .ok_or_else(|| {
                PhtError::not_found_with_context(
                    format!("Proposal {} not found", prsl_id),
                    ErrorContext::new("get")
                        .with_entity("proposal")
                        .with_entity_id(prsl_id),
                )
            })
    }

    async fn query(&self, filter: &ProposalFilter) -> PhtResult<Vec<Proposal>> {
        self.check_health("query")?;
        Ok(self
            .data
            .read()
            .committed
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn add(&self, mut proposal: Proposal) -> PhtResult<Proposal> {
        self.check_health("add")?;
        let now = self.clock.now();
        let mut data = self.data.write();

        match proposal.prsl_id.clone() {
            None => {
                let prsl_id = format!(
                    "prsl-{}-{}-{:05}",
                    self.generator,
                    now.format("%Y%m%d"),
                    data.next_sequence
                );
                data.next_sequence += 1;

                let metadata = &mut proposal.metadata;
                let creator = metadata
                    .created_by
                    .clone()
                    .or_else(|| proposal.submitted_by.clone())
                    .unwrap_or_else(|| DEFAULT_USER.to_string());
                metadata.created_by = Some(creator.clone());
                metadata.created_on = Some(metadata.created_on.unwrap_or(now));
                metadata.last_modified_by = Some(metadata.last_modified_by.clone().unwrap_or(creator));
                metadata.last_modified_on = Some(metadata.last_modified_on.unwrap_or(now));
                metadata.version = Some(1);
                proposal.prsl_id = Some(prsl_id.clone());

                info!("Staged new proposal {}", prsl_id);
                data.staged.insert(prsl_id, proposal.clone());
            }
            Some(prsl_id) => {
                let stored = data
                    .staged
                    .get(&prsl_id)
                    .or_else(|| data.committed.get(&prsl_id))
                    .ok_or_else(|| {
                        PhtError::not_found_with_context(
                            format!("Proposal {} not found", prsl_id),
                            ErrorContext::new("add")
                                .with_entity("proposal")
                                .with_entity_id(&prsl_id),
                        )
                    })?;

                let previous = stored.metadata.clone();
                let metadata = &mut proposal.metadata;
                metadata.created_by = previous.created_by;
                metadata.created_on = previous.created_on;
                metadata.version = Some(previous.version.unwrap_or(1) + 1);
                if metadata.last_modified_on.is_none() {
                    metadata.last_modified_on = Some(now);
                }

                debug!(
                    "Staged edit of proposal {} (version {:?})",
                    prsl_id, proposal.metadata.version
                );
                data.staged.insert(prsl_id, proposal.clone());
            }
        }

        Ok(proposal)
    }

    async fn commit(&self) -> PhtResult<()> {
        self.check_health("commit")?;
        let mut data = self.data.write();
        let staged = std::mem::take(&mut data.staged);
        let count = staged.len();
        data.committed.extend(staged);
        debug!("Committed {} proposal(s)", count);
        Ok(())
    }
}
