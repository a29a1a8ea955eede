//! Repository trait for proposal persistence.
//!
//! The archive is a unit of work: `add` stages a proposal and returns it with
//! the identifier and metadata the archive assigned, `commit` makes every
//! staged proposal visible to `get` and `query`.
//!
//! ```ignore
//! let stored = repo.add(normalized).await?;
//! repo.commit().await?;
//! let again = repo.get(stored.prsl_id.as_deref().unwrap()).await?;
//! ```

use async_trait::async_trait;

use crate::error::PhtResult;
use crate::models::proposal::Proposal;

/// Selects proposals in [`ProposalRepository::query`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalFilter {
    /// Proposals the user submitted, created or is an investigator on.
    pub user_id: Option<String>,
}

impl ProposalFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn matches(&self, proposal: &Proposal) -> bool {
        match &self.user_id {
            Some(user) => proposal.involves(user),
            None => true,
        }
    }
}

#[async_trait]
pub trait ProposalRepository: Send + Sync {
    /// Check that the archive is reachable.
    async fn health_check(&self) -> PhtResult<bool>;

    /// Retrieve a committed proposal.
    ///
    /// # Returns
    /// * `Err(PhtError::NotFound)` if no proposal has this id
    async fn get(&self, prsl_id: &str) -> PhtResult<Proposal>;

    /// Committed proposals matching `filter`, ordered by id.
    async fn query(&self, filter: &ProposalFilter) -> PhtResult<Vec<Proposal>>;

    /// Stage a proposal.
    ///
    /// A proposal without an id is new: the archive assigns
    /// `prsl-<generator>-<YYYYMMDD>-<NNNNN>` and the creation metadata. A
    /// proposal with an id replaces the stored one and its version is
    /// incremented.
    ///
    /// # Returns
    /// The proposal as it will be stored.
    async fn add(&self, proposal: Proposal) -> PhtResult<Proposal>;

    /// Make all staged proposals durable.
    async fn commit(&self) -> PhtResult<()>;
}
