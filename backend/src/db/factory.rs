//! Repository factory for dependency injection.
//!
//! Creates a repository instance from runtime configuration.

use std::str::FromStr;
use std::sync::Arc;

use log::info;

use super::repositories::LocalRepository;
#[cfg(feature = "oda-repo")]
use super::repositories::OdaRepository;
use super::repository::ProposalRepository;
use crate::config::RepositorySettings;
use crate::error::{PhtError, PhtResult};
use crate::services::clock::SystemClock;

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Observation Data Archive over REST
    Oda,
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("oda", "rest", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "oda" | "rest" => Ok(Self::Oda),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

/// Repository factory for creating repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// # Returns
    /// * `Err(PhtError::ConfigurationError)` if the ODA is selected without a
    ///   URL or without the `oda-repo` feature
    pub fn create(
        repo_type: RepositoryType,
        settings: &RepositorySettings,
    ) -> PhtResult<Arc<dyn ProposalRepository>> {
        match repo_type {
            RepositoryType::Oda => {
                #[cfg(feature = "oda-repo")]
                {
                    let url = settings.oda_url.as_deref().ok_or_else(|| {
                        PhtError::configuration("ODA repository requires 'repository.oda_url'")
                    })?;
                    info!("Using ODA repository at {}", url);
                    let oda = OdaRepository::new(url, settings.timeout())?;
                    Ok(Arc::new(oda) as Arc<dyn ProposalRepository>)
                }
                #[cfg(not(feature = "oda-repo"))]
                {
                    let _ = settings;
                    Err(PhtError::configuration(
                        "ODA repository feature not enabled",
                    ))
                }
            }
            RepositoryType::Local => {
                info!("Using in-memory repository");
                Ok(Self::create_local(&settings.generator))
            }
        }
    }

    /// Create an in-memory local repository.
    pub fn create_local(generator: &str) -> Arc<dyn ProposalRepository> {
        Arc::new(LocalRepository::with_clock(generator, Arc::new(SystemClock)))
    }

    /// Create a repository from the `[repository]` settings.
    pub fn from_settings(settings: &RepositorySettings) -> PhtResult<Arc<dyn ProposalRepository>> {
        let repo_type = RepositoryType::from_str(&settings.repo_type).map_err(PhtError::configuration)?;
        Self::create(repo_type, settings)
    }
}
