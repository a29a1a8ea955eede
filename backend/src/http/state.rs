//! Application state for the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use crate::clients::catalog::{NedClient, SimbadClient};
use crate::clients::object_store::{ObjectStore, S3Presigner};
use crate::clients::osd::OsdClient;
use crate::config::AppConfig;
use crate::db::factory::RepositoryFactory;
use crate::db::repository::ProposalRepository;
use crate::error::{PhtError, PhtResult};
use crate::services::clock::{Clock, SystemClock};
use crate::services::normalizer::ProposalNormalizer;
use crate::services::resolver::CoordinateResolver;

/// Default lifetime of a pre-signed URL.
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(60);

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Proposal archive
    pub repository: Arc<dyn ProposalRepository>,
    pub normalizer: ProposalNormalizer,
    pub resolver: CoordinateResolver,
    /// Unset when no bucket is configured
    pub object_store: Option<Arc<dyn ObjectStore>>,
    pub url_expiry: Duration,
    /// Unset when no OSD is configured
    pub osd: Option<Arc<OsdClient>>,
}

impl AppState {
    /// Create a state with the given archive and resolver; attachments and
    /// OSD are left unconfigured.
    pub fn new(repository: Arc<dyn ProposalRepository>, resolver: CoordinateResolver) -> Self {
        Self {
            repository,
            normalizer: ProposalNormalizer::default(),
            resolver,
            object_store: None,
            url_expiry: DEFAULT_URL_EXPIRY,
            osd: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.normalizer = ProposalNormalizer::new(clock);
        self
    }

    pub fn with_object_store(mut self, store: Arc<dyn ObjectStore>, expiry: Duration) -> Self {
        self.object_store = Some(store);
        self.url_expiry = expiry;
        self
    }

    pub fn with_osd(mut self, osd: Arc<OsdClient>) -> Self {
        self.osd = Some(osd);
        self
    }

    /// Build every collaborator from configuration.
    pub async fn from_config(config: &AppConfig) -> PhtResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let repository = RepositoryFactory::from_settings(&config.repository)?;

        let catalogs = &config.catalogs;
        let resolver = CoordinateResolver::new(
            Arc::new(SimbadClient::new(&catalogs.simbad_url, catalogs.timeout())?),
            Arc::new(NedClient::new(&catalogs.ned_url, catalogs.timeout())?),
        );

        let mut state = Self::new(repository, resolver)
            .with_clock(clock.clone())
            .with_osd(Arc::new(OsdClient::new(&config.osd.url, config.osd.timeout())?));

        if let Some(s3) = &config.s3 {
            let presigner = S3Presigner::new(s3.to_settings(), clock).await?;
            state = state.with_object_store(Arc::new(presigner), s3.expiry());
        }
        Ok(state)
    }

    pub fn object_store(&self) -> PhtResult<&Arc<dyn ObjectStore>> {
        self.object_store
            .as_ref()
            .ok_or_else(|| PhtError::configuration("Object store is not configured"))
    }

    pub fn osd(&self) -> PhtResult<&Arc<OsdClient>> {
        self.osd
            .as_ref()
            .ok_or_else(|| PhtError::configuration("OSD client is not configured"))
    }
}
