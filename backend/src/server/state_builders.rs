//! Builds the backend context once at startup.
//!
//! The context owns the store, profile, and auth adapters for the selected
//! backend and the domain services wired over them. Handlers only ever see
//! the driving ports.

use std::sync::Arc;

use mockable::DefaultClock;
use reqwest::Url;
use tracing::info;

use marketplace::domain::ports::{AuthService, ListingStore, MarketplaceFeed, ProfileStore};
use marketplace::domain::{IdentityService, MarketplaceService, MutationGateway};
use marketplace::inbound::http::state::HttpState;
use marketplace::outbound::firestore::{
    DEFAULT_AUTH_BASE_URL, DEFAULT_FIRESTORE_BASE_URL, FirestoreConfig, FirestoreStore,
    IdentityToolkitAuth,
};
use marketplace::outbound::memory::{MemoryBackend, SeedError};
use marketplace::settings::{BackendKind, MarketSettings, SettingsError};

/// Startup failure while building the backend context.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("invalid default url: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Seed(#[from] SeedError),
}

impl From<BackendError> for std::io::Error {
    fn from(error: BackendError) -> Self {
        std::io::Error::other(error.to_string())
    }
}

/// Driving ports for one backend, shared by every worker.
#[derive(Clone)]
pub struct BackendContext {
    pub kind: BackendKind,
    pub http: HttpState,
    pub feed: Arc<dyn MarketplaceFeed>,
}

fn wire<S, P, A>(kind: BackendKind, store: Arc<S>, profiles: Arc<P>, auth: Arc<A>) -> BackendContext
where
    S: ListingStore + 'static,
    P: ProfileStore + 'static,
    A: AuthService + 'static,
{
    let marketplace = Arc::new(MarketplaceService::new(store.clone(), profiles.clone()));
    let http = HttpState::new(
        marketplace.clone(),
        Arc::new(MutationGateway::new(store)),
        Arc::new(IdentityService::new(auth, profiles)),
    );
    BackendContext {
        kind,
        http,
        feed: marketplace,
    }
}

/// Build the context for the backend named in `settings`.
///
/// # Errors
///
/// Fails on invalid settings, a client that cannot be built, or a demo seed
/// that cannot be written.
pub async fn build_backend(settings: &MarketSettings) -> Result<BackendContext, BackendError> {
    match settings.backend()? {
        BackendKind::Memory => {
            let backend = MemoryBackend::new(Arc::new(DefaultClock));
            if settings.seed_demo_data {
                backend.seed_demo().await?;
            }
            info!(backend = "memory", "backend ready");
            Ok(wire(
                BackendKind::Memory,
                backend.listings,
                backend.profiles,
                backend.auth,
            ))
        }
        BackendKind::Firestore => {
            let firestore = settings.firestore()?;
            let api_key = firestore.api_key.clone().ok_or(SettingsError::Missing {
                field: "firestore_api_key",
                reason: "backend is firestore",
            })?;
            let base_url = match firestore.base_url {
                Some(url) => url,
                None => Url::parse(DEFAULT_FIRESTORE_BASE_URL)?,
            };
            let auth_base_url = match firestore.auth_base_url {
                Some(url) => url,
                None => Url::parse(DEFAULT_AUTH_BASE_URL)?,
            };
            let store = Arc::new(FirestoreStore::new(FirestoreConfig {
                project_id: firestore.project_id.clone(),
                api_key: Some(api_key.clone()),
                base_url,
                request_timeout: settings.request_timeout(),
                poll_interval: settings.poll_interval(),
            })?);
            let auth = Arc::new(IdentityToolkitAuth::new(
                auth_base_url,
                api_key,
                settings.request_timeout(),
            )?);
            info!(backend = "firestore", project = %firestore.project_id, "backend ready");
            Ok(wire(BackendKind::Firestore, store.clone(), store, auth))
        }
    }
}
