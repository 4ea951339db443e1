//! Marketplace entry-point: loads settings, builds the backend context once,
//! and serves the REST API, live feed, and health checks.

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use marketplace::inbound::http::health::HealthState;
use marketplace::inbound::http::session_config::{BuildMode, session_settings_from_env};
use marketplace::inbound::ws::state::OriginPolicy;
use marketplace::settings::MarketSettings;

use server::{ServerConfig, build_backend, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        MarketSettings::load().map_err(|error| std::io::Error::other(error.to_string()))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let origins = OriginPolicy::new(settings.allowed_origins().map_err(std::io::Error::other)?);

    let backend = build_backend(&settings).await?;
    let health_state = web::Data::new(HealthState::new(backend.kind.as_str()));
    let config = ServerConfig::new(session.key, session.cookie_secure, bind_addr).with_origins(origins);

    info!(%bind_addr, backend = backend.kind.as_str(), "starting marketplace server");
    create_server(health_state, backend, config)?.await
}
