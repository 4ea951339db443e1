//! HTTP server configuration object.

use std::net::SocketAddr;

use actix_web::cookie::Key;

use marketplace::inbound::ws::state::OriginPolicy;

/// Everything the HTTP server needs beyond the backend context.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) origins: OriginPolicy,
}

impl ServerConfig {
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            bind_addr,
            origins: OriginPolicy::default(),
        }
    }

    /// Restrict the live feed to the given origins.
    #[must_use]
    pub fn with_origins(mut self, origins: OriginPolicy) -> Self {
        self.origins = origins;
        self
    }
}
