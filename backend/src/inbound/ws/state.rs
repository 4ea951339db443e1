//! Shared WebSocket adapter state.
//!
//! The feed endpoint depends on the [`MarketplaceFeed`] driving port rather
//! than on a concrete service, so tests can swap in a fixture or mock.

use std::sync::Arc;

use url::{Origin, Url};

use crate::domain::ports::{FixtureMarketplace, MarketplaceFeed};

const LOCALHOST: &str = "localhost";

/// Origins allowed to open a feed.
///
/// An empty list falls back to `http://localhost` on any explicit non-zero
/// port, which covers local front-end dev servers.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<Origin>,
}

impl OriginPolicy {
    pub fn new(allowed: impl IntoIterator<Item = Url>) -> Self {
        Self {
            allowed: allowed.into_iter().map(|url| url.origin()).collect(),
        }
    }

    /// Whether a parsed `Origin` header is acceptable.
    ///
    /// # Examples
    /// ```
    /// use marketplace::inbound::ws::state::OriginPolicy;
    /// use url::Url;
    ///
    /// let policy = OriginPolicy::new([Url::parse("https://market.example.edu").unwrap()]);
    /// assert!(policy.allows(&Url::parse("https://market.example.edu").unwrap()));
    /// assert!(!policy.allows(&Url::parse("http://market.example.edu").unwrap()));
    /// ```
    pub fn allows(&self, origin: &Url) -> bool {
        if self.allowed.is_empty() {
            return origin.scheme() == "http"
                && origin.host_str() == Some(LOCALHOST)
                && matches!(origin.port(), Some(port) if port != 0);
        }
        let candidate = origin.origin();
        candidate.is_tuple() && self.allowed.contains(&candidate)
    }
}

/// Dependency bundle for the feed endpoint.
#[derive(Clone)]
pub struct WsState {
    pub feed: Arc<dyn MarketplaceFeed>,
    pub origins: OriginPolicy,
}

impl WsState {
    pub fn new(feed: Arc<dyn MarketplaceFeed>, origins: OriginPolicy) -> Self {
        Self { feed, origins }
    }

    /// Empty feed that accepts local dev origins.
    pub fn fixtures() -> Self {
        Self::new(Arc::new(FixtureMarketplace), OriginPolicy::default())
    }
}
