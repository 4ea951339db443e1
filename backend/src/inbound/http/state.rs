//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and depend only on driving
//! ports, so they stay testable without a backend.

use std::sync::Arc;

use crate::domain::ports::{
    AccountService, FixtureAccountService, FixtureListingCommand, FixtureMarketplace,
    ListingCommand, MarketplaceQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub marketplace: Arc<dyn MarketplaceQuery>,
    pub listings: Arc<dyn ListingCommand>,
    pub accounts: Arc<dyn AccountService>,
}

impl HttpState {
    pub fn new(
        marketplace: Arc<dyn MarketplaceQuery>,
        listings: Arc<dyn ListingCommand>,
        accounts: Arc<dyn AccountService>,
    ) -> Self {
        Self {
            marketplace,
            listings,
            accounts,
        }
    }

    /// State backed entirely by fixture ports.
    ///
    /// # Examples
    /// ```
    /// use marketplace::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::fixtures();
    /// let _accounts = state.accounts.clone();
    /// ```
    pub fn fixtures() -> Self {
        Self::new(
            Arc::new(FixtureMarketplace),
            Arc::new(FixtureListingCommand),
            Arc::new(FixtureAccountService),
        )
    }
}
