//! Driving ports for reading the marketplace.
//!
//! Inbound adapters load a page of presented listings with
//! [`MarketplaceQuery`] or hold a live feed open with [`MarketplaceFeed`].
//! Identity is read fresh for every call; nothing is cached across calls.

use async_trait::async_trait;

use crate::domain::{Error, ListingView, UserId, ViewParameters};

use super::subscription::Subscription;

/// Live feed of presented batches. Release the handle on teardown.
pub type ListingFeed = Subscription<Result<Vec<ListingView>, Error>>;

/// One-shot listing load.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketplaceQuery: Send + Sync {
    /// Query, filter, resolve names, and present once.
    ///
    /// Scoped views without an identity yield an empty page.
    async fn load(
        &self,
        params: ViewParameters,
        identity: Option<UserId>,
    ) -> Result<Vec<ListingView>, Error>;
}

/// Standing listing subscription.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketplaceFeed: Send + Sync {
    /// Open a feed that re-delivers the presented result set after every
    /// backend change.
    async fn watch(
        &self,
        params: ViewParameters,
        identity: Option<UserId>,
    ) -> Result<ListingFeed, Error>;
}

/// Marketplace with no listings.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureMarketplace;

#[async_trait]
impl MarketplaceQuery for FixtureMarketplace {
    async fn load(
        &self,
        _params: ViewParameters,
        _identity: Option<UserId>,
    ) -> Result<Vec<ListingView>, Error> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl MarketplaceFeed for FixtureMarketplace {
    async fn watch(
        &self,
        _params: ViewParameters,
        _identity: Option<UserId>,
    ) -> Result<ListingFeed, Error> {
        Ok(Subscription::from_items([Ok(Vec::new())]))
    }
}
