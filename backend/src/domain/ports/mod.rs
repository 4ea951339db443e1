//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`ListingStore`], [`ProfileStore`], [`AuthService`]) are the
//! hosted backend's collections and identity service. Driving ports
//! ([`MarketplaceQuery`], [`MarketplaceFeed`], [`ListingCommand`],
//! [`AccountService`]) are what inbound adapters call.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod auth_service;
mod listing_command;
mod listing_store;
mod marketplace_query;
mod profile_store;
mod subscription;

#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::{AccountService, FixtureAccountService};
#[cfg(test)]
pub use auth_service::MockAuthService;
pub use auth_service::{AuthService, AuthServiceError, FixtureAuthService};
#[cfg(test)]
pub use listing_command::MockListingCommand;
pub use listing_command::{FixtureListingCommand, ListingCommand};
#[cfg(test)]
pub use listing_store::MockListingStore;
pub use listing_store::{
    FixtureListingStore, ListingStore, ListingStoreError, ListingSubscription,
};
#[cfg(test)]
pub use marketplace_query::{MockMarketplaceFeed, MockMarketplaceQuery};
pub use marketplace_query::{FixtureMarketplace, ListingFeed, MarketplaceFeed, MarketplaceQuery};
#[cfg(test)]
pub use profile_store::MockProfileStore;
pub use profile_store::{FixtureProfileStore, ProfileStore, ProfileStoreError};
pub use subscription::{
    SUBSCRIPTION_BUFFER, Subscription, SubscriptionHandle, SubscriptionSink,
};
