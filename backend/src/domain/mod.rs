//! Domain types, services, and ports.
//!
//! Everything here is transport agnostic. Inbound adapters call the driving
//! ports in [`ports`]; outbound adapters implement the driven ones.

pub mod account_service;
pub mod error;
pub mod listing;
pub mod listing_error;
pub mod listing_query;
pub mod listing_query_service;
pub mod marketplace_service;
pub mod mutation_gateway;
pub mod name_resolver;
pub mod ports;
pub mod presentation;
pub mod user;
pub mod view_params;

pub use self::account_service::IdentityService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::listing::{
    Category, ImageUrl, ListingDraft, ListingFields, ListingForm, ListingId, ListingRecord,
    ListingValidationError, NewListingDocument, Price, Title,
};
pub use self::listing_error::ListingError;
pub use self::listing_query::{ListingFilter, ListingQuery, ListingQueryComposer};
pub use self::listing_query_service::{ListingQueryService, QueryPlan};
pub use self::marketplace_service::MarketplaceService;
pub use self::mutation_gateway::{
    Confirmation, CreatedListing, DeleteOutcome, FormAction, MutationGateway,
};
pub use self::name_resolver::{UserNameResolver, distinct_authors};
pub use self::presentation::{AuthorNames, ListingView, UNKNOWN_SELLER, present, present_all};
pub use self::user::{
    Credentials, DisplayName, SignUpRequest, UserId, UserProfile, UserValidationError,
};
pub use self::view_params::{CategoryFilter, Scope, SearchText, ViewParameters};

/// Convenient alias for results carrying the API [`Error`].
pub type ApiResult<T> = Result<T, Error>;
