//! Hosted backend adapters over the Firestore and Identity Toolkit REST
//! APIs.
//!
//! [`FirestoreStore`] serves both the listings and profiles collections;
//! [`IdentityToolkitAuth`] handles email and password accounts.

mod auth;
mod client;
mod dto;

pub use self::auth::{DEFAULT_AUTH_BASE_URL, IdentityToolkitAuth};
pub use self::client::{
    DEFAULT_FIRESTORE_BASE_URL, DEFAULT_POLL_INTERVAL, FirestoreConfig, FirestoreStore,
};
