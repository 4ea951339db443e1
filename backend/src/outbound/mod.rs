//! Outbound adapters implementing domain ports for the document backend.
//!
//! - **memory**: in-process listings, profiles, and accounts for development
//!   and tests
//! - **firestore**: the hosted document store and identity backend over REST
//!
//! Adapters are thin translators between domain types and the backend's
//! representation. They contain no business logic.

pub mod firestore;
pub mod memory;
