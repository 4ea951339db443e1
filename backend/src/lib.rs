//! Student marketplace backend.
//!
//! Listings are read through a query, filter, name-resolution, and
//! presentation pipeline and written through a mutation gateway. Both sit in
//! [`domain`] behind ports; [`outbound`] implements those ports for an
//! in-memory store and for Firestore, and [`inbound`] exposes them over HTTP
//! and WebSocket.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
