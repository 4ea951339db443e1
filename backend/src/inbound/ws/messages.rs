//! Wire-level frames for the live listings feed.
//!
//! Every feed batch becomes one JSON text frame tagged by `type`.

use serde::Serialize;

use crate::domain::{Error, ListingView};
use crate::inbound::http::error::redact_if_internal;

/// Outbound frame sent to feed clients.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FeedFrame {
    /// The full presented result set after a backend change.
    Listings { listings: Vec<ListingView> },
    /// A batch failed; the feed stays open and the next change retries.
    Error { error: Error },
}

impl From<Result<Vec<ListingView>, Error>> for FeedFrame {
    fn from(batch: Result<Vec<ListingView>, Error>) -> Self {
        match batch {
            Ok(listings) => Self::Listings { listings },
            Err(error) => Self::Error {
                error: redact_if_internal(&error),
            },
        }
    }
}
