//! Failure taxonomy of the listings pipeline.

use crate::domain::listing::ListingValidationError;
use crate::domain::Error;

/// Errors raised while querying or mutating listings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingError {
    /// A scoped query or a mutation needs a signed-in user.
    #[error("sign in to continue")]
    Unauthenticated,
    #[error("price must be a non-negative number, got {input:?}")]
    InvalidPrice { input: String },
    #[error("title must not be blank")]
    InvalidTitle,
    #[error("unknown category {input:?}")]
    InvalidCategory { input: String },
    #[error("image url must be an absolute http(s) url, got {input:?}")]
    InvalidImageUrl { input: String },
    #[error("listing {id} not found")]
    NotFound { id: String },
    /// The caller is not the listing's author.
    #[error("only the seller can change listing {id}")]
    Forbidden { id: String },
    /// The backend read failed. Not retried.
    #[error("could not load listings: {message}")]
    QueryFailed { message: String },
    /// The backend write or delete failed. Not retried.
    #[error("could not save changes: {message}")]
    WriteFailed { message: String },
}

impl From<ListingValidationError> for ListingError {
    fn from(value: ListingValidationError) -> Self {
        match value {
            ListingValidationError::EmptyTitle => Self::InvalidTitle,
            ListingValidationError::InvalidPrice { input } => Self::InvalidPrice { input },
            ListingValidationError::UnknownCategory { input } => Self::InvalidCategory { input },
            ListingValidationError::InvalidImageUrl { input } => Self::InvalidImageUrl { input },
            // A malformed id cannot name an existing document.
            ListingValidationError::InvalidId { input, .. } => Self::NotFound { id: input },
        }
    }
}

impl From<ListingError> for Error {
    fn from(value: ListingError) -> Self {
        let message = value.to_string();
        match value {
            ListingError::Unauthenticated => Error::unauthorized(message),
            ListingError::InvalidPrice { .. } => {
                Error::invalid_request(message).with_details(field_details("price"))
            }
            ListingError::InvalidTitle => {
                Error::invalid_request(message).with_details(field_details("title"))
            }
            ListingError::InvalidCategory { .. } => {
                Error::invalid_request(message).with_details(field_details("category"))
            }
            ListingError::InvalidImageUrl { .. } => {
                Error::invalid_request(message).with_details(field_details("imageUrl"))
            }
            ListingError::NotFound { .. } => Error::not_found(message),
            ListingError::Forbidden { .. } => Error::forbidden(message),
            ListingError::QueryFailed { .. } | ListingError::WriteFailed { .. } => {
                Error::service_unavailable(message)
            }
        }
    }
}

fn field_details(field: &str) -> serde_json::Value {
    serde_json::json!({ "field": field })
}
