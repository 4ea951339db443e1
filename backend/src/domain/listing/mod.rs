//! Listing documents and their validated field types.
//!
//! [`ListingRecord`] is the schema every listing document is checked against
//! when it is read from the backend. Adapters decode raw documents into it and
//! skip (with a warning) any document that fails validation.

mod category;
mod form;
mod price;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::UserId;

pub use category::Category;
pub use form::{ListingDraft, ListingForm};
pub use price::Price;

/// Maximum accepted length of a listing identifier.
pub const LISTING_ID_MAX: usize = 128;

/// Validation failures for listing field values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingValidationError {
    #[error("listing id {input:?} must be 1-{max} characters without '/'")]
    InvalidId { input: String, max: usize },
    #[error("title must not be blank")]
    EmptyTitle,
    #[error("price must be a non-negative number, got {input:?}")]
    InvalidPrice { input: String },
    #[error("unknown category {input:?}")]
    UnknownCategory { input: String },
    #[error("image url must be an absolute http(s) url, got {input:?}")]
    InvalidImageUrl { input: String },
}

/// Backend-assigned listing identifier.
///
/// Identifiers are opaque. They become a path segment in document names, so
/// `/` is rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ListingId(String);

impl ListingId {
    /// Validate and construct a [`ListingId`].
    pub fn new(id: impl Into<String>) -> Result<Self, ListingValidationError> {
        let id = id.into();
        if id.is_empty() || id.contains('/') || id.chars().count() > LISTING_ID_MAX {
            return Err(ListingValidationError::InvalidId {
                input: id,
                max: LISTING_ID_MAX,
            });
        }
        Ok(Self(id))
    }

    /// Generate a fresh identifier for stores that assign their own ids.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

impl AsRef<str> for ListingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ListingId> for String {
    fn from(value: ListingId) -> Self {
        value.0
    }
}

impl TryFrom<String> for ListingId {
    type Error = ListingValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Listing title, stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Title(String);

impl Title {
    /// Trim and validate a title. Pure whitespace is rejected.
    pub fn new(title: impl AsRef<str>) -> Result<Self, ListingValidationError> {
        let trimmed = title.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ListingValidationError::EmptyTitle);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Case-insensitive substring match used by the search filter.
    pub fn contains_ignore_case(&self, needle_lowercase: &str) -> bool {
        self.0.to_lowercase().contains(needle_lowercase)
    }
}

impl AsRef<str> for Title {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Title> for String {
    fn from(value: Title) -> Self {
        value.0
    }
}

impl TryFrom<String> for Title {
    type Error = ListingValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Absolute `http`/`https` reference to a listing photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageUrl(Url);

impl ImageUrl {
    /// Parse and validate an image reference.
    pub fn parse(raw: &str) -> Result<Self, ListingValidationError> {
        let invalid = || ListingValidationError::InvalidImageUrl {
            input: raw.to_owned(),
        };
        let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
        match url.scheme() {
            "http" | "https" if url.has_host() => Ok(Self(url)),
            _ => Err(invalid()),
        }
    }

    /// The underlying URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl AsRef<str> for ImageUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ImageUrl> for String {
    fn from(value: ImageUrl) -> Self {
        value.0.into()
    }
}

impl TryFrom<String> for ImageUrl {
    type Error = ListingValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Fields a seller may set on create and change on edit.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFields {
    pub title: Title,
    pub price: Price,
    pub category: Category,
    pub image_url: Option<ImageUrl>,
}

/// Document written by the create path. The store assigns the identifier and
/// the server timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListingDocument {
    pub fields: ListingFields,
    pub author_id: UserId,
}

/// Validated listing document as read from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub id: ListingId,
    pub title: Title,
    pub price: Price,
    pub category: Category,
    /// Absent on legacy documents written without an author.
    #[serde(default)]
    pub author_id: Option<UserId>,
    /// Absent while the server timestamp is still pending.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_url: Option<ImageUrl>,
    #[serde(default)]
    pub favorites: BTreeSet<UserId>,
}

impl ListingRecord {
    /// Whether `user` authored this listing.
    pub fn is_authored_by(&self, user: &UserId) -> bool {
        self.author_id.as_ref() == Some(user)
    }

    /// Whether `user` has favorited this listing.
    pub fn is_favorited_by(&self, user: &UserId) -> bool {
        self.favorites.contains(user)
    }

    /// Replace the editable fields, leaving identity, author, and timestamp.
    pub fn apply(&mut self, fields: ListingFields) {
        self.title = fields.title;
        self.price = fields.price;
        self.category = fields.category;
        self.image_url = fields.image_url;
    }
}
