//! Raw listing form input and its validation.

use serde::Deserialize;
use utoipa::ToSchema;

use super::{Category, ImageUrl, ListingFields, Price, Title};
use crate::domain::ListingError;

/// Validated form contents, ready to be written.
pub type ListingDraft = ListingFields;

/// Listing form exactly as the user typed it.
///
/// The form is only cleared after a successful create. A failed write leaves
/// it populated so the user can retry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingForm {
    #[schema(example = "Desk chair")]
    pub title: String,
    #[schema(example = "25.00")]
    pub price: String,
    #[schema(example = "Home")]
    pub category: String,
    /// Optional photo link; blank means none.
    #[serde(default)]
    #[schema(example = "https://cdn.example.com/chair.png")]
    pub image_url: String,
}

impl ListingForm {
    /// Convenience constructor used by callers without an image.
    pub fn new(
        title: impl Into<String>,
        price: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            price: price.into(),
            category: category.into(),
            image_url: String::new(),
        }
    }

    /// Check every field and produce a [`ListingDraft`].
    ///
    /// Fields are checked in form order and the first failure is returned.
    pub fn validate(&self) -> Result<ListingDraft, ListingError> {
        let title = Title::new(&self.title)?;
        let price: Price = self.price.parse()?;
        let category: Category = self.category.parse()?;
        let image_url = match self.image_url.trim() {
            "" => None,
            raw => Some(ImageUrl::parse(raw)?),
        };
        Ok(ListingFields {
            title,
            price,
            category,
            image_url,
        })
    }

    /// Reset every field to blank.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether every field is blank.
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}
