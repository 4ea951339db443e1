//! Render-ready listing view records.
//!
//! Pure mapping from a validated record, the author names resolved for its
//! batch, and the current identity. No I/O and no state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{DisplayName, ListingRecord, UserId};

/// Placeholder shown for listings without an author.
pub const UNKNOWN_SELLER: &str = "Unknown seller";

/// Display names resolved for one result batch.
pub type AuthorNames = HashMap<UserId, DisplayName>;

/// One listing as the listings view renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    #[schema(example = "4f1c2a9e0b7d4c55a1e3f0c2d9b8a761")]
    pub id: String,
    #[schema(example = "Desk chair")]
    pub title: String,
    #[schema(example = "Home")]
    pub category: String,
    #[schema(example = "$25.00")]
    pub price: String,
    /// Absent while the server timestamp is pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "2024-03-01 14:05 UTC")]
    pub posted_at: Option<String>,
    #[schema(example = "Ada")]
    pub author_name: String,
    /// True only for the listing's author.
    pub can_mutate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub favorite_count: usize,
    pub is_favorite: bool,
}

/// Map one record into its view.
///
/// The author name falls back to the raw author id when no profile was
/// found, and to [`UNKNOWN_SELLER`] when the listing has no author.
pub fn present(
    record: &ListingRecord,
    names: &AuthorNames,
    identity: Option<&UserId>,
) -> ListingView {
    let author_name = match &record.author_id {
        Some(author) => names
            .get(author)
            .map_or_else(|| author.to_string(), ToString::to_string),
        None => UNKNOWN_SELLER.to_owned(),
    };
    ListingView {
        id: record.id.to_string(),
        title: record.title.to_string(),
        category: record.category.to_string(),
        price: record.price.to_string(),
        posted_at: record.created_at.map(format_timestamp),
        author_name,
        can_mutate: identity.is_some_and(|user| record.is_authored_by(user)),
        image_url: record.image_url.as_ref().map(|url| url.as_ref().to_owned()),
        favorite_count: record.favorites.len(),
        is_favorite: identity.is_some_and(|user| record.is_favorited_by(user)),
    }
}

/// Map a whole batch, preserving order.
pub fn present_all(
    records: &[ListingRecord],
    names: &AuthorNames,
    identity: Option<&UserId>,
) -> Vec<ListingView> {
    records
        .iter()
        .map(|record| present(record, names, identity))
        .collect()
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M UTC").to_string()
}
