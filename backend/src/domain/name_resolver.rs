//! Resolves listing authors to display names.
//!
//! One equality lookup per distinct author, issued concurrently; the result
//! is only returned once every lookup has finished. Nothing is cached across
//! calls.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::warn;

use crate::domain::ports::ProfileStore;
use crate::domain::{AuthorNames, ListingRecord, UserId};

/// Distinct authors appearing in a batch. Author-less records are skipped.
pub fn distinct_authors(records: &[ListingRecord]) -> BTreeSet<UserId> {
    records
        .iter()
        .filter_map(|record| record.author_id.clone())
        .collect()
}

/// Display-name lookups over a [`ProfileStore`].
pub struct UserNameResolver<P> {
    profiles: Arc<P>,
}

impl<P> Clone for UserNameResolver<P> {
    fn clone(&self) -> Self {
        Self {
            profiles: Arc::clone(&self.profiles),
        }
    }
}

impl<P> UserNameResolver<P> {
    pub fn new(profiles: Arc<P>) -> Self {
        Self { profiles }
    }
}

impl<P> UserNameResolver<P>
where
    P: ProfileStore,
{
    /// Map each author to the display name of its first matching profile.
    ///
    /// Authors without a profile are absent from the result. A failed lookup
    /// is logged and treated the same way.
    pub async fn resolve(&self, authors: &BTreeSet<UserId>) -> AuthorNames {
        let lookups = authors.iter().map(|author| async move {
            match self.profiles.find_by_user_id(author).await {
                Ok(profiles) => profiles
                    .into_iter()
                    .next()
                    .map(|profile| (author.clone(), profile.display_name)),
                Err(error) => {
                    warn!(user_id = %author, kind = error.kind(), %error, "display name lookup failed");
                    None
                }
            }
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }

    /// Resolve the authors of a batch.
    pub async fn resolve_batch(&self, records: &[ListingRecord]) -> AuthorNames {
        self.resolve(&distinct_authors(records)).await
    }
}
