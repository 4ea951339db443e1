//! Executes composed listing queries against the store.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::{ListingStore, ListingStoreError, ListingSubscription};
use crate::domain::{
    ListingError, ListingQuery, ListingQueryComposer, ListingRecord, UserId, ViewParameters,
};

/// Outcome of composing a query for a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    /// Run this query.
    Run(ListingQuery),
    /// A scoped view without an identity: no results, no read.
    Skip,
}

/// Listing reads: compose, execute, post-filter.
pub struct ListingQueryService<S> {
    store: Arc<S>,
    composer: ListingQueryComposer,
}

impl<S> Clone for ListingQueryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            composer: self.composer,
        }
    }
}

impl<S> ListingQueryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            composer: ListingQueryComposer,
        }
    }

    /// Compose the query for `params`, turning a missing identity on a
    /// scoped view into [`QueryPlan::Skip`].
    pub fn plan(&self, params: &ViewParameters, identity: Option<&UserId>) -> QueryPlan {
        match self.composer.compose(params, identity) {
            Ok(query) => QueryPlan::Run(query),
            Err(ListingError::Unauthenticated) => {
                debug!(scope = ?params.scope, "scoped view without identity; skipping read");
                QueryPlan::Skip
            }
            Err(other) => {
                // Composition has no other failure mode today.
                warn!(error = %other, "unexpected composition failure; skipping read");
                QueryPlan::Skip
            }
        }
    }

    /// Keep the records matching the view's search text.
    pub fn filter(&self, records: Vec<ListingRecord>, params: &ViewParameters) -> Vec<ListingRecord> {
        self.composer.apply_search(records, &params.search)
    }
}

impl<S> ListingQueryService<S>
where
    S: ListingStore,
{
    /// One-shot fetch for a view.
    ///
    /// A scoped view without an identity returns an empty batch without
    /// reading. Backend failures become [`ListingError::QueryFailed`].
    pub async fn fetch(
        &self,
        params: &ViewParameters,
        identity: Option<&UserId>,
    ) -> Result<Vec<ListingRecord>, ListingError> {
        let query = match self.plan(params, identity) {
            QueryPlan::Run(query) => query,
            QueryPlan::Skip => return Ok(Vec::new()),
        };
        let records = self
            .store
            .fetch_once(&query)
            .await
            .map_err(query_failed)?;
        Ok(self.filter(records, params))
    }

    /// Open a standing subscription for a composed query.
    pub async fn subscribe(&self, query: &ListingQuery) -> Result<ListingSubscription, ListingError> {
        self.store.subscribe(query).await.map_err(query_failed)
    }
}

pub(crate) fn query_failed(error: ListingStoreError) -> ListingError {
    warn!(kind = error.kind(), %error, "listing query failed");
    ListingError::QueryFailed {
        message: error.to_string(),
    }
}
