//! The listings read pipeline.
//!
//! view parameters -> composed query -> store (one-shot or subscription)
//! -> search filter -> name resolution -> presentation.
//!
//! Live feeds run the same pipeline on every batch the store pushes, in the
//! order the store pushes them. Each batch is fully resolved before it is
//! presented.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, debug, info_span};

use crate::domain::listing_query_service::{QueryPlan, query_failed};
use crate::domain::ports::{
    ListingFeed, ListingStore, MarketplaceFeed, MarketplaceQuery, ProfileStore,
    SUBSCRIPTION_BUFFER, Subscription,
};
use crate::domain::{
    Error, ListingQueryService, ListingRecord, ListingView, UserId, UserNameResolver,
    ViewParameters, present_all,
};

/// Read-side marketplace service implementing the driving query ports.
pub struct MarketplaceService<S, P> {
    queries: ListingQueryService<S>,
    names: UserNameResolver<P>,
}

impl<S, P> Clone for MarketplaceService<S, P> {
    fn clone(&self) -> Self {
        Self {
            queries: self.queries.clone(),
            names: self.names.clone(),
        }
    }
}

impl<S, P> MarketplaceService<S, P> {
    pub fn new(store: Arc<S>, profiles: Arc<P>) -> Self {
        Self {
            queries: ListingQueryService::new(store),
            names: UserNameResolver::new(profiles),
        }
    }
}

impl<S, P> MarketplaceService<S, P>
where
    S: ListingStore,
    P: ProfileStore,
{
    async fn present_batch(
        &self,
        records: Vec<ListingRecord>,
        params: &ViewParameters,
        identity: Option<&UserId>,
    ) -> Vec<ListingView> {
        let records = self.queries.filter(records, params);
        let names = self.names.resolve_batch(&records).await;
        present_all(&records, &names, identity)
    }
}

#[async_trait]
impl<S, P> MarketplaceQuery for MarketplaceService<S, P>
where
    S: ListingStore,
    P: ProfileStore,
{
    async fn load(
        &self,
        params: ViewParameters,
        identity: Option<UserId>,
    ) -> Result<Vec<ListingView>, Error> {
        let records = self.queries.fetch(&params, identity.as_ref()).await?;
        let names = self.names.resolve_batch(&records).await;
        Ok(present_all(&records, &names, identity.as_ref()))
    }
}

#[async_trait]
impl<S, P> MarketplaceFeed for MarketplaceService<S, P>
where
    S: ListingStore + 'static,
    P: ProfileStore + 'static,
{
    async fn watch(
        &self,
        params: ViewParameters,
        identity: Option<UserId>,
    ) -> Result<ListingFeed, Error> {
        let query = match self.queries.plan(&params, identity.as_ref()) {
            QueryPlan::Run(query) => query,
            QueryPlan::Skip => return Ok(Subscription::from_items([Ok(Vec::new())])),
        };
        let mut upstream = self.queries.subscribe(&query).await?;
        let (feed, mut sink) = Subscription::channel(SUBSCRIPTION_BUFFER);
        let pipeline = self.clone();
        let span = info_span!("listing_feed", scope = ?params.scope);

        tokio::spawn(
            async move {
                while let Some(Some(batch)) = sink.until_released(upstream.next()).await {
                    let presented = match batch {
                        Ok(records) => Ok(pipeline
                            .present_batch(records, &params, identity.as_ref())
                            .await),
                        Err(error) => Err(Error::from(query_failed(error))),
                    };
                    if !sink.send(presented).await {
                        break;
                    }
                }
                upstream.cancel();
                debug!("listing feed released");
            }
            .instrument(span),
        );

        Ok(feed)
    }
}

#[cfg(test)]
#[path = "marketplace_service_tests.rs"]
mod tests;
