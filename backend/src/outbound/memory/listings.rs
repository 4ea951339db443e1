//! In-memory listings collection.
//!
//! Every write bumps a revision counter on a `watch` channel. Each standing
//! subscription waits on that channel and re-evaluates its query after every
//! bump, so subscribers see the full result set on open and after each
//! change.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tokio::sync::{RwLock, watch};
use tracing::{Instrument, debug, debug_span};

use crate::domain::ports::{
    ListingStore, ListingStoreError, ListingSubscription, SUBSCRIPTION_BUFFER, Subscription,
};
use crate::domain::{
    ListingFields, ListingId, ListingQuery, ListingRecord, NewListingDocument, UserId,
};

#[derive(Default)]
struct ListingState {
    documents: HashMap<ListingId, ListingRecord>,
    last_timestamp: Option<DateTime<Utc>>,
}

struct Shared {
    state: RwLock<ListingState>,
    revision: watch::Sender<u64>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl Shared {
    async fn evaluate(&self, query: &ListingQuery) -> Vec<ListingRecord> {
        let state = self.state.read().await;
        let mut records: Vec<ListingRecord> = state
            .documents
            .values()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        // HashMap order is arbitrary; fix it before the stable timestamp sort.
        records.sort_by(|a, b| a.id.cmp(&b.id));
        query.sort(&mut records);
        records
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

/// Listings held in process memory.
#[derive(Clone)]
pub struct MemoryListingStore {
    shared: Arc<Shared>,
}

impl MemoryListingStore {
    /// Empty store stamping documents with `clock`.
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(ListingState::default()),
                revision,
                clock,
            }),
        }
    }

    /// Store a fully formed record as-is, replacing any document with the
    /// same id. Used for seeding, including legacy author-less documents.
    pub async fn insert(&self, record: ListingRecord) {
        let mut state = self.shared.state.write().await;
        state.documents.insert(record.id.clone(), record);
        drop(state);
        self.shared.bump();
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.shared.state.read().await.documents.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Server timestamp for the next write. Never earlier than, or equal to,
    /// the previous one, so newest-first ordering stays total even when the
    /// clock stalls.
    fn next_timestamp(&self, state: &mut ListingState) -> DateTime<Utc> {
        let now = self.shared.clock.utc();
        let stamped = match state.last_timestamp {
            Some(previous) if now <= previous => previous + TimeDelta::microseconds(1),
            _ => now,
        };
        state.last_timestamp = Some(stamped);
        stamped
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn fetch_once(
        &self,
        query: &ListingQuery,
    ) -> Result<Vec<ListingRecord>, ListingStoreError> {
        Ok(self.shared.evaluate(query).await)
    }

    async fn subscribe(
        &self,
        query: &ListingQuery,
    ) -> Result<ListingSubscription, ListingStoreError> {
        let (subscription, mut sink) = Subscription::channel(SUBSCRIPTION_BUFFER);
        let mut revisions = self.shared.revision.subscribe();
        let shared = Arc::clone(&self.shared);
        let query = query.clone();

        let span = debug_span!("memory_subscription", filter = ?query.filter());
        tokio::spawn(
            async move {
                loop {
                    let revision = *revisions.borrow_and_update();
                    let batch = shared.evaluate(&query).await;
                    debug!(revision, size = batch.len(), "pushing batch");
                    if !sink.send(Ok(batch)).await {
                        break;
                    }
                    match sink.until_released(revisions.changed()).await {
                        Some(Ok(())) => {}
                        Some(Err(_)) | None => break,
                    }
                }
                debug!("subscription released");
            }
            .instrument(span),
        );
        Ok(subscription)
    }

    async fn create(&self, document: NewListingDocument) -> Result<ListingId, ListingStoreError> {
        let NewListingDocument { fields, author_id } = document;
        let id = ListingId::random();
        let mut state = self.shared.state.write().await;
        let created_at = self.next_timestamp(&mut state);
        let record = ListingRecord {
            id: id.clone(),
            title: fields.title,
            price: fields.price,
            category: fields.category,
            author_id: Some(author_id),
            created_at: Some(created_at),
            image_url: fields.image_url,
            favorites: Default::default(),
        };
        state.documents.insert(id.clone(), record);
        drop(state);
        self.shared.bump();
        Ok(id)
    }

    async fn overwrite(
        &self,
        id: &ListingId,
        fields: ListingFields,
    ) -> Result<(), ListingStoreError> {
        let mut state = self.shared.state.write().await;
        let record = state
            .documents
            .get_mut(id)
            .ok_or_else(|| ListingStoreError::missing(id.to_string()))?;
        record.apply(fields);
        drop(state);
        self.shared.bump();
        Ok(())
    }

    async fn get(&self, id: &ListingId) -> Result<Option<ListingRecord>, ListingStoreError> {
        Ok(self.shared.state.read().await.documents.get(id).cloned())
    }

    async fn delete(&self, id: &ListingId) -> Result<(), ListingStoreError> {
        let removed = self.shared.state.write().await.documents.remove(id);
        if removed.is_some() {
            self.shared.bump();
        }
        Ok(())
    }

    async fn set_favorite(
        &self,
        id: &ListingId,
        user: &UserId,
        favorite: bool,
    ) -> Result<(), ListingStoreError> {
        let mut state = self.shared.state.write().await;
        let record = state
            .documents
            .get_mut(id)
            .ok_or_else(|| ListingStoreError::missing(id.to_string()))?;
        let changed = if favorite {
            record.favorites.insert(user.clone())
        } else {
            record.favorites.remove(user)
        };
        drop(state);
        if changed {
            self.shared.bump();
        }
        Ok(())
    }
}
