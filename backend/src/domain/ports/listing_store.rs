//! Port for the hosted listings collection.
//!
//! [`ListingStore`] is the backend client adapter boundary for listings:
//! query execution (one-shot or standing subscription), document writes, and
//! the favorites array. Adapters validate every document on read and skip
//! the ones that do not match [`ListingRecord`].

use async_trait::async_trait;

use crate::domain::{
    ListingFields, ListingId, ListingQuery, ListingRecord, NewListingDocument, UserId,
};

use super::define_port_error;
use super::subscription::Subscription;

define_port_error! {
    /// Errors raised by listing store adapters.
    pub enum ListingStoreError {
        /// The backend could not be reached.
        Connection { message: String } =>
            "listing store connection failed: {message}",
        /// The backend rejected or failed the operation.
        Query { message: String } =>
            "listing store query failed: {message}",
        /// The backend refused the caller's credentials or rules.
        Denied { message: String } =>
            "listing store denied the request: {message}",
        /// The backend answered with a payload that could not be decoded.
        Decode { message: String } =>
            "listing store response could not be decoded: {message}",
        /// The addressed document does not exist.
        Missing { id: String } =>
            "listing {id} does not exist",
    }
}

/// Batch stream delivered by [`ListingStore::subscribe`].
pub type ListingSubscription = Subscription<Result<Vec<ListingRecord>, ListingStoreError>>;

/// Backend access to the listings collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Execute `query` once.
    async fn fetch_once(
        &self,
        query: &ListingQuery,
    ) -> Result<Vec<ListingRecord>, ListingStoreError>;

    /// Start a standing query. The full current result set is pushed first
    /// and again after every change, in the order the backend emits them,
    /// until the subscription is released.
    async fn subscribe(&self, query: &ListingQuery)
    -> Result<ListingSubscription, ListingStoreError>;

    /// Write a new document. The store assigns the id and server timestamp.
    async fn create(&self, document: NewListingDocument) -> Result<ListingId, ListingStoreError>;

    /// Replace the editable fields of an existing document.
    ///
    /// Fails with [`ListingStoreError::Missing`] when the document is gone.
    async fn overwrite(
        &self,
        id: &ListingId,
        fields: ListingFields,
    ) -> Result<(), ListingStoreError>;

    /// Read one document.
    async fn get(&self, id: &ListingId) -> Result<Option<ListingRecord>, ListingStoreError>;

    /// Remove a document.
    async fn delete(&self, id: &ListingId) -> Result<(), ListingStoreError>;

    /// Add `user` to, or remove it from, the document's favorites array.
    async fn set_favorite(
        &self,
        id: &ListingId,
        user: &UserId,
        favorite: bool,
    ) -> Result<(), ListingStoreError>;
}

/// Empty store. Creates and deletes succeed without effect; edits and
/// favorite toggles report the document missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureListingStore;

#[async_trait]
impl ListingStore for FixtureListingStore {
    async fn fetch_once(
        &self,
        _query: &ListingQuery,
    ) -> Result<Vec<ListingRecord>, ListingStoreError> {
        Ok(Vec::new())
    }

    async fn subscribe(
        &self,
        _query: &ListingQuery,
    ) -> Result<ListingSubscription, ListingStoreError> {
        Ok(Subscription::from_items([Ok(Vec::new())]))
    }

    async fn create(&self, _document: NewListingDocument) -> Result<ListingId, ListingStoreError> {
        Ok(ListingId::random())
    }

    async fn overwrite(
        &self,
        id: &ListingId,
        _fields: ListingFields,
    ) -> Result<(), ListingStoreError> {
        Err(ListingStoreError::missing(id.to_string()))
    }

    async fn get(&self, _id: &ListingId) -> Result<Option<ListingRecord>, ListingStoreError> {
        Ok(None)
    }

    async fn delete(&self, _id: &ListingId) -> Result<(), ListingStoreError> {
        Ok(())
    }

    async fn set_favorite(
        &self,
        id: &ListingId,
        _user: &UserId,
        _favorite: bool,
    ) -> Result<(), ListingStoreError> {
        Err(ListingStoreError::missing(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Price, Title};

    #[tokio::test]
    async fn fixture_store_has_no_documents() {
        let store = FixtureListingStore;
        let records = store
            .fetch_once(&ListingQuery::newest_first())
            .await
            .expect("fixture fetch succeeds");
        assert!(records.is_empty());

        let id = ListingId::new("missing").expect("valid id");
        assert_eq!(store.get(&id).await, Ok(None));
    }

    #[tokio::test]
    async fn fixture_subscription_pushes_one_empty_batch() {
        let mut subscription = FixtureListingStore
            .subscribe(&ListingQuery::newest_first())
            .await
            .expect("fixture subscribe succeeds");
        assert_eq!(subscription.next().await, Some(Ok(Vec::new())));
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn fixture_overwrite_reports_missing_document() {
        let id = ListingId::new("gone").expect("valid id");
        let fields = ListingFields {
            title: Title::new("Lamp").expect("valid title"),
            price: Price::new(3.0).expect("valid price"),
            category: Category::Home,
            image_url: None,
        };
        let error = FixtureListingStore
            .overwrite(&id, fields)
            .await
            .expect_err("missing document");
        assert_eq!(error.kind(), "missing");
    }
}
