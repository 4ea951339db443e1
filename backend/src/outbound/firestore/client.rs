//! Reqwest-backed Firestore document store.
//!
//! This adapter owns transport details only: request serialisation, HTTP
//! error mapping, and decoding documents into domain records. Standing
//! queries are served by polling `runQuery` and pushing a batch only when the
//! decoded result set differs from the previous one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, debug_span, warn};

use super::dto::{
    CommitRequest, Document, DocumentMask, DocumentTransform, EDITABLE_FIELDS, ErrorEnvelope,
    FIELD_FAVORITES, FIELD_TIMESTAMP, FIELD_USER_ID, FieldTransform, LISTINGS, PROFILES,
    Precondition, RunQueryRequest, RunQueryResponseItem, StructuredQuery, Value, Write,
    listing_fields, profile_fields,
};
use crate::domain::ports::{
    ListingStore, ListingStoreError, ListingSubscription, ProfileStore, ProfileStoreError,
    SUBSCRIPTION_BUFFER, Subscription,
};
use crate::domain::{
    ListingFields, ListingId, ListingQuery, ListingRecord, NewListingDocument, UserId,
    UserProfile,
};

/// Public Firestore REST endpoint.
pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1/";
/// Default delay between polls of a standing query.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Connection settings for one Firestore database.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: Option<String>,
    pub base_url: Url,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

/// Transport-level failure, before it is mapped into a port error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum TransportError {
    Unreachable(String),
    Status { status: StatusCode, message: String },
    Decode(String),
}

impl TransportError {
    fn into_listing_error(self) -> ListingStoreError {
        match self {
            Self::Unreachable(message) => ListingStoreError::connection(message),
            Self::Decode(message) => ListingStoreError::decode(message),
            Self::Status { status, message } => match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ListingStoreError::denied(message)
                }
                StatusCode::TOO_MANY_REQUESTS
                | StatusCode::REQUEST_TIMEOUT
                | StatusCode::GATEWAY_TIMEOUT
                | StatusCode::SERVICE_UNAVAILABLE => ListingStoreError::connection(message),
                _ => ListingStoreError::query(message),
            },
        }
    }

    fn into_profile_error(self) -> ProfileStoreError {
        match self {
            Self::Unreachable(message) => ProfileStoreError::connection(message),
            Self::Decode(message) => ProfileStoreError::query(message),
            Self::Status { message, .. } => ProfileStoreError::query(message),
        }
    }

    fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

struct Inner {
    http: Client,
    base_url: Url,
    database: String,
    api_key: Option<String>,
    poll_interval: Duration,
}

impl Inner {
    fn documents_root(&self) -> String {
        format!("{}/documents", self.database)
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.documents_root())
    }

    fn url(&self, resource: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(resource)
            .map_err(|error| TransportError::Unreachable(format!("invalid resource url: {error}")))
    }

    fn request(&self, method: Method, resource: &str) -> Result<RequestBuilder, TransportError> {
        let mut builder = self.http.request(method, self.url(resource)?);
        if let Some(key) = &self.api_key {
            builder = builder.query(&[("key", key.as_str())]);
        }
        Ok(builder.header(reqwest::header::ACCEPT, "application/json"))
    }

    async fn send<T>(&self, builder: RequestBuilder) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
    {
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        serde_json::from_slice(&body)
            .map_err(|error| TransportError::Decode(format!("invalid Firestore payload: {error}")))
    }

    async fn post<B, T>(&self, resource: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, resource)?.json(body))
            .await
    }

    async fn run_query(&self, query: StructuredQuery) -> Result<Vec<Document>, TransportError> {
        let resource = format!("{}:runQuery", self.documents_root());
        let items: Vec<RunQueryResponseItem> = self
            .post(
                &resource,
                &RunQueryRequest {
                    structured_query: query,
                },
            )
            .await?;
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<(), TransportError> {
        let resource = format!("{}:commit", self.documents_root());
        let _: serde_json::Value = self.post(&resource, &CommitRequest { writes }).await?;
        Ok(())
    }

    async fn fetch_listings(
        &self,
        query: &ListingQuery,
    ) -> Result<Vec<ListingRecord>, ListingStoreError> {
        let documents = self
            .run_query(StructuredQuery::listings(query.filter()))
            .await
            .map_err(TransportError::into_listing_error)?;
        let mut records = decode_listings(documents);
        query.sort(&mut records);
        Ok(records)
    }
}

/// Decode every document, skipping the ones that do not validate.
fn decode_listings(documents: Vec<Document>) -> Vec<ListingRecord> {
    documents
        .into_iter()
        .filter_map(|document| {
            let name = document.name.clone();
            match document.into_listing() {
                Ok(record) => Some(record),
                Err(reason) => {
                    warn!(document = %name, %reason, "skipping malformed listing");
                    None
                }
            }
        })
        .collect()
}

/// Firestore-backed listings and profiles collections.
#[derive(Clone)]
pub struct FirestoreStore {
    inner: Arc<Inner>,
}

impl FirestoreStore {
    /// Build an adapter using a reqwest client with an explicit request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: FirestoreConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url,
                database: format!("projects/{}/databases/(default)", config.project_id),
                api_key: config.api_key,
                poll_interval: config.poll_interval,
            }),
        })
    }
}

#[async_trait]
impl ListingStore for FirestoreStore {
    async fn fetch_once(
        &self,
        query: &ListingQuery,
    ) -> Result<Vec<ListingRecord>, ListingStoreError> {
        self.inner.fetch_listings(query).await
    }

    async fn subscribe(
        &self,
        query: &ListingQuery,
    ) -> Result<ListingSubscription, ListingStoreError> {
        let (subscription, mut sink) = Subscription::channel(SUBSCRIPTION_BUFFER);
        let inner = Arc::clone(&self.inner);
        let query = query.clone();

        let span = debug_span!("firestore_subscription", filter = ?query.filter());
        tokio::spawn(
            async move {
                let mut last: Option<Result<Vec<ListingRecord>, ListingStoreError>> = None;
                loop {
                    let Some(current) = sink.until_released(inner.fetch_listings(&query)).await
                    else {
                        break;
                    };
                    if last.as_ref() != Some(&current) {
                        if let Err(error) = &current {
                            warn!(kind = error.kind(), %error, "standing query failed");
                        }
                        if !sink.send(current.clone()).await {
                            break;
                        }
                        last = Some(current);
                    }
                    if sink
                        .until_released(tokio::time::sleep(inner.poll_interval))
                        .await
                        .is_none()
                    {
                        break;
                    }
                }
                debug!("subscription released");
            }
            .instrument(span),
        );
        Ok(subscription)
    }

    async fn create(&self, document: NewListingDocument) -> Result<ListingId, ListingStoreError> {
        let id = ListingId::random();
        let mut fields = listing_fields(&document.fields);
        fields.insert(
            FIELD_USER_ID.to_owned(),
            Value::string(document.author_id.as_ref()),
        );
        fields.insert(
            FIELD_FAVORITES.to_owned(),
            Value::ArrayValue(Default::default()),
        );
        let write = Write {
            update: Some(Document {
                name: self.inner.document_name(LISTINGS, id.as_ref()),
                fields,
            }),
            update_transforms: vec![FieldTransform::request_time(FIELD_TIMESTAMP)],
            current_document: Some(Precondition { exists: false }),
            ..Write::default()
        };
        self.inner
            .commit(vec![write])
            .await
            .map_err(TransportError::into_listing_error)?;
        debug!(listing_id = %id, "listing created");
        Ok(id)
    }

    async fn overwrite(
        &self,
        id: &ListingId,
        fields: ListingFields,
    ) -> Result<(), ListingStoreError> {
        let write = Write {
            update: Some(Document {
                name: self.inner.document_name(LISTINGS, id.as_ref()),
                fields: listing_fields(&fields),
            }),
            update_mask: Some(DocumentMask {
                field_paths: EDITABLE_FIELDS.iter().map(|f| (*f).to_owned()).collect(),
            }),
            current_document: Some(Precondition { exists: true }),
            ..Write::default()
        };
        self.inner
            .commit(vec![write])
            .await
            .map_err(|error| missing_or(error, id))
    }

    async fn get(&self, id: &ListingId) -> Result<Option<ListingRecord>, ListingStoreError> {
        let resource = self.inner.document_name(LISTINGS, id.as_ref());
        let request = self
            .inner
            .request(Method::GET, &resource)
            .map_err(TransportError::into_listing_error)?;
        match self.inner.send::<Document>(request).await {
            Ok(document) => document
                .into_listing()
                .map(Some)
                .map_err(ListingStoreError::decode),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error.into_listing_error()),
        }
    }

    async fn delete(&self, id: &ListingId) -> Result<(), ListingStoreError> {
        let resource = self.inner.document_name(LISTINGS, id.as_ref());
        let request = self
            .inner
            .request(Method::DELETE, &resource)
            .map_err(TransportError::into_listing_error)?;
        let _: serde_json::Value = self
            .inner
            .send(request)
            .await
            .map_err(TransportError::into_listing_error)?;
        Ok(())
    }

    async fn set_favorite(
        &self,
        id: &ListingId,
        user: &UserId,
        favorite: bool,
    ) -> Result<(), ListingStoreError> {
        let write = Write {
            transform: Some(DocumentTransform {
                document: self.inner.document_name(LISTINGS, id.as_ref()),
                field_transforms: vec![FieldTransform::array_toggle(
                    FIELD_FAVORITES,
                    Value::string(user.as_ref()),
                    favorite,
                )],
            }),
            current_document: Some(Precondition { exists: true }),
            ..Write::default()
        };
        self.inner
            .commit(vec![write])
            .await
            .map_err(|error| missing_or(error, id))
    }
}

#[async_trait]
impl ProfileStore for FirestoreStore {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserProfile>, ProfileStoreError> {
        let documents = self
            .inner
            .run_query(StructuredQuery::profiles_of(user_id))
            .await
            .map_err(TransportError::into_profile_error)?;
        Ok(documents
            .into_iter()
            .filter_map(|document| match document.into_profile() {
                Ok(profile) => Some(profile),
                Err(reason) => {
                    warn!(user_id = %user_id, %reason, "skipping malformed profile");
                    None
                }
            })
            .collect())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), ProfileStoreError> {
        let write = Write {
            update: Some(Document {
                name: self
                    .inner
                    .document_name(PROFILES, profile.user_id.as_ref()),
                fields: profile_fields(profile),
            }),
            ..Write::default()
        };
        self.inner
            .commit(vec![write])
            .await
            .map_err(TransportError::into_profile_error)
    }
}

/// A failed precondition on an addressed document means it is gone.
fn missing_or(error: TransportError, id: &ListingId) -> ListingStoreError {
    match &error {
        TransportError::Status { status, .. }
            if *status == StatusCode::NOT_FOUND || *status == StatusCode::PRECONDITION_FAILED =>
        {
            ListingStoreError::missing(id.to_string())
        }
        _ => error.into_listing_error(),
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    TransportError::Unreachable(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> TransportError {
    let detail = serde_json::from_slice::<ErrorEnvelope>(body)
        .map(|envelope| format!("{} {}", envelope.error.status, envelope.error.message))
        .unwrap_or_else(|_| body_preview(body));
    let detail = detail.trim();
    let message = if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), detail)
    };
    TransportError::Status { status, message }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
