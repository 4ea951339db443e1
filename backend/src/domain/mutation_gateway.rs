//! Create, edit, delete, and favorite operations on single listings.
//!
//! Every operation validates before it writes: a rejected form, a missing
//! identity, or a declined confirmation never reaches the store. Backend
//! failures are logged where they are caught and reported as
//! [`ListingError::WriteFailed`] (or [`ListingError::QueryFailed`] for the
//! ownership read); nothing is retried.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::ports::{ListingCommand, ListingStore, ListingStoreError};
use crate::domain::{
    Error, ListingError, ListingForm, ListingId, ListingRecord, NewListingDocument, UserId,
};

/// Explicit yes/no gate in front of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::Declined
        }
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Confirmation was declined; nothing was read or written.
    Declined,
}

impl DeleteOutcome {
    pub fn deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// What the caller should do with its form after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FormAction {
    /// Clear every field.
    Reset,
}

/// Outcome of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedListing {
    pub id: ListingId,
    pub form: FormAction,
}

/// Mutation gateway over a [`ListingStore`].
pub struct MutationGateway<S> {
    store: Arc<S>,
}

impl<S> Clone for MutationGateway<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> MutationGateway<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S> MutationGateway<S>
where
    S: ListingStore,
{
    /// Validate `form` and write a new listing authored by `identity`.
    ///
    /// On success the caller is told to reset its form. On any failure the
    /// form is left alone.
    pub async fn create(
        &self,
        form: &ListingForm,
        identity: Option<&UserId>,
    ) -> Result<CreatedListing, ListingError> {
        let author = identity.ok_or(ListingError::Unauthenticated)?;
        let fields = form.validate()?;
        let document = NewListingDocument {
            fields,
            author_id: author.clone(),
        };
        let id = self
            .store
            .create(document)
            .await
            .map_err(|error| write_failed("create", None, error))?;
        info!(listing_id = %id, author = %author, "listing created");
        Ok(CreatedListing {
            id,
            form: FormAction::Reset,
        })
    }

    /// Validate `form` and replace the editable fields of `id`.
    ///
    /// Identifier, author, and timestamp are untouched.
    pub async fn edit(
        &self,
        id: &ListingId,
        form: &ListingForm,
        identity: Option<&UserId>,
    ) -> Result<(), ListingError> {
        let user = identity.ok_or(ListingError::Unauthenticated)?;
        let fields = form.validate()?;
        self.load_owned(id, user).await?;
        self.store
            .overwrite(id, fields)
            .await
            .map_err(|error| write_failed("edit", Some(id), error))?;
        info!(listing_id = %id, "listing updated");
        Ok(())
    }

    /// Remove `id` once the user has confirmed.
    ///
    /// A declined confirmation returns [`DeleteOutcome::Declined`] without
    /// touching the store.
    pub async fn delete(
        &self,
        id: &ListingId,
        confirmation: Confirmation,
        identity: Option<&UserId>,
    ) -> Result<DeleteOutcome, ListingError> {
        if confirmation == Confirmation::Declined {
            return Ok(DeleteOutcome::Declined);
        }
        let user = identity.ok_or(ListingError::Unauthenticated)?;
        self.load_owned(id, user).await?;
        self.store
            .delete(id)
            .await
            .map_err(|error| write_failed("delete", Some(id), error))?;
        info!(listing_id = %id, "listing deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Add or remove the current user from the listing's favorites.
    pub async fn set_favorite(
        &self,
        id: &ListingId,
        favorite: bool,
        identity: Option<&UserId>,
    ) -> Result<(), ListingError> {
        let user = identity.ok_or(ListingError::Unauthenticated)?;
        self.store
            .set_favorite(id, user, favorite)
            .await
            .map_err(|error| write_failed("favorite", Some(id), error))
    }

    async fn load_owned(&self, id: &ListingId, user: &UserId) -> Result<ListingRecord, ListingError> {
        let record = self
            .store
            .get(id)
            .await
            .map_err(|error| {
                warn!(listing_id = %id, kind = error.kind(), %error, "listing lookup failed");
                ListingError::QueryFailed {
                    message: error.to_string(),
                }
            })?
            .ok_or_else(|| ListingError::NotFound { id: id.to_string() })?;
        if !record.is_authored_by(user) {
            return Err(ListingError::Forbidden { id: id.to_string() });
        }
        Ok(record)
    }
}

fn write_failed(operation: &str, id: Option<&ListingId>, error: ListingStoreError) -> ListingError {
    if let (ListingStoreError::Missing { .. }, Some(id)) = (&error, id) {
        return ListingError::NotFound { id: id.to_string() };
    }
    warn!(
        operation,
        listing_id = id.map(tracing::field::display),
        kind = error.kind(),
        %error,
        "listing write failed"
    );
    ListingError::WriteFailed {
        message: error.to_string(),
    }
}

#[async_trait]
impl<S> ListingCommand for MutationGateway<S>
where
    S: ListingStore,
{
    async fn create(
        &self,
        identity: Option<UserId>,
        form: ListingForm,
    ) -> Result<CreatedListing, Error> {
        MutationGateway::create(self, &form, identity.as_ref())
            .await
            .map_err(Error::from)
    }

    async fn edit(
        &self,
        identity: Option<UserId>,
        id: ListingId,
        form: ListingForm,
    ) -> Result<(), Error> {
        MutationGateway::edit(self, &id, &form, identity.as_ref())
            .await
            .map_err(Error::from)
    }

    async fn delete(
        &self,
        identity: Option<UserId>,
        id: ListingId,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, Error> {
        MutationGateway::delete(self, &id, confirmation, identity.as_ref())
            .await
            .map_err(Error::from)
    }

    async fn set_favorite(
        &self,
        identity: Option<UserId>,
        id: ListingId,
        favorite: bool,
    ) -> Result<(), Error> {
        MutationGateway::set_favorite(self, &id, favorite, identity.as_ref())
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
#[path = "mutation_gateway_tests.rs"]
mod tests;
