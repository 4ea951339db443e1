//! Driving port for listing mutations.

use async_trait::async_trait;

use crate::domain::{
    Confirmation, CreatedListing, DeleteOutcome, Error, FormAction, ListingForm, ListingId, UserId,
};

/// User-triggered listing actions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingCommand: Send + Sync {
    /// Submit the create form.
    async fn create(
        &self,
        identity: Option<UserId>,
        form: ListingForm,
    ) -> Result<CreatedListing, Error>;

    /// Submit the edit form for an existing listing.
    async fn edit(
        &self,
        identity: Option<UserId>,
        id: ListingId,
        form: ListingForm,
    ) -> Result<(), Error>;

    /// Delete behind a confirmation gate.
    async fn delete(
        &self,
        identity: Option<UserId>,
        id: ListingId,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, Error>;

    /// Favorite or unfavorite a listing.
    async fn set_favorite(
        &self,
        identity: Option<UserId>,
        id: ListingId,
        favorite: bool,
    ) -> Result<(), Error>;
}

/// Command port that accepts everything without a backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureListingCommand;

#[async_trait]
impl ListingCommand for FixtureListingCommand {
    async fn create(
        &self,
        identity: Option<UserId>,
        form: ListingForm,
    ) -> Result<CreatedListing, Error> {
        if identity.is_none() {
            return Err(Error::unauthorized("sign in to continue"));
        }
        form.validate().map_err(Error::from)?;
        Ok(CreatedListing {
            id: ListingId::random(),
            form: FormAction::Reset,
        })
    }

    async fn edit(
        &self,
        _identity: Option<UserId>,
        _id: ListingId,
        _form: ListingForm,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn delete(
        &self,
        _identity: Option<UserId>,
        _id: ListingId,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, Error> {
        Ok(match confirmation {
            Confirmation::Confirmed => DeleteOutcome::Deleted,
            Confirmation::Declined => DeleteOutcome::Declined,
        })
    }

    async fn set_favorite(
        &self,
        _identity: Option<UserId>,
        _id: ListingId,
        _favorite: bool,
    ) -> Result<(), Error> {
        Ok(())
    }
}
