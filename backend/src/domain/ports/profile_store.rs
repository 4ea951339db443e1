//! Port for the hosted profiles collection.

use async_trait::async_trait;

use crate::domain::{UserId, UserProfile};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile store adapters.
    pub enum ProfileStoreError {
        /// The backend could not be reached.
        Connection { message: String } =>
            "profile store connection failed: {message}",
        /// The lookup or write failed.
        Query { message: String } =>
            "profile store query failed: {message}",
    }
}

/// Backend access to user profiles.
///
/// At most one profile is expected per identity, but the lookup returns every
/// match and callers use the first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Equality lookup on the profile's user id.
    async fn find_by_user_id(&self, user_id: &UserId)
    -> Result<Vec<UserProfile>, ProfileStoreError>;

    /// Create or replace the profile for `profile.user_id`.
    async fn save_profile(&self, profile: &UserProfile) -> Result<(), ProfileStoreError>;
}

/// Store with no profiles.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProfileStore;

#[async_trait]
impl ProfileStore for FixtureProfileStore {
    async fn find_by_user_id(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<UserProfile>, ProfileStoreError> {
        Ok(Vec::new())
    }

    async fn save_profile(&self, _profile: &UserProfile) -> Result<(), ProfileStoreError> {
        Ok(())
    }
}
