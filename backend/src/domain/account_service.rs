//! Sign-in and sign-up use-cases.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{AccountService, AuthService, AuthServiceError, ProfileStore};
use crate::domain::{Credentials, Error, SignUpRequest, UserId, UserProfile};

/// Account service over the identity backend and the profiles collection.
pub struct IdentityService<A, P> {
    auth: Arc<A>,
    profiles: Arc<P>,
}

impl<A, P> IdentityService<A, P> {
    pub fn new(auth: Arc<A>, profiles: Arc<P>) -> Self {
        Self { auth, profiles }
    }
}

fn map_auth_error(error: AuthServiceError) -> Error {
    match error {
        AuthServiceError::InvalidCredentials => Error::unauthorized("invalid credentials"),
        AuthServiceError::EmailTaken => Error::invalid_request("email already registered")
            .with_details(serde_json::json!({ "field": "email" })),
        AuthServiceError::Connection { message } => {
            warn!(%message, "identity backend unreachable");
            Error::service_unavailable("identity backend unavailable")
        }
        AuthServiceError::Rejected { message } => {
            warn!(%message, "identity backend rejected request");
            Error::invalid_request(message)
        }
    }
}

#[async_trait]
impl<A, P> AccountService for IdentityService<A, P>
where
    A: AuthService,
    P: ProfileStore,
{
    async fn sign_in(&self, credentials: Credentials) -> Result<UserId, Error> {
        let user_id = self
            .auth
            .sign_in(&credentials)
            .await
            .map_err(map_auth_error)?;
        info!(user_id = %user_id, "signed in");
        Ok(user_id)
    }

    /// Create the account, then its profile.
    ///
    /// A failed profile write does not undo the account: the user is signed
    /// up and their listings show the raw id until a profile exists.
    async fn sign_up(&self, request: SignUpRequest) -> Result<UserId, Error> {
        let user_id = self.auth.sign_up(&request).await.map_err(map_auth_error)?;
        let profile = UserProfile::new(user_id.clone(), request.display_name.clone());
        if let Err(error) = self.profiles.save_profile(&profile).await {
            warn!(user_id = %user_id, kind = error.kind(), %error, "profile write failed after sign-up");
        }
        info!(user_id = %user_id, "account created");
        Ok(user_id)
    }
}
