//! In-memory profiles collection and identity backend.

use std::collections::HashMap;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::ports::{AuthService, AuthServiceError, ProfileStore, ProfileStoreError};
use crate::domain::{Credentials, SignUpRequest, UserId, UserProfile};

/// Profiles held in process memory, at most one per user.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<Vec<UserProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserProfile>, ProfileStoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles
            .iter()
            .filter(|profile| &profile.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), ProfileStoreError> {
        let mut profiles = self.profiles.write().await;
        match profiles.iter_mut().find(|p| p.user_id == profile.user_id) {
            Some(existing) => *existing = profile.clone(),
            None => profiles.push(profile.clone()),
        }
        Ok(())
    }
}

struct Account {
    user_id: UserId,
    /// Argon2id PHC string; salt and parameters are embedded.
    password_hash: String,
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(error) => Err(error),
    }
}

/// Email and password accounts held in process memory.
///
/// Passwords are stored as Argon2id hashes. Accounts do not survive a
/// restart.
#[derive(Default)]
pub struct MemoryAuthService {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAuthService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account with a fixed user id, replacing any account
    /// under the same email.
    pub async fn register(
        &self,
        credentials: &Credentials,
        user_id: UserId,
    ) -> Result<(), AuthServiceError> {
        let password_hash = hash_password(credentials.password()).map_err(|error| {
            warn!(%error, "password hashing failed");
            AuthServiceError::rejected("password could not be stored")
        })?;
        self.accounts.write().await.insert(
            credentials.email().to_owned(),
            Account {
                user_id,
                password_hash,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl AuthService for MemoryAuthService {
    async fn sign_in(&self, credentials: &Credentials) -> Result<UserId, AuthServiceError> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(credentials.email())
            .ok_or_else(AuthServiceError::invalid_credentials)?;
        let verified =
            verify_password(credentials.password(), &account.password_hash).map_err(|error| {
                warn!(%error, "stored password hash is unreadable");
                AuthServiceError::invalid_credentials()
            })?;
        if !verified {
            return Err(AuthServiceError::invalid_credentials());
        }
        Ok(account.user_id.clone())
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<UserId, AuthServiceError> {
        let email = request.credentials.email();
        if self.accounts.read().await.contains_key(email) {
            return Err(AuthServiceError::email_taken());
        }
        let user_id = UserId::random();
        self.register(&request.credentials, user_id.clone()).await?;
        debug!(user_id = %user_id, "account registered");
        Ok(user_id)
    }
}
