//! Port for the hosted identity backend.

use async_trait::async_trait;

use crate::domain::{Credentials, SignUpRequest, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity adapters.
    pub enum AuthServiceError {
        /// Unknown email or wrong password.
        InvalidCredentials => "invalid credentials",
        /// An account already exists for the email.
        EmailTaken => "email already registered",
        /// The identity backend could not be reached.
        Connection { message: String } =>
            "identity backend connection failed: {message}",
        /// The identity backend rejected the request for another reason.
        Rejected { message: String } =>
            "identity backend rejected the request: {message}",
    }
}

/// Email/password authentication against the identity backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check credentials and return the account's identity.
    async fn sign_in(&self, credentials: &Credentials) -> Result<UserId, AuthServiceError>;

    /// Register a new account and return its identity.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<UserId, AuthServiceError>;
}

/// Identity backend that rejects every sign-in and refuses sign-ups.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAuthService;

#[async_trait]
impl AuthService for FixtureAuthService {
    async fn sign_in(&self, _credentials: &Credentials) -> Result<UserId, AuthServiceError> {
        Err(AuthServiceError::invalid_credentials())
    }

    async fn sign_up(&self, _request: &SignUpRequest) -> Result<UserId, AuthServiceError> {
        Err(AuthServiceError::rejected("sign-up disabled"))
    }
}
