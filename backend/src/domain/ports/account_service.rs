//! Driving port for sign-in and sign-up.
//!
//! Inbound adapters authenticate through this port and keep the returned
//! identity in their own session state. The identity backend stays behind
//! the port.

use async_trait::async_trait;

use crate::domain::{Credentials, Error, SignUpRequest, UserId};

/// Account use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Validate credentials and return the signed-in identity.
    async fn sign_in(&self, credentials: Credentials) -> Result<UserId, Error>;

    /// Register an account plus its profile and return the new identity.
    async fn sign_up(&self, request: SignUpRequest) -> Result<UserId, Error>;
}

/// Development authenticator: `student@example.com` / `password` signs in.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAccountService;

impl FixtureAccountService {
    const EMAIL: &'static str = "student@example.com";
    const PASSWORD: &'static str = "password";
    const USER_ID: &'static str = "fixture-student";
}

#[async_trait]
impl AccountService for FixtureAccountService {
    async fn sign_in(&self, credentials: Credentials) -> Result<UserId, Error> {
        if credentials.email() == Self::EMAIL && credentials.password() == Self::PASSWORD {
            UserId::new(Self::USER_ID)
                .map_err(|err| Error::internal(format!("invalid fixture user id: {err}")))
        } else {
            Err(Error::unauthorized("invalid credentials"))
        }
    }

    async fn sign_up(&self, _request: SignUpRequest) -> Result<UserId, Error> {
        Err(Error::service_unavailable("sign-up is not available"))
    }
}
