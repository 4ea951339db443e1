//! Identity Toolkit REST adapter for email and password accounts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{AuthService, AuthServiceError};
use crate::domain::{Credentials, SignUpRequest, UserId};

/// Public Identity Toolkit endpoint.
pub const DEFAULT_AUTH_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1/";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Identity backend reached over the Identity Toolkit REST API.
pub struct IdentityToolkitAuth {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl IdentityToolkitAuth {
    /// Build an adapter using a reqwest client with an explicit request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    async fn call(
        &self,
        action: &str,
        credentials: &Credentials,
    ) -> Result<UserId, AuthServiceError> {
        // The leading "./" keeps "accounts:" from parsing as a URL scheme.
        let url = self
            .base_url
            .join(&format!("./accounts:{action}"))
            .map_err(|error| AuthServiceError::connection(format!("invalid auth url: {error}")))?;
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email: credentials.email(),
                password: credentials.password(),
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|error| AuthServiceError::connection(error.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| AuthServiceError::connection(error.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        let account: AccountResponse = serde_json::from_slice(&body).map_err(|error| {
            AuthServiceError::rejected(format!("invalid identity payload: {error}"))
        })?;
        UserId::new(account.local_id)
            .map_err(|error| AuthServiceError::rejected(format!("invalid account id: {error}")))
    }
}

#[async_trait]
impl AuthService for IdentityToolkitAuth {
    async fn sign_in(&self, credentials: &Credentials) -> Result<UserId, AuthServiceError> {
        self.call("signInWithPassword", credentials).await
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<UserId, AuthServiceError> {
        let user_id = self.call("signUp", &request.credentials).await?;
        debug!(user_id = %user_id, "identity account created");
        Ok(user_id)
    }
}

/// Map an Identity Toolkit failure. The error code is the leading token of
/// the message, optionally followed by " : detail".
fn map_status_error(status: StatusCode, body: &[u8]) -> AuthServiceError {
    let message = serde_json::from_slice::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_default();
    let code = message.split(" : ").next().unwrap_or_default().trim();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AuthServiceError::invalid_credentials()
        }
        "EMAIL_EXISTS" => AuthServiceError::email_taken(),
        _ if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            AuthServiceError::connection(format!("status {}: {message}", status.as_u16()))
        }
        "" => AuthServiceError::rejected(format!("status {}", status.as_u16())),
        _ => AuthServiceError::rejected(message),
    }
}
