//! Account endpoints.
//!
//! ```text
//! POST /api/v1/login  {"email":"ada@example.edu","password":"secret1"}
//! POST /api/v1/signup {"email":"ada@example.edu","password":"secret1","displayName":"Ada"}
//! POST /api/v1/logout
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{ApiResult, Credentials, Error, SignUpRequest, UserId, UserValidationError};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /api/v1/signup`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpBody {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Identity established by login or sign-up.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: String,
}

impl From<UserId> for SessionUser {
    fn from(id: UserId) -> Self {
        Self {
            user_id: id.to_string(),
        }
    }
}

fn map_validation_error(err: UserValidationError) -> Error {
    let field = match err {
        UserValidationError::InvalidEmail => "email",
        UserValidationError::EmptyPassword | UserValidationError::PasswordTooShort { .. } => {
            "password"
        }
        UserValidationError::EmptyDisplayName | UserValidationError::DisplayNameTooLong { .. } => {
            "displayName"
        }
        UserValidationError::EmptyId
        | UserValidationError::IdContainsWhitespace
        | UserValidationError::IdTooLong { .. } => "userId",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

/// Sign in and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionUser,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Identity backend unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<SessionUser>> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials = Credentials::try_from_parts(&email, &password).map_err(map_validation_error)?;
    let user_id = state.accounts.sign_in(credentials).await?;
    session.persist_user(&user_id)?;
    Ok(web::Json(user_id.into()))
}

/// Create an account with a display name and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignUpBody,
    responses(
        (status = 201, description = "Account created", body = SessionUser),
        (status = 400, description = "Invalid request or email taken", body = Error),
        (status = 503, description = "Identity backend unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "signUp",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignUpBody>,
) -> ApiResult<HttpResponse> {
    let SignUpBody {
        email,
        password,
        display_name,
    } = payload.into_inner();
    let request = SignUpRequest::try_from_parts(&email, &password, &display_name)
        .map_err(map_validation_error)?;
    let user_id = state.accounts.sign_up(request).await?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::Created().json(SessionUser::from(user_id)))
}

/// End the session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Signed out")),
    tags = ["users"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}
