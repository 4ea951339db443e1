//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint of the inbound HTTP layer, the
//! request and response bodies they use, and the session cookie security
//! scheme. Swagger UI serves it in debug builds and `openapi-dump` prints it
//! for external tooling. The live feed at `/ws/listings` is not part of the
//! document; its frames are the `ListingView` schema wrapped in a
//! `{"type": "listings"}` envelope.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, FormAction, ListingForm, ListingView};
use crate::inbound::http::listings::{CreateListingResponse, DeleteListingResponse};
use crate::inbound::http::users::{LoginRequest, SessionUser, SignUpBody};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login or /api/v1/signup.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Student marketplace API",
        description = "Browse, post, and favorite second-hand listings."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::signup,
        crate::inbound::http::users::logout,
        crate::inbound::http::listings::list_listings,
        crate::inbound::http::listings::create_listing,
        crate::inbound::http::listings::edit_listing,
        crate::inbound::http::listings::delete_listing,
        crate::inbound::http::listings::favorite_listing,
        crate::inbound::http::listings::unfavorite_listing,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        ListingView,
        ListingForm,
        FormAction,
        CreateListingResponse,
        DeleteListingResponse,
        LoginRequest,
        SignUpBody,
        SessionUser
    )),
    tags(
        (name = "users", description = "Sign-in, sign-up, and sign-out"),
        (name = "listings", description = "Marketplace listings and favorites"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
