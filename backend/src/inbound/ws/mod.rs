//! WebSocket inbound adapter for the live listings feed.
//!
//! Responsibilities:
//! - validate upgrade requests against the origin allow-list
//! - open a [`MarketplaceFeed`](crate::domain::ports::MarketplaceFeed) for
//!   the requested view and the session identity
//! - hand the socket to the per-connection loop, which owns the feed

use actix_web::http::header::{HeaderValue, ORIGIN};
use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::{error, info, warn};
use url::Url;

use crate::inbound::http::listings::ListingsQuery;
use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod state;

use self::state::{OriginPolicy, WsState};

/// Upgrade to a live listings feed.
///
/// Accepts the same query parameters as `GET /api/v1/listings`. Each frame
/// carries the full presented result set.
#[get("/listings")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    req: HttpRequest,
    stream: Payload,
    session: SessionContext,
    query: web::Query<ListingsQuery>,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(&state.origins, origin_header)?;

    let params = query.into_inner().into_params()?;
    let identity = session.identity()?;
    let feed = state.feed.watch(params, identity).await?;

    let (response, ws_session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;
    info!("listing feed opened");
    actix_web::rt::spawn(session::run_feed_session(feed, ws_session, messages));
    Ok(response)
}

fn validate_origin(policy: &OriginPolicy, origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = origin_header.to_str().map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as string");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;
    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if policy.allows(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}
