//! Listing endpoints.
//!
//! ```text
//! GET    /api/v1/listings?categories=Books,Toys&search=chair&mine=true&favorites=true
//! POST   /api/v1/listings                 {"title","price","category","imageUrl"}
//! PUT    /api/v1/listings/{id}            {"title","price","category","imageUrl"}
//! DELETE /api/v1/listings/{id}?confirm=true
//! PUT    /api/v1/listings/{id}/favorite
//! DELETE /api/v1/listings/{id}/favorite
//! ```
//!
//! The identity comes from the session cookie on every request. Reads work
//! anonymously; mine-only and favorites-only views return an empty page
//! without one.

use std::str::FromStr;

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    ApiResult, Category, CategoryFilter, Confirmation, CreatedListing, Error, FormAction,
    ListingError, ListingForm, ListingId, ListingView, Scope, SearchText, ViewParameters,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// View parameters accepted on the query string.
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingsQuery {
    /// Comma-separated categories; empty or absent means all.
    #[param(example = "Books,Toys")]
    pub categories: Option<String>,
    /// Case-insensitive title substring.
    pub search: Option<String>,
    /// Only the signed-in user's listings. Takes precedence over `favorites`.
    #[serde(default)]
    pub mine: bool,
    /// Only listings the signed-in user favorited.
    #[serde(default)]
    pub favorites: bool,
}

impl ListingsQuery {
    /// Parse into view parameters. Unknown categories are rejected.
    ///
    /// # Examples
    /// ```
    /// use marketplace::domain::{Category, Scope};
    /// use marketplace::inbound::http::listings::ListingsQuery;
    ///
    /// let query = ListingsQuery {
    ///     categories: Some("books, Toys".into()),
    ///     mine: true,
    ///     ..ListingsQuery::default()
    /// };
    /// let params = query.into_params().expect("valid query");
    /// assert_eq!(params.scope, Scope::MineOnly);
    /// assert!(params.categories.contains(Category::Toys));
    /// ```
    pub fn into_params(self) -> Result<ViewParameters, Error> {
        let categories = self
            .categories
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(Category::from_str)
            .collect::<Result<CategoryFilter, _>>()
            .map_err(|err| {
                Error::invalid_request(err.to_string())
                    .with_details(json!({ "field": "categories" }))
            })?;
        Ok(ViewParameters::new(
            Scope::from_flags(self.mine, self.favorites),
            categories,
            self.search.map_or_else(SearchText::none, SearchText::new),
        ))
    }
}

/// Delete confirmation flag. Absent means declined.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// Response to a successful create.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingResponse {
    pub listing_id: String,
    /// What the client should do with its form.
    pub form: FormAction,
}

impl From<CreatedListing> for CreateListingResponse {
    fn from(created: CreatedListing) -> Self {
        Self {
            listing_id: created.id.to_string(),
            form: created.form,
        }
    }
}

/// Response to a delete request.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DeleteListingResponse {
    pub deleted: bool,
}

fn listing_id(raw: String) -> Result<ListingId, Error> {
    ListingId::new(raw).map_err(|err| Error::from(ListingError::from(err)))
}

/// Load the marketplace once.
#[utoipa::path(
    get,
    path = "/api/v1/listings",
    params(ListingsQuery),
    responses(
        (status = 200, description = "Presented listings, newest first", body = [ListingView]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Backend unavailable", body = Error)
    ),
    tags = ["listings"],
    operation_id = "listListings",
    security([])
)]
#[get("/listings")]
pub async fn list_listings(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ListingsQuery>,
) -> ApiResult<web::Json<Vec<ListingView>>> {
    let params = query.into_inner().into_params()?;
    let identity = session.identity()?;
    let views = state.marketplace.load(params, identity).await?;
    Ok(web::Json(views))
}

/// Create a listing authored by the signed-in user.
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    request_body = ListingForm,
    responses(
        (status = 201, description = "Listing created", body = CreateListingResponse),
        (status = 400, description = "Invalid form field", body = Error),
        (status = 401, description = "Sign-in required", body = Error),
        (status = 503, description = "Backend unavailable", body = Error)
    ),
    tags = ["listings"],
    operation_id = "createListing"
)]
#[post("/listings")]
pub async fn create_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Json<ListingForm>,
) -> ApiResult<HttpResponse> {
    let identity = session.identity()?;
    let created = state.listings.create(identity, form.into_inner()).await?;
    Ok(HttpResponse::Created().json(CreateListingResponse::from(created)))
}

/// Replace the editable fields of an owned listing.
#[utoipa::path(
    put,
    path = "/api/v1/listings/{id}",
    params(("id" = String, Path, description = "Listing id")),
    request_body = ListingForm,
    responses(
        (status = 204, description = "Listing updated"),
        (status = 400, description = "Invalid form field", body = Error),
        (status = 401, description = "Sign-in required", body = Error),
        (status = 403, description = "Not the author", body = Error),
        (status = 404, description = "No such listing", body = Error),
        (status = 503, description = "Backend unavailable", body = Error)
    ),
    tags = ["listings"],
    operation_id = "editListing"
)]
#[put("/listings/{id}")]
pub async fn edit_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    form: web::Json<ListingForm>,
) -> ApiResult<HttpResponse> {
    let id = listing_id(path.into_inner())?;
    let identity = session.identity()?;
    state.listings.edit(identity, id, form.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete an owned listing. Nothing happens unless `confirm=true`.
#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    params(("id" = String, Path, description = "Listing id"), DeleteQuery),
    responses(
        (status = 200, description = "Whether the listing was deleted", body = DeleteListingResponse),
        (status = 401, description = "Sign-in required", body = Error),
        (status = 403, description = "Not the author", body = Error),
        (status = 404, description = "No such listing", body = Error),
        (status = 503, description = "Backend unavailable", body = Error)
    ),
    tags = ["listings"],
    operation_id = "deleteListing"
)]
#[delete("/listings/{id}")]
pub async fn delete_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<DeleteQuery>,
) -> ApiResult<web::Json<DeleteListingResponse>> {
    let id = listing_id(path.into_inner())?;
    let identity = session.identity()?;
    let outcome = state
        .listings
        .delete(identity, id, Confirmation::from(query.confirm))
        .await?;
    Ok(web::Json(DeleteListingResponse {
        deleted: outcome.deleted(),
    }))
}

async fn toggle_favorite(
    state: web::Data<HttpState>,
    session: SessionContext,
    raw_id: String,
    favorite: bool,
) -> ApiResult<HttpResponse> {
    let id = listing_id(raw_id)?;
    let identity = session.identity()?;
    state.listings.set_favorite(identity, id, favorite).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Add the listing to the signed-in user's favorites.
#[utoipa::path(
    put,
    path = "/api/v1/listings/{id}/favorite",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Favorited"),
        (status = 401, description = "Sign-in required", body = Error),
        (status = 404, description = "No such listing", body = Error)
    ),
    tags = ["listings"],
    operation_id = "favoriteListing"
)]
#[put("/listings/{id}/favorite")]
pub async fn favorite_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    toggle_favorite(state, session, path.into_inner(), true).await
}

/// Remove the listing from the signed-in user's favorites.
#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}/favorite",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Unfavorited"),
        (status = 401, description = "Sign-in required", body = Error),
        (status = 404, description = "No such listing", body = Error)
    ),
    tags = ["listings"],
    operation_id = "unfavoriteListing"
)]
#[delete("/listings/{id}/favorite")]
pub async fn unfavorite_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    toggle_favorite(state, session, path.into_inner(), false).await
}

#[cfg(test)]
#[path = "listings_tests.rs"]
mod tests;
