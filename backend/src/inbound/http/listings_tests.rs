//! Handler coverage for the listing endpoints.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{App, test};
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{MockListingCommand, MockMarketplaceQuery};
use crate::domain::{DeleteOutcome, UserId};
use crate::inbound::http::test_utils::{session_cookie, sign_in_as, test_session_middleware};

fn state(marketplace: MockMarketplaceQuery, listings: MockListingCommand) -> web::Data<HttpState> {
    let fixtures = HttpState::fixtures();
    web::Data::new(HttpState::new(
        Arc::new(marketplace),
        Arc::new(listings),
        fixtures.accounts,
    ))
}

macro_rules! listings_app {
    ($state:expr) => {
        test::init_service(
            App::new().app_data($state).service(
                web::scope("/api/v1")
                    .wrap(test_session_middleware())
                    .route("/test/sign-in/{user}", web::post().to(sign_in_as))
                    .service(list_listings)
                    .service(create_listing)
                    .service(favorite_listing)
                    .service(unfavorite_listing)
                    .service(edit_listing)
                    .service(delete_listing),
            ),
        )
        .await
    };
}

macro_rules! sign_in {
    ($app:expr, $user:expr) => {{
        let res = test::call_service(
            &$app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/test/sign-in/{}", $user))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        session_cookie(&res).expect("session cookie")
    }};
}

fn view(id: &str) -> ListingView {
    ListingView {
        id: id.to_owned(),
        title: "Desk chair".to_owned(),
        category: "Home".to_owned(),
        price: "$25.00".to_owned(),
        posted_at: Some("2024-03-01 14:05 UTC".to_owned()),
        author_name: "Ada".to_owned(),
        can_mutate: false,
        image_url: None,
        favorite_count: 0,
        is_favorite: false,
    }
}

fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid id")
}

fn with_cookie(request: test::TestRequest, cookie: &Cookie<'static>) -> test::TestRequest {
    request.cookie(cookie.clone())
}

#[rstest]
#[actix_web::test]
async fn list_passes_parsed_parameters_and_anonymous_identity() {
    let mut marketplace = MockMarketplaceQuery::new();
    marketplace
        .expect_load()
        .withf(|params, identity| {
            params.scope == Scope::All
                && params.categories.len() == 2
                && params.categories.contains(Category::Books)
                && params.categories.contains(Category::Toys)
                && params.search.needle() == Some("chair")
                && identity.is_none()
        })
        .times(1)
        .return_once(|_, _| Ok(vec![view("a")]));
    let app = listings_app!(state(marketplace, MockListingCommand::new()));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/listings?categories=books,Toys&search=%20Chair%20")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body[0]["id"], "a");
    assert_eq!(body[0]["authorName"], "Ada");
    assert_eq!(body[0]["canMutate"], false);
}

#[rstest]
#[actix_web::test]
async fn list_reads_identity_from_the_session() {
    let mut marketplace = MockMarketplaceQuery::new();
    marketplace
        .expect_load()
        .withf(|params, identity| {
            params.scope == Scope::FavoritesOnly && identity.as_ref() == Some(&user("uid-7"))
        })
        .times(1)
        .return_once(|_, _| Ok(Vec::new()));
    let app = listings_app!(state(marketplace, MockListingCommand::new()));
    let cookie = sign_in!(app, "uid-7");

    let res = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::get().uri("/api/v1/listings?favorites=true"),
            &cookie,
        )
        .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn unknown_category_is_rejected_before_loading() {
    let mut marketplace = MockMarketplaceQuery::new();
    marketplace.expect_load().never();
    let app = listings_app!(state(marketplace, MockListingCommand::new()));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/listings?categories=Books,Boats")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], "categories");
}

#[rstest]
#[actix_web::test]
async fn backend_outage_surfaces_as_service_unavailable() {
    let mut marketplace = MockMarketplaceQuery::new();
    marketplace
        .expect_load()
        .return_once(|_, _| Err(Error::service_unavailable("listing store unreachable")));
    let app = listings_app!(state(marketplace, MockListingCommand::new()));

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/listings").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[rstest]
#[actix_web::test]
async fn create_returns_the_new_id_and_a_form_reset() {
    let mut listings = MockListingCommand::new();
    listings
        .expect_create()
        .withf(|identity, form| {
            identity.as_ref() == Some(&user("uid-1"))
                && form.title == "Desk chair"
                && form.image_url.is_empty()
        })
        .times(1)
        .return_once(|_, _| {
            Ok(CreatedListing {
                id: ListingId::new("new-id").expect("valid id"),
                form: FormAction::Reset,
            })
        });
    let app = listings_app!(state(MockMarketplaceQuery::new(), listings));
    let cookie = sign_in!(app, "uid-1");

    let res = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/listings"), &cookie)
            .set_json(json!({"title": "Desk chair", "price": "25", "category": "Home"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, json!({"listingId": "new-id", "form": "reset"}));
}

#[rstest]
#[actix_web::test]
async fn create_without_a_session_is_unauthorised() {
    let mut listings = MockListingCommand::new();
    listings
        .expect_create()
        .withf(|identity, _| identity.is_none())
        .return_once(|_, _| Err(Error::unauthorized("sign in to continue")));
    let app = listings_app!(state(MockMarketplaceQuery::new(), listings));

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/listings")
            .set_json(json!({"title": "Lamp", "price": "5", "category": "Home"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn edit_forwards_the_path_id() {
    let mut listings = MockListingCommand::new();
    listings
        .expect_edit()
        .withf(|_, id, form| id.as_ref() == "abc" && form.price == "30")
        .times(1)
        .return_once(|_, _, _| Ok(()));
    let app = listings_app!(state(MockMarketplaceQuery::new(), listings));
    let cookie = sign_in!(app, "uid-1");

    let res = test::call_service(
        &app,
        with_cookie(test::TestRequest::put().uri("/api/v1/listings/abc"), &cookie)
            .set_json(json!({"title": "Lamp", "price": "30", "category": "Home"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[rstest]
#[actix_web::test]
async fn edit_by_someone_else_is_forbidden() {
    let mut listings = MockListingCommand::new();
    listings
        .expect_edit()
        .return_once(|_, _, _| Err(Error::forbidden("only the author can change this listing")));
    let app = listings_app!(state(MockMarketplaceQuery::new(), listings));
    let cookie = sign_in!(app, "uid-2");

    let res = test::call_service(
        &app,
        with_cookie(test::TestRequest::put().uri("/api/v1/listings/abc"), &cookie)
            .set_json(json!({"title": "Lamp", "price": "30", "category": "Home"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_web::test]
async fn overlong_path_id_is_not_found_without_calling_the_gateway() {
    let mut listings = MockListingCommand::new();
    listings.expect_delete().never();
    let app = listings_app!(state(MockMarketplaceQuery::new(), listings));
    let long_id = "x".repeat(200);

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/listings/{long_id}?confirm=true"))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[case::confirmed("?confirm=true", Confirmation::Confirmed, DeleteOutcome::Deleted, true)]
#[case::declined("?confirm=false", Confirmation::Declined, DeleteOutcome::Declined, false)]
#[case::absent("", Confirmation::Declined, DeleteOutcome::Declined, false)]
#[actix_web::test]
async fn delete_reports_whether_anything_was_removed(
    #[case] query: &str,
    #[case] confirmation: Confirmation,
    #[case] outcome: DeleteOutcome,
    #[case] deleted: bool,
) {
    let mut listings = MockListingCommand::new();
    listings
        .expect_delete()
        .withf(move |_, id, given| id.as_ref() == "abc" && *given == confirmation)
        .times(1)
        .return_once(move |_, _, _| Ok(outcome));
    let app = listings_app!(state(MockMarketplaceQuery::new(), listings));
    let cookie = sign_in!(app, "uid-1");

    let res = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::delete().uri(&format!("/api/v1/listings/abc{query}")),
            &cookie,
        )
        .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, json!({ "deleted": deleted }));
}

#[rstest]
#[case::favorite(true)]
#[case::unfavorite(false)]
#[actix_web::test]
async fn favorite_routes_toggle_membership(#[case] favorite: bool) {
    let mut listings = MockListingCommand::new();
    listings
        .expect_set_favorite()
        .withf(move |identity, id, flag| {
            identity.as_ref() == Some(&user("uid-3")) && id.as_ref() == "abc" && *flag == favorite
        })
        .times(1)
        .return_once(|_, _, _| Ok(()));
    let app = listings_app!(state(MockMarketplaceQuery::new(), listings));
    let cookie = sign_in!(app, "uid-3");

    let request = if favorite {
        test::TestRequest::put()
    } else {
        test::TestRequest::delete()
    };
    let res = test::call_service(
        &app,
        with_cookie(request.uri("/api/v1/listings/abc/favorite"), &cookie).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[rstest]
#[actix_web::test]
async fn query_without_flags_is_the_full_marketplace() {
    let params = ListingsQuery::default().into_params().expect("valid query");
    assert_eq!(params, ViewParameters::default());
}
