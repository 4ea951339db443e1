//! End-to-end listing flows over the in-memory backend.
//!
//! Each scenario drives the public routes with a real session cookie and
//! checks what a second visitor, or the same one, sees afterwards.

#[path = "support/app.rs"]
mod app;

use actix_http::Request;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use marketplace::inbound::ws::state::OriginPolicy;
use marketplace::outbound::memory::{DEMO_EMAIL, DEMO_PASSWORD};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use app::TestBackend;

#[fixture]
fn backend() -> TestBackend {
    TestBackend::new(OriginPolicy::default())
}

async fn call<S>(app: &S, request: TestRequest, cookie: Option<&Cookie<'static>>) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = match cookie {
        Some(cookie) => request.cookie(cookie.clone()),
        None => request,
    };
    let response = test::call_service(app, request.to_request()).await;
    let status = response.status();
    let body = test::read_body(response).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, value)
}

async fn sign_up<S>(app: &S, email: &str, name: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = test::call_service(
        app,
        TestRequest::post()
            .uri("/api/v1/signup")
            .set_json(json!({"email": email, "password": "secret1", "displayName": name}))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie")
}

fn titles(body: &Value) -> Vec<String> {
    body.as_array()
        .expect("listing array")
        .iter()
        .map(|listing| listing["title"].as_str().expect("title").to_owned())
        .collect()
}

#[rstest]
#[actix_rt::test]
async fn a_seller_posts_edits_and_deletes_a_listing(backend: TestBackend) {
    let app = test::init_service(backend.app()).await;
    let seller = sign_up(&app, "ada@example.edu", "Ada").await;

    let (status, created) = call(
        &app,
        TestRequest::post().uri("/api/v1/listings").set_json(json!({
            "title": " Desk chair ",
            "price": "25",
            "category": "Home"
        })),
        Some(&seller),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["form"], "reset");
    let id = created["listingId"].as_str().expect("listing id").to_owned();

    let (_, mine) = call(&app, TestRequest::get().uri("/api/v1/listings?mine=true"), Some(&seller)).await;
    assert_eq!(titles(&mine), vec!["Desk chair"]);
    assert_eq!(mine[0]["authorName"], "Ada");
    assert_eq!(mine[0]["price"], "$25.00");
    assert_eq!(mine[0]["canMutate"], true);

    let (status, _) = call(
        &app,
        TestRequest::put().uri(&format!("/api/v1/listings/{id}")).set_json(json!({
            "title": "Desk chair",
            "price": "20.5",
            "category": "Home"
        })),
        Some(&seller),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, all) = call(&app, TestRequest::get().uri("/api/v1/listings"), None).await;
    assert_eq!(all[0]["price"], "$20.50");
    assert_eq!(all[0]["canMutate"], false);

    let (status, declined) = call(
        &app,
        TestRequest::delete().uri(&format!("/api/v1/listings/{id}")),
        Some(&seller),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(declined, json!({"deleted": false}));

    let (_, deleted) = call(
        &app,
        TestRequest::delete().uri(&format!("/api/v1/listings/{id}?confirm=true")),
        Some(&seller),
    )
    .await;
    assert_eq!(deleted, json!({"deleted": true}));

    let (_, after) = call(&app, TestRequest::get().uri("/api/v1/listings"), None).await;
    assert!(titles(&after).is_empty());
}

#[rstest]
#[actix_rt::test]
async fn only_the_author_may_change_a_listing(backend: TestBackend) {
    let app = test::init_service(backend.app()).await;
    let seller = sign_up(&app, "ada@example.edu", "Ada").await;
    let buyer = sign_up(&app, "bo@example.edu", "Bo").await;

    let (_, created) = call(
        &app,
        TestRequest::post().uri("/api/v1/listings").set_json(json!({
            "title": "Lamp",
            "price": "5",
            "category": "Home"
        })),
        Some(&seller),
    )
    .await;
    let id = created["listingId"].as_str().expect("listing id").to_owned();

    let (status, body) = call(
        &app,
        TestRequest::delete().uri(&format!("/api/v1/listings/{id}?confirm=true")),
        Some(&buyer),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (_, all) = call(&app, TestRequest::get().uri("/api/v1/listings"), None).await;
    assert_eq!(titles(&all), vec!["Lamp"]);
}

#[rstest]
#[actix_rt::test]
async fn favorites_follow_the_signed_in_user(backend: TestBackend) {
    let app = test::init_service(backend.app()).await;
    let seller = sign_up(&app, "ada@example.edu", "Ada").await;
    let buyer = sign_up(&app, "bo@example.edu", "Bo").await;

    let mut ids = Vec::new();
    for title in ["Calculus", "Poetry"] {
        let (_, created) = call(
            &app,
            TestRequest::post().uri("/api/v1/listings").set_json(json!({
                "title": title,
                "price": "10",
                "category": "Books"
            })),
            Some(&seller),
        )
        .await;
        ids.push(created["listingId"].as_str().expect("listing id").to_owned());
    }

    let (status, _) = call(
        &app,
        TestRequest::put().uri(&format!("/api/v1/listings/{}/favorite", ids[0])),
        Some(&buyer),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, favorites) = call(
        &app,
        TestRequest::get().uri("/api/v1/listings?favorites=true"),
        Some(&buyer),
    )
    .await;
    assert_eq!(titles(&favorites), vec!["Calculus"]);
    assert_eq!(favorites[0]["isFavorite"], true);
    assert_eq!(favorites[0]["favoriteCount"], 1);

    let (_, anonymous) = call(
        &app,
        TestRequest::get().uri("/api/v1/listings?favorites=true"),
        None,
    )
    .await;
    assert!(titles(&anonymous).is_empty());

    call(
        &app,
        TestRequest::delete().uri(&format!("/api/v1/listings/{}/favorite", ids[0])),
        Some(&buyer),
    )
    .await;
    let (_, favorites) = call(
        &app,
        TestRequest::get().uri("/api/v1/listings?favorites=true"),
        Some(&buyer),
    )
    .await;
    assert!(titles(&favorites).is_empty());
}

#[rstest]
#[actix_rt::test]
async fn demo_data_signs_in_and_filters_by_category(backend: TestBackend) {
    backend.memory.seed_demo().await.expect("demo seed");
    let app = test::init_service(backend.app()).await;

    let (status, user) = call(
        &app,
        TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({"email": DEMO_EMAIL, "password": DEMO_PASSWORD})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["userId"], "demo-student");

    let (_, books) = call(
        &app,
        TestRequest::get().uri("/api/v1/listings?categories=Books"),
        None,
    )
    .await;
    assert!(
        books
            .as_array()
            .expect("listing array")
            .iter()
            .all(|listing| listing["category"] == "Books")
    );

    let (_, everything) = call(&app, TestRequest::get().uri("/api/v1/listings"), None).await;
    let legacy = everything
        .as_array()
        .expect("listing array")
        .iter()
        .find(|listing| listing["id"] == "legacy-bike-lock")
        .expect("legacy listing");
    assert_eq!(legacy["authorName"], "Unknown seller");
}

#[rstest]
#[actix_rt::test]
async fn bad_credentials_do_not_start_a_session(backend: TestBackend) {
    backend.memory.seed_demo().await.expect("demo seed");
    let app = test::init_service(backend.app()).await;

    let (status, body) = call(
        &app,
        TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({"email": DEMO_EMAIL, "password": "wrong-password"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}
