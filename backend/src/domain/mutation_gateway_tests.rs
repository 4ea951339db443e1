//! Tests for the listing mutation gateway.

use std::collections::BTreeSet;
use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::MockListingStore;
use crate::domain::{Category, ErrorCode, Price, Title};

#[fixture]
fn seller() -> UserId {
    UserId::new("seller").expect("valid id")
}

#[fixture]
fn listing_id() -> ListingId {
    ListingId::new("listing-1").expect("valid id")
}

fn stored(id: &ListingId, author: Option<UserId>) -> ListingRecord {
    ListingRecord {
        id: id.clone(),
        title: Title::new("Lamp").expect("valid title"),
        price: Price::new(4.0).expect("valid price"),
        category: Category::Home,
        author_id: author,
        created_at: None,
        image_url: None,
        favorites: BTreeSet::new(),
    }
}

fn gateway(store: MockListingStore) -> MutationGateway<MockListingStore> {
    MutationGateway::new(Arc::new(store))
}

#[rstest]
#[tokio::test]
async fn create_writes_validated_fields_and_resets_form(seller: UserId) {
    let mut store = MockListingStore::new();
    let expected_author = seller.clone();
    store
        .expect_create()
        .times(1)
        .withf(move |doc| {
            doc.author_id == expected_author
                && doc.fields.title.as_ref() == "Desk chair"
                && doc.fields.price.amount() == 25.5
                && doc.fields.category == Category::Home
        })
        .return_once(|_| Ok(ListingId::new("new-id").expect("valid id")));

    let form = ListingForm::new(" Desk chair ", "25.5", "Home");
    let created = gateway(store)
        .create(&form, Some(&seller))
        .await
        .expect("create succeeds");

    assert_eq!(created.id.as_ref(), "new-id");
    assert_eq!(created.form, FormAction::Reset);
}

#[rstest]
#[case("abc")]
#[case("-1")]
#[case("")]
#[tokio::test]
async fn create_rejects_invalid_price_without_writing(seller: UserId, #[case] price: &str) {
    let mut store = MockListingStore::new();
    store.expect_create().never();

    let form = ListingForm::new("Lamp", price, "Home");
    let error = gateway(store)
        .create(&form, Some(&seller))
        .await
        .expect_err("invalid price");

    assert!(matches!(error, ListingError::InvalidPrice { .. }));
}

#[rstest]
#[tokio::test]
async fn create_requires_identity() {
    let mut store = MockListingStore::new();
    store.expect_create().never();

    let form = ListingForm::new("Lamp", "3", "Home");
    let error = gateway(store)
        .create(&form, None)
        .await
        .expect_err("unauthenticated");
    assert_eq!(error, ListingError::Unauthenticated);
}

#[rstest]
#[tokio::test]
async fn create_reports_write_failures(seller: UserId) {
    let mut store = MockListingStore::new();
    store
        .expect_create()
        .times(1)
        .return_once(|_| Err(ListingStoreError::connection("offline")));

    let form = ListingForm::new("Lamp", "3", "Home");
    let error = gateway(store)
        .create(&form, Some(&seller))
        .await
        .expect_err("write fails");
    assert!(matches!(error, ListingError::WriteFailed { .. }));
}

#[rstest]
#[tokio::test]
async fn edit_overwrites_owned_listing(seller: UserId, listing_id: ListingId) {
    let mut store = MockListingStore::new();
    let record = stored(&listing_id, Some(seller.clone()));
    store
        .expect_get()
        .times(1)
        .return_once(move |_| Ok(Some(record)));
    store
        .expect_overwrite()
        .times(1)
        .withf(|_, fields| fields.title.as_ref() == "Desk lamp" && fields.price.amount() == 6.0)
        .return_once(|_, _| Ok(()));

    let form = ListingForm::new("Desk lamp", "6", "Electronics");
    gateway(store)
        .edit(&listing_id, &form, Some(&seller))
        .await
        .expect("edit succeeds");
}

#[rstest]
#[case(Some("someone-else"))]
#[case(None)]
#[tokio::test]
async fn edit_rejects_non_authors(
    seller: UserId,
    listing_id: ListingId,
    #[case] author: Option<&str>,
) {
    let mut store = MockListingStore::new();
    let record = stored(
        &listing_id,
        author.map(|id| UserId::new(id).expect("valid id")),
    );
    store
        .expect_get()
        .times(1)
        .return_once(move |_| Ok(Some(record)));
    store.expect_overwrite().never();

    let form = ListingForm::new("Lamp", "6", "Home");
    let error = gateway(store)
        .edit(&listing_id, &form, Some(&seller))
        .await
        .expect_err("forbidden");
    assert!(matches!(error, ListingError::Forbidden { .. }));
}

#[rstest]
#[tokio::test]
async fn edit_validates_before_reading(seller: UserId, listing_id: ListingId) {
    let mut store = MockListingStore::new();
    store.expect_get().never();
    store.expect_overwrite().never();

    let form = ListingForm::new("Lamp", "-2", "Home");
    let error = gateway(store)
        .edit(&listing_id, &form, Some(&seller))
        .await
        .expect_err("invalid price");
    assert!(matches!(error, ListingError::InvalidPrice { .. }));
}

#[rstest]
#[tokio::test]
async fn edit_of_missing_listing_is_not_found(seller: UserId, listing_id: ListingId) {
    let mut store = MockListingStore::new();
    store.expect_get().times(1).return_once(|_| Ok(None));

    let form = ListingForm::new("Lamp", "6", "Home");
    let error = gateway(store)
        .edit(&listing_id, &form, Some(&seller))
        .await
        .expect_err("not found");
    assert!(matches!(error, ListingError::NotFound { .. }));
}

#[rstest]
#[tokio::test]
async fn declined_delete_touches_nothing(listing_id: ListingId) {
    let mut store = MockListingStore::new();
    store.expect_get().never();
    store.expect_delete().never();

    let outcome = gateway(store)
        .delete(&listing_id, Confirmation::Declined, None)
        .await
        .expect("declined delete is not an error");
    assert_eq!(outcome, DeleteOutcome::Declined);
    assert!(!outcome.deleted());
}

#[rstest]
#[tokio::test]
async fn confirmed_delete_removes_owned_listing(seller: UserId, listing_id: ListingId) {
    let mut store = MockListingStore::new();
    let record = stored(&listing_id, Some(seller.clone()));
    store
        .expect_get()
        .times(1)
        .return_once(move |_| Ok(Some(record)));
    let expected = listing_id.clone();
    store
        .expect_delete()
        .times(1)
        .withf(move |id| *id == expected)
        .return_once(|_| Ok(()));

    let outcome = gateway(store)
        .delete(&listing_id, Confirmation::Confirmed, Some(&seller))
        .await
        .expect("delete succeeds");
    assert_eq!(outcome, DeleteOutcome::Deleted);
}

#[rstest]
#[tokio::test]
async fn failed_delete_is_a_write_failure(seller: UserId, listing_id: ListingId) {
    let mut store = MockListingStore::new();
    let record = stored(&listing_id, Some(seller.clone()));
    store
        .expect_get()
        .times(1)
        .return_once(move |_| Ok(Some(record)));
    store
        .expect_delete()
        .times(1)
        .return_once(|_| Err(ListingStoreError::denied("rules")));

    let error = gateway(store)
        .delete(&listing_id, Confirmation::Confirmed, Some(&seller))
        .await
        .expect_err("delete fails");
    assert!(matches!(error, ListingError::WriteFailed { .. }));
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn set_favorite_forwards_the_toggle(
    seller: UserId,
    listing_id: ListingId,
    #[case] favorite: bool,
) {
    let mut store = MockListingStore::new();
    store
        .expect_set_favorite()
        .times(1)
        .withf(move |_, _, value| *value == favorite)
        .return_once(|_, _, _| Ok(()));

    gateway(store)
        .set_favorite(&listing_id, favorite, Some(&seller))
        .await
        .expect("toggle succeeds");
}

#[rstest]
#[tokio::test]
async fn set_favorite_on_missing_listing_is_not_found(seller: UserId, listing_id: ListingId) {
    let mut store = MockListingStore::new();
    store
        .expect_set_favorite()
        .times(1)
        .return_once(|id, _, _| Err(ListingStoreError::missing(id.to_string())));

    let error = gateway(store)
        .set_favorite(&listing_id, true, Some(&seller))
        .await
        .expect_err("missing");
    assert!(matches!(error, ListingError::NotFound { .. }));
}

#[rstest]
#[tokio::test]
async fn command_port_maps_errors_to_api_codes(listing_id: ListingId) {
    let store = MockListingStore::new();
    let command: &dyn ListingCommand = &gateway(store);

    let error = command
        .set_favorite(None, listing_id, true)
        .await
        .expect_err("unauthenticated");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
}
