//! `HttpStore` behavior against the fake admin API: status handling,
//! partial failures and id enforcement.

mod common;

use common::FakeAdmin;
use serde_json::{Value, json};

use stubchaos::error::StoreError;
use stubchaos::mapping::{Document, Mapping};
use stubchaos::store::{HttpStore, MappingStore};

fn doc(value: Value) -> Document {
    value.as_object().cloned().expect("object")
}

fn two_mappings() -> Vec<Value> {
    vec![
        json!({"id": "a", "request": {"method": "GET", "url": "/a"}, "response": {"status": 200}}),
        json!({"id": "b", "request": {"method": "GET", "url": "/b"}, "response": {"status": 200}}),
    ]
}

#[tokio::test]
async fn list_and_get_round_trip_documents() {
    let admin = FakeAdmin::with_mappings(two_mappings()).await;
    let store = HttpStore::new(&admin.target()).unwrap();

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    let fetched = store.get("b").await.unwrap();
    assert_eq!(fetched.id(), Some("b"));
    assert_eq!(fetched.request().unwrap()["url"], "/b");
}

#[tokio::test]
async fn unknown_id_is_status_error_with_id() {
    let admin = FakeAdmin::start().await;
    let store = HttpStore::new(&admin.target()).unwrap();

    let err = store.get("missing").await.unwrap_err();
    match err {
        StoreError::Status {
            operation,
            id,
            status,
            ..
        } => {
            assert_eq!(operation, "get");
            assert_eq!(id.as_deref(), Some("missing"));
            assert_eq!(status, 404);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn create_returns_assigned_id() {
    let admin = FakeAdmin::start().await;
    let store = HttpStore::new(&admin.target()).unwrap();

    let mapping = Mapping::try_from(json!({"request": {"url": "/new"}})).unwrap();
    let created = store.create(&mapping).await.unwrap();
    assert!(created.id().is_some());
    assert_eq!(admin.mappings().len(), 1);
}

#[tokio::test]
async fn failed_update_is_skipped_and_others_applied() {
    let admin = FakeAdmin::with_mappings(two_mappings()).await;
    admin.fail_updates_for("a");

    let updated = admin
        .orchestrator()
        .fixed_delay(&[doc(json!({"method": "GET"}))], 500)
        .await
        .unwrap();
    let ids: Vec<_> = updated.iter().filter_map(Mapping::id).collect();
    assert_eq!(ids, ["b"]);
    assert_eq!(admin.count("PUT"), 2);
    assert_eq!(
        admin.mapping("b").unwrap()["response"]["fixedDelayMilliseconds"],
        500
    );
    assert!(
        admin.mapping("a").unwrap()["response"]
            .get("fixedDelayMilliseconds")
            .is_none()
    );
}

#[tokio::test]
async fn mismatched_echo_id_is_not_reported() {
    let admin = FakeAdmin::with_mappings(two_mappings()).await;
    admin.echo_id("someone-else");

    let updated = admin
        .orchestrator()
        .fixed_delay(&[doc(json!({"url": "/a"}))], 10)
        .await
        .unwrap();
    assert!(updated.is_empty());
}

#[tokio::test]
async fn delete_all_and_reset() {
    let admin = FakeAdmin::with_mappings(two_mappings()).await;
    let orchestrator = admin.orchestrator();

    assert_eq!(orchestrator.delete_all().await.unwrap(), 2);
    assert!(admin.mappings().is_empty());

    orchestrator.reset_mappings().await.unwrap();
    assert_eq!(admin.mappings().len(), 2);

    orchestrator.global_fixed_delay(5).await.unwrap();
    orchestrator.reset().await.unwrap();
    assert!(admin.settings().is_none());
}

#[tokio::test]
async fn path_like_id_stays_inside_mappings() {
    let admin = FakeAdmin::with_mappings(two_mappings()).await;
    let store = HttpStore::new(&admin.target()).unwrap();

    let err = store.delete("../reset").await.unwrap_err();
    assert!(matches!(err, StoreError::Status { status: 404, .. }), "{err:?}");
    assert_eq!(admin.requests(), ["DELETE /__admin/mappings/../reset"]);
    assert_eq!(admin.mappings().len(), 2);
}

#[tokio::test]
async fn dot_id_is_rejected_without_request() {
    let admin = FakeAdmin::with_mappings(two_mappings()).await;
    let store = HttpStore::new(&admin.target()).unwrap();

    let err = store.get("..").await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidId { operation: "get", .. }));
    assert!(admin.requests().is_empty());
}
