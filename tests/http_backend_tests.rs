use inventory_ingest::prelude::*;
use inventory_ingest::spaces::SpaceLevel;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const TOKEN: &str = "test-token";

fn inventory(server: &MockServer, options: ClientOptions) -> Inventory {
    let config = InventoryConfig::new(&server.uri(), Some(TOKEN.to_string())).unwrap();
    Inventory::new(config, options)
}

fn spaces_body() -> Value {
    json!({
        "spaces": [],
        "flat": [
            { "id": "r1", "name": "Kitchen", "level": 1, "parent_id": null },
            { "id": "l1", "name": "Fridge", "level": 2, "parent_id": "r1" },
            { "id": "l2", "name": "Pantry", "level": 2, "parent_id": "r1" }
        ]
    })
}

async fn mount_spaces(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/spaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(spaces_body()))
        .mount(server)
        .await;
}

/// Answers `POST /items` with the posted fields and a fresh id
struct EchoItem {
    next_id: AtomicUsize,
}

impl Respond for EchoItem {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut body: Value = serde_json::from_slice(&request.body).unwrap();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        body["id"] = json!(format!("i{}", id));
        ResponseTemplate::new(201).set_body_json(json!({ "item": body }))
    }
}

fn echo_items() -> EchoItem {
    EchoItem {
        next_id: AtomicUsize::new(0),
    }
}

#[tokio::test]
async fn test_recognition_drops_nameless_entries() {
    let server = MockServer::start().await;
    mount_spaces(&server).await;

    Mock::given(method("POST"))
        .and(path("/recognize"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_partial_json(json!({ "image": "YWJj", "mime_type": "image/jpeg" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "name": "苹果" },
                { "name": "", "confidence": 0.9 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let inventory = inventory(&server, ClientOptions::default());
    let session = inventory
        .ingest_photo(b"abc", "image/jpeg", PlacementMode::Shared)
        .await
        .unwrap();

    let candidates: Vec<_> = session.placement().candidates().collect();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name(), "苹果");
    assert_eq!(candidates[0].fields.quantity, 1);
    assert_eq!(candidates[0].fields.category.as_deref(), Some("食品饮料"));
    assert_eq!(candidates[0].fields.value, None);
    assert_eq!(session.rooms().len(), 1);
}

#[tokio::test]
async fn test_recognition_survives_space_listing_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "name": "Milk" }, { "name": "Scarf" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/spaces"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db down" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_spaces(&server).await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .respond_with(echo_items())
        .expect(2)
        .mount(&server)
        .await;

    let inventory = inventory(&server, ClientOptions::default());
    let mut session = inventory
        .ingest_photo(b"abc", "image/jpeg", PlacementMode::Shared)
        .await
        .unwrap();
    assert!(!session.spaces_loaded());
    assert!(session.rooms().is_empty());
    let names: Vec<&str> = session.placement().candidates().map(|c| c.name()).collect();
    assert_eq!(names, vec!["Milk", "Scarf"]);

    assert_eq!(session.reload_spaces(inventory.backend()).await.unwrap(), 3);
    assert!(session.spaces_loaded());
    session.select_room(Target::Shared, "r1").unwrap();
    session.select_location(Target::Shared, "l2").unwrap();
    let outcome = inventory.commit(&mut session).await.unwrap();
    assert_eq!(outcome.summary(), "Saved 2 item(s)");
    assert!(session.is_finished());
}

#[tokio::test]
async fn test_partial_batch_commits_successes() {
    let server = MockServer::start().await;
    mount_spaces(&server).await;

    Mock::given(method("POST"))
        .and(path("/items"))
        .and(body_partial_json(json!({ "name": "Eggs" })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "Failed to create item" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .respond_with(echo_items())
        .expect(2)
        .mount(&server)
        .await;

    let inventory = inventory(&server, ClientOptions::default());
    let entries = serde_json::from_value(json!([
        { "name": "Milk" },
        { "name": "Eggs", "quantity": 12 },
        { "name": "Butter" }
    ]))
    .unwrap();
    let mut session = inventory
        .ingest_entries(entries, PlacementMode::Shared)
        .await
        .unwrap();
    session.select_room(Target::Shared, "r1").unwrap();
    session.select_location(Target::Shared, "l1").unwrap();

    let outcome = inventory.commit(&mut session).await.unwrap();
    assert_eq!(outcome.success_count(), 2);
    assert_eq!(outcome.failure_count(), 1);
    assert_eq!(outcome.summary(), "Saved 2 of 3 item(s), 1 failed");

    let mut cached: Vec<String> = inventory.cache().items().into_iter().map(|i| i.name).collect();
    cached.sort();
    assert_eq!(cached, vec!["Butter", "Milk"]);

    let left: Vec<&str> = session.placement().candidates().map(|c| c.name()).collect();
    assert_eq!(left, vec!["Eggs"]);
}

#[tokio::test]
async fn test_unauthorized_halts_batch() {
    let server = MockServer::start().await;
    mount_spaces(&server).await;

    Mock::given(method("POST"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Unauthorized" })))
        .expect(1)
        .mount(&server)
        .await;

    let inventory = inventory(&server, ClientOptions::default().with_commit_concurrency(1));
    let entries = serde_json::from_value(json!([{ "name": "Milk" }, { "name": "Eggs" }, { "name": "Tea" }])).unwrap();
    let mut session = inventory
        .ingest_entries(entries, PlacementMode::Shared)
        .await
        .unwrap();
    session.select_room(Target::Shared, "r1").unwrap();
    session.select_location(Target::Shared, "l2").unwrap();

    let outcome = inventory.commit(&mut session).await.unwrap();
    assert!(outcome.reauth_required);
    assert_eq!(outcome.failure_count(), 1);
    assert_eq!(outcome.failed[0].error.kind(), ErrorKind::Authentication);
    assert_eq!(outcome.skipped.len(), 2);
    assert!(inventory.cache().is_empty());
    assert_eq!(session.placement().len(), 3);
}

#[tokio::test]
async fn test_per_item_placement_reports_unresolved() {
    let server = MockServer::start().await;
    mount_spaces(&server).await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .respond_with(echo_items())
        .expect(0)
        .mount(&server)
        .await;

    let inventory = inventory(&server, ClientOptions::default());
    let entries = serde_json::from_value(json!([
        { "name": "Milk", "suggested_location": "fridge" },
        { "name": "Rice" }
    ]))
    .unwrap();
    let mut session = inventory
        .ingest_entries(entries, PlacementMode::PerItem)
        .await
        .unwrap();

    match inventory.commit(&mut session).await {
        Err(Error::MissingPlacement { unresolved }) => assert_eq!(unresolved, vec!["Rice"]),
        other => panic!("Expected MissingPlacement, got {:?}", other),
    }
}

#[tokio::test]
async fn test_refresh_is_single_flight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [{ "id": "i1", "name": "Milk", "space_id": "l1" }] }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let inventory = inventory(&server, ClientOptions::default());
    let (a, b, c) = tokio::join!(
        inventory.refresh_items(),
        inventory.refresh_items(),
        inventory.refresh_items()
    );
    assert_eq!(a.unwrap(), 1);
    assert_eq!(b.unwrap(), 1);
    assert_eq!(c.unwrap(), 1);
    assert_eq!(inventory.cache().ids(), vec!["i1"]);
}

#[tokio::test]
async fn test_failed_refresh_keeps_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .respond_with(echo_items())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "database unavailable" })))
        .mount(&server)
        .await;

    let inventory = inventory(&server, ClientOptions::default());
    inventory
        .create_item(&ItemForm::minimal(), NewItem::new("Kettle", "l1"))
        .await
        .unwrap();

    let err = inventory.refresh_items().await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 500, ref message } if message == "database unavailable"));
    assert_eq!(inventory.cache().len(), 1);
}

#[tokio::test]
async fn test_manual_entry_is_validated_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .respond_with(echo_items())
        .expect(0)
        .mount(&server)
        .await;

    let inventory = inventory(&server, ClientOptions::default());
    let err = inventory
        .create_item(&ItemForm::full(), NewItem::new("Kettle", "  "))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_update_and_delete_reconcile_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .respond_with(echo_items())
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/items/i1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "i1", "name": "Electric kettle", "quantity": 1, "space_id": "l1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/items/i1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/items/i9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Item not found" })))
        .mount(&server)
        .await;

    let inventory = inventory(&server, ClientOptions::default());
    let form = ItemForm::full();
    let created = inventory.create_item(&form, NewItem::new("Kettle", "l1")).await.unwrap();
    assert_eq!(created.id, "i1");

    inventory
        .update_item("i1", &form, NewItem::new("Electric kettle", "l1"))
        .await
        .unwrap();
    assert_eq!(inventory.cache().get("i1").unwrap().name, "Electric kettle");

    inventory.delete_item("i1").await.unwrap();
    assert!(inventory.cache().is_empty());

    let err = inventory.delete_item("i9").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(ref m) if m == "Item not found"));
}

#[tokio::test]
async fn test_items_in_space_uses_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("space_id", "l2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "i4", "name": "Rice", "space_id": "l2", "priority": "high" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let inventory = inventory(&server, ClientOptions::default());
    let items = inventory.items_in("l2").await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].priority, inventory_ingest::items::Priority::High);
}

#[tokio::test]
async fn test_space_tree_and_creation() {
    let server = MockServer::start().await;
    mount_spaces(&server).await;
    Mock::given(method("POST"))
        .and(path("/spaces"))
        .and(body_partial_json(json!({ "name": "Freezer", "level": 2, "parent_id": "r1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "l3", "name": "Freezer", "level": 2, "parent_id": "r1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let inventory = inventory(&server, ClientOptions::default());
    let tree = inventory.spaces().tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    let names: Vec<&str> = tree[0].locations.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Fridge", "Pantry"]);

    let created = inventory
        .spaces()
        .create(&NewSpace::location(" Freezer ", "r1"))
        .await
        .unwrap();
    assert_eq!(created.level, SpaceLevel::Location);

    let err = inventory
        .spaces()
        .create(&NewSpace::location("Shelf", "l1"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParent { .. }));
}

#[tokio::test]
async fn test_room_delete_is_two_phase() {
    let server = MockServer::start().await;
    mount_spaces(&server).await;
    for location in ["l1", "l2"] {
        Mock::given(method("DELETE"))
            .and(path(format!("/spaces/{}", location)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("DELETE"))
        .and(path("/spaces/r1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "Failed to delete space" })))
        .expect(1)
        .mount(&server)
        .await;

    let inventory = inventory(&server, ClientOptions::default());
    match inventory.spaces().delete("r1").await {
        Err(Error::RoomDeletionIncomplete {
            room_id,
            locations_deleted,
            source,
        }) => {
            assert_eq!(room_id, "r1");
            assert_eq!(locations_deleted, vec!["l1", "l2"]);
            assert!(matches!(*source, Error::Api { status: 500, .. }));
        }
        other => panic!("Expected RoomDeletionIncomplete, got {:?}", other),
    }
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(spaces_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let options = ClientOptions::default().with_request_timeout(Some(Duration::from_millis(100)));
    let inventory = inventory(&server, options);
    let err = inventory.spaces().list().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_expired_token_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(spaces_body()))
        .expect(0)
        .mount(&server)
        .await;

    let token = encode(
        &Header::default(),
        &json!({ "sub": "alice", "exp": 1_000_000_000 }),
        &EncodingKey::from_secret(b"secret"),
    )
    .unwrap();
    let config = InventoryConfig::new(&server.uri(), Some(token)).unwrap();
    let inventory = Inventory::new(config, ClientOptions::default());

    assert_eq!(inventory.backend().owner_id(), Some("alice"));
    let err = inventory.spaces().list().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}
