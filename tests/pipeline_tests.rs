use inventory_ingest::backend::MemoryStore;
use inventory_ingest::prelude::*;
use inventory_ingest::recognition::RawRecognitionEntry;
use inventory_ingest::spaces::SpaceLevel;
use serde_json::json;
use std::sync::Arc;

fn entries(value: serde_json::Value) -> Vec<RawRecognitionEntry> {
    serde_json::from_value(value).unwrap()
}

async fn kitchen(inventory: &Inventory) -> (Space, Space, Space) {
    let spaces = inventory.spaces();
    let room = spaces.create(&NewSpace::room("Kitchen")).await.unwrap();
    let fridge = spaces.create(&NewSpace::location("Fridge", &room.id)).await.unwrap();
    let pantry = spaces.create(&NewSpace::location("Pantry", &room.id)).await.unwrap();
    (room, fridge, pantry)
}

#[tokio::test]
async fn test_room_delete_cascades_to_locations_and_items() {
    let store = MemoryStore::new();
    let inventory = Inventory::with_backend(Arc::new(store.backend_for("alice")), ClientOptions::default());
    let (room, fridge, pantry) = kitchen(&inventory).await;

    let form = ItemForm::minimal();
    let mut created = Vec::new();
    for (name, space) in [
        ("Milk", &fridge),
        ("Butter", &fridge),
        ("Rice", &pantry),
        ("Flour", &pantry),
        ("Tea", &pantry),
    ] {
        created.push(inventory.create_item(&form, NewItem::new(name, &space.id)).await.unwrap().id);
    }
    assert_eq!(inventory.cache().len(), 5);

    let deletion = inventory.spaces().delete(&room.id).await.unwrap();
    assert_eq!(deletion.deleted.len(), 3);
    assert_eq!(deletion.deleted.last(), Some(&room.id));

    assert!(inventory.cache().is_empty());
    assert!(inventory.spaces().list().await.unwrap().is_empty());
    let remaining = inventory.backend().list_items(None).await.unwrap();
    assert!(remaining.iter().all(|item| !created.contains(&item.id)));
    assert!(remaining.is_empty());
    assert!(store.items().is_empty());
}

#[tokio::test]
async fn test_persisted_entities_keep_hierarchy_invariants() {
    let store = MemoryStore::new();
    let alice = Inventory::with_backend(Arc::new(store.backend_for("alice")), ClientOptions::default());
    let bob = Inventory::with_backend(Arc::new(store.backend_for("bob")), ClientOptions::default());
    let (room, fridge, _) = kitchen(&alice).await;
    kitchen(&bob).await;

    match bob.spaces().create(&NewSpace::location("Shelf", &room.id)).await {
        Err(Error::InvalidParent { .. }) => {}
        other => panic!("Expected InvalidParent, got {:?}", other),
    }
    assert!(bob
        .create_item(&ItemForm::minimal(), NewItem::new("Milk", &fridge.id))
        .await
        .is_err());

    let spaces = store.spaces();
    for space in &spaces {
        match space.level {
            SpaceLevel::Room => assert!(space.parent_id.is_none()),
            SpaceLevel::Location => {
                let parent = spaces
                    .iter()
                    .find(|s| Some(&s.id) == space.parent_id.as_ref())
                    .unwrap();
                assert!(parent.is_room());
                assert_eq!(parent.user_id, space.user_id);
            }
        }
    }
    for item in store.items() {
        let space = spaces.iter().find(|s| s.id == item.space_id).unwrap();
        assert_eq!(space.user_id, item.user_id);
    }
}

#[tokio::test]
async fn test_photo_to_items_in_shared_mode() {
    let store = MemoryStore::new();
    store.set_recognition(entries(json!([
        { "name": "蒙牛纯牛奶", "quantity": "2", "needs_expiry_date": true, "type": "label", "confidence": 0.95 },
        { "name": "  ", "confidence": 0.4 },
        { "name": "电池", "quantity": 1500 },
        { "name": "电池", "quantity": -5 }
    ])));
    let inventory = Inventory::with_backend(Arc::new(store.backend_for("alice")), ClientOptions::default());
    let (room, fridge, _) = kitchen(&inventory).await;

    let mut session = inventory
        .ingest_photo(&[1, 2, 3], "image/jpeg", PlacementMode::Shared)
        .await
        .unwrap();
    let candidates: Vec<_> = session.placement().candidates().cloned().collect();
    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[0].fields.quantity, 2);
    assert_eq!(candidates[0].fields.category.as_deref(), Some("食品饮料"));
    assert!(candidates[0].fields.expire_date.is_some());
    assert_eq!(candidates[1].fields.quantity, 999);
    assert_eq!(candidates[2].fields.quantity, 1);
    assert_eq!(candidates[1].fields.category.as_deref(), Some("电子产品"));

    session.select_room(Target::Shared, &room.id).unwrap();
    session.select_location(Target::Shared, &fridge.id).unwrap();
    let outcome = inventory.commit(&mut session).await.unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.summary(), "Saved 3 item(s)");
    assert!(session.is_finished());

    assert_eq!(inventory.cache().items_in(&fridge.id).len(), 3);
    assert_eq!(store.items().len(), 3);
}

#[tokio::test]
async fn test_edit_before_commit() {
    let store = MemoryStore::new();
    store.set_recognition(entries(json!([{ "name": "Notebook" }, { "name": "Scarf" }])));
    let inventory = Inventory::with_backend(Arc::new(store.backend_for("alice")), ClientOptions::default());
    let (room, fridge, pantry) = kitchen(&inventory).await;

    let mut session = inventory
        .ingest_photo(b"photo", "image/png", PlacementMode::PerItem)
        .await
        .unwrap();
    let ids: Vec<_> = session.placement().candidates().map(|c| c.id).collect();

    {
        let placement = session.placement_mut();
        let buffer = placement.begin_edit(ids[0]).unwrap();
        buffer.name = "Field notebook".to_string();
        buffer.quantity = 3;
        placement.save_edit(ids[0]).unwrap();
        placement.begin_edit(ids[1]).unwrap().name = "Wool scarf".to_string();
        placement.cancel_edit(ids[1]);
    }
    for (id, location) in ids.iter().zip([&fridge, &pantry]) {
        session.select_room(Target::Candidate(*id), &room.id).unwrap();
        session.select_location(Target::Candidate(*id), &location.id).unwrap();
    }

    let outcome = inventory.commit(&mut session).await.unwrap();
    assert_eq!(outcome.success_count(), 2);
    let mut saved: Vec<(String, u32, String)> = inventory
        .cache()
        .items()
        .into_iter()
        .map(|i| (i.name, i.quantity, i.space_id))
        .collect();
    saved.sort();
    assert_eq!(
        saved,
        vec![
            ("Field notebook".to_string(), 3, fridge.id.clone()),
            ("Scarf".to_string(), 1, pantry.id.clone()),
        ]
    );
}

#[tokio::test]
async fn test_value_policy_zero() {
    let store = MemoryStore::new();
    let options = ClientOptions::default()
        .with_value_policy(ValuePolicy::Zero)
        .with_category_labels(LabelSet::English);
    let inventory = Inventory::with_backend(Arc::new(store.backend_for("alice")), options);
    kitchen(&inventory).await;

    let session = inventory
        .ingest_entries(
            entries(json!([{ "name": "USB charger" }, { "name": "Lamp", "value": "35.5" }])),
            PlacementMode::Shared,
        )
        .await
        .unwrap();
    let candidates: Vec<_> = session.placement().candidates().collect();
    assert_eq!(candidates[0].fields.value, Some(0.0));
    assert_eq!(candidates[0].fields.category.as_deref(), Some("Electronics"));
    assert_eq!(candidates[1].fields.value, Some(35.5));
    assert_eq!(candidates[1].fields.category.as_deref(), Some("Other"));
}
