//! In-process inventory service

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::InventoryBackend;
use crate::error::{Error, Result};
use crate::items::{Item, NewItem};
use crate::recognition::RawRecognitionEntry;
use crate::spaces::{NewSpace, Space, SpaceLevel};

#[derive(Debug, Default)]
struct State {
    spaces: Vec<Space>,
    items: Vec<Item>,
    next_id: u64,
    recognition: Vec<RawRecognitionEntry>,
    failing_item_names: HashSet<String>,
    failing_space_deletes: HashSet<String>,
    revoked: HashSet<String>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn owned_space(&self, user_id: &str, id: &str) -> Option<&Space> {
        self.spaces
            .iter()
            .find(|s| s.id == id && s.user_id.as_deref() == Some(user_id))
    }

    fn check_item(&self, user_id: &str, item: &NewItem) -> Result<()> {
        if item.name.trim().is_empty() {
            return Err(Error::api(400, "name is required"));
        }
        if item.space_id.trim().is_empty() {
            return Err(Error::api(400, "space_id is required"));
        }
        if self.owned_space(user_id, &item.space_id).is_none() {
            return Err(Error::api(400, "space not found"));
        }
        if self.failing_item_names.contains(item.name.trim()) {
            return Err(Error::api(500, format!("failed to save {}", item.name.trim())));
        }
        Ok(())
    }
}

fn build_item(id: String, user_id: &str, item: &NewItem) -> Item {
    Item {
        id,
        user_id: Some(user_id.to_string()),
        name: item.name.trim().to_string(),
        quantity: item.quantity.max(1),
        category: item.category.clone(),
        expire_date: item.expire_date,
        value: item.value,
        brand: item.brand.clone(),
        purchase_date: item.purchase_date,
        purchase_source: item.purchase_source.clone(),
        notes: item.notes.clone(),
        condition: item.condition,
        priority: item.priority,
        photo_url: item.photo_url.clone(),
        space_id: item.space_id.clone(),
        created_at: Some(Utc::now()),
    }
}

/// Shared data behind every [`MemoryBackend`] handle.
///
/// Also carries knobs for scripting recognition output and injecting
/// failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A backend acting as `user_id`
    pub fn backend_for(&self, user_id: &str) -> MemoryBackend {
        MemoryBackend {
            store: self.clone(),
            user_id: user_id.to_string(),
        }
    }

    /// Entries returned by every subsequent recognition call
    pub fn set_recognition(&self, entries: Vec<RawRecognitionEntry>) {
        self.lock().recognition = entries;
    }

    /// Make item creation fail with a 500 for items named `name`
    pub fn fail_items_named(&self, name: &str) {
        self.lock().failing_item_names.insert(name.to_string());
    }

    /// Make deletion of space `id` fail with a 500
    pub fn fail_space_delete(&self, id: &str) {
        self.lock().failing_space_deletes.insert(id.to_string());
    }

    /// Answer every request of `user_id` with a 401
    pub fn revoke(&self, user_id: &str) {
        self.lock().revoked.insert(user_id.to_string());
    }

    /// Every space of every user
    pub fn spaces(&self) -> Vec<Space> {
        self.lock().spaces.clone()
    }

    /// Every item of every user
    pub fn items(&self) -> Vec<Item> {
        self.lock().items.clone()
    }
}

/// One user's view of a [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    store: MemoryStore,
    user_id: String,
}

impl MemoryBackend {
    /// A backend over a fresh store
    pub fn new(user_id: &str) -> Self {
        MemoryStore::new().backend_for(user_id)
    }

    /// The store behind this handle
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        let state = self.store.lock();
        if state.revoked.contains(&self.user_id) {
            return Err(Error::unauthorized("Unauthorized"));
        }
        Ok(state)
    }
}

#[async_trait]
impl InventoryBackend for MemoryBackend {
    fn owner_id(&self) -> Option<&str> {
        Some(&self.user_id)
    }

    async fn recognize(&self, image: &[u8], _mime_type: &str) -> Result<Vec<RawRecognitionEntry>> {
        let state = self.state()?;
        if image.is_empty() {
            return Err(Error::api(400, "image is required"));
        }
        Ok(state.recognition.clone())
    }

    async fn list_spaces(&self) -> Result<Vec<Space>> {
        let state = self.state()?;
        Ok(state
            .spaces
            .iter()
            .filter(|s| s.user_id.as_deref() == Some(self.user_id.as_str()))
            .cloned()
            .collect())
    }

    async fn create_space(&self, space: &NewSpace) -> Result<Space> {
        let mut state = self.state()?;
        let name = space.name.trim();
        if name.is_empty() {
            return Err(Error::api(400, "name is required"));
        }
        match (space.level, space.parent_id.as_deref()) {
            (SpaceLevel::Room, None) => {}
            (SpaceLevel::Room, Some(_)) => return Err(Error::api(400, "a room cannot have a parent")),
            (SpaceLevel::Location, None) => return Err(Error::api(400, "parent_id is required")),
            (SpaceLevel::Location, Some(parent_id)) => {
                let valid = state
                    .owned_space(&self.user_id, parent_id)
                    .map(|parent| parent.is_room())
                    .unwrap_or(false);
                if !valid {
                    return Err(Error::api(400, "invalid parent"));
                }
            }
        }

        let created = Space {
            id: state.next_id("space"),
            user_id: Some(self.user_id.clone()),
            name: name.to_string(),
            level: space.level,
            parent_id: space.parent_id.clone(),
            description: space.description.clone(),
            icon: space.icon.clone(),
        };
        state.spaces.push(created.clone());
        Ok(created)
    }

    async fn delete_space(&self, id: &str) -> Result<()> {
        let mut state = self.state()?;
        let target = state
            .owned_space(&self.user_id, id)
            .cloned()
            .ok_or_else(|| Error::not_found("space not found"))?;
        if state.failing_space_deletes.contains(id) {
            return Err(Error::api(500, format!("failed to delete {}", id)));
        }

        let mut doomed = vec![target.id.clone()];
        if target.is_room() {
            doomed.extend(
                state
                    .spaces
                    .iter()
                    .filter(|s| s.is_location_of(&target.id))
                    .map(|s| s.id.clone()),
            );
        }
        state.items.retain(|item| !doomed.contains(&item.space_id));
        state.spaces.retain(|space| !doomed.contains(&space.id));
        Ok(())
    }

    async fn list_items(&self, space_id: Option<&str>) -> Result<Vec<Item>> {
        let state = self.state()?;
        Ok(state
            .items
            .iter()
            .filter(|item| item.user_id.as_deref() == Some(self.user_id.as_str()))
            .filter(|item| space_id.map(|id| item.space_id == id).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn create_item(&self, item: &NewItem) -> Result<Item> {
        let mut state = self.state()?;
        state.check_item(&self.user_id, item)?;
        let id = state.next_id("item");
        let created = build_item(id, &self.user_id, item);
        state.items.push(created.clone());
        Ok(created)
    }

    async fn update_item(&self, id: &str, item: &NewItem) -> Result<Item> {
        let mut state = self.state()?;
        let index = state
            .items
            .iter()
            .position(|i| i.id == id && i.user_id.as_deref() == Some(self.user_id.as_str()))
            .ok_or_else(|| Error::not_found("item not found"))?;
        state.check_item(&self.user_id, item)?;

        let mut updated = build_item(id.to_string(), &self.user_id, item);
        updated.created_at = state.items[index].created_at;
        state.items[index] = updated.clone();
        Ok(updated)
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        let mut state = self.state()?;
        let before = state.items.len();
        let user_id = self.user_id.as_str();
        state
            .items
            .retain(|i| !(i.id == id && i.user_id.as_deref() == Some(user_id)));
        if state.items.len() == before {
            return Err(Error::not_found("item not found"));
        }
        Ok(())
    }
}
