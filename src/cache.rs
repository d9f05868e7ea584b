//! Client-side item cache
//!
//! Mutations go through [`ItemCache::add`], [`ItemCache::update`] and
//! [`ItemCache::remove`], which are idempotent per item id, so the cache can
//! follow every write without a refetch. [`ItemCache::refresh`] replaces the
//! contents with a full fetch; concurrent refreshes share one request and a
//! failed refresh keeps what was cached before. Writes made while a refresh
//! is pending are replayed on top of the fetched list.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::{debug, warn};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};
use crate::items::{Item, ItemId};
use crate::spaces::SpaceId;

type RefreshOutput = std::result::Result<Arc<Vec<Item>>, Arc<Error>>;
type InFlight = Shared<BoxFuture<'static, RefreshOutput>>;

/// A write recorded while a refresh is pending
#[derive(Debug, Clone)]
enum Change {
    Add(Item),
    Update(Item),
    Remove(ItemId),
    RemoveSpaces(Vec<SpaceId>),
}

impl Change {
    fn apply(self, items: &mut Vec<Item>) {
        match self {
            Change::Add(item) => upsert(items, item),
            Change::Update(item) => {
                replace(items, item);
            }
            Change::Remove(id) => {
                items.retain(|item| item.id != id);
            }
            Change::RemoveSpaces(space_ids) => {
                items.retain(|item| !space_ids.contains(&item.space_id));
            }
        }
    }
}

fn upsert(items: &mut Vec<Item>, item: Item) {
    match items.iter_mut().find(|cached| cached.id == item.id) {
        Some(cached) => *cached = item,
        None => items.insert(0, item),
    }
}

fn replace(items: &mut [Item], item: Item) -> bool {
    match items.iter_mut().find(|cached| cached.id == item.id) {
        Some(cached) => {
            *cached = item;
            true
        }
        None => false,
    }
}

#[derive(Default)]
struct Contents {
    items: Vec<Item>,
    /// Open while a refresh is pending
    journal: Option<Vec<Change>>,
}

impl Contents {
    fn record(&mut self, change: Change) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(change);
        }
    }
}

/// Items of the current user, keyed by id
#[derive(Default)]
pub struct ItemCache {
    contents: RwLock<Contents>,
    in_flight: Mutex<Option<InFlight>>,
}

impl std::fmt::Debug for ItemCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemCache").field("len", &self.len()).finish()
    }
}

impl ItemCache {
    /// An empty cache
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Contents> {
        self.contents.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Contents> {
        self.contents.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `item`, replacing any entry with the same id.
    ///
    /// New items go first, matching newest-first listings.
    pub fn add(&self, item: Item) {
        let mut contents = self.write();
        contents.record(Change::Add(item.clone()));
        upsert(&mut contents.items, item);
    }

    /// Replace the entry with `item`'s id; returns false if it was not cached
    pub fn update(&self, item: Item) -> bool {
        let mut contents = self.write();
        contents.record(Change::Update(item.clone()));
        replace(&mut contents.items, item)
    }

    /// Drop the entry with `id`; returns false if there was none
    pub fn remove(&self, id: &str) -> bool {
        let mut contents = self.write();
        contents.record(Change::Remove(id.to_string()));
        let before = contents.items.len();
        contents.items.retain(|item| item.id != id);
        contents.items.len() != before
    }

    /// Drop every item stored in one of `space_ids`
    pub fn remove_in_spaces(&self, space_ids: &[SpaceId]) -> usize {
        let mut contents = self.write();
        contents.record(Change::RemoveSpaces(space_ids.to_vec()));
        let before = contents.items.len();
        contents.items.retain(|item| !space_ids.contains(&item.space_id));
        before - contents.items.len()
    }

    /// Replace the whole contents
    pub fn replace_all(&self, items: Vec<Item>) {
        let mut contents = self.write();
        contents.items = items;
        if let Some(journal) = contents.journal.as_mut() {
            journal.clear();
        }
    }

    /// A snapshot of every cached item
    pub fn items(&self) -> Vec<Item> {
        self.read().items.clone()
    }

    /// Cached items stored in `space_id`
    pub fn items_in(&self, space_id: &str) -> Vec<Item> {
        self.read()
            .items
            .iter()
            .filter(|item| item.space_id == space_id)
            .cloned()
            .collect()
    }

    /// Look up one item
    pub fn get(&self, id: &str) -> Option<Item> {
        self.read().items.iter().find(|item| item.id == id).cloned()
    }

    /// Ids of every cached item
    pub fn ids(&self) -> Vec<ItemId> {
        self.read().items.iter().map(|item| item.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    /// Install a fetched list, then replay writes made since the fetch began
    fn install(&self, fetched: Vec<Item>) -> usize {
        let mut contents = self.write();
        let replayed = contents.journal.take().unwrap_or_default();
        let count = replayed.len();
        contents.items = fetched;
        for change in replayed {
            change.apply(&mut contents.items);
        }
        count
    }

    /// Replace the contents with the result of `fetch`.
    ///
    /// While a refresh is running, further calls wait for that one instead
    /// of calling `fetch`. Adds, updates and removals made while it runs are
    /// applied again on top of the fetched list. On failure the cached items
    /// are left as they were and every waiting caller gets the error.
    pub async fn refresh<F, Fut>(&self, fetch: F) -> Result<usize>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Item>>> + Send + 'static,
    {
        let shared = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(running) if running.peek().is_none() => {
                    debug!("Joining item refresh already in flight");
                    running.clone()
                }
                _ => {
                    self.write().journal.get_or_insert_with(Vec::new);
                    let started: InFlight = fetch()
                        .map(|result| result.map(Arc::new).map_err(Arc::new))
                        .boxed()
                        .shared();
                    *slot = Some(started.clone());
                    started
                }
            }
        };

        let output = shared.clone().await;

        // The first caller to observe completion installs the result.
        let installs = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            let ours = slot
                .as_ref()
                .map(|running| running.peek().is_some() && running.ptr_eq(&shared))
                .unwrap_or(false);
            if ours {
                slot.take();
            }
            ours
        };

        match output {
            Ok(items) => {
                if installs {
                    let replayed = self.install(items.as_ref().clone());
                    debug!(
                        "Item cache refreshed with {} item(s), {} local write(s) replayed",
                        items.len(),
                        replayed
                    );
                }
                Ok(items.len())
            }
            Err(err) => {
                if installs {
                    self.write().journal = None;
                    warn!("Item refresh failed, keeping {} cached item(s): {}", self.len(), err);
                }
                Err(err.duplicate())
            }
        }
    }
}
