//! Inventory Ingestion Client Library
//!
//! Turns photo-recognition output into inventory items: raw entries are
//! normalized and classified into candidates, placed into a room and
//! location, and committed as a batch that tolerates per-item failures
//! while keeping a local item cache current.

pub mod backend;
pub mod cache;
pub mod commit;
pub mod config;
pub mod error;
pub mod fetch;
pub mod form;
pub mod ingest;
pub mod items;
pub mod placement;
pub mod recognition;
pub mod session;
pub mod spaces;

use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::backend::{HttpBackend, InventoryBackend};
use crate::cache::ItemCache;
use crate::commit::{BatchCommitter, BatchOutcome};
use crate::config::{ClientOptions, InventoryConfig};
use crate::error::Result;
use crate::form::ItemForm;
use crate::ingest::IngestSession;
use crate::items::{Item, NewItem};
use crate::placement::PlacementMode;
use crate::recognition::{Classifier, RawRecognitionEntry};
use crate::spaces::Spaces;

/// The main entry point for the inventory client
pub struct Inventory {
    backend: Arc<dyn InventoryBackend>,
    cache: ItemCache,
    classifier: Classifier,
    options: ClientOptions,
}

impl Inventory {
    /// Create a client talking to the REST API described by `config`
    ///
    /// # Example
    ///
    /// ```
    /// use inventory_ingest::{Inventory, config::{ClientOptions, InventoryConfig}};
    ///
    /// let config = InventoryConfig::new("https://home.example.com/api", None).unwrap();
    /// let inventory = Inventory::new(config, ClientOptions::default());
    /// assert!(inventory.cache().is_empty());
    /// ```
    pub fn new(config: InventoryConfig, options: ClientOptions) -> Self {
        let backend = HttpBackend::new(config, &options);
        Self::with_backend(Arc::new(backend), options)
    }

    /// Create a client over any backend, e.g. a [`backend::MemoryBackend`]
    pub fn with_backend(backend: Arc<dyn InventoryBackend>, options: ClientOptions) -> Self {
        Self {
            backend,
            cache: ItemCache::new(),
            classifier: Classifier::from_options(&options),
            options,
        }
    }

    /// The backend in use
    pub fn backend(&self) -> &dyn InventoryBackend {
        self.backend.as_ref()
    }

    /// The local item cache
    pub fn cache(&self) -> &ItemCache {
        &self.cache
    }

    /// The client options
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Space operations
    pub fn spaces(&self) -> Spaces<'_> {
        Spaces::new(self.backend.as_ref(), &self.cache)
    }

    /// A committer sharing this client's backend and cache
    pub fn committer(&self) -> BatchCommitter<'_> {
        BatchCommitter::new(self.backend.as_ref(), &self.cache, self.options.commit_concurrency)
    }

    /// Recognize a photo and open a placement session for the result
    pub async fn ingest_photo(&self, image: &[u8], mime_type: &str, mode: PlacementMode) -> Result<IngestSession> {
        let entries = self.backend.recognize(image, mime_type).await?;
        self.ingest_entries(entries, mode).await
    }

    /// Read a photo from disk and ingest it
    pub async fn ingest_file(&self, path: &Path, mode: PlacementMode) -> Result<IngestSession> {
        let (bytes, mime_type) = ingest::read_photo(path).await?;
        self.ingest_photo(&bytes, mime_type, mode).await
    }

    /// Open a placement session for entries recognized elsewhere.
    ///
    /// If the spaces cannot be listed the session still holds every
    /// candidate, with no spaces loaded; see [`IngestSession::reload_spaces`].
    pub async fn ingest_entries(&self, entries: Vec<RawRecognitionEntry>, mode: PlacementMode) -> Result<IngestSession> {
        let received = entries.len();
        let candidates = recognition::prepare(entries, &self.classifier);
        info!("Recognized {} candidate(s) from {} entries", candidates.len(), received);
        match self.backend.list_spaces().await {
            Ok(spaces) => Ok(IngestSession::new(candidates, spaces, mode)),
            Err(err) => {
                warn!("Keeping {} candidate(s) without spaces: {}", candidates.len(), err);
                Ok(IngestSession::without_spaces(candidates, mode))
            }
        }
    }

    /// Commit every pending candidate of `session`
    pub async fn commit(&self, session: &mut IngestSession) -> Result<BatchOutcome> {
        session.commit(&self.committer()).await
    }

    /// Reload every item into the cache; concurrent calls share one request
    pub async fn refresh_items(&self) -> Result<usize> {
        let backend = self.backend.clone();
        self.cache
            .refresh(move || async move { backend.list_items(None).await })
            .await
    }

    /// Items of one space, straight from the service
    pub async fn items_in(&self, space_id: &str) -> Result<Vec<Item>> {
        self.backend.list_items(Some(space_id)).await
    }

    /// Create an item entered through `form`
    pub async fn create_item(&self, form: &ItemForm, item: NewItem) -> Result<Item> {
        let item = form.apply(item);
        form.validate(&item)?;
        let created = self.backend.create_item(&item).await?;
        self.cache.add(created.clone());
        Ok(created)
    }

    /// Save edits to an item entered through `form`
    pub async fn update_item(&self, id: &str, form: &ItemForm, item: NewItem) -> Result<Item> {
        let item = form.apply(item);
        form.validate(&item)?;
        let updated = self.backend.update_item(id, &item).await?;
        if !self.cache.update(updated.clone()) {
            self.cache.add(updated.clone());
        }
        Ok(updated)
    }

    /// Delete an item
    pub async fn delete_item(&self, id: &str) -> Result<()> {
        self.backend.delete_item(id).await?;
        self.cache.remove(id);
        Ok(())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::backend::{HttpBackend, InventoryBackend, MemoryBackend};
    pub use crate::commit::BatchOutcome;
    pub use crate::config::{ClientOptions, InventoryConfig};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::form::ItemForm;
    pub use crate::ingest::IngestSession;
    pub use crate::items::{Item, NewItem};
    pub use crate::placement::{PlacementMode, Target};
    pub use crate::recognition::{LabelSet, ValuePolicy};
    pub use crate::spaces::{NewSpace, Space};
    pub use crate::Inventory;
}
