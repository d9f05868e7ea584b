//! The inventory service as seen by the pipeline
//!
//! [`InventoryBackend`] is the seam between the pipeline and the service:
//! [`HttpBackend`] talks to the real API, [`MemoryBackend`] keeps everything
//! in process with the same ownership and cascade rules.

mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::{MemoryBackend, MemoryStore};

use async_trait::async_trait;

use crate::error::Result;
use crate::items::{Item, NewItem};
use crate::recognition::RawRecognitionEntry;
use crate::spaces::{NewSpace, Space};

/// Operations the inventory service offers to one authenticated user
#[async_trait]
pub trait InventoryBackend: Send + Sync {
    /// The id of the user every request is scoped to, when known locally
    fn owner_id(&self) -> Option<&str>;

    /// Send a photo to the vision service
    async fn recognize(&self, image: &[u8], mime_type: &str) -> Result<Vec<RawRecognitionEntry>>;

    /// Every space of the user, flat
    async fn list_spaces(&self) -> Result<Vec<Space>>;

    /// Create a room or location
    async fn create_space(&self, space: &NewSpace) -> Result<Space>;

    /// Delete one space; the service cascades rooms to their children and items
    async fn delete_space(&self, id: &str) -> Result<()>;

    /// Items of the user, optionally limited to one space
    async fn list_items(&self, space_id: Option<&str>) -> Result<Vec<Item>>;

    /// Create one item
    async fn create_item(&self, item: &NewItem) -> Result<Item>;

    /// Replace the writable fields of an item
    async fn update_item(&self, id: &str, item: &NewItem) -> Result<Item>;

    /// Delete one item
    async fn delete_item(&self, id: &str) -> Result<()>;
}
