//! Rooms and locations
//!
//! Pure helpers in [`tree`] work on a flat list of spaces; [`Spaces`] adds
//! the service calls, validating before it sends and keeping the item cache
//! in line with deletions.

mod tree;
mod types;

pub use tree::*;
pub use types::*;

use log::{info, warn};

use crate::backend::InventoryBackend;
use crate::cache::ItemCache;
use crate::error::{Error, Result};

/// Space operations for the signed-in user
pub struct Spaces<'a> {
    backend: &'a dyn InventoryBackend,
    cache: &'a ItemCache,
}

impl<'a> Spaces<'a> {
    pub(crate) fn new(backend: &'a dyn InventoryBackend, cache: &'a ItemCache) -> Self {
        Self { backend, cache }
    }

    /// Every space, flat
    pub async fn list(&self) -> Result<Vec<Space>> {
        self.backend.list_spaces().await
    }

    /// Rooms with their locations, sorted by name
    pub async fn tree(&self) -> Result<Vec<SpaceNode>> {
        Ok(build_tree(&self.list().await?))
    }

    /// Create a room or location.
    ///
    /// Locations are checked against the current list first, so a missing,
    /// foreign or non-room parent never reaches the service.
    pub async fn create(&self, new: &NewSpace) -> Result<Space> {
        let known = match new.level {
            SpaceLevel::Location => self.list().await?,
            SpaceLevel::Room => Vec::new(),
        };
        validate_new_space(&known, new, self.backend.owner_id())?;

        let mut request = new.clone();
        request.name = request.name.trim().to_string();
        self.backend.create_space(&request).await
    }

    /// Delete a space and everything stored in it.
    ///
    /// A room's locations are deleted one by one before the room. If a
    /// location fails, the room is left alone and that error is returned; if
    /// only the room fails, the result is `RoomDeletionIncomplete` listing the
    /// locations that are already gone. Cached items of deleted spaces are
    /// dropped either way.
    pub async fn delete(&self, id: &str) -> Result<SpaceDeletion> {
        let spaces = self.list().await?;
        let target = find(&spaces, id).ok_or_else(|| Error::not_found(format!("space {}", id)))?;

        if !target.is_room() {
            self.backend.delete_space(id).await?;
            self.purge(&[id.to_string()]);
            return Ok(SpaceDeletion {
                deleted: vec![id.to_string()],
            });
        }

        let mut deleted = Vec::new();
        for location in locations_of(&spaces, id) {
            if let Err(err) = self.backend.delete_space(&location.id).await {
                warn!("Stopped deleting room {} at location {}: {}", id, location.id, err);
                self.purge(&deleted);
                return Err(err);
            }
            deleted.push(location.id.clone());
        }

        if let Err(err) = self.backend.delete_space(id).await {
            warn!("Room {} survived after its {} location(s) were deleted", id, deleted.len());
            self.purge(&deleted);
            return Err(Error::RoomDeletionIncomplete {
                room_id: id.to_string(),
                locations_deleted: deleted,
                source: Box::new(err),
            });
        }
        deleted.push(id.to_string());
        self.purge(&deleted);
        info!("Deleted room {} with {} location(s)", id, deleted.len() - 1);
        Ok(SpaceDeletion { deleted })
    }

    fn purge(&self, space_ids: &[SpaceId]) {
        if !space_ids.is_empty() {
            self.cache.remove_in_spaces(space_ids);
        }
    }
}
