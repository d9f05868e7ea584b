//! One photo's trip from recognition to committed items
//!
//! [`IngestSession`] holds the candidates of one recognition call together
//! with the user's spaces while placement and editing happen. Committing
//! removes the saved candidates; the rest stay for another attempt.

use log::debug;
use std::path::Path;

use crate::backend::InventoryBackend;
use crate::commit::{BatchCommitter, BatchOutcome};
use crate::error::{Error, Result};
use crate::placement::{PlacementMode, PlacementState, Target};
use crate::recognition::RecognitionCandidate;
use crate::spaces::{self, Space};

/// MIME type of a photo, from its file extension
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// Read a photo from disk together with its MIME type
pub async fn read_photo(path: &Path) -> Result<(Vec<u8>, &'static str)> {
    let mime_type = mime_type_for(path)
        .ok_or_else(|| Error::validation(format!("{} is not a supported image", path.display())))?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::validation(format!("cannot read {}: {}", path.display(), e)))?;
    if bytes.is_empty() {
        return Err(Error::validation(format!("{} is empty", path.display())));
    }
    debug!("Read {} bytes of {} from {}", bytes.len(), mime_type, path.display());
    Ok((bytes, mime_type))
}

/// Candidates of one photo awaiting placement and commit
#[derive(Debug, Clone)]
pub struct IngestSession {
    placement: PlacementState,
    spaces: Vec<Space>,
    spaces_loaded: bool,
}

impl IngestSession {
    /// Start a session; location hints are applied to per-item selections
    pub fn new(candidates: Vec<RecognitionCandidate>, spaces: Vec<Space>, mode: PlacementMode) -> Self {
        let mut placement = PlacementState::new(candidates, mode);
        placement.apply_suggestions(&spaces);
        Self {
            placement,
            spaces,
            spaces_loaded: true,
        }
    }

    /// Start a session whose spaces could not be listed yet
    pub fn without_spaces(candidates: Vec<RecognitionCandidate>, mode: PlacementMode) -> Self {
        Self {
            placement: PlacementState::new(candidates, mode),
            spaces: Vec::new(),
            spaces_loaded: false,
        }
    }

    /// The spaces placement is chosen from
    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    /// Whether the space list was fetched successfully
    pub fn spaces_loaded(&self) -> bool {
        self.spaces_loaded
    }

    /// Fetch the space list again, keeping candidates and selections.
    ///
    /// Location hints are applied to candidates that have no room yet.
    pub async fn reload_spaces(&mut self, backend: &dyn InventoryBackend) -> Result<usize> {
        let spaces = backend.list_spaces().await?;
        self.placement.apply_suggestions(&spaces);
        self.spaces = spaces;
        self.spaces_loaded = true;
        debug!("Loaded {} space(s) into the session", self.spaces.len());
        Ok(self.spaces.len())
    }

    /// Rooms offered for selection
    pub fn rooms(&self) -> Vec<&Space> {
        spaces::rooms_of(&self.spaces)
    }

    /// Locations offered to `target`
    pub fn location_options(&self, target: Target) -> Vec<&Space> {
        self.placement.location_options(target, &self.spaces)
    }

    pub fn placement(&self) -> &PlacementState {
        &self.placement
    }

    /// Direct access for edits, discards and mode changes
    pub fn placement_mut(&mut self) -> &mut PlacementState {
        &mut self.placement
    }

    pub fn select_room(&mut self, target: Target, room_id: &str) -> Result<()> {
        self.placement.select_room(target, &self.spaces, room_id)
    }

    pub fn select_location(&mut self, target: Target, location_id: &str) -> Result<()> {
        self.placement.select_location(target, &self.spaces, location_id)
    }

    /// Nothing left to commit
    pub fn is_finished(&self) -> bool {
        self.placement.is_empty()
    }

    /// Resolve placement and commit every pending candidate.
    ///
    /// Nothing is sent when any candidate lacks a room and location.
    pub async fn commit(&mut self, committer: &BatchCommitter<'_>) -> Result<BatchOutcome> {
        let resolved = self.placement.resolve()?;
        let outcome = committer.commit(resolved).await?;
        self.placement.remove_committed(&outcome.committed_ids());
        Ok(outcome)
    }
}
