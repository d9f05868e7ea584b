//! Room/location selection with pure transitions

use crate::error::{Error, Result};
use crate::spaces::{self, Space, SpaceId};

/// A (room, location) choice in progress.
///
/// `room selected -> location cleared -> location selected`: picking a
/// different room always forgets the location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    room_id: Option<SpaceId>,
    location_id: Option<SpaceId>,
}

impl Selection {
    /// Nothing selected
    pub fn empty() -> Self {
        Self::default()
    }

    /// The selected room
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    /// The selected location
    pub fn location_id(&self) -> Option<&str> {
        self.location_id.as_deref()
    }

    /// The space an item would be committed to, once both levels are chosen
    pub fn resolved(&self) -> Option<&str> {
        match (&self.room_id, &self.location_id) {
            (Some(_), Some(location)) => Some(location.as_str()),
            _ => None,
        }
    }

    /// Select a room; a different room clears the location
    pub fn select_room(self, spaces: &[Space], room_id: &str) -> Result<Self> {
        match spaces::find(spaces, room_id) {
            Some(space) if space.is_room() => {}
            Some(_) => return Err(Error::InvalidPlacement(format!("{} is not a room", room_id))),
            None => return Err(Error::InvalidPlacement(format!("unknown room {}", room_id))),
        }

        if self.room_id.as_deref() == Some(room_id) {
            return Ok(self);
        }
        Ok(Self {
            room_id: Some(room_id.to_string()),
            location_id: None,
        })
    }

    /// Select a location under the current room
    pub fn select_location(self, spaces: &[Space], location_id: &str) -> Result<Self> {
        let room_id = self
            .room_id
            .as_deref()
            .ok_or_else(|| Error::InvalidPlacement("select a room before a location".to_string()))?;
        let fits = spaces::find(spaces, location_id)
            .map(|space| space.is_location_of(room_id))
            .unwrap_or(false);
        if !fits {
            return Err(Error::InvalidPlacement(format!(
                "{} is not a location in room {}",
                location_id, room_id
            )));
        }
        Ok(Self {
            location_id: Some(location_id.to_string()),
            ..self
        })
    }

    /// Forget the location but keep the room
    pub fn clear_location(self) -> Self {
        Self {
            location_id: None,
            ..self
        }
    }

    /// The locations offered for the current room
    pub fn location_options<'a>(&self, spaces: &'a [Space]) -> Vec<&'a Space> {
        match self.room_id.as_deref() {
            Some(room_id) => spaces::locations_of(spaces, room_id),
            None => Vec::new(),
        }
    }
}
