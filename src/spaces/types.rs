//! Types for the space hierarchy

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Opaque space identifier
pub type SpaceId = String;

/// Depth of a space in the two-level tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SpaceLevel {
    /// Top-level space without a parent
    Room,
    /// Child space, always under exactly one room
    Location,
}

impl SpaceLevel {
    /// Numeric level as stored by the service
    pub fn as_u8(&self) -> u8 {
        match self {
            SpaceLevel::Room => 1,
            SpaceLevel::Location => 2,
        }
    }
}

impl TryFrom<u8> for SpaceLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SpaceLevel::Room),
            2 => Ok(SpaceLevel::Location),
            other => Err(format!("space level must be 1 or 2, got {}", other)),
        }
    }
}

impl From<SpaceLevel> for u8 {
    fn from(level: SpaceLevel) -> u8 {
        level.as_u8()
    }
}

/// A room or location owned by one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Space {
    /// Unique, owner-scoped id
    pub id: SpaceId,

    /// Owner, when the service includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Display name
    pub name: String,

    /// Room or location
    pub level: SpaceLevel,

    /// The room of a location; always empty for rooms
    #[serde(default)]
    pub parent_id: Option<SpaceId>,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Icon key from the preset catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Space {
    /// Whether this space is a room
    pub fn is_room(&self) -> bool {
        self.level == SpaceLevel::Room
    }

    /// Whether this space is a location under `room_id`
    pub fn is_location_of(&self, room_id: &str) -> bool {
        self.level == SpaceLevel::Location && self.parent_id.as_deref() == Some(room_id)
    }
}

/// Request body for `POST /spaces`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSpace {
    pub name: String,
    pub level: SpaceLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<SpaceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewSpace {
    /// A new room
    pub fn room(name: &str) -> Self {
        Self {
            name: name.to_string(),
            level: SpaceLevel::Room,
            parent_id: None,
            icon: None,
            description: None,
        }
    }

    /// A new location under `room_id`
    pub fn location(name: &str, room_id: &str) -> Self {
        Self {
            name: name.to_string(),
            level: SpaceLevel::Location,
            parent_id: Some(room_id.to_string()),
            icon: None,
            description: None,
        }
    }

    /// Set the icon
    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// A room with its locations, as shown in the tree view
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceNode {
    pub room: Space,
    pub locations: Vec<Space>,
}

/// Result of a successful space deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceDeletion {
    /// Every space id that no longer exists, children first
    pub deleted: Vec<SpaceId>,
}
