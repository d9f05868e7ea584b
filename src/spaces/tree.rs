//! Tree and flat views over a user's spaces

use super::types::{NewSpace, Space, SpaceLevel, SpaceNode};
use crate::error::{Error, ParentRejection, Result};

const MAX_SPACE_NAME: usize = 50;

fn by_name(a: &Space, b: &Space) -> std::cmp::Ordering {
    a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
}

/// All rooms, sorted by name
pub fn rooms_of(spaces: &[Space]) -> Vec<&Space> {
    let mut rooms: Vec<&Space> = spaces.iter().filter(|s| s.is_room()).collect();
    rooms.sort_by(|a, b| by_name(a, b));
    rooms
}

/// The locations directly under `room_id`, sorted by name
pub fn locations_of<'a>(spaces: &'a [Space], room_id: &str) -> Vec<&'a Space> {
    let mut locations: Vec<&Space> = spaces.iter().filter(|s| s.is_location_of(room_id)).collect();
    locations.sort_by(|a, b| by_name(a, b));
    locations
}

/// Nest locations under their rooms.
///
/// Locations whose room is not in `spaces` are left out of the tree.
pub fn build_tree(spaces: &[Space]) -> Vec<SpaceNode> {
    rooms_of(spaces)
        .into_iter()
        .map(|room| SpaceNode {
            room: room.clone(),
            locations: locations_of(spaces, &room.id).into_iter().cloned().collect(),
        })
        .collect()
}

/// Case-insensitive match on name and description; an empty query keeps everything
pub fn filter_spaces<'a>(spaces: &'a [Space], query: &str) -> Vec<&'a Space> {
    let needle = query.trim().to_lowercase();
    spaces
        .iter()
        .filter(|space| {
            needle.is_empty()
                || space.name.to_lowercase().contains(&needle)
                || space
                    .description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        })
        .collect()
}

/// Find a space by id
pub fn find<'a>(spaces: &'a [Space], id: &str) -> Option<&'a Space> {
    spaces.iter().find(|s| s.id == id)
}

/// Check a new space against the caller's known spaces.
///
/// `owner` is the current user; a parent carrying another `user_id` is refused.
pub fn validate_new_space(spaces: &[Space], new: &NewSpace, owner: Option<&str>) -> Result<()> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(Error::validation("space name is required"));
    }
    if name.chars().count() > MAX_SPACE_NAME {
        return Err(Error::validation(format!(
            "space name must be at most {} characters",
            MAX_SPACE_NAME
        )));
    }

    match new.level {
        SpaceLevel::Room => {
            if new.parent_id.is_some() {
                return Err(Error::validation("a room cannot have a parent"));
            }
            Ok(())
        }
        SpaceLevel::Location => {
            let parent_id = new
                .parent_id
                .as_deref()
                .ok_or_else(|| Error::validation("a location requires a parent room"))?;
            let reject = |reason| Error::InvalidParent {
                parent_id: parent_id.to_string(),
                reason,
            };

            let parent = find(spaces, parent_id).ok_or_else(|| reject(ParentRejection::Missing))?;
            if let (Some(owner), Some(parent_owner)) = (owner, parent.user_id.as_deref()) {
                if owner != parent_owner {
                    return Err(reject(ParentRejection::NotOwned));
                }
            }
            if !parent.is_room() {
                return Err(reject(ParentRejection::NotARoom));
            }
            Ok(())
        }
    }
}
