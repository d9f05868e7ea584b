//! Assigning recognized candidates to rooms and locations
//!
//! [`PlacementState`] holds a batch of candidates together with either one
//! shared selection or a selection per candidate, plus an edit buffer per
//! candidate so edits never touch the recognized values until saved.

mod selection;

pub use selection::Selection;

use log::debug;

use crate::error::{Error, Result};
use crate::form::ItemForm;
use crate::items::NewItem;
use crate::recognition::{CandidateFields, CandidateId, RecognitionCandidate};
use crate::spaces::Space;

/// How a batch is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    /// One room/location for every candidate
    #[default]
    Shared,
    /// Each candidate carries its own room/location
    PerItem,
}

/// Whose selection a transition applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Shared,
    Candidate(CandidateId),
}

/// A candidate ready to be written, with its resolved space
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCandidate {
    pub candidate_id: CandidateId,
    pub item: NewItem,
}

#[derive(Debug, Clone)]
struct Pending {
    candidate: RecognitionCandidate,
    selection: Selection,
    edit: Option<CandidateFields>,
}

/// Placement and editing state for one batch of candidates
#[derive(Debug, Clone, Default)]
pub struct PlacementState {
    mode: PlacementMode,
    shared: Selection,
    pending: Vec<Pending>,
}

impl PlacementState {
    /// Start placing `candidates` in `mode`
    pub fn new(candidates: Vec<RecognitionCandidate>, mode: PlacementMode) -> Self {
        Self {
            mode,
            shared: Selection::empty(),
            pending: candidates
                .into_iter()
                .map(|candidate| Pending {
                    candidate,
                    selection: Selection::empty(),
                    edit: None,
                })
                .collect(),
        }
    }

    /// The current mode
    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    /// Switch mode; selections made in either mode are kept
    pub fn set_mode(&mut self, mode: PlacementMode) {
        self.mode = mode;
    }

    /// Candidates still pending, in recognition order
    pub fn candidates(&self) -> impl Iterator<Item = &RecognitionCandidate> {
        self.pending.iter().map(|p| &p.candidate)
    }

    /// Look up a pending candidate
    pub fn candidate(&self, id: CandidateId) -> Option<&RecognitionCandidate> {
        self.find(id).map(|p| &p.candidate)
    }

    /// Number of pending candidates
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no candidates are pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The selection `target` currently holds
    pub fn selection(&self, target: Target) -> Option<&Selection> {
        match target {
            Target::Shared => Some(&self.shared),
            Target::Candidate(id) => self.find(id).map(|p| &p.selection),
        }
    }

    fn find(&self, id: CandidateId) -> Option<&Pending> {
        self.pending.iter().find(|p| p.candidate.id == id)
    }

    fn find_mut(&mut self, id: CandidateId) -> Result<&mut Pending> {
        self.pending
            .iter_mut()
            .find(|p| p.candidate.id == id)
            .ok_or_else(|| Error::validation(format!("no pending candidate {}", id)))
    }

    fn selection_mut(&mut self, target: Target) -> Result<&mut Selection> {
        match target {
            Target::Shared => Ok(&mut self.shared),
            Target::Candidate(id) => Ok(&mut self.find_mut(id)?.selection),
        }
    }

    fn transition<F>(&mut self, target: Target, step: F) -> Result<()>
    where
        F: FnOnce(Selection) -> Result<Selection>,
    {
        let slot = self.selection_mut(target)?;
        *slot = step(slot.clone())?;
        Ok(())
    }

    /// Select a room for `target`, clearing its location if the room changed
    pub fn select_room(&mut self, target: Target, spaces: &[Space], room_id: &str) -> Result<()> {
        self.transition(target, |s| s.select_room(spaces, room_id))
    }

    /// Select a location for `target` under its current room
    pub fn select_location(&mut self, target: Target, spaces: &[Space], location_id: &str) -> Result<()> {
        self.transition(target, |s| s.select_location(spaces, location_id))
    }

    /// Locations offered to `target` for its current room
    pub fn location_options<'a>(&self, target: Target, spaces: &'a [Space]) -> Vec<&'a Space> {
        self.selection(target)
            .map(|s| s.location_options(spaces))
            .unwrap_or_default()
    }

    /// Pre-select per-item placements from the recognizer's location hints.
    ///
    /// A hint matching a location name (case-insensitive) selects that
    /// location and its room; candidates that already have a room are left
    /// alone. Returns how many candidates were placed.
    pub fn apply_suggestions(&mut self, spaces: &[Space]) -> usize {
        let mut placed = 0;
        for pending in &mut self.pending {
            if pending.selection.room_id().is_some() {
                continue;
            }
            let hint = match pending.candidate.suggested_location.as_deref() {
                Some(hint) => hint.trim().to_lowercase(),
                None => continue,
            };
            let location = spaces
                .iter()
                .filter(|s| !s.is_room())
                .find(|s| s.name.trim().to_lowercase() == hint);
            let (location, room_id) = match location.and_then(|l| l.parent_id.as_deref().map(|r| (l, r))) {
                Some(found) => found,
                None => continue,
            };
            let selected = Selection::empty()
                .select_room(spaces, room_id)
                .and_then(|s| s.select_location(spaces, &location.id));
            if let Ok(selection) = selected {
                pending.selection = selection;
                placed += 1;
            }
        }
        if placed > 0 {
            debug!("Placed {} candidate(s) from location hints", placed);
        }
        placed
    }

    /// Open (or reopen) the edit buffer of a candidate
    pub fn begin_edit(&mut self, id: CandidateId) -> Result<&mut CandidateFields> {
        let pending = self.find_mut(id)?;
        let fields = pending.candidate.fields.clone();
        Ok(pending.edit.get_or_insert(fields))
    }

    /// The edit buffer of a candidate, if one is open
    pub fn edit_buffer(&self, id: CandidateId) -> Option<&CandidateFields> {
        self.find(id).and_then(|p| p.edit.as_ref())
    }

    /// Mutable access to an open edit buffer
    pub fn edit_buffer_mut(&mut self, id: CandidateId) -> Option<&mut CandidateFields> {
        self.pending
            .iter_mut()
            .find(|p| p.candidate.id == id)
            .and_then(|p| p.edit.as_mut())
    }

    /// Validate the edit buffer and write it into the candidate.
    ///
    /// On a validation error the buffer stays open and unchanged.
    pub fn save_edit(&mut self, id: CandidateId) -> Result<()> {
        let pending = self.find_mut(id)?;
        let edited = pending
            .edit
            .as_ref()
            .ok_or_else(|| Error::validation(format!("candidate {} is not being edited", id)))?;
        ItemForm::candidate().validate(&edited.to_new_item(""))?;

        if let Some(mut fields) = pending.edit.take() {
            fields.name = fields.name.trim().to_string();
            pending.candidate.fields = fields;
        }
        Ok(())
    }

    /// Throw the edit buffer away
    pub fn cancel_edit(&mut self, id: CandidateId) {
        if let Some(pending) = self.pending.iter_mut().find(|p| p.candidate.id == id) {
            pending.edit = None;
        }
    }

    /// Drop a candidate from the batch
    pub fn discard(&mut self, id: CandidateId) -> Option<RecognitionCandidate> {
        let index = self.pending.iter().position(|p| p.candidate.id == id)?;
        Some(self.pending.remove(index).candidate)
    }

    /// Remove candidates that were committed
    pub fn remove_committed(&mut self, ids: &[CandidateId]) {
        self.pending.retain(|p| !ids.contains(&p.candidate.id));
    }

    /// Resolve every pending candidate to a create request.
    ///
    /// Fails with `MissingPlacement` naming the candidates without a room and
    /// location, and with a validation error for a candidate without a name.
    /// Open edit buffers are ignored; only saved values are committed.
    pub fn resolve(&self) -> Result<Vec<ResolvedCandidate>> {
        if let Some(nameless) = self.pending.iter().find(|p| p.candidate.name().trim().is_empty()) {
            return Err(Error::validation(format!(
                "candidate {} has no name",
                nameless.candidate.id
            )));
        }

        let unresolved: Vec<String> = self
            .pending
            .iter()
            .filter(|p| self.space_for(p).is_none())
            .map(|p| p.candidate.name().to_string())
            .collect();
        if !unresolved.is_empty() {
            return Err(Error::MissingPlacement { unresolved });
        }

        Ok(self
            .pending
            .iter()
            .filter_map(|p| {
                self.space_for(p).map(|space_id| ResolvedCandidate {
                    candidate_id: p.candidate.id,
                    item: p.candidate.fields.to_new_item(space_id),
                })
            })
            .collect())
    }

    fn space_for<'a>(&'a self, pending: &'a Pending) -> Option<&'a str> {
        match self.mode {
            PlacementMode::Shared => self.shared.resolved(),
            PlacementMode::PerItem => pending.selection.resolved(),
        }
    }
}
