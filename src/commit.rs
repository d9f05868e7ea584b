//! Batch commit of resolved candidates
//!
//! Every candidate is created by its own request. A failed request does not
//! stop its siblings, except for a 401: once one is seen no further requests
//! are started and the outcome asks for re-authentication. Items that were
//! created go straight into the [`ItemCache`].

use futures_util::stream::{self, StreamExt};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::backend::InventoryBackend;
use crate::cache::ItemCache;
use crate::error::{Error, Result};
use crate::form::ItemForm;
use crate::items::Item;
use crate::placement::ResolvedCandidate;
use crate::recognition::CandidateId;

/// A candidate that is now a persisted item
#[derive(Debug, Clone)]
pub struct CommittedItem {
    pub candidate_id: CandidateId,
    pub item: Item,
}

/// A candidate whose create request failed
#[derive(Debug)]
pub struct CommitFailure {
    pub candidate_id: CandidateId,
    pub name: String,
    pub error: Error,
}

/// What happened to each candidate of a batch
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Created items, in submission order
    pub committed: Vec<CommittedItem>,
    /// Requests that failed
    pub failed: Vec<CommitFailure>,
    /// Candidates never sent because the batch was halted
    pub skipped: Vec<CandidateId>,
    /// A request was answered with 401
    pub reauth_required: bool,
}

impl BatchOutcome {
    pub fn success_count(&self) -> usize {
        self.committed.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// Whether every candidate was committed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    /// Ids of the committed candidates
    pub fn committed_ids(&self) -> Vec<CandidateId> {
        self.committed.iter().map(|c| c.candidate_id).collect()
    }

    /// A count-only message for the user
    pub fn summary(&self) -> String {
        let total = self.committed.len() + self.failed.len() + self.skipped.len();
        let mut message = if self.is_complete() {
            format!("Saved {} item(s)", total)
        } else {
            format!("Saved {} of {} item(s)", self.committed.len(), total)
        };
        if !self.failed.is_empty() {
            message.push_str(&format!(", {} failed", self.failed.len()));
        }
        if !self.skipped.is_empty() {
            message.push_str(&format!(", {} not attempted", self.skipped.len()));
        }
        if self.reauth_required {
            message.push_str("; sign in again to continue");
        }
        message
    }
}

/// Writes resolved candidates with bounded concurrency
pub struct BatchCommitter<'a> {
    backend: &'a dyn InventoryBackend,
    cache: &'a ItemCache,
    concurrency: usize,
}

impl<'a> BatchCommitter<'a> {
    pub fn new(backend: &'a dyn InventoryBackend, cache: &'a ItemCache, concurrency: usize) -> Self {
        Self {
            backend,
            cache,
            concurrency: concurrency.max(1),
        }
    }

    /// Create every candidate and reconcile the cache.
    ///
    /// Fails without sending anything if a candidate does not pass the full
    /// item form; otherwise per-item failures land in the outcome.
    pub async fn commit(&self, batch: Vec<ResolvedCandidate>) -> Result<BatchOutcome> {
        let form = ItemForm::full();
        for candidate in &batch {
            form.validate(&candidate.item).map_err(|err| match err {
                Error::Validation(msg) => Error::Validation(format!("{}: {}", candidate.item.name, msg)),
                other => other,
            })?;
        }

        let halted = AtomicBool::new(false);
        let halted = &halted;
        let results: Vec<(ResolvedCandidate, Option<Result<Item>>)> = stream::iter(batch)
            .map(|candidate| async move {
                if halted.load(Ordering::SeqCst) {
                    return (candidate, None);
                }
                let result = self.backend.create_item(&candidate.item).await;
                if let Err(err) = &result {
                    if err.halts_batch() {
                        halted.store(true, Ordering::SeqCst);
                    }
                }
                (candidate, Some(result))
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut outcome = BatchOutcome {
            reauth_required: halted.load(Ordering::SeqCst),
            ..Default::default()
        };
        for (candidate, result) in results {
            match result {
                Some(Ok(item)) => {
                    self.cache.add(item.clone());
                    outcome.committed.push(CommittedItem {
                        candidate_id: candidate.candidate_id,
                        item,
                    });
                }
                Some(Err(error)) => {
                    warn!("Failed to save {}: {}", candidate.item.name, error);
                    outcome.failed.push(CommitFailure {
                        candidate_id: candidate.candidate_id,
                        name: candidate.item.name,
                        error,
                    });
                }
                None => outcome.skipped.push(candidate.candidate_id),
            }
        }

        info!("{}", outcome.summary());
        Ok(outcome)
    }
}
