//! Photo recognition output: normalization and heuristic classification
//!
//! Raw entries from the vision service go through [`normalize`] first, which
//! drops nameless entries and bounds every field, then through a
//! [`Classifier`] that fills in category, expiry date and value.

mod classify;
mod normalize;
mod types;

pub use classify::*;
pub use normalize::*;
pub use types::*;

/// Normalize raw entries and classify the survivors
pub fn prepare(entries: Vec<RawRecognitionEntry>, classifier: &Classifier) -> Vec<RecognitionCandidate> {
    let mut candidates = normalize(entries);
    classifier.classify_all(&mut candidates);
    candidates
}
