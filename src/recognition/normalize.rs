//! Turn raw recognition output into inventory-shaped candidates

use chrono::{DateTime, NaiveDate};
use log::debug;
use serde_json::Value;

use super::types::{CandidateFields, CandidateId, RawRecognitionEntry, RecognitionCandidate, SourceType};
use crate::items::{Condition, Priority};

/// Smallest quantity a candidate may carry
pub const MIN_QUANTITY: u32 = 1;
/// Largest quantity a candidate may carry
pub const MAX_QUANTITY: u32 = 999;

/// Maximum lengths in characters, per field
pub mod limits {
    pub const NAME: usize = 100;
    pub const CATEGORY: usize = 50;
    pub const BRAND: usize = 50;
    pub const PURCHASE_SOURCE: usize = 50;
    pub const NOTES: usize = 200;
    pub const SUGGESTED_LOCATION: usize = 100;
    pub const EXPIRY_DATE_HINT: usize = 100;
    pub const UNIT: usize = 20;
    pub const SIZE: usize = 50;
    pub const COLOR: usize = 30;
    pub const PHOTO_URL: usize = 500;
}

/// Keep at most `max` characters
pub fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Trim, drop when empty, then bound the length
fn clean(value: Option<String>, max: usize) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| truncate(&v, max))
}

/// Clamp a raw quantity into `[1, 999]`; anything unparseable becomes 1
pub fn parse_quantity(raw: Option<&Value>) -> u32 {
    let number = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => {
            let whole = n.trunc();
            if whole < MIN_QUANTITY as f64 {
                MIN_QUANTITY
            } else if whole > MAX_QUANTITY as f64 {
                MAX_QUANTITY
            } else {
                whole as u32
            }
        }
        _ => MIN_QUANTITY,
    }
}

/// A non-negative, finite value, or nothing
pub fn parse_value(raw: Option<&Value>) -> Option<f64> {
    let number = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    if number.is_finite() && number >= 0.0 {
        Some(number)
    } else {
        None
    }
}

/// Confidence clamped into `[0, 1]`
fn parse_confidence(raw: Option<&Value>) -> Option<f32> {
    let number = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    if number.is_nan() {
        return None;
    }
    Some(number.clamp(0.0, 1.0) as f32)
}

fn parse_flag(raw: Option<&Value>) -> bool {
    match raw {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    }
}

/// `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Normalize one raw entry; entries without a usable name yield `None`
pub fn normalize_entry(raw: RawRecognitionEntry) -> Option<RecognitionCandidate> {
    let name = clean(raw.name, limits::NAME)?;

    let fields = CandidateFields {
        name,
        quantity: parse_quantity(raw.quantity.as_ref()),
        category: clean(raw.category, limits::CATEGORY),
        expire_date: parse_date(raw.expire_date.as_deref()),
        value: parse_value(raw.value.as_ref()),
        brand: clean(raw.brand, limits::BRAND),
        purchase_date: parse_date(raw.purchase_date.as_deref()),
        purchase_source: clean(raw.purchase_source, limits::PURCHASE_SOURCE),
        notes: clean(raw.notes, limits::NOTES),
        condition: raw.condition.as_deref().and_then(Condition::parse),
        priority: raw.priority.as_deref().and_then(Priority::parse),
        photo_url: clean(raw.photo_url, limits::PHOTO_URL),
    };

    Some(RecognitionCandidate {
        id: CandidateId::new(),
        fields,
        confidence: parse_confidence(raw.confidence.as_ref()),
        source_type: raw.source_type.as_deref().and_then(SourceType::parse),
        suggested_location: clean(raw.suggested_location, limits::SUGGESTED_LOCATION),
        needs_expiry_date: parse_flag(raw.needs_expiry_date.as_ref()),
        expiry_date_hint: clean(raw.expiry_date_hint, limits::EXPIRY_DATE_HINT),
        unit: clean(raw.unit, limits::UNIT),
        size: clean(raw.size, limits::SIZE),
        color: clean(raw.color, limits::COLOR),
    })
}

/// Normalize a whole recognition response.
///
/// Order is preserved and same-named entries stay separate candidates.
pub fn normalize(entries: Vec<RawRecognitionEntry>) -> Vec<RecognitionCandidate> {
    let total = entries.len();
    let candidates: Vec<RecognitionCandidate> = entries.into_iter().filter_map(normalize_entry).collect();
    if candidates.len() < total {
        debug!(
            "Dropped {} of {} recognition entries without a name",
            total - candidates.len(),
            total
        );
    }
    candidates
}
