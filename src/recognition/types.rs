//! Types for raw recognition output and inventory-ready candidates

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::items::{Condition, NewItem, Priority};

/// Accept strings, numbers and booleans where a string is expected
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// One entry of a `POST /recognize` response.
///
/// Any field may be missing or carry the wrong JSON type; the normalizer
/// decides what survives.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RawRecognitionEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    pub quantity: Option<Value>,
    #[serde(deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient_string", alias = "expireDate")]
    pub expire_date: Option<String>,
    pub value: Option<Value>,
    #[serde(deserialize_with = "lenient_string")]
    pub brand: Option<String>,
    #[serde(deserialize_with = "lenient_string", alias = "purchaseDate")]
    pub purchase_date: Option<String>,
    #[serde(deserialize_with = "lenient_string", alias = "purchaseSource")]
    pub purchase_source: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub condition: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub priority: Option<String>,
    #[serde(deserialize_with = "lenient_string", alias = "photoUrl")]
    pub photo_url: Option<String>,
    pub confidence: Option<Value>,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub source_type: Option<String>,
    #[serde(deserialize_with = "lenient_string", alias = "suggestedLocation")]
    pub suggested_location: Option<String>,
    #[serde(alias = "needsExpiryDate")]
    pub needs_expiry_date: Option<Value>,
    #[serde(deserialize_with = "lenient_string", alias = "expiryDateHint")]
    pub expiry_date_hint: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub unit: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub size: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub color: Option<String>,
}

/// Client-generated identity of a candidate; never shared with a persisted item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(Uuid);

impl CandidateId {
    /// A fresh random id
    pub fn new() -> Self {
        CandidateId(Uuid::new_v4())
    }
}

impl Default for CandidateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the recognizer read the item from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A product label or packaging
    Label,
    /// Free text in the photo
    Text,
}

impl SourceType {
    /// Parse `label` / `text` case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "label" => Some(SourceType::Label),
            "text" => Some(SourceType::Text),
            _ => None,
        }
    }
}

/// The user-editable part of a candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFields {
    pub name: String,
    pub quantity: u32,
    pub category: Option<String>,
    pub expire_date: Option<NaiveDate>,
    pub value: Option<f64>,
    pub brand: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_source: Option<String>,
    pub notes: Option<String>,
    pub condition: Option<Condition>,
    pub priority: Option<Priority>,
    pub photo_url: Option<String>,
}

impl CandidateFields {
    /// Fields with only a name set
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: 1,
            category: None,
            expire_date: None,
            value: None,
            brand: None,
            purchase_date: None,
            purchase_source: None,
            notes: None,
            condition: None,
            priority: None,
            photo_url: None,
        }
    }

    /// Build the create request for these fields in `space_id`
    pub fn to_new_item(&self, space_id: &str) -> NewItem {
        NewItem {
            name: self.name.trim().to_string(),
            quantity: self.quantity,
            category: self.category.clone(),
            expire_date: self.expire_date,
            value: self.value,
            brand: self.brand.clone(),
            purchase_date: self.purchase_date,
            purchase_source: self.purchase_source.clone(),
            notes: self.notes.clone(),
            condition: self.condition,
            priority: self.priority.unwrap_or_default(),
            photo_url: self.photo_url.clone(),
            space_id: space_id.to_string(),
        }
    }
}

/// A recognized proto-item awaiting confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionCandidate {
    pub id: CandidateId,
    #[serde(flatten)]
    pub fields: CandidateFields,
    pub confidence: Option<f32>,
    pub source_type: Option<SourceType>,
    pub suggested_location: Option<String>,
    pub needs_expiry_date: bool,
    pub expiry_date_hint: Option<String>,
    pub unit: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl RecognitionCandidate {
    /// A candidate with only a name, as if typed in by hand
    pub fn named(name: &str) -> Self {
        Self {
            id: CandidateId::new(),
            fields: CandidateFields::named(name),
            confidence: None,
            source_type: None,
            suggested_location: None,
            needs_expiry_date: false,
            expiry_date_hint: None,
            unit: None,
            size: None,
            color: None,
        }
    }

    /// The candidate's display name
    pub fn name(&self) -> &str {
        &self.fields.name
    }
}

/// Body of a `POST /recognize` request
#[derive(Debug, Clone, Serialize)]
pub struct RecognizeRequest {
    /// Base64-encoded image bytes
    pub image: String,
    /// MIME type of the image, e.g. `image/jpeg`
    pub mime_type: String,
}
