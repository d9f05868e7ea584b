//! Types for cataloged items

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::spaces::SpaceId;

/// Opaque item identifier
pub type ItemId = String;

/// Physical condition of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

impl Condition {
    /// Parse a loosely formatted condition such as `"Like New"` or `"like_new"`
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '_' { '-' } else { c })
            .collect();
        match normalized.as_str() {
            "new" => Some(Condition::New),
            "like-new" => Some(Condition::LikeNew),
            "good" => Some(Condition::Good),
            "fair" => Some(Condition::Fair),
            "poor" => Some(Condition::Poor),
            _ => None,
        }
    }
}

/// Attention level of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Parse a priority case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "normal" => Some(Priority::Normal),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

fn default_quantity() -> u32 {
    1
}

/// A cataloged belonging, as returned by the service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub expire_date: Option<NaiveDate>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub purchase_source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub space_id: SpaceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    /// The writable fields of this item, e.g. to send a full update
    pub fn to_new_item(&self) -> NewItem {
        NewItem {
            name: self.name.clone(),
            quantity: self.quantity,
            category: self.category.clone(),
            expire_date: self.expire_date,
            value: self.value,
            brand: self.brand.clone(),
            purchase_date: self.purchase_date,
            purchase_source: self.purchase_source.clone(),
            notes: self.notes.clone(),
            condition: self.condition,
            priority: self.priority,
            photo_url: self.photo_url.clone(),
            space_id: self.space_id.clone(),
        }
    }
}

/// Request body for `POST /items` and `PUT /items/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub space_id: SpaceId,
}

impl NewItem {
    /// A single item with every optional field empty
    pub fn new(name: &str, space_id: &str) -> Self {
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
            priority: Priority::Normal,
            photo_url: None,
            space_id: space_id.to_string(),
        }
    }
}
