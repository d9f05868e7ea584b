//! Declarative item form shared by manual entry and candidate editing
//!
//! One field list drives both the short "quick add" form and the full form;
//! validation runs here, before anything is sent to the service.

use crate::error::{Error, Result};
use crate::items::NewItem;
use crate::recognition::{limits, MAX_QUANTITY, MIN_QUANTITY};

/// A field an item form can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Quantity,
    Category,
    ExpireDate,
    Value,
    Brand,
    PurchaseDate,
    PurchaseSource,
    Notes,
    Condition,
    Priority,
    PhotoUrl,
    Space,
}

/// How a field is entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldInput {
    Text { max_chars: usize },
    LongText { max_chars: usize },
    Integer { min: u32, max: u32 },
    Money,
    Date,
    Choice,
    SpacePicker,
}

impl Field {
    /// Wire name of the field
    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Quantity => "quantity",
            Field::Category => "category",
            Field::ExpireDate => "expire_date",
            Field::Value => "value",
            Field::Brand => "brand",
            Field::PurchaseDate => "purchase_date",
            Field::PurchaseSource => "purchase_source",
            Field::Notes => "notes",
            Field::Condition => "condition",
            Field::Priority => "priority",
            Field::PhotoUrl => "photo_url",
            Field::Space => "space_id",
        }
    }

    /// Input widget and bounds
    pub fn input(&self) -> FieldInput {
        match self {
            Field::Name => FieldInput::Text { max_chars: limits::NAME },
            Field::Quantity => FieldInput::Integer {
                min: MIN_QUANTITY,
                max: MAX_QUANTITY,
            },
            Field::Category => FieldInput::Text { max_chars: limits::CATEGORY },
            Field::ExpireDate | Field::PurchaseDate => FieldInput::Date,
            Field::Value => FieldInput::Money,
            Field::Brand => FieldInput::Text { max_chars: limits::BRAND },
            Field::PurchaseSource => FieldInput::Text {
                max_chars: limits::PURCHASE_SOURCE,
            },
            Field::Notes => FieldInput::LongText { max_chars: limits::NOTES },
            Field::Condition | Field::Priority => FieldInput::Choice,
            Field::PhotoUrl => FieldInput::Text {
                max_chars: limits::PHOTO_URL,
            },
            Field::Space => FieldInput::SpacePicker,
        }
    }
}

/// One row of a form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    pub required: bool,
}

const fn required(field: Field) -> FieldSpec {
    FieldSpec { field, required: true }
}

const fn optional(field: Field) -> FieldSpec {
    FieldSpec { field, required: false }
}

/// An ordered list of fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemForm {
    fields: Vec<FieldSpec>,
}

impl ItemForm {
    /// Build a form from an explicit field list
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Quick-add form: name, quantity, category, expiry and placement
    pub fn minimal() -> Self {
        Self::new(vec![
            required(Field::Name),
            optional(Field::Quantity),
            optional(Field::Category),
            optional(Field::ExpireDate),
            required(Field::Space),
        ])
    }

    /// Every item field
    pub fn full() -> Self {
        Self::new(vec![
            required(Field::Name),
            optional(Field::Quantity),
            optional(Field::Category),
            optional(Field::Brand),
            optional(Field::Value),
            optional(Field::PurchaseDate),
            optional(Field::PurchaseSource),
            optional(Field::ExpireDate),
            optional(Field::Condition),
            optional(Field::Priority),
            optional(Field::Notes),
            optional(Field::PhotoUrl),
            required(Field::Space),
        ])
    }

    /// Editing a recognition candidate; placement is chosen separately
    pub fn candidate() -> Self {
        let mut form = Self::full();
        form.fields.retain(|spec| spec.field != Field::Space);
        form
    }

    /// The rows of this form, in display order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Whether the form shows `field`
    pub fn contains(&self, field: Field) -> bool {
        self.fields.iter().any(|spec| spec.field == field)
    }

    /// Drop values for fields this form does not show and trim text
    pub fn apply(&self, mut item: NewItem) -> NewItem {
        let keep = |field: Field, value: Option<String>| -> Option<String> {
            if self.contains(field) {
                value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
            } else {
                None
            }
        };
        item.name = item.name.trim().to_string();
        item.category = keep(Field::Category, item.category);
        item.brand = keep(Field::Brand, item.brand);
        item.purchase_source = keep(Field::PurchaseSource, item.purchase_source);
        item.notes = keep(Field::Notes, item.notes);
        item.photo_url = keep(Field::PhotoUrl, item.photo_url);
        if !self.contains(Field::Quantity) {
            item.quantity = 1;
        }
        if !self.contains(Field::ExpireDate) {
            item.expire_date = None;
        }
        if !self.contains(Field::Value) {
            item.value = None;
        }
        if !self.contains(Field::PurchaseDate) {
            item.purchase_date = None;
        }
        if !self.contains(Field::Condition) {
            item.condition = None;
        }
        if !self.contains(Field::Priority) {
            item.priority = Default::default();
        }
        item
    }

    /// Check `item` against every row of the form
    pub fn validate(&self, item: &NewItem) -> Result<()> {
        for spec in &self.fields {
            let text = match spec.field {
                Field::Name => Some(item.name.as_str()),
                Field::Category => item.category.as_deref(),
                Field::Brand => item.brand.as_deref(),
                Field::PurchaseSource => item.purchase_source.as_deref(),
                Field::Notes => item.notes.as_deref(),
                Field::PhotoUrl => item.photo_url.as_deref(),
                Field::Space => Some(item.space_id.as_str()),
                _ => None,
            }
            .map(str::trim);

            if spec.required && text.map(str::is_empty).unwrap_or(false) {
                return Err(Error::validation(format!("{} is required", spec.field.key())));
            }

            match spec.field.input() {
                FieldInput::Text { max_chars } | FieldInput::LongText { max_chars } => {
                    if let Some(text) = text {
                        if text.chars().count() > max_chars {
                            return Err(Error::validation(format!(
                                "{} must be at most {} characters",
                                spec.field.key(),
                                max_chars
                            )));
                        }
                    }
                }
                FieldInput::Integer { min, max } => {
                    if item.quantity < min || item.quantity > max {
                        return Err(Error::validation(format!(
                            "{} must be between {} and {}",
                            spec.field.key(),
                            min,
                            max
                        )));
                    }
                }
                FieldInput::Money => {
                    if let Some(value) = item.value {
                        if !value.is_finite() || value < 0.0 {
                            return Err(Error::validation(format!(
                                "{} must be a non-negative number",
                                spec.field.key()
                            )));
                        }
                    }
                }
                FieldInput::Date | FieldInput::Choice | FieldInput::SpacePicker => {}
            }
        }
        Ok(())
    }
}
