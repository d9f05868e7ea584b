//! Cataloged items and client-side search

mod types;

pub use types::*;

/// Case-insensitive search over name, category, brand and notes.
///
/// The service does not search; listing endpoints return everything in a
/// space and the filter runs here.
pub fn filter_items<'a>(items: &'a [Item], query: &str) -> Vec<&'a Item> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    let hit = |field: &Option<String>| {
        field
            .as_deref()
            .map(|value| value.to_lowercase().contains(&needle))
            .unwrap_or(false)
    };
    items
        .iter()
        .filter(|item| {
            item.name.to_lowercase().contains(&needle)
                || hit(&item.category)
                || hit(&item.brand)
                || hit(&item.notes)
        })
        .collect()
}
