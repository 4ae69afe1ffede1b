//! Section and line item mutators.
//!
//! Every function takes the current sections by reference and returns a new
//! list. Ids that match nothing leave the list unchanged.

mod state;

pub use state::{Command, EditorState, ItemUpdate, ProjectUpdate};

use tracing::debug;

use crate::error::EditError;
use crate::models::invoice::{LineItem, Section};

/// Derive the id of the section following `last_id`.
///
/// The integer part of `last_id` is incremented and zero-padded to two digits
/// with a `.00` suffix, so `"03.00"` becomes `"04.00"`. A non-numeric id falls
/// back to `fallback` as the previous number. Returns `None` when the next
/// number does not fit.
pub fn next_section_id(last_id: &str, fallback: usize) -> Option<String> {
    let previous = last_id
        .trim()
        .split('.')
        .next()
        .and_then(|major| major.parse::<u64>().ok())
        .unwrap_or(fallback as u64);

    previous
        .checked_add(1)
        .map(|number| format!("{:02}.00", number))
}

/// Append an empty section after the last one.
///
/// Returns the input unchanged when `sections` is empty or no next id can be
/// derived from the last one.
pub fn add_section(sections: &[Section]) -> Vec<Section> {
    let Some(last) = sections.last() else {
        debug!("add_section called without sections, ignoring");
        return Vec::new();
    };

    let Some(id) = next_section_id(&last.id, sections.len()) else {
        debug!(last_id = %last.id, "section id space exhausted, ignoring");
        return sections.to_vec();
    };
    let mut next = sections.to_vec();
    next.push(Section::new(id, ""));
    next
}

/// Remove the section with `section_id`.
///
/// Refuses to remove the only section or the first (protected) section.
pub fn delete_section(sections: &[Section], section_id: &str) -> Result<Vec<Section>, EditError> {
    if sections.len() <= 1 {
        return Err(EditError::SoleSection);
    }
    if sections[0].id == section_id {
        return Err(EditError::ProtectedSection(section_id.to_string()));
    }

    Ok(sections
        .iter()
        .filter(|s| s.id != section_id)
        .cloned()
        .collect())
}

/// Rename the section with `section_id`.
pub fn set_section_title(sections: &[Section], section_id: &str, title: &str) -> Vec<Section> {
    map_section(sections, section_id, |section| Section {
        title: title.to_string(),
        ..section.clone()
    })
}

/// Append an empty item with `item_id` to the section with `section_id`.
pub fn add_item(sections: &[Section], section_id: &str, item_id: i64) -> Vec<Section> {
    map_section(sections, section_id, |section| {
        let mut items = section.items.clone();
        items.push(LineItem::new(item_id));
        Section {
            items,
            ..section.clone()
        }
    })
}

/// Apply a single field update to one item.
pub fn update_item(
    sections: &[Section],
    section_id: &str,
    item_id: i64,
    update: &ItemUpdate,
) -> Vec<Section> {
    map_section(sections, section_id, |section| Section {
        items: section
            .items
            .iter()
            .map(|item| {
                if item.id == item_id {
                    update.apply(item)
                } else {
                    item.clone()
                }
            })
            .collect(),
        ..section.clone()
    })
}

/// Remove one item.
pub fn delete_item(sections: &[Section], section_id: &str, item_id: i64) -> Vec<Section> {
    map_section(sections, section_id, |section| Section {
        items: section
            .items
            .iter()
            .filter(|item| item.id != item_id)
            .cloned()
            .collect(),
        ..section.clone()
    })
}

fn map_section<F>(sections: &[Section], section_id: &str, f: F) -> Vec<Section>
where
    F: Fn(&Section) -> Section,
{
    sections
        .iter()
        .map(|section| {
            if section.id == section_id {
                f(section)
            } else {
                section.clone()
            }
        })
        .collect()
}

impl ItemUpdate {
    /// Return a copy of `item` with this update applied.
    pub fn apply(&self, item: &LineItem) -> LineItem {
        let mut next = item.clone();
        match self {
            ItemUpdate::SetDescription(description) => next.description = description.clone(),
            ItemUpdate::SetQuantity(quantity) => next.quantity = *quantity,
            ItemUpdate::SetUnit(unit) => next.unit = non_empty(unit),
            ItemUpdate::SetPrice(price) => next.price = *price,
            ItemUpdate::SetVatRate(rate) => next.vat_rate = *rate,
            ItemUpdate::SetImage(url) => next.image_url = url.as_deref().and_then(non_empty),
        }
        next
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
