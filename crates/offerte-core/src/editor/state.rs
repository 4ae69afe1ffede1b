//! Editor session state as an immutable record.
//!
//! Each [`Command`] produces a new [`EditorState`]; a refused command returns
//! an [`EditError`] and the caller keeps the previous state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EditError;
use crate::models::amount::lenient_decimal;
use crate::models::invoice::{
    CalculatedSection, InvoiceDraft, ProjectDetails, Section, VatRate, HEADER_IMAGE_SLOTS,
};

use super::{add_item, add_section, delete_item, delete_section, set_section_title, update_item};

/// One field of one line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum ItemUpdate {
    SetDescription(String),
    SetQuantity(#[serde(deserialize_with = "lenient_decimal")] Decimal),
    SetUnit(String),
    SetPrice(#[serde(deserialize_with = "lenient_decimal")] Decimal),
    SetVatRate(VatRate),
    /// `None` or an empty string removes the image.
    SetImage(Option<String>),
}

/// One field of the project details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum ProjectUpdate {
    SetProjectAddress(String),
    SetClientName(String),
    SetEmail(String),
    SetPhone(String),
    SetDate(String),
    SetInvoiceNumber(String),
    SetProjectDescription(String),
    SetValidity(String),
    SetRichTextHtml(String),
    SetHeaderImage { index: usize, url: String },
    RemoveHeaderImage { index: usize },
}

/// A user action on the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    AddSection,
    DeleteSection { section_id: String },
    SetSectionTitle { section_id: String, title: String },
    AddItem { section_id: String },
    UpdateItem { section_id: String, item_id: i64, update: ItemUpdate },
    DeleteItem { section_id: String, item_id: i64 },
    UpdateProject { update: ProjectUpdate },
}

/// Complete state of an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub project_details: ProjectDetails,
    pub sections: Vec<Section>,

    /// Id handed to the next added item.
    pub next_item_id: i64,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::from_draft(InvoiceDraft::default())
    }
}

impl EditorState {
    /// Start a session from a draft, seeding the item id counter past every
    /// existing item id.
    pub fn from_draft(draft: InvoiceDraft) -> Self {
        let next_item_id = first_free_item_id(&draft.sections);

        Self {
            project_details: draft.project_details,
            sections: draft.sections,
            next_item_id,
        }
    }

    /// The draft to persist.
    pub fn to_draft(&self) -> InvoiceDraft {
        InvoiceDraft {
            project_details: self.project_details.clone(),
            sections: self.sections.clone(),
        }
    }

    /// Sections with up-to-date totals, ready for the report.
    pub fn calculated_sections(&self) -> Vec<CalculatedSection> {
        self.to_draft().calculated_sections()
    }

    /// Apply a command, producing the next state.
    pub fn apply(&self, command: &Command) -> Result<EditorState, EditError> {
        debug!(?command, "applying editor command");

        let mut next = self.clone();
        match command {
            Command::AddSection => {
                if self.sections.is_empty() {
                    return Ok(next);
                }
                next.sections = add_section(&self.sections);
            }
            Command::DeleteSection { section_id } => {
                next.sections = delete_section(&self.sections, section_id)?;
            }
            Command::SetSectionTitle { section_id, title } => {
                next.sections = set_section_title(&self.sections, section_id, title);
            }
            Command::AddItem { section_id } => {
                if self.sections.iter().any(|s| &s.id == section_id) {
                    // A client-supplied counter may lag behind the items it sent.
                    let id = self.next_item_id.max(first_free_item_id(&self.sections));
                    next.sections = add_item(&self.sections, section_id, id);
                    next.next_item_id = id.saturating_add(1);
                }
            }
            Command::UpdateItem {
                section_id,
                item_id,
                update,
            } => {
                next.sections = update_item(&self.sections, section_id, *item_id, update);
            }
            Command::DeleteItem {
                section_id,
                item_id,
            } => {
                next.sections = delete_item(&self.sections, section_id, *item_id);
            }
            Command::UpdateProject { update } => {
                next.project_details = update_project(&self.project_details, update)?;
            }
        }
        Ok(next)
    }
}

/// One past the largest item id in any section, or 1 when there are no items.
fn first_free_item_id(sections: &[Section]) -> i64 {
    sections
        .iter()
        .flat_map(|s| s.items.iter().map(|i| i.id))
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Apply one project detail update.
pub fn update_project(
    details: &ProjectDetails,
    update: &ProjectUpdate,
) -> Result<ProjectDetails, EditError> {
    let mut next = details.clone();
    match update {
        ProjectUpdate::SetProjectAddress(v) => next.project_address = v.clone(),
        ProjectUpdate::SetClientName(v) => next.client_name = v.clone(),
        ProjectUpdate::SetEmail(v) => next.email = v.clone(),
        ProjectUpdate::SetPhone(v) => next.phone = v.clone(),
        ProjectUpdate::SetDate(v) => next.date = v.clone(),
        ProjectUpdate::SetInvoiceNumber(v) => next.invoice_number = v.clone(),
        ProjectUpdate::SetProjectDescription(v) => next.project_description = v.clone(),
        ProjectUpdate::SetValidity(v) => next.validity = v.clone(),
        ProjectUpdate::SetRichTextHtml(html) => {
            next.rich_text_html = Some(html.clone());
            // The editor-internal state no longer matches the HTML.
            next.rich_text_content = None;
        }
        ProjectUpdate::SetHeaderImage { index, url } => {
            check_header_index(*index)?;
            set_header_slot(&mut next.header_images, *index, url.clone());
        }
        ProjectUpdate::RemoveHeaderImage { index } => {
            check_header_index(*index)?;
            set_header_slot(&mut next.header_images, *index, String::new());
        }
    }
    Ok(next)
}

fn check_header_index(index: usize) -> Result<(), EditError> {
    if index >= HEADER_IMAGE_SLOTS {
        return Err(EditError::HeaderImageIndex {
            index,
            max: HEADER_IMAGE_SLOTS - 1,
        });
    }
    Ok(())
}

fn set_header_slot(images: &mut Vec<String>, index: usize, value: String) {
    if images.len() <= index {
        images.resize(index + 1, String::new());
    }
    images[index] = value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::{LineItem, FIRST_SECTION_ID};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_default_state() {
        let state = EditorState::default();
        assert_eq!(state.sections.len(), 1);
        assert_eq!(state.sections[0].id, FIRST_SECTION_ID);
        assert_eq!(state.next_item_id, 1);
    }

    #[test]
    fn test_from_draft_seeds_item_ids() {
        let mut draft = InvoiceDraft::default();
        draft.sections[0].items.push(LineItem::new(1_700_000_000_000));
        draft.sections[0].items.push(LineItem::new(5));

        let state = EditorState::from_draft(draft);
        assert_eq!(state.next_item_id, 1_700_000_000_001);
    }

    #[test]
    fn test_add_items_get_unique_ids() {
        let state = EditorState::default();
        let add = Command::AddItem {
            section_id: FIRST_SECTION_ID.to_string(),
        };

        let state = state.apply(&add).unwrap().apply(&add).unwrap();
        let ids: Vec<i64> = state.sections[0].items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(state.next_item_id, 3);
    }

    #[test]
    fn test_add_item_to_unknown_section_keeps_counter() {
        let state = EditorState::default();
        let next = state
            .apply(&Command::AddItem {
                section_id: "09.00".to_string(),
            })
            .unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn test_add_item_skips_ids_behind_stale_counter() {
        let state: EditorState = serde_json::from_value(serde_json::json!({
            "projectDetails": {},
            "sections": [
                { "id": "0.00", "title": "", "items": [{ "id": 1, "description": "Wand" }] }
            ],
            "nextItemId": 1
        }))
        .unwrap();

        let state = state
            .apply(&Command::AddItem {
                section_id: FIRST_SECTION_ID.to_string(),
            })
            .unwrap();
        let ids: Vec<i64> = state.sections[0].items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(state.next_item_id, 3);

        let state = state
            .apply(&Command::UpdateItem {
                section_id: FIRST_SECTION_ID.to_string(),
                item_id: 1,
                update: ItemUpdate::SetDescription("Vloer".into()),
            })
            .unwrap();
        let descriptions: Vec<&str> = state.sections[0]
            .items
            .iter()
            .map(|i| i.description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["Vloer", ""]);
    }

    #[test]
    fn test_add_section_after_largest_id_keeps_state() {
        let mut state = EditorState::default();
        state.sections[0].id = "18446744073709551615.00".into();

        let next = state.apply(&Command::AddSection).unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn test_refused_delete_leaves_state() {
        let state = EditorState::default();
        let err = state
            .apply(&Command::DeleteSection {
                section_id: FIRST_SECTION_ID.to_string(),
            })
            .unwrap_err();

        assert_eq!(err, EditError::SoleSection);
        assert_eq!(state.sections.len(), 1);
    }

    #[test]
    fn test_full_edit_flow() {
        let state = EditorState::default()
            .apply(&Command::AddSection)
            .unwrap()
            .apply(&Command::AddItem {
                section_id: "01.00".into(),
            })
            .unwrap()
            .apply(&Command::UpdateItem {
                section_id: "01.00".into(),
                item_id: 1,
                update: ItemUpdate::SetQuantity(Decimal::from(2)),
            })
            .unwrap()
            .apply(&Command::UpdateItem {
                section_id: "01.00".into(),
                item_id: 1,
                update: ItemUpdate::SetPrice(Decimal::from(100)),
            })
            .unwrap()
            .apply(&Command::UpdateItem {
                section_id: "01.00".into(),
                item_id: 1,
                update: ItemUpdate::SetVatRate(VatRate::STANDARD),
            })
            .unwrap();

        let calculated = state.calculated_sections();
        assert_eq!(calculated.len(), 2);
        assert_eq!(calculated[1].calculations.total, Decimal::from(242));

        let state = state
            .apply(&Command::DeleteSection {
                section_id: "01.00".into(),
            })
            .unwrap();
        assert_eq!(state.sections.len(), 1);
    }

    #[test]
    fn test_project_updates() {
        let state = EditorState::default()
            .apply(&Command::UpdateProject {
                update: ProjectUpdate::SetClientName("J. Jansen".into()),
            })
            .unwrap()
            .apply(&Command::UpdateProject {
                update: ProjectUpdate::SetHeaderImage {
                    index: 1,
                    url: "data:image/png;base64,AA==".into(),
                },
            })
            .unwrap();

        assert_eq!(state.project_details.client_name, "J. Jansen");
        assert_eq!(state.project_details.header_images, vec![
            String::new(),
            "data:image/png;base64,AA==".to_string()
        ]);

        let cleared = state
            .apply(&Command::UpdateProject {
                update: ProjectUpdate::RemoveHeaderImage { index: 1 },
            })
            .unwrap();
        assert_eq!(cleared.project_details.present_header_images().count(), 0);
    }

    #[test]
    fn test_header_image_index_out_of_range() {
        let err = EditorState::default()
            .apply(&Command::UpdateProject {
                update: ProjectUpdate::RemoveHeaderImage { index: 2 },
            })
            .unwrap_err();
        assert_eq!(err, EditError::HeaderImageIndex { index: 2, max: 1 });
    }

    #[test]
    fn test_command_wire_format() {
        let command: Command = serde_json::from_value(json!({
            "type": "updateItem",
            "sectionId": "0.00",
            "itemId": 4,
            "update": { "field": "setPrice", "value": "12,50" }
        }))
        .unwrap();

        assert_eq!(
            command,
            Command::UpdateItem {
                section_id: "0.00".into(),
                item_id: 4,
                update: ItemUpdate::SetPrice(Decimal::new(1250, 2)),
            }
        );

        let add: Command = serde_json::from_value(json!({ "type": "addSection" })).unwrap();
        assert_eq!(add, Command::AddSection);
    }
}
