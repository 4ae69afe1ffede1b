//! Quotation data models: line items, sections, project details and the
//! persisted invoice aggregate.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::amount::{decimal_number, lenient_decimal};
use crate::totals::{calculate_section_totals, CalculationResult};

/// Id of the section every new quotation starts with.
pub const FIRST_SECTION_ID: &str = "0.00";

/// Title of the section every new quotation starts with.
pub const FIRST_SECTION_TITLE: &str = "Voor het werk geldende voorwaarden uav 2012";

/// Number of header image slots on the cover page.
pub const HEADER_IMAGE_SLOTS: usize = 2;

/// A VAT percentage.
///
/// The UI offers 0, 9 and 21, but any value is accepted. Rates compare
/// numerically, so `21` and `21.00` are the same rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VatRate(Decimal);

impl VatRate {
    /// Zero rate: 0%
    pub const ZERO: VatRate = VatRate(Decimal::ZERO);

    /// Reduced rate: 9%
    pub const REDUCED: VatRate = VatRate(Decimal::from_parts(9, 0, 0, false, 0));

    /// Standard rate: 21%
    pub const STANDARD: VatRate = VatRate(Decimal::from_parts(21, 0, 0, false, 0));

    /// Create a rate from a percentage.
    pub fn new(percent: Decimal) -> Self {
        Self(percent)
    }

    /// The rate as a percentage (e.g. 21).
    pub fn percent(&self) -> Decimal {
        self.0
    }

    /// The rate as a multiplier (e.g. 0.21 for 21%).
    pub fn as_fraction(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }
}

impl fmt::Display for VatRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl From<Decimal> for VatRate {
    fn from(percent: Decimal) -> Self {
        Self(percent)
    }
}

impl From<u32> for VatRate {
    fn from(percent: u32) -> Self {
        Self(Decimal::from(percent))
    }
}

impl Serialize for VatRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        decimal_number(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for VatRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_decimal(deserializer).map(VatRate)
    }
}

/// A single billable row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Unique within the enclosing section.
    pub id: i64,

    /// Free-text description.
    #[serde(default)]
    pub description: String,

    /// Quantity.
    #[serde(
        default,
        serialize_with = "decimal_number",
        deserialize_with = "lenient_decimal"
    )]
    pub quantity: Decimal,

    /// Unit of measure (shown as "Eenheid" on the report).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Unit price, VAT excluded.
    #[serde(
        default,
        serialize_with = "decimal_number",
        deserialize_with = "lenient_decimal"
    )]
    pub price: Decimal,

    /// VAT percentage applied to this row.
    #[serde(default)]
    pub vat_rate: VatRate,

    /// Inline image (data URL) or remote URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl LineItem {
    /// Create an empty row with the given id.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            description: String::new(),
            quantity: Decimal::ZERO,
            unit: None,
            price: Decimal::ZERO,
            vat_rate: VatRate::ZERO,
            image_url: None,
        }
    }
}

/// A titled, ordered group of line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Dotted two-part code such as `"01.00"`.
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub items: Vec<LineItem>,

    /// Declared on the section but unused by the calculation, which works
    /// per item.
    #[serde(default)]
    pub vat_rate: VatRate,
}

impl Section {
    /// Create an empty section.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            items: Vec::new(),
            vat_rate: VatRate::ZERO,
        }
    }

    /// Totals for this section's items.
    pub fn calculate(&self) -> CalculationResult {
        calculate_section_totals(&self.items)
    }
}

/// Client and project metadata shown on the cover and terms pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectDetails {
    pub project_address: String,
    pub client_name: String,
    pub email: String,
    pub phone: String,

    /// Free text, not validated as a date.
    pub date: String,

    /// Free text, no numbering authority.
    pub invoice_number: String,
    pub project_description: String,

    /// Validity period, e.g. "14 dagen".
    pub validity: String,

    /// Up to two cover images. An empty string marks a cleared slot.
    pub header_images: Vec<String>,

    /// Rich text editor state, opaque to this crate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rich_text_content: Option<serde_json::Value>,

    /// Serialized rich text body.
    #[serde(rename = "richTextHTML", skip_serializing_if = "Option::is_none")]
    pub rich_text_html: Option<String>,
}

impl ProjectDetails {
    /// Header images that are actually set.
    pub fn present_header_images(&self) -> impl Iterator<Item = &str> {
        self.header_images
            .iter()
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

/// Editable contents of a quotation, as posted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    #[serde(default)]
    pub project_details: ProjectDetails,

    #[serde(default = "default_sections")]
    pub sections: Vec<Section>,
}

fn default_sections() -> Vec<Section> {
    vec![Section::new(FIRST_SECTION_ID, FIRST_SECTION_TITLE)]
}

impl Default for InvoiceDraft {
    fn default() -> Self {
        Self {
            project_details: ProjectDetails::default(),
            sections: default_sections(),
        }
    }
}

impl InvoiceDraft {
    /// Pair every section with its freshly computed totals.
    pub fn calculated_sections(&self) -> Vec<CalculatedSection> {
        self.sections
            .iter()
            .map(|section| CalculatedSection {
                section: section.clone(),
                calculations: section.calculate(),
            })
            .collect()
    }

    /// Suggested export file stem: `<project address>-<invoice number>`.
    pub fn export_stem(&self) -> String {
        let stem = slug::slugify(format!(
            "{}-{}",
            self.project_details.project_address, self.project_details.invoice_number
        ));
        if stem.is_empty() {
            "offerte".to_string()
        } else {
            stem
        }
    }
}

/// A section together with its precomputed totals, as consumed by the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedSection {
    #[serde(flatten)]
    pub section: Section,
    pub calculations: CalculationResult,
}

/// Totals of one section, keyed by section id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionTotals {
    pub section_id: String,
    pub calculations: CalculationResult,
}

/// Precomputed totals stored with an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    /// Per-section totals, in section order.
    pub sections: Vec<SectionTotals>,

    /// Totals over every item of every section.
    pub grand: CalculationResult,
}

impl InvoiceTotals {
    /// Compute totals for a list of sections.
    pub fn compute(sections: &[Section]) -> Self {
        let all_items: Vec<LineItem> = sections
            .iter()
            .flat_map(|s| s.items.iter().cloned())
            .collect();

        Self {
            sections: sections
                .iter()
                .map(|s| SectionTotals {
                    section_id: s.id.clone(),
                    calculations: s.calculate(),
                })
                .collect(),
            grand: calculate_section_totals(&all_items),
        }
    }
}

/// A persisted quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Assigned by the store on creation.
    pub id: String,

    pub project_details: ProjectDetails,

    pub sections: Vec<Section>,

    /// Recomputed on every write.
    pub totals: InvoiceTotals,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Build a stored invoice from a draft, computing its totals.
    pub fn assemble(
        id: impl Into<String>,
        draft: InvoiceDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let totals = InvoiceTotals::compute(&draft.sections);
        Self {
            id: id.into(),
            project_details: draft.project_details,
            sections: draft.sections,
            totals,
            created_at,
            updated_at,
        }
    }

    /// The editable part of this invoice.
    pub fn to_draft(&self) -> InvoiceDraft {
        InvoiceDraft {
            project_details: self.project_details.clone(),
            sections: self.sections.clone(),
        }
    }

    /// Short listing view.
    pub fn summary(&self) -> InvoiceSummary {
        InvoiceSummary {
            id: self.id.clone(),
            client_name: self.project_details.client_name.clone(),
            project_address: self.project_details.project_address.clone(),
            invoice_number: self.project_details.invoice_number.clone(),
            date: self.project_details.date.clone(),
            total: self.totals.grand.total,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// One row of the invoice list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub id: String,
    pub client_name: String,
    pub project_address: String,
    pub invoice_number: String,
    pub date: String,
    #[serde(
        default,
        serialize_with = "decimal_number",
        deserialize_with = "lenient_decimal"
    )]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
