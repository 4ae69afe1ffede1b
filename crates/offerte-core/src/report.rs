//! HTML report rendering.
//!
//! The report is a fixed sequence of A4 pages: cover, introduction with the
//! rich text body, the itemized sections and the closing terms. Totals are
//! taken from the precomputed [`CalculatedSection`]s; nothing is calculated
//! here beyond the per-row `quantity * price` display value.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use crate::error::RenderError;
use crate::models::config::{ExportConfig, ReportConfig};
use crate::models::invoice::{CalculatedSection, LineItem, ProjectDetails};
use crate::totals::line_subtotal;

const TEMPLATE_NAME: &str = "report.html";
const TEMPLATE: &str = include_str!("../templates/report.html.tera");

/// Format an amount for display: `€ 1234.50`.
pub fn format_money(amount: Decimal) -> String {
    format!("€ {:.2}", round_display(amount))
}

/// Round half away from zero to two decimals.
pub fn round_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Serialize)]
struct PageView {
    width: u32,
    height: u32,
    raster_scale: f32,
}

#[derive(Debug, Serialize)]
struct ItemView {
    description: String,
    image_url: Option<String>,
    quantity: String,
    unit: String,
    price: String,
    subtotal: String,
    vat_rate: String,
}

impl ItemView {
    fn new(item: &LineItem) -> Self {
        let quantity = if item.quantity.is_zero() {
            "-".to_string()
        } else {
            item.quantity.normalize().to_string()
        };

        Self {
            description: item.description.clone(),
            image_url: item.image_url.clone().filter(|url| !url.trim().is_empty()),
            quantity,
            unit: item
                .unit
                .clone()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| "-".to_string()),
            price: format_money(item.price),
            subtotal: format_money(line_subtotal(item)),
            vat_rate: format!("{}%", item.vat_rate),
        }
    }
}

/// Project details under the names the template uses.
#[derive(Debug, Serialize)]
struct DetailsView<'a> {
    project_address: &'a str,
    client_name: &'a str,
    email: &'a str,
    phone: &'a str,
    date: &'a str,
    invoice_number: &'a str,
    validity: &'a str,
}

impl<'a> DetailsView<'a> {
    fn new(details: &'a ProjectDetails) -> Self {
        Self {
            project_address: &details.project_address,
            client_name: &details.client_name,
            email: &details.email,
            phone: &details.phone,
            date: &details.date,
            invoice_number: &details.invoice_number,
            validity: &details.validity,
        }
    }
}

#[derive(Debug, Serialize)]
struct VatRow {
    label: String,
    amount: String,
}

#[derive(Debug, Serialize)]
struct SectionView {
    heading: String,
    items: Vec<ItemView>,
    subtotal: String,
    vat_rows: Vec<VatRow>,
    total: String,
}

impl SectionView {
    fn new(calculated: &CalculatedSection) -> Self {
        let section = &calculated.section;
        let calc = &calculated.calculations;

        Self {
            heading: format!("{} {}", section.id, section.title).trim().to_string(),
            items: section.items.iter().map(ItemView::new).collect(),
            subtotal: format_money(calc.subtotal),
            vat_rows: calc
                .vat_details
                .iter()
                .map(|(rate, amount)| VatRow {
                    label: format!("VAT ({}%):", rate),
                    amount: format_money(*amount),
                })
                .collect(),
            total: format_money(calc.total),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReportView<'a> {
    page: PageView,
    company_name: &'a str,
    tagline: &'a str,
    headline: &'a str,
    services: &'a [String],
    terms: &'a [String],
    details: DetailsView<'a>,
    header_images: Vec<&'a str>,
    reference: String,
    rich_text_html: &'a str,
    sections: Vec<SectionView>,
}

/// Renders quotations to standalone HTML documents.
pub struct ReportRenderer {
    tera: Tera,
    report: ReportConfig,
    export: ExportConfig,
}

impl ReportRenderer {
    /// Create a renderer with the built-in template.
    pub fn new(report: ReportConfig, export: ExportConfig) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self {
            tera,
            report,
            export,
        })
    }

    /// Render the report for a snapshot of project details and sections.
    ///
    /// The sections must already carry their calculations.
    pub fn render(
        &self,
        details: &ProjectDetails,
        sections: &[CalculatedSection],
    ) -> Result<String, RenderError> {
        let view = ReportView {
            page: PageView {
                width: self.export.page_width,
                height: self.export.page_height,
                raster_scale: self.export.raster_scale,
            },
            company_name: &self.report.company_name,
            tagline: &self.report.tagline,
            headline: &self.report.headline,
            services: &self.report.services,
            terms: &self.report.terms,
            details: DetailsView::new(details),
            header_images: details.present_header_images().collect(),
            reference: format!("Totaal renovatie {}", details.project_address),
            rich_text_html: details.rich_text_html.as_deref().unwrap_or(""),
            sections: sections.iter().map(SectionView::new).collect(),
        };

        let context = Context::from_serialize(&view)?;
        let html = self.tera.render(TEMPLATE_NAME, &context)?;
        debug!(sections = sections.len(), bytes = html.len(), "Rendered report");
        Ok(html)
    }
}
