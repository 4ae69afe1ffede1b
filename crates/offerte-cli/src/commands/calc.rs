//! Calc command - compute totals for a draft or a list of items.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use comfy_table::{Attribute, Cell, Table};
use serde::Deserialize;

use offerte_core::report::format_money;
use offerte_core::{CalculationResult, InvoiceDraft, InvoiceTotals, LineItem};

/// Arguments for the calc command.
#[derive(Args)]
pub struct CalcArgs {
    /// JSON file: an invoice draft, `{"items": [...]}` or a bare item array
    #[arg(required = true)]
    input: PathBuf,

    /// Print the totals as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CalcInput {
    Items(Vec<LineItem>),
    Wrapped { items: Vec<LineItem> },
    Draft(InvoiceDraft),
}

pub async fn run(args: CalcArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let content = fs::read_to_string(&args.input)?;
    let input: CalcInput = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Unrecognized input in {}: {}", args.input.display(), e))?;

    match input {
        CalcInput::Items(items) | CalcInput::Wrapped { items } => {
            let result = offerte_core::calculate_section_totals(&items);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result_table(&[("Items".to_string(), &result)]));
            }
        }
        CalcInput::Draft(draft) => {
            let totals = InvoiceTotals::compute(&draft.sections);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else {
                let mut rows: Vec<(String, &CalculationResult)> = draft
                    .sections
                    .iter()
                    .zip(&totals.sections)
                    .map(|(section, t)| {
                        (
                            format!("{} {}", section.id, section.title).trim().to_string(),
                            &t.calculations,
                        )
                    })
                    .collect();
                rows.push(("Totaal".to_string(), &totals.grand));
                println!("{}", result_table(&rows));
            }
        }
    }

    Ok(())
}

fn vat_summary(result: &CalculationResult) -> String {
    if result.vat_details.is_empty() {
        return "-".to_string();
    }
    result
        .vat_details
        .iter()
        .map(|(rate, amount)| format!("{}%: {}", rate, format_money(*amount)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn result_table(rows: &[(String, &CalculationResult)]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Sectie"),
        Cell::new("Subtotaal"),
        Cell::new("BTW"),
        Cell::new("Subtotaal incl. BTW"),
    ]);

    let last = rows.len().saturating_sub(1);
    for (index, (label, result)) in rows.iter().enumerate() {
        let mut cells = vec![
            Cell::new(label),
            Cell::new(format_money(result.subtotal)),
            Cell::new(vat_summary(result)),
            Cell::new(format_money(result.total)),
        ];
        if rows.len() > 1 && index == last {
            cells = cells
                .into_iter()
                .map(|c| c.add_attribute(Attribute::Bold))
                .collect();
        }
        table.add_row(cells);
    }

    table
}
