//! Invoice command - create, inspect, export and delete stored invoices.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Subcommand};
use comfy_table::{Cell, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use offerte_core::media::file_to_data_url;
use offerte_core::report::format_money;
use offerte_core::{
    Command, EditorState, ImageWarning, Invoice, InvoiceDraft, InvoiceService, InvoiceSummary,
    ItemUpdate, ProjectUpdate, ReportRenderer,
};

use super::calc::result_table;
use super::{load_config, open_service};

/// Arguments for the invoice command.
#[derive(Args)]
pub struct InvoiceArgs {
    /// SQLite database file (default from config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: InvoiceCommand,
}

#[derive(Subcommand)]
enum InvoiceCommand {
    /// Create a new invoice
    New(NewArgs),

    /// List stored invoices, newest first
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: ListFormat,
    },

    /// Show one invoice
    Show {
        /// Invoice id
        id: String,

        /// Print the stored document as JSON
        #[arg(long)]
        json: bool,
    },

    /// Overwrite an invoice with a draft JSON file
    Update {
        /// Invoice id
        id: String,

        /// Draft JSON file
        input: PathBuf,
    },

    /// Delete an invoice
    Delete {
        /// Invoice id
        id: String,
    },

    /// Export the HTML report
    Render {
        /// Invoice id
        id: String,

        /// Output file or directory (default: <address>-<number>.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Attach an image file to the cover or to a line item
    AttachImage(AttachArgs),
}

#[derive(Args)]
struct NewArgs {
    /// Start from a draft JSON file
    #[arg(long)]
    from: Option<PathBuf>,

    /// Client name
    #[arg(long)]
    client: Option<String>,

    /// Project address
    #[arg(long)]
    address: Option<String>,

    /// Invoice number
    #[arg(long)]
    number: Option<String>,

    /// Date (free text)
    #[arg(long)]
    date: Option<String>,
}

#[derive(Args)]
struct AttachArgs {
    /// Invoice id
    id: String,

    /// Image file
    image: PathBuf,

    /// Cover image slot (0 or 1)
    #[arg(long, conflicts_with_all = ["section", "item"])]
    header: Option<usize>,

    /// Section id of the item
    #[arg(long, requires = "item")]
    section: Option<String>,

    /// Item id
    #[arg(long, requires = "section")]
    item: Option<i64>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ListFormat {
    /// Table for the terminal
    Table,
    /// JSON output
    Json,
    /// CSV output
    Csv,
}

pub async fn run(args: InvoiceArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let service = open_service(&config, args.db.as_deref())?;

    match args.command {
        InvoiceCommand::New(new_args) => create(&service, new_args),
        InvoiceCommand::List { format } => list(&service, format),
        InvoiceCommand::Show { id, json } => show(&service, &id, json),
        InvoiceCommand::Update { id, input } => update(&service, &id, &input),
        InvoiceCommand::Delete { id } => delete(&service, &id),
        InvoiceCommand::Render { id, output } => {
            let renderer = ReportRenderer::new(config.report.clone(), config.export.clone())?;
            render(&service, &renderer, &id, output)
        }
        InvoiceCommand::AttachImage(attach_args) => attach_image(&service, attach_args),
    }
}

fn read_draft(path: &Path) -> anyhow::Result<InvoiceDraft> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn print_warnings(warnings: &[ImageWarning]) {
    for warning in warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning.message);
    }
}

fn create(service: &InvoiceService, args: NewArgs) -> anyhow::Result<()> {
    let mut draft = match &args.from {
        Some(path) => read_draft(path)?,
        None => InvoiceDraft::default(),
    };

    let details = &mut draft.project_details;
    if let Some(client) = args.client {
        details.client_name = client;
    }
    if let Some(address) = args.address {
        details.project_address = address;
    }
    if let Some(number) = args.number {
        details.invoice_number = number;
    }
    if let Some(date) = args.date {
        details.date = date;
    }

    let outcome = service.create(draft)?;
    print_warnings(&outcome.warnings);

    println!(
        "{} Created invoice {}",
        style("✓").green(),
        outcome.invoice.id
    );

    Ok(())
}

fn list(service: &InvoiceService, format: ListFormat) -> anyhow::Result<()> {
    let invoices = service.list()?;

    let output = match format {
        ListFormat::Json => serde_json::to_string_pretty(&invoices)?,
        ListFormat::Csv => format_csv(&invoices)?,
        ListFormat::Table => {
            if invoices.is_empty() {
                println!("{} No invoices stored yet.", style("ℹ").blue());
                return Ok(());
            }
            format_table(&invoices).to_string()
        }
    };

    println!("{}", output);
    Ok(())
}

fn format_table(invoices: &[InvoiceSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Id"),
        Cell::new("Klant"),
        Cell::new("Projectadres"),
        Cell::new("Offertenummer"),
        Cell::new("Totaal"),
        Cell::new("Aangemaakt"),
    ]);

    for invoice in invoices {
        table.add_row(vec![
            Cell::new(&invoice.id),
            Cell::new(&invoice.client_name),
            Cell::new(&invoice.project_address),
            Cell::new(&invoice.invoice_number),
            Cell::new(format_money(invoice.total)),
            Cell::new(invoice.created_at.format("%Y-%m-%d %H:%M")),
        ]);
    }

    table
}

fn format_csv(invoices: &[InvoiceSummary]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id",
        "client_name",
        "project_address",
        "invoice_number",
        "date",
        "total",
        "created_at",
        "updated_at",
    ])?;

    for invoice in invoices {
        wtr.write_record([
            &invoice.id,
            &invoice.client_name,
            &invoice.project_address,
            &invoice.invoice_number,
            &invoice.date,
            &invoice.total.to_string(),
            &invoice.created_at.to_rfc3339(),
            &invoice.updated_at.to_rfc3339(),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn show(service: &InvoiceService, id: &str, json: bool) -> anyhow::Result<()> {
    let invoice = service.require(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&invoice)?);
        return Ok(());
    }

    print_details(&invoice);

    let mut rows: Vec<(String, _)> = invoice
        .sections
        .iter()
        .zip(&invoice.totals.sections)
        .map(|(section, totals)| {
            (
                format!("{} {}", section.id, section.title).trim().to_string(),
                &totals.calculations,
            )
        })
        .collect();
    rows.push(("Totaal".to_string(), &invoice.totals.grand));

    println!();
    println!("{}", result_table(&rows));
    Ok(())
}

fn print_details(invoice: &Invoice) {
    let details = &invoice.project_details;
    let field = |label: &str, value: &str| {
        if !value.is_empty() {
            println!("{:<15} {}", style(label).bold(), value);
        }
    };

    field("Id", &invoice.id);
    field("Klant", &details.client_name);
    field("Projectadres", &details.project_address);
    field("E-mail", &details.email);
    field("Telefoon", &details.phone);
    field("Datum", &details.date);
    field("Offertenummer", &details.invoice_number);
    field("Geldigheid", &details.validity);
}

fn update(service: &InvoiceService, id: &str, input: &Path) -> anyhow::Result<()> {
    let draft = read_draft(input)?;
    let outcome = service.update(id, draft)?;
    print_warnings(&outcome.warnings);

    println!(
        "{} Updated invoice {} (total {})",
        style("✓").green(),
        id,
        format_money(outcome.invoice.totals.grand.total)
    );
    Ok(())
}

fn delete(service: &InvoiceService, id: &str) -> anyhow::Result<()> {
    if service.delete(id)? {
        println!("{} Deleted invoice {}", style("✓").green(), id);
    } else {
        println!("{} Invoice {} does not exist", style("ℹ").blue(), id);
    }
    Ok(())
}

fn render(
    service: &InvoiceService,
    renderer: &ReportRenderer,
    id: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let invoice = service.require(id)?;
    let draft = invoice.to_draft();
    let file_name = format!("{}.html", draft.export_stem());

    let output_path = match output {
        Some(path) if path.is_dir() => path.join(&file_name),
        Some(path) => path,
        None => PathBuf::from(&file_name),
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_message("Rendering report...");

    let html = renderer.render(&draft.project_details, &draft.calculated_sections())?;
    fs::write(&output_path, html)?;

    pb.finish_and_clear();
    debug!("Report written to {}", output_path.display());

    println!(
        "{} Report written to {}",
        style("✓").green(),
        output_path.display()
    );
    Ok(())
}

fn attach_image(service: &InvoiceService, args: AttachArgs) -> anyhow::Result<()> {
    let invoice = service.require(&args.id)?;
    let url = file_to_data_url(&args.image)?;

    let command = match (args.header, args.section, args.item) {
        (Some(index), _, _) => Command::UpdateProject {
            update: ProjectUpdate::SetHeaderImage { index, url },
        },
        (None, Some(section_id), Some(item_id)) => {
            let exists = invoice
                .sections
                .iter()
                .any(|s| s.id == section_id && s.items.iter().any(|i| i.id == item_id));
            if !exists {
                anyhow::bail!("No item {} in section {}", item_id, section_id);
            }
            Command::UpdateItem {
                section_id,
                item_id,
                update: ItemUpdate::SetImage(Some(url)),
            }
        }
        _ => anyhow::bail!("Pass --header <index> or --section <id> --item <id>"),
    };

    let state = EditorState::from_draft(invoice.to_draft()).apply(&command)?;
    let outcome = service.update(&args.id, state.to_draft())?;
    print_warnings(&outcome.warnings);

    if outcome.warnings.is_empty() {
        println!(
            "{} Attached {} to invoice {}",
            style("✓").green(),
            args.image.display(),
            args.id
        );
    }
    Ok(())
}
