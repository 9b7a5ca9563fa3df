//! Invoice command - review the line items of an extraction result.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;
use console::style;
use serde_json::json;
use tracing::info;

use docket_core::invoice::{DigitalInvoice, LineItem, ReturnReason, SelectedState};
use docket_core::Price;
use docket_core::models::extraction::ExtractionResult;

use super::{load_config, OutputFormat};

/// Arguments for the invoice command.
#[derive(Args)]
pub struct InvoiceArgs {
    /// Extraction result JSON file
    #[arg(required = true)]
    input: PathBuf,

    /// Return a line item: <index>=<reason>, e.g. 0=arrivedTooLate. Indices start at 0.
    #[arg(short, long)]
    deselect: Vec<Deselection>,

    /// Write the reviewed extraction result to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Deselection {
    index: usize,
    reason: ReturnReason,
}

impl FromStr for Deselection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (index, reason) = s
            .split_once('=')
            .ok_or_else(|| format!("expected <index>=<reason>, got {:?}", s))?;
        let index = index
            .trim()
            .parse()
            .map_err(|_| format!("invalid line item index {:?}", index))?;
        let reason = reason.trim().parse()?;
        Ok(Self { index, reason })
    }
}

pub async fn run(args: InvoiceArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    if !config.invoice.enabled {
        anyhow::bail!("Digital invoice review is disabled in the configuration");
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let content = fs::read_to_string(&args.input)?;
    let result: ExtractionResult = serde_json::from_str(&content)?;
    let mut invoice = DigitalInvoice::new(result)?;

    for deselection in &args.deselect {
        invoice.deselect(deselection.index, deselection.reason)?;
    }

    let total = invoice.total()?;
    let item_totals = invoice
        .line_items
        .iter()
        .map(LineItem::total_price)
        .collect::<Result<Vec<Price>, _>>()?;
    let warnings = invoice.validate();
    info!(
        selected = invoice.num_selected(),
        total = invoice.num_total(),
        "Reviewed digital invoice"
    );

    match args.format {
        OutputFormat::Json => {
            let summary = json!({
                "lineItems": invoice.line_items.iter().zip(&item_totals).map(|(item, item_total)| json!({
                    "name": item.name,
                    "quantity": item.quantity,
                    "price": item.price.extraction_string(),
                    "totalPrice": item_total.extraction_string(),
                    "selectedState": item.selected_state,
                })).collect::<Vec<_>>(),
                "addons": invoice.addons.iter().map(|addon| json!({
                    "name": addon.name(),
                    "price": addon.price.extraction_string(),
                })).collect::<Vec<_>>(),
                "total": total.extraction_string(),
                "numSelected": invoice.num_selected(),
                "numTotal": invoice.num_total(),
                "warnings": warnings,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Csv => print!("{}", format_csv(&invoice, &item_totals)?),
        OutputFormat::Text => print_text(&invoice, &item_totals, &total, &warnings),
    }

    if let Some(output) = &args.output {
        let reviewed = invoice.extraction_result();
        fs::write(output, serde_json::to_string_pretty(&reviewed)?)?;
        println!(
            "{} Reviewed extraction result written to {}",
            style("✓").green(),
            output.display()
        );
    }

    Ok(())
}

fn print_text(invoice: &DigitalInvoice, item_totals: &[Price], total: &Price, warnings: &[String]) {
    for (index, (item, item_total)) in invoice.line_items.iter().zip(item_totals).enumerate() {
        match item.selected_state {
            SelectedState::Selected => println!(
                "{} {:>2}. {} x{} @ {} = {}",
                style("✓").green(),
                index,
                item.name,
                item.quantity,
                item.price,
                item_total
            ),
            SelectedState::Deselected(reason) => println!(
                "{} {:>2}. {} x{} @ {} ({})",
                style("✗").red(),
                index,
                style(&item.name).dim(),
                item.quantity,
                item.price,
                reason
            ),
        }
    }

    for addon in &invoice.addons {
        println!("     {}: {}", addon.name(), addon.price);
    }

    println!();
    println!(
        "Total: {} ({} of {} items)",
        style(total).bold(),
        invoice.num_selected(),
        invoice.num_total()
    );

    if let Some(amount_to_pay) = invoice.amount_to_pay() {
        println!("Amount to pay: {}", amount_to_pay);
    }

    if !warnings.is_empty() {
        println!();
        for warning in warnings {
            println!("{} {}", style("!").yellow(), warning);
        }
    }
}

fn format_csv(invoice: &DigitalInvoice, item_totals: &[Price]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["index", "name", "quantity", "price", "total_price", "selected", "reason"])?;

    for (index, (item, item_total)) in invoice.line_items.iter().zip(item_totals).enumerate() {
        let reason = match item.selected_state {
            SelectedState::Selected => "",
            SelectedState::Deselected(reason) => reason.key(),
        };
        wtr.write_record([
            index.to_string().as_str(),
            item.name.as_str(),
            item.quantity.to_string().as_str(),
            item.price.extraction_string().as_str(),
            item_total.extraction_string().as_str(),
            if item.is_selected() { "true" } else { "false" },
            reason,
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}
