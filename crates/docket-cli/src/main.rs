//! CLI application for document capture review.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, invoice, pages, prefs, qr, validate};

/// Docket - validate captured documents, review pages and digital invoices
#[derive(Parser)]
#[command(name = "docket")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate images and PDFs as an import would
    Validate(validate::ValidateArgs),

    /// Assemble pages and apply review edits
    Pages(pages::PagesArgs),

    /// Review the line items of an extraction result
    Invoice(invoice::InvoiceArgs),

    /// Read a payment QR code
    Qr(qr::QrArgs),

    /// Manage configuration
    Config(config::ConfigArgs),

    /// Manage one-time hint flags
    Prefs(prefs::PrefsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Validate(args) => validate::run(args, config_path).await,
        Commands::Pages(args) => pages::run(args, config_path).await,
        Commands::Invoice(args) => invoice::run(args, config_path).await,
        Commands::Qr(args) => qr::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
        Commands::Prefs(args) => prefs::run(args, config_path).await,
    }
}
