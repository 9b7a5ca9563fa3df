//! Validate command - check files the way an import would.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, ValueEnum};
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, warn};

use docket_core::error::{UserMessage, ValidationError};
use docket_core::models::document::{Document, DocumentBuilder, DocumentSource, ImportMethod};
use docket_core::pages::ensure_single_kind;
use docket_core::task::spawn_validation;
use docket_core::validation::DocumentValidator;

use super::{load_config, OutputFormat};

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Where the files come from
    #[arg(short, long, value_enum, default_value = "external")]
    source: SourceArg,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Also write a summary CSV to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Exit with an error if any file is invalid
    #[arg(long)]
    strict: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceArg {
    Camera,
    External,
}

impl From<SourceArg> for DocumentSource {
    fn from(source: SourceArg) -> Self {
        match source {
            SourceArg::Camera => DocumentSource::Camera,
            SourceArg::External => DocumentSource::External,
        }
    }
}

/// Outcome for a single file.
#[derive(Debug, Serialize)]
struct FileReport {
    file: PathBuf,
    kind: Option<String>,
    valid: bool,
    error: Option<String>,
    message: Option<String>,
}

impl FileReport {
    fn new(file: &Path, document: Option<&Document>, error: Option<&ValidationError>) -> Self {
        Self {
            file: file.to_path_buf(),
            kind: document.map(|d| d.kind().to_string()),
            valid: error.is_none(),
            error: error.map(|e| e.to_string()),
            message: error.map(|e| e.user_message()),
        }
    }
}

pub async fn run(args: ValidateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    let source: DocumentSource = args.source.into();
    let mut documents = Vec::with_capacity(files.len());
    let mut reports = Vec::with_capacity(files.len());

    for path in &files {
        let data = fs::read(path)?;
        match DocumentBuilder::new(data, source.clone())
            .with_import_method(ImportMethod::Picker)
            .with_preview_config(config.preview.clone())
            .build()
        {
            Some(document) => documents.push((path.clone(), document)),
            None => {
                debug!("{} is neither an image nor a PDF", path.display());
                reports.push(FileReport::new(path, None, Some(&ValidationError::FileFormatNotValid)));
            }
        }
    }

    if let Err(e) = ensure_single_kind(documents.iter().map(|(_, d)| d)) {
        warn!("{}", e);
        eprintln!("{} {}", style("!").yellow(), e.user_message());
    }

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let validator = Arc::new(DocumentValidator::new(config.validation.clone()));
    let tasks: Vec<_> = documents
        .into_iter()
        .map(|(path, document)| (path, spawn_validation(Arc::clone(&validator), document)))
        .collect();

    for (path, task) in tasks {
        match task.join().await {
            Some(validated) => reports.push(FileReport::new(
                &path,
                Some(&validated.document),
                validated.error.as_ref(),
            )),
            None => reports.push(FileReport::new(&path, None, Some(&ValidationError::Unknown))),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    reports.sort_by(|a, b| a.file.cmp(&b.file));

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Csv => print!("{}", format_csv(&reports)?),
        OutputFormat::Text => print_text(&reports),
    }

    if let Some(summary_path) = &args.summary {
        fs::write(summary_path, format_csv(&reports)?)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let invalid = reports.iter().filter(|r| !r.valid).count();
    debug!("Validated {} files in {:?}", reports.len(), start.elapsed());

    if args.strict && invalid > 0 {
        anyhow::bail!("{} of {} files are invalid", invalid, reports.len());
    }
    Ok(())
}

fn print_text(reports: &[FileReport]) {
    for report in reports {
        let kind = report.kind.as_deref().unwrap_or("unknown");
        if report.valid {
            println!("{} {} ({})", style("✓").green(), report.file.display(), kind);
        } else {
            println!(
                "{} {} ({}): {}",
                style("✗").red(),
                report.file.display(),
                kind,
                report.message.as_deref().unwrap_or("invalid")
            );
        }
    }

    let invalid = reports.iter().filter(|r| !r.valid).count();
    println!();
    println!(
        "   {} valid, {} invalid",
        style(reports.len() - invalid).green(),
        style(invalid).red()
    );
}

fn format_csv(reports: &[FileReport]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["filename", "kind", "status", "error", "message"])?;

    for report in reports {
        wtr.write_record([
            report.file.display().to_string().as_str(),
            report.kind.as_deref().unwrap_or(""),
            if report.valid { "valid" } else { "invalid" },
            report.error.as_deref().unwrap_or(""),
            report.message.as_deref().unwrap_or(""),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}
