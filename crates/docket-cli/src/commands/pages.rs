//! Pages command - assemble a multi-page document and apply review edits.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;
use console::style;
use tracing::debug;

use docket_core::error::UserMessage;
use docket_core::models::document::{Document, DocumentBuilder, DocumentSource};
use docket_core::pages::{ensure_single_kind, PageCollection, PageEvent};
use docket_core::validation::DocumentValidator;

use super::load_config;

/// Arguments for the pages command.
#[derive(Args)]
pub struct PagesArgs {
    /// Page files, in capture order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Edit to apply, in order: delete:<i>, move:<from>:<to>, rotate:<i>, select:<i>.
    /// Indices start at 0.
    #[arg(long = "op")]
    ops: Vec<PageOp>,

    /// Write the resulting pages to this directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

/// A single review edit.
#[derive(Clone, Debug, PartialEq, Eq)]
enum PageOp {
    Delete(usize),
    Move(usize, usize),
    Rotate(usize),
    Select(usize),
}

impl FromStr for PageOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let index = |i: usize| -> Result<usize, String> {
            parts
                .get(i)
                .and_then(|p| p.trim().parse().ok())
                .ok_or_else(|| format!("invalid page index in {:?}", s))
        };

        match (parts[0], parts.len()) {
            ("delete", 2) => Ok(PageOp::Delete(index(1)?)),
            ("move", 3) => Ok(PageOp::Move(index(1)?, index(2)?)),
            ("rotate", 2) => Ok(PageOp::Rotate(index(1)?)),
            ("select", 2) => Ok(PageOp::Select(index(1)?)),
            _ => Err(format!(
                "invalid operation {:?}, expected delete:<i>, move:<from>:<to>, rotate:<i> or select:<i>",
                s
            )),
        }
    }
}

impl fmt::Display for PageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageOp::Delete(i) => write!(f, "delete page {}", i),
            PageOp::Move(from, to) => write!(f, "move page {} to {}", from, to),
            PageOp::Rotate(i) => write!(f, "rotate page {}", i),
            PageOp::Select(i) => write!(f, "select page {}", i),
        }
    }
}

pub async fn run(args: PagesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let mut documents = Vec::with_capacity(args.files.len());
    let mut names = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let data = fs::read(path)?;
        let document = DocumentBuilder::new(data, DocumentSource::External)
            .with_preview_config(config.preview.clone())
            .build()
            .ok_or_else(|| anyhow::anyhow!("{} is neither an image nor a PDF", path.display()))?;
        names.push((document.id(), path.clone()));
        documents.push(document);
    }

    if let Err(e) = ensure_single_kind(&documents) {
        anyhow::bail!(e.user_message());
    }

    let validator = DocumentValidator::new(config.validation.clone());
    let validated: Vec<_> = documents
        .into_iter()
        .map(|document| validator.validate_document(document))
        .collect();

    let mut pages = PageCollection::new(&config.pages)
        .with_observer(|event: &PageEvent| debug!(?event, "Page collection changed"));
    pages
        .append(validated)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    for op in &args.ops {
        let result = match *op {
            PageOp::Delete(i) => pages.delete(i).map(|_| ()),
            PageOp::Move(from, to) => pages.move_page(from, to),
            PageOp::Rotate(i) => pages.rotate(i),
            PageOp::Select(i) => pages.select(i),
        };
        result.map_err(|e| anyhow::anyhow!("Cannot {}: {}", op, e))?;
        println!("{} {}", style("✓").green(), op);
    }

    let name_of = |document: &Document| {
        names
            .iter()
            .find(|(id, _)| *id == document.id())
            .map(|(_, path)| path.display().to_string())
            .unwrap_or_default()
    };

    println!();
    for (index, page) in pages.pages().iter().enumerate() {
        let marker = if pages.selected() == Some(index) { ">" } else { " " };
        let rotation = match &page.document {
            Document::Image(image) if image.rotation_delta() != 0 => {
                format!(" rotated {}°", image.rotation_delta())
            }
            _ => String::new(),
        };
        let status = match &page.error {
            Some(e) => format!(" {}", style(e.user_message()).red()),
            None => String::new(),
        };
        println!(
            "{} {:>2}. {} ({}){}{}",
            marker,
            index,
            name_of(&page.document),
            page.document.kind(),
            rotation,
            status
        );
    }

    if let Some(output_dir) = &args.output_dir {
        fs::create_dir_all(output_dir)?;
        for (index, page) in pages.pages().iter().enumerate() {
            let output_path = write_page(output_dir, index, &page.document)?;
            debug!("Wrote page to {}", output_path.display());
        }
        println!(
            "{} Wrote {} pages to {}",
            style("✓").green(),
            pages.len(),
            output_dir.display()
        );
    }

    Ok(())
}

/// Write a page. Images are exported as JPEG with their rotation and provenance comment.
fn write_page(output_dir: &std::path::Path, index: usize, document: &Document) -> anyhow::Result<PathBuf> {
    let (extension, data) = match document {
        Document::Image(image) => ("jpg", image.export_jpeg()?),
        Document::Pdf(_) => ("pdf", document.data().to_vec()),
        Document::QrCode(_) => ("json", document.data().to_vec()),
    };

    let output_path = output_dir.join(format!("page-{:02}.{}", index + 1, extension));
    fs::write(&output_path, data)?;
    debug!("Wrote {}", output_path.display());
    Ok(output_path)
}
