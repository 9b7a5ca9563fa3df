//! QR command - read payment QR codes from a payload or an image.

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde_json::json;
use tracing::{debug, info};

use docket_core::error::{FilePickerError, UserMessage};
use docket_core::models::document::{Document, QrCodeDocument};
use docket_core::qr::{format_iban, QrDetector, PARAM_IBAN};
use docket_core::validation::DocumentValidator;

use super::{load_config, OutputFormat};

/// Arguments for the qr command.
#[derive(Args)]
pub struct QrArgs {
    /// Scanned QR payload, e.g. "bank://singlepaymentsepa?..."
    #[arg(required_unless_present = "image", conflicts_with = "image")]
    payload: Option<String>,

    /// Detect QR codes in this image instead
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: QrArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let payloads = match (&args.payload, &args.image) {
        (Some(payload), _) => vec![payload.clone()],
        (None, Some(path)) => {
            if !config.qr.detection_enabled {
                anyhow::bail!("QR code detection is disabled in the configuration");
            }
            let image = image::open(path).map_err(|e| {
                debug!("Failed to open {}: {}", path.display(), e);
                anyhow::anyhow!(
                    "{} {}: {}",
                    FilePickerError::FailedToOpenDocument.user_message(),
                    path.display(),
                    e
                )
            })?;

            let detector = QrDetector::with_max_dimension(config.preview.max_dimension);
            let payloads = detector.detect_in_background(image).await;
            if payloads.is_empty() {
                anyhow::bail!("No QR code found in {}", path.display());
            }
            info!("Detected {} QR codes in {}", payloads.len(), path.display());
            payloads
        }
        (None, None) => anyhow::bail!("Provide a QR payload or --image"),
    };

    let validator = DocumentValidator::new(config.validation.clone());
    let mut reports = Vec::with_capacity(payloads.len());
    let mut invalid = 0;

    for payload in payloads {
        let document = QrCodeDocument::with_default_currency(payload, &config.qr.default_currency);
        let validated = validator.validate_document(Document::QrCode(document.clone()));
        if validated.error.is_some() {
            invalid += 1;
        }
        reports.push((document, validated.error));
    }

    match args.format {
        OutputFormat::Json => {
            let output: Vec<_> = reports
                .iter()
                .map(|(document, error)| {
                    json!({
                        "qrcode": document.scanned_string(),
                        "format": document.format().map(|f| f.to_string()),
                        "paymentdata": document.parameters(),
                        "valid": error.is_none(),
                        "error": error.as_ref().map(|e| e.user_message()),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(["qrcode", "format", "parameter", "value"])?;
            for (document, _) in &reports {
                let format = document.format().map(|f| f.to_string()).unwrap_or_default();
                for (key, value) in document.parameters() {
                    wtr.write_record([document.scanned_string(), format.as_str(), key.as_str(), value.as_str()])?;
                }
            }
            print!("{}", String::from_utf8(wtr.into_inner()?)?);
        }
        OutputFormat::Text => {
            for (document, error) in &reports {
                match error {
                    Some(e) => {
                        println!("{} {}", style("✗").red(), e.user_message());
                        continue;
                    }
                    None => {
                        let format = document.format().map(|f| f.to_string()).unwrap_or_default();
                        println!("{} {}", style("✓").green(), style(format).bold());
                    }
                }

                for (key, value) in document.parameters() {
                    let value = if key == PARAM_IBAN {
                        format_iban(value)
                    } else {
                        value.clone()
                    };
                    println!("   {}: {}", key, value);
                }
            }
        }
    }

    if invalid == reports.len() {
        anyhow::bail!("No valid payment QR code found");
    }
    Ok(())
}
