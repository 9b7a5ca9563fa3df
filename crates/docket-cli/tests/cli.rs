use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

const BEZAHLCODE: &str = "bank://singlepaymentsepa?name=Gini%20Online%20Shop&reason=A12345-6789&iban=DE89370400440532013000&bic=GINIBICXXX&amount=47%2C65&currency=EUR";

/// A temp dir holding a config file that keeps preferences inside it.
fn workspace() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    let config = serde_json::json!({
        "preferences": { "path": dir.path().join("preferences.json") }
    });
    fs::write(&config_path, config.to_string()).unwrap();
    (dir, config_path)
}

fn docket(config_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docket").unwrap();
    cmd.arg("--config").arg(config_path);
    cmd
}

fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 200, 200]))
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

fn clothing_order() -> serde_json::Value {
    let group = |price: &str, description: &str, quantity: &str| {
        serde_json::json!([
            {"entity": "amount", "value": price, "name": "grossPrice"},
            {"entity": "text", "value": description, "name": "description"},
            {"entity": "number", "value": quantity, "name": "quantity"}
        ])
    };
    serde_json::json!({
        "extractions": [
            {"entity": "amount", "value": "24.99:EUR", "name": "amountToPay"}
        ],
        "lineItems": [
            group("39.99:EUR", "CORE ICON - Sweatjacke - emerald", "3"),
            group("34.99:EUR", "Strickpullover - yellow", "1"),
            group("49.99:EUR", "JPRDEEP CREW NECK - Strickpullover - vintage indigo", "5")
        ]
    })
}

#[test]
fn test_help() {
    Command::cargo_bin("docket")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("invoice"));
}

#[test]
fn test_validate_reports_invalid_files() {
    let (dir, config_path) = workspace();
    write_png(&dir.path().join("page.png"), 32, 32);
    fs::write(dir.path().join("notes.png"), b"not an image").unwrap();

    let pattern = dir.path().join("*.png");
    docket(&config_path)
        .args(["validate", pattern.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 valid, 1 invalid"));

    docket(&config_path)
        .args(["validate", "--strict", pattern.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_qr_payload() {
    let (_dir, config_path) = workspace();
    docket(&config_path)
        .args(["qr", BEZAHLCODE])
        .assert()
        .success()
        .stdout(predicate::str::contains("DE89 3704 0044 0532 0130 00"))
        .stdout(predicate::str::contains("Gini Online Shop"));
}

#[test]
fn test_qr_invalid_payload() {
    let (_dir, config_path) = workspace();
    docket(&config_path)
        .args(["qr", "https://example.com"])
        .assert()
        .failure();
}

#[test]
fn test_qr_unreadable_image() {
    let (dir, config_path) = workspace();
    let path = dir.path().join("scan.png");
    fs::write(&path, b"not an image").unwrap();

    docket(&config_path)
        .args(["qr", "--image"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("The document could not be opened."))
        .stderr(predicate::str::contains("camera").not());
}

#[test]
fn test_invoice_overflowing_price() {
    let (dir, config_path) = workspace();
    let input = dir.path().join("result.json");
    let result = serde_json::json!({
        "extractions": [],
        "lineItems": [[
            {"entity": "amount", "value": "79228162514264337593543950335:EUR", "name": "grossPrice"},
            {"entity": "text", "value": "Gold bar", "name": "description"},
            {"entity": "number", "value": "2", "name": "quantity"}
        ]]
    });
    fs::write(&input, result.to_string()).unwrap();

    docket(&config_path)
        .arg("invoice")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("overflowed"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_invoice_deselect() {
    let (dir, config_path) = workspace();
    let input = dir.path().join("result.json");
    let output = dir.path().join("reviewed.json");
    fs::write(&input, clothing_order().to_string()).unwrap();

    docket(&config_path)
        .args(["invoice", "--format", "json", "--deselect", "0=arrivedTooLate"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("284.94"));

    let reviewed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let first = reviewed["lineItems"][0].as_array().unwrap();
    assert!(first
        .iter()
        .any(|e| e["name"] == "quantity" && e["value"] == "0"));
}

#[test]
fn test_pages_move() {
    let (dir, config_path) = workspace();
    let files: Vec<PathBuf> = (0..3)
        .map(|i| {
            let path = dir.path().join(format!("scan-{}.png", i));
            write_png(&path, 16, 16);
            path
        })
        .collect();

    docket(&config_path)
        .arg("pages")
        .args(&files)
        .args(["--op", "move:0:2", "--op", "rotate:1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("move page 0 to 2"))
        .stdout(predicate::str::contains("rotated 90°"));

    docket(&config_path)
        .arg("pages")
        .args(&files)
        .args(["--op", "delete:7"])
        .assert()
        .failure();
}

#[test]
fn test_pages_export_keeps_provenance() {
    let (dir, config_path) = workspace();
    let input = dir.path().join("scan.png");
    write_png(&input, 40, 20);
    let output_dir = dir.path().join("out");

    docket(&config_path)
        .arg("pages")
        .arg(&input)
        .args(["--op", "rotate:0", "--output-dir"])
        .arg(&output_dir)
        .assert()
        .success();

    let exported = fs::read(output_dir.join("page-01.jpg")).unwrap();
    let decoded = image::load_from_memory(&exported).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (20, 40));

    let text = String::from_utf8_lossy(&exported);
    assert!(text.contains("Source=external"));
    assert!(text.contains("ImportMethod=picker"));
    assert!(text.contains("RotDeltaDeg=90"));
}

#[test]
fn test_prefs_take_once() {
    let (_dir, config_path) = workspace();
    docket(&config_path)
        .args(["prefs", "take", "onboardingShown"])
        .assert()
        .success()
        .stdout("true\n");
    docket(&config_path)
        .args(["prefs", "take", "onboardingShown"])
        .assert()
        .success()
        .stdout("false\n");
}
