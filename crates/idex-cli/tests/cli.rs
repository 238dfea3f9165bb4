use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn idex(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("idex").unwrap();
    cmd.env_remove("IDEX_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config);
    cmd
}

/// Temp dir holding a default config file and an empty model directory.
fn workspace() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();
    fs::create_dir(dir.path().join("models")).unwrap();
    (dir, config)
}

fn write_png(path: &Path) {
    image::RgbImage::from_pixel(32, 20, image::Rgb([255, 255, 255]))
        .save(path)
        .unwrap();
}

#[test]
fn config_init_get_set() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("nested").join("config.json");

    idex(&config)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(config.exists());

    idex(&config)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    idex(&config)
        .args(["config", "get", "detection.confidence_threshold"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.5"));

    idex(&config)
        .args(["config", "set", "detection.tie_break", "highest_confidence"])
        .assert()
        .success();

    idex(&config)
        .args(["config", "get", "detection.tie_break"])
        .assert()
        .success()
        .stdout(predicate::str::contains("highest_confidence"));

    idex(&config)
        .args(["config", "get", "detection.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn config_set_rejects_bad_value() {
    let (_dir, config) = workspace();

    idex(&config)
        .args(["config", "set", "ocr.engine", "paddle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for ocr.engine"));
}

#[test]
fn explicit_config_must_exist() {
    let dir = TempDir::new().unwrap();
    let card = dir.path().join("card.png");
    write_png(&card);

    idex(&dir.path().join("missing.json"))
        .arg("extract")
        .arg(&card)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn extract_missing_input() {
    let (dir, config) = workspace();

    idex(&config)
        .arg("extract")
        .arg(dir.path().join("nope.jpg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn extract_unsupported_extension() {
    let (dir, config) = workspace();
    let input = dir.path().join("card.gif");
    fs::write(&input, b"GIF89a").unwrap();

    idex(&config)
        .arg("extract")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn extract_without_detector_model() {
    let (dir, config) = workspace();
    let card = dir.path().join("card.png");
    write_png(&card);

    idex(&config)
        .arg("extract")
        .arg(&card)
        .arg("--model-dir")
        .arg(dir.path().join("models"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Detector model not found"))
        .stderr(predicate::str::contains("idex models download"));
}

#[test]
fn extract_rejects_out_of_range_threshold() {
    let (dir, config) = workspace();
    let card = dir.path().join("card.png");
    write_png(&card);

    idex(&config)
        .arg("extract")
        .arg(&card)
        .args(["--threshold", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Threshold must be between 0 and 1"));
}

#[test]
fn batch_without_matches() {
    let (dir, config) = workspace();
    let pattern = dir.path().join("*.jpg");

    idex(&config)
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}

#[test]
fn health_reports_degraded_without_model() {
    let (dir, config) = workspace();

    idex(&config)
        .arg("health")
        .arg("--model-dir")
        .arg(dir.path().join("models"))
        .assert()
        .success()
        .stdout(predicate::str::contains("degraded"));

    idex(&config)
        .args(["health", "--json"])
        .arg("--model-dir")
        .arg(dir.path().join("models"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"detector_loaded\": false"));
}

#[test]
fn models_status_and_clean() {
    let (dir, config) = workspace();
    let models = dir.path().join("models");

    idex(&config)
        .args(["models", "status", "--model-dir"])
        .arg(&models)
        .assert()
        .success()
        .stdout(predicate::str::contains("missing"));

    fs::write(models.join("model.onnx"), vec![0u8; 2048]).unwrap();
    fs::write(models.join("model.tmp"), b"partial").unwrap();

    idex(&config)
        .args(["models", "status", "--model-dir"])
        .arg(&models)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready"));

    idex(&config)
        .args(["models", "clean", "--model-dir"])
        .arg(&models)
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed model.onnx"));

    assert!(!models.join("model.onnx").exists());
    assert!(!models.join("model.tmp").exists());
}
