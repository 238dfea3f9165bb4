//! Health command - report whether extraction can run.

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use serde::Serialize;

use idex_core::models::OcrEngineKind;
use idex_core::TesseractRecognizer;

use super::load_config;

/// Arguments for the health command.
#[derive(Args)]
pub struct HealthArgs {
    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Model directory (overrides config)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    engine: String,
    detector_model: String,
    detector_loaded: bool,
    ocr_ready: bool,
    tesseract_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tesseract_version: Option<String>,
    timestamp: chrono::DateTime<chrono::Utc>,
}

pub async fn run(args: HealthArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(model_dir) = args.model_dir {
        config.models.model_dir = model_dir;
    }

    let detector_path = config.detector_model_path();
    let detector_loaded = detector_path.is_file();

    let tesseract = TesseractRecognizer::from_config(&config.ocr);
    let tesseract_version = tesseract.version();
    let tesseract_available = tesseract_version.is_some() || tesseract.is_available();

    let ocr_ready = match config.ocr.engine {
        OcrEngineKind::Tesseract => tesseract_available,
        OcrEngineKind::Crnn => config
            .model_path(&config.models.recognition_model)
            .is_file(),
    };

    let report = HealthReport {
        status: if detector_loaded && ocr_ready {
            "healthy"
        } else {
            "degraded"
        },
        engine: format!("{:?}", config.ocr.engine).to_lowercase(),
        detector_model: detector_path.display().to_string(),
        detector_loaded,
        ocr_ready,
        tesseract_available,
        tesseract_version,
        timestamp: chrono::Utc::now(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mark = |ok: bool| {
        if ok {
            style("✓").green()
        } else {
            style("✗").red()
        }
    };

    let status = if report.status == "healthy" {
        style(report.status).green().bold()
    } else {
        style(report.status).yellow().bold()
    };
    println!("Status: {}", status);
    println!();
    println!(
        "  {} Detector model   {}",
        mark(report.detector_loaded),
        report.detector_model
    );
    println!(
        "  {} OCR engine       {}",
        mark(report.ocr_ready),
        report.engine
    );
    println!(
        "  {} Tesseract        {}",
        mark(report.tesseract_available),
        report.tesseract_version.as_deref().unwrap_or("not found")
    );

    Ok(())
}
