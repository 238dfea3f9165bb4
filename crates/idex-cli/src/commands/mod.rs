//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod health;
pub mod models;

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail};
use tracing::debug;

use idex_core::models::{InputConfig, OcrEngineKind};
use idex_core::{
    CardPipeline, CrnnRecognizer, ExtractionResponse, IdexConfig, LineRecognizer, OrtBackend,
    OrtOptions, TesseractRecognizer, YoloFieldDetector,
};

/// Pipeline as built by the CLI.
pub type CliPipeline = CardPipeline<YoloFieldDetector<OrtBackend>, Box<dyn LineRecognizer>>;

/// Output format for extraction results.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("idex")
        .join("config.json")
}

/// The config file in effect: `--config` if given, else the default path.
pub fn config_file(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path)
}

/// Load configuration, falling back to defaults when no file exists.
pub fn load_config(config_path: Option<&Path>) -> anyhow::Result<IdexConfig> {
    let path = config_file(config_path);

    if path.exists() {
        debug!("Loading config from {}", path.display());
        IdexConfig::from_file(&path)
            .map_err(|e| anyhow!("Failed to read config {}: {}", path.display(), e))
    } else if config_path.is_some() {
        bail!("Config file not found: {}", path.display())
    } else {
        Ok(IdexConfig::default())
    }
}

/// Check that an input file exists, has an allowed extension and is not
/// too large.
pub fn validate_input(path: &Path, input: &InputConfig) -> anyhow::Result<()> {
    if !path.is_file() {
        bail!("Input file not found: {}", path.display());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if !input.is_allowed_extension(&extension) {
        bail!(
            "Unsupported file format: '{}'. Allowed: {}",
            extension,
            input.allowed_extensions.join(", ")
        );
    }

    let size = fs::metadata(path)?.len();
    if size > input.max_file_size_bytes() {
        bail!(
            "File too large: {:.1}MB (max {}MB)",
            size as f64 / (1024.0 * 1024.0),
            input.max_file_size_mb
        );
    }

    Ok(())
}

/// Build the recognizer selected in config.
pub fn build_recognizer(config: &IdexConfig) -> anyhow::Result<Box<dyn LineRecognizer>> {
    match config.ocr.engine {
        OcrEngineKind::Tesseract => {
            let recognizer = TesseractRecognizer::from_config(&config.ocr);
            if !recognizer.is_available() {
                bail!(
                    "Tesseract is not available. Install tesseract-ocr or set ocr.tesseract_cmd."
                );
            }
            Ok(Box::new(recognizer))
        }
        OcrEngineKind::Crnn => {
            let model = config.model_path(&config.models.recognition_model);
            if !model.exists() {
                bail!("Recognition model not found at {}", model.display());
            }

            let options = OrtOptions {
                intra_threads: config.ocr.num_threads,
            };
            let backend = OrtBackend::from_file_with_options(&model, options)
                .map_err(|e| anyhow!("Failed to load recognition model: {}", e))?;

            let dictionary = match &config.models.dictionary {
                Some(name) => {
                    CrnnRecognizer::<OrtBackend>::load_dictionary(&config.model_path(name))?
                }
                None => CrnnRecognizer::<OrtBackend>::default_latin_dictionary(),
            };

            Ok(Box::new(CrnnRecognizer::new(backend, dictionary)))
        }
    }
}

/// Load the detector and recognizer and assemble the pipeline.
pub fn build_pipeline(config: &IdexConfig) -> anyhow::Result<CliPipeline> {
    let detector_path = config.detector_model_path();
    if !detector_path.exists() {
        bail!(
            "Detector model not found at {}.\n\n\
             Run 'idex models download' to fetch it from {}.",
            detector_path.display(),
            config.models.detector_repo_id
        );
    }

    let options = OrtOptions {
        intra_threads: config.ocr.num_threads,
    };
    let backend = OrtBackend::from_file_with_options(&detector_path, options)
        .map_err(|e| anyhow!("Failed to load detector model: {}", e))?;
    let detector = YoloFieldDetector::from_config(backend, &config.detection);

    let recognizer = build_recognizer(config)?;

    Ok(CardPipeline::from_config(detector, recognizer, config))
}

/// Render a response in the requested format.
pub fn format_response(
    response: &ExtractionResponse,
    format: OutputFormat,
    show_detections: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(response)?),
        OutputFormat::Csv => format_csv(response, show_detections),
        OutputFormat::Text => Ok(format_text(response, show_detections)),
    }
}

fn format_csv(response: &ExtractionResponse, show_detections: bool) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["AADHAR_NUMBER", "NAME", "DOB", "GENDER", "processing_time"])?;
    wtr.write_record([
        response.data.aadhar_number.as_deref().unwrap_or(""),
        response.data.name.as_deref().unwrap_or(""),
        response.data.dob.as_deref().unwrap_or(""),
        response.data.gender.as_deref().unwrap_or(""),
        &format!("{:.3}", response.processing_time),
    ])?;

    let mut out = String::from_utf8(wtr.into_inner()?)?;

    if show_detections {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(["label", "confidence", "x1", "y1", "x2", "y2", "text"])?;
        for d in &response.detections {
            wtr.write_record([
                d.label.as_str(),
                &format!("{:.3}", d.confidence),
                &format!("{:.1}", d.bbox.x1),
                &format!("{:.1}", d.bbox.y1),
                &format!("{:.1}", d.bbox.x2),
                &format!("{:.1}", d.bbox.y2),
                d.text.as_deref().unwrap_or(""),
            ])?;
        }
        out.push('\n');
        out.push_str(&String::from_utf8(wtr.into_inner()?)?);
    }

    Ok(out)
}

fn format_text(response: &ExtractionResponse, show_detections: bool) -> String {
    let mut out = String::new();
    let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

    let _ = writeln!(out, "Aadhaar number: {}", field(&response.data.aadhar_number));
    let _ = writeln!(out, "Name:           {}", field(&response.data.name));
    let _ = writeln!(out, "Date of birth:  {}", field(&response.data.dob));
    let _ = writeln!(out, "Gender:         {}", field(&response.data.gender));

    if show_detections {
        let _ = writeln!(out);
        let _ = writeln!(out, "Detections:");
        for d in &response.detections {
            let _ = writeln!(
                out,
                "  {:<14} {:.2}  [{:.0}, {:.0}, {:.0}, {:.0}]  {}",
                d.label,
                d.confidence,
                d.bbox.x1,
                d.bbox.y1,
                d.bbox.x2,
                d.bbox.y2,
                d.text.as_deref().unwrap_or("-")
            );
        }
    }

    if let Some(message) = &response.message {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} ({:.3}s)", message, response.processing_time);
    }

    out
}

/// Human-readable file size.
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}
