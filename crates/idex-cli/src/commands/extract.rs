//! Extract command - read identity fields from a single card image.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use idex_core::CardImage;

use super::{build_pipeline, format_response, load_config, validate_input, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input card image (JPG or PNG)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory (overrides config)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Minimum detection confidence (overrides config)
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Include per-detection evidence in text and CSV output
    #[arg(long)]
    show_detections: bool,

    /// Report fields that look wrong
    #[arg(long)]
    validate: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(model_dir) = &args.model_dir {
        config.models.model_dir = model_dir.clone();
    }
    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("Threshold must be between 0 and 1, got {}", threshold);
        }
        config.detection.confidence_threshold = threshold;
    }

    validate_input(&args.input, &config.input)?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Loading models...");
    pb.set_position(10);
    let pipeline = build_pipeline(&config)?;

    pb.set_message("Loading image...");
    pb.set_position(30);
    let image = CardImage::open(&args.input)?;

    pb.set_message("Extracting fields...");
    pb.set_position(50);
    let response = pipeline.process(&image)?;

    pb.finish_and_clear();

    if args.validate {
        let issues = response.data.validate();
        if !issues.is_empty() {
            eprintln!("{}", style("Validation issues:").yellow());
            for issue in &issues {
                eprintln!("  - {}", issue);
            }
        }
    }

    let output = format_response(&response, args.format, args.show_detections)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total time: {:?}", start.elapsed());

    Ok(())
}
