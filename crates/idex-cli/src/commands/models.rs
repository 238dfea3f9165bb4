//! Models command - download and manage the detector and recognition models.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use idex_core::models::OcrEngineKind;
use idex_core::IdexConfig;

use super::{format_size, load_config};

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// Download the field detector
    Download(DownloadArgs),

    /// Check which model files are present
    Status(StatusArgs),

    /// Remove downloaded models
    Clean(CleanArgs),
}

#[derive(Args)]
struct DownloadArgs {
    /// Output directory (default: configured model directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force re-download even if the file exists
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct StatusArgs {
    /// Model directory (overrides config)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

#[derive(Args)]
struct CleanArgs {
    /// Model directory (overrides config)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// A model file expected in the model directory.
struct ModelFile {
    filename: String,
    description: &'static str,
    required: bool,
}

/// Model files the current configuration needs.
fn expected_models(config: &IdexConfig) -> Vec<ModelFile> {
    let crnn = config.ocr.engine == OcrEngineKind::Crnn;

    let mut models = vec![ModelFile {
        filename: config.models.detector_model.clone(),
        description: "YOLOv8 field detector",
        required: true,
    }];

    models.push(ModelFile {
        filename: config.models.recognition_model.clone(),
        description: "CRNN line recognizer",
        required: crnn,
    });

    if let Some(dictionary) = &config.models.dictionary {
        models.push(ModelFile {
            filename: dictionary.clone(),
            description: "Recognizer dictionary",
            required: crnn,
        });
    }

    models
}

/// Hugging Face download URL for a file in a repository.
fn hub_url(repo_id: &str, filename: &str) -> String {
    format!(
        "https://huggingface.co/{}/resolve/main/{}",
        repo_id, filename
    )
}

pub async fn run(args: ModelsArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    match args.command {
        ModelsCommand::Download(download_args) => download_models(download_args, &config).await,
        ModelsCommand::Status(status_args) => {
            let model_dir = status_args
                .model_dir
                .unwrap_or_else(|| config.models.model_dir.clone());
            check_status(&config, &model_dir)
        }
        ModelsCommand::Clean(clean_args) => {
            let model_dir = clean_args
                .model_dir
                .unwrap_or_else(|| config.models.model_dir.clone());
            clean_models(&config, &model_dir)
        }
    }
}

async fn download_models(args: DownloadArgs, config: &IdexConfig) -> anyhow::Result<()> {
    let output_dir = args
        .output
        .unwrap_or_else(|| config.models.model_dir.clone());
    fs::create_dir_all(&output_dir)?;

    let filename = &config.models.detector_model;
    let repo_id = &config.models.detector_repo_id;
    let path = output_dir.join(filename);

    println!(
        "{} Downloading detector from {} to {}",
        style("ℹ").blue(),
        style(repo_id).cyan().bold(),
        output_dir.display()
    );
    println!();

    if path.exists() && !args.force {
        let size = fs::metadata(&path)?.len();
        if size > 0 {
            println!(
                "  {} {} (already exists, {})",
                style("✓").green(),
                filename,
                format_size(size)
            );
            println!();
            println!("Use --force to download again.");
            return Ok(());
        }
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("idex-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.green} {msg:<30} [{bar:25.cyan/blue}] {bytes}/{total_bytes}")?
            .progress_chars("=>-"),
    );
    pb.set_message(filename.clone());

    let url = hub_url(repo_id, filename);
    debug!("Fetching {}", url);

    match download_file(&client, &url, &path, &pb).await {
        Ok(()) => {
            pb.finish_with_message(format!("{} {}", style("✓").green(), filename));
        }
        Err(e) => {
            pb.finish_with_message(format!("{} {} - {}", style("✗").red(), filename, e));
            println!();
            println!("Retry with: idex models download --force");
            return Err(e);
        }
    }

    println!();
    println!("{} Detector downloaded successfully!", style("✓").green().bold());

    if config.ocr.engine == OcrEngineKind::Crnn {
        println!();
        println!(
            "{} The CRNN engine also needs {} in {}",
            style("ℹ").blue(),
            config.models.recognition_model,
            output_dir.display()
        );
    }

    println!();
    check_status(config, &output_dir)?;

    Ok(())
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    pb: &ProgressBar,
) -> anyhow::Result<()> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }

    if let Some(content_length) = response.content_length() {
        pb.set_length(content_length);
    }

    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    Ok(())
}

fn check_status(config: &IdexConfig, model_dir: &Path) -> anyhow::Result<()> {
    println!("{}", style("Model Status").bold());
    println!("Model directory: {}", model_dir.display());
    println!("OCR engine: {}", style(format!("{:?}", config.ocr.engine).to_lowercase()).cyan());
    println!();

    let mut ready = true;
    let mut total_size: u64 = 0;

    for model in expected_models(config) {
        let path = model_dir.join(&model.filename);

        let (status, size_str) = match fs::metadata(&path) {
            Ok(metadata) if metadata.len() > 0 => {
                total_size += metadata.len();
                (style("✓").green(), format_size(metadata.len()))
            }
            Ok(_) => {
                if model.required {
                    ready = false;
                }
                (style("⚠").yellow(), "empty".to_string())
            }
            Err(_) if model.required => {
                ready = false;
                (style("✗").red(), "missing".to_string())
            }
            Err(_) => (style("-").dim(), "missing (optional)".to_string()),
        };

        println!(
            "    {} {:<25} {:>20}  {}",
            status, model.filename, size_str, model.description
        );
    }

    println!();
    if ready {
        println!(
            "    {} Ready ({} total)",
            style("✓").green(),
            format_size(total_size)
        );
    } else {
        println!(
            "    {} Run 'idex models download' to download",
            style("⚠").yellow()
        );
    }

    Ok(())
}

fn clean_models(config: &IdexConfig, model_dir: &Path) -> anyhow::Result<()> {
    if !model_dir.exists() {
        println!("{} No model files to remove.", style("ℹ").blue());
        return Ok(());
    }

    println!("{} Cleaning {}...", style("⚠").yellow(), model_dir.display());

    let mut total_removed = 0;
    let mut total_freed: u64 = 0;

    for model in expected_models(config) {
        let path = model_dir.join(&model.filename);
        if path.exists() {
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            fs::remove_file(&path)?;
            total_removed += 1;
            total_freed += size;
            println!("  {} Removed {}", style("✓").green(), model.filename);
        }
    }

    // Leftovers from interrupted downloads
    if let Ok(entries) = fs::read_dir(model_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "tmp").unwrap_or(false) {
                let _ = fs::remove_file(&path);
            }
        }
    }

    if total_removed > 0 {
        println!();
        println!(
            "{} Removed {} files, freed {}",
            style("✓").green(),
            total_removed,
            format_size(total_freed)
        );
    } else {
        println!("{} No model files to remove.", style("ℹ").blue());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_url() {
        assert_eq!(
            hub_url("arnabdhar/YOLOv8-nano-aadhar-card", "model.onnx"),
            "https://huggingface.co/arnabdhar/YOLOv8-nano-aadhar-card/resolve/main/model.onnx"
        );
    }

    #[test]
    fn test_expected_models_tesseract() {
        let config = IdexConfig::default();
        let models = expected_models(&config);

        assert_eq!(models[0].filename, "model.onnx");
        assert!(models[0].required);
        assert!(models.iter().skip(1).all(|m| !m.required));
    }

    #[test]
    fn test_expected_models_crnn() {
        let mut config = IdexConfig::default();
        config.ocr.engine = OcrEngineKind::Crnn;
        config.models.dictionary = Some("dict.txt".to_string());

        let models = expected_models(&config);
        assert_eq!(models.len(), 3);
        assert!(models.iter().all(|m| m.required));
    }
}
