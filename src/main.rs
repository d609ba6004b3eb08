//! BookBridge CLI - EPUB translation quoting and submission.

use anyhow::{Context, Result};
use bookbridge::config::Config;
use bookbridge::console::Console;
use bookbridge::epub::EpubAnalyzer;
use bookbridge::pricing::{SpeedMode, TranslationMode};
use bookbridge::submission::{SubmissionClient, SubmissionRequest};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// EPUB translation quoting and submission client.
#[derive(Parser, Debug)]
#[command(name = "bookbridge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the EPUB file to analyze.
    epub_path: PathBuf,

    /// Translation speed (selects the price column).
    #[arg(long, value_enum, default_value = "standard")]
    speed: SpeedMode,

    /// Translation quality profile.
    #[arg(long, value_enum, default_value = "standard")]
    mode: TranslationMode,

    /// Upload the book for translation after quoting.
    #[arg(long)]
    submit: bool,

    /// Directory for the translated result (defaults to config value).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    console.section("BookBridge - EPUB Translation Client");

    // Load configuration
    console.step("Loading configuration...");
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    console.success("Configuration loaded");

    // Analyze the book
    console.step(&format!("Analyzing {}...", args.epub_path.display()));
    let analyzer = EpubAnalyzer::new();
    let epub_path = args.epub_path.clone();
    let analysis = tokio::task::spawn_blocking(move || analyzer.analyze(&epub_path))
        .await
        .context("Analysis task failed")?
        .context("Failed to analyze EPUB")?;

    console.success(&format!("Found: {}", analysis.title));
    if let Some(ref author) = analysis.author {
        console.info(&format!("Author: {}", author));
    }
    if let Some(ref language) = analysis.language {
        console.info(&format!("Language: {}", language));
    }
    console.info(&format!(
        "Word count: {}",
        console.word_count(analysis.word_count)
    ));

    // Quote the price
    let price = config.pricing.quote(analysis.word_count, args.speed);
    console.info(&format!(
        "Price ({} speed): {}",
        args.speed.as_str(),
        console.price(&price.to_string())
    ));

    if !args.submit {
        console.info("Run again with --submit to upload the book for translation.");
        return Ok(());
    }

    // Submit for translation
    let client = SubmissionClient::new(
        &config.server.base_url,
        Duration::from_secs(config.server.timeout_sec),
    )
    .context("Failed to create submission client")?;

    console.step("Checking server health...");
    match client.health_check().await {
        Ok(true) => console.success("Server is reachable"),
        Ok(false) => anyhow::bail!("Translation server is unhealthy"),
        Err(e) => return Err(e).context("Failed to reach translation server"),
    }

    console.step("Uploading book for translation...");
    let request = SubmissionRequest {
        speed: args.speed,
        mode: args.mode,
        word_count: analysis.word_count,
    };
    let translated = client
        .submit(&args.epub_path, request)
        .await
        .context("Translation submission failed")?;

    // Write the translated archive next to the configured output directory
    let output_dir = args
        .output
        .unwrap_or_else(|| config.paths.output_directory.clone());
    tokio::fs::create_dir_all(&output_dir)
        .await
        .context("Failed to create output directory")?;

    let stem = args
        .epub_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());
    let output_path = output_dir.join(format!("{}_translated.epub", stem));

    tokio::fs::write(&output_path, &translated)
        .await
        .context("Failed to write translated book")?;

    console.success(&format!("Translated book saved: {}", output_path.display()));
    console.section("Done!");
    Ok(())
}
