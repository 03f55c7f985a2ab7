// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Menuscan: restaurant menu OCR, segmentation and translation.
//
// Entry point. Initialises logging, loads configuration, runs one image
// through the pipeline and prints the result as JSON on stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use menuscan_core::config::PipelineConfig;
use menuscan_core::types::LanguageCode;
use menuscan_pipeline::MenuPipeline;
use menuscan_vision::TesseractRecognizer;

/// Read a photographed menu and translate its items.
#[derive(Debug, Parser)]
#[command(name = "menuscan", version, about, long_about = None)]
struct Cli {
    /// Menu photo (JPEG, PNG, GIF, BMP or TIFF)
    image: PathBuf,

    /// Target language code (en, es, fr, de, it, pt, ru, ja, ko, zh, ar, hi)
    #[arg(short, long, env = "MENUSCAN_TARGET")]
    target: Option<String>,

    /// JSON configuration file
    #[arg(short, long, env = "MENUSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Print the result on a single line
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!(image = %cli.image.display(), "Menuscan starting");

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PipelineConfig::from_env().context("invalid configuration from environment")?,
    };
    tracing::debug!(
        endpoint = %config.translation.endpoint,
        "Translation provider"
    );

    if !TesseractRecognizer::from_config(&config.recognition)
        .is_available()
        .await
    {
        tracing::warn!(
            binary = %config.recognition.tesseract_binary,
            "tesseract could not be started; every recognition run will come back empty"
        );
    }

    let image = tokio::fs::read(&cli.image)
        .await
        .with_context(|| format!("failed to read {}", cli.image.display()))?;

    let pipeline = MenuPipeline::from_config(&config).context("failed to build pipeline")?;
    let result = pipeline.process(&image, cli.target.as_deref()).await;

    let json = if cli.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{json}");

    if result.success {
        Ok(ExitCode::SUCCESS)
    } else {
        if let Some(error) = &result.error {
            tracing::error!(%error, "Menu could not be processed");
        }
        if cli.target.as_deref().is_some_and(|t| LanguageCode::from_code(t).is_none()) {
            let supported: Vec<_> = LanguageCode::ALL
                .iter()
                .map(|code| format!("{code} ({})", code.english_name()))
                .collect();
            eprintln!("supported target languages: {}", supported.join(", "));
        }
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn arguments_parse() {
        let cli = Cli::try_parse_from([
            "menuscan",
            "menu.jpg",
            "--target",
            "es",
            "--config",
            "menuscan.json",
            "--compact",
        ])
        .unwrap();
        assert_eq!(cli.image, PathBuf::from("menu.jpg"));
        assert_eq!(cli.target.as_deref(), Some("es"));
        assert_eq!(cli.config, Some(PathBuf::from("menuscan.json")));
        assert!(cli.compact);
    }

    #[test]
    fn image_is_required() {
        assert!(Cli::try_parse_from(["menuscan"]).is_err());
    }
}
