// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Aligna: document scanner command-line tool.
//
// Entry point. Initialises error reporting and logging, loads the config, and
// runs one scan session per invocation.

use std::path::{Path, PathBuf};

use aligna_app::DocumentSession;
use aligna_app::services::{config_store, data_dir};
use aligna_core::human_errors::humanize_error;
use aligna_core::{AlignaError, AspectRatio, CornerSet, EnhancementMode, ScanConfig};
use aligna_document::{DetectionFallback, DocumentScanner, ImageProcessor};
use clap::{Parser, Subcommand};
use color_eyre::Section;
use color_eyre::eyre::{Report, Result};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aligna", author, version, about, long_about = None)]
struct Cli {
    /// Path to a JSON configuration file (defaults to the data directory's config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the document corners in an image and print them as JSON
    Detect {
        /// Path to the input image
        input: PathBuf,
    },
    /// Rectify, reshape and enhance a document photo
    Scan {
        /// Path to the input image
        input: PathBuf,
        /// Output image path; the format follows the extension
        #[arg(short, long)]
        output: PathBuf,
        /// Enhancement mode: original, magic, bw, color
        #[arg(short, long, default_value = "magic")]
        mode: EnhancementMode,
        /// Output aspect ratio: auto, 1:1, 4:3, 16:9, 3:2 or W:H
        #[arg(short, long, default_value = "auto")]
        ratio: AspectRatio,
        /// Corners to use instead of detection: "x,y;x,y;x,y;x,y" (TL;TR;BR;BL)
        #[arg(long)]
        corners: Option<CornerSet>,
        /// Width of the rectified page in pixels
        #[arg(long)]
        width: Option<u32>,
        /// Height of the rectified page in pixels
        #[arg(long)]
        height: Option<u32>,
        /// Square up perspective-skewed corners before rectifying
        #[arg(long)]
        straighten: bool,
    },
    /// Print the effective configuration as JSON
    Config {
        /// Also write it to the data directory's config.json
        #[arg(long)]
        save: bool,
    },
}

/// JSON printed by `aligna detect`.
#[derive(Serialize)]
struct DetectReport {
    input: PathBuf,
    width: u32,
    height: u32,
    corners: CornerSet,
    fallback: Option<DetectionFallback>,
    ratio: String,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config_store::effective_config(cli.config.as_deref()).map_err(explain)?;

    match cli.command {
        Commands::Detect { input } => detect(&input, config),
        Commands::Scan {
            input,
            output,
            mode,
            ratio,
            corners,
            width,
            height,
            straighten,
        } => scan(
            &input,
            &output,
            config,
            ScanOptions {
                mode,
                ratio,
                corners,
                size: (width, height),
                straighten,
            },
        ),
        Commands::Config { save } => show_config(&config, save),
    }
}

fn detect(input: &Path, config: ScanConfig) -> Result<()> {
    let scanner = DocumentScanner::new(config);
    let image = ImageProcessor::open(input).map_err(explain)?.into_dynamic();
    let detection = scanner.detect_with_report(&image).map_err(explain)?;
    let (ratio_w, ratio_h) = scanner.detected_ratio(&detection.corners);

    let report = DetectReport {
        input: input.to_path_buf(),
        width: image.width(),
        height: image.height(),
        corners: detection.corners,
        fallback: detection.fallback,
        ratio: format!("{ratio_w}:{ratio_h}"),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

struct ScanOptions {
    mode: EnhancementMode,
    ratio: AspectRatio,
    corners: Option<CornerSet>,
    size: (Option<u32>, Option<u32>),
    straighten: bool,
}

fn scan(input: &Path, output: &Path, config: ScanConfig, options: ScanOptions) -> Result<()> {
    let scanner = DocumentScanner::new(config);
    let image = ImageProcessor::open(input).map_err(explain)?.into_dynamic();

    let mut session = DocumentSession::capture(&scanner, image).map_err(explain)?;
    match (options.corners, session.detection_fallback()) {
        (Some(corners), _) => {
            session.set_corners(corners).map_err(explain)?;
        }
        (None, Some(reason)) => {
            warn!(?reason, "Document edges not found, rectifying the whole image");
        }
        (None, None) => {}
    }
    if options.straighten {
        session.straighten(&scanner).map_err(explain)?;
    }
    let (width, height) = options.size;
    session.set_output_size(width, height).map_err(explain)?;

    session.lock(&scanner).map_err(explain)?;
    session.set_ratio(options.ratio).map_err(explain)?;
    session.set_mode(options.mode);

    let page = session.render(&scanner).map_err(explain)?;
    ImageProcessor::from_dynamic(page.image)
        .save(output)
        .map_err(explain)?;
    info!(
        session = %session.id(),
        output = %output.display(),
        "Scan written"
    );
    Ok(())
}

fn show_config(config: &ScanConfig, save: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if save {
        config_store::persist_config(&data_dir::data_dir(), config).map_err(explain)?;
    }
    Ok(())
}

/// Attach the plain-English message and suggestion to a pipeline error.
fn explain(err: AlignaError) -> Report {
    let human = humanize_error(&err);
    Report::new(err)
        .wrap_err(human.message)
        .suggestion(human.suggestion)
}
