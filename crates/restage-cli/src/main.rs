//! restage: CLI furniture removal and restyling for room photos.
//!
//! Runs the full pipeline on a photo with configurable parameters,
//! writing each stage's output as a PNG and printing per-stage
//! diagnostics. Useful for:
//!
//! - Tuning the detection score threshold and mask margin
//! - Comparing inpainting radii on real room photos
//! - Trying style transfer models and reference images
//! - Printing catalog recommendations for a client brief
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin restage -- --detector furniture.rten [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod overlay;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;

use restage_catalog::{AssetCatalog, DesignBrief, recommend};
use restage_models::{ModelSet, RoomStyler};
use restage_pipeline::diagnostics::{Clock, process_staged_with_diagnostics};
use restage_pipeline::{PipelineConfig, StagedResult};

/// Furniture removal and restyling for room photos.
///
/// Detects furniture in the given photo, removes it by inpainting, and
/// optionally restyles the emptied room. Writes every stage's output as
/// a PNG and prints per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "restage", version)]
struct Cli {
    /// Path to the input photo (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Path to the furniture detector model (.rten).
    #[arg(long)]
    detector: PathBuf,

    /// Path to the style transfer model (.rten). Requires --style-image.
    #[arg(long, requires = "style_image")]
    style_model: Option<PathBuf>,

    /// Path to the style reference image. Requires --style-model.
    #[arg(long, requires = "style_model")]
    style_image: Option<PathBuf>,

    /// Minimum detection confidence to keep (0.0-1.0).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_SCORE_THRESHOLD)]
    score_threshold: f32,

    /// Pixels to grow the mask outward beyond each detection box.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MASK_MARGIN)]
    mask_margin: u32,

    /// Neighborhood radius for inpainting (>= 1).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_INPAINT_RADIUS)]
    inpaint_radius: u32,

    /// Directory for per-stage PNG outputs.
    #[arg(long, default_value = "restage-out")]
    out_dir: PathBuf,

    /// Skip writing per-stage PNG outputs.
    #[arg(long)]
    no_outputs: bool,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Client design brief as a JSON string; prints matching catalog
    /// recommendations after processing.
    #[arg(long)]
    brief_json: Option<String>,

    /// Base URL for catalog asset links.
    #[arg(long, default_value = restage_catalog::DEFAULT_BASE_URL)]
    asset_base_url: String,
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        score_threshold: cli.score_threshold,
        mask_margin: cli.mask_margin,
        inpaint_radius: cli.inpaint_radius,
    })
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Write each stage's output under `dir`.
fn write_stage_outputs(dir: &std::path::Path, staged: &StagedResult) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Error creating {}: {e}", dir.display()))?;

    let save = |name: &str, save_fn: &dyn Fn(&std::path::Path) -> image::ImageResult<()>| {
        let path = dir.join(name);
        save_fn(&path).map_err(|e| format!("Error writing {}: {e}", path.display()))
    };

    save("original.png", &|p| staged.original.save(p))?;
    let overlay = overlay::render_overlay(&staged.original, &staged.detections);
    save("overlay.png", &|p| overlay.save(p))?;
    save("mask.png", &|p| staged.mask.as_image().save(p))?;
    save("inpainted.png", &|p| staged.inpainted.save(p))?;
    if let Some(ref styled) = staged.styled {
        save("styled.png", &|p| styled.save(p))?;
    }
    Ok(())
}

/// Print catalog recommendations for a brief.
fn print_recommendations(brief: &DesignBrief, catalog: &AssetCatalog) {
    let picks = recommend(brief);
    println!();
    println!(
        "Recommendations for a {} (budget {} EUR)",
        brief.space_type(),
        brief.budget(),
    );
    if picks.is_empty() {
        println!("  (nothing in the catalog fits this brief)");
        return;
    }
    for pick in picks {
        println!(
            "  {:<20} {:>6} EUR  {}",
            pick.name,
            pick.price,
            catalog.url(pick.asset),
        );
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let brief = match cli.brief_json.as_deref() {
        None => None,
        Some(json) => match serde_json::from_str::<DesignBrief>(json) {
            Ok(b) => Some(b),
            Err(e) => {
                eprintln!("Error parsing --brief-json: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let mut models = match ModelSet::load(&cli.detector) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let (Some(model_path), Some(image_path)) = (&cli.style_model, &cli.style_image) {
        match RoomStyler::load(model_path, image_path) {
            Ok(styler) => models = models.with_styler(styler),
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Photo: {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!(
        "Style transfer: {}",
        if models.has_styler() {
            "enabled"
        } else {
            "skipped"
        },
    );
    eprintln!();

    let (staged, diagnostics) =
        match process_staged_with_diagnostics(&image_bytes, &config, models.adapters(), &StdClock) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        };

    if cli.json {
        match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", diagnostics.report());
    }

    if !cli.no_outputs {
        if let Err(msg) = write_stage_outputs(&cli.out_dir, &staged) {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
        eprintln!();
        eprintln!("Stage outputs written to {}", cli.out_dir.display());
    }

    if let Some(ref brief) = brief {
        let catalog = AssetCatalog::new(cli.asset_base_url.clone());
        print_recommendations(brief, &catalog);
    }

    ExitCode::SUCCESS
}
