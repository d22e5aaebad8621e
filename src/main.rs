//! Command-line entry point.
//!
//! # Startup sequence
//!
//! 1. Parse arguments.
//! 2. Initialise logging (`--debug` lowers the default filter to `debug`).
//! 3. Load [`AppConfig`] (defaults on first run).
//! 4. Run the subcommand:
//!    * `diff`: pair two caption batches, extract candidates on a small
//!      tokio runtime, merge into the mapping and persist it.
//!    * `apply`: correct a batch with the current mapping, optionally
//!      exporting one `.vtt` file per video.
//!    * `view`: list the current mapping.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use term_mapper::{
    batch::{apply_mapping, pair_batches, segments_to_vtt, vtt_file_name, CaptionBatch},
    config::{AppConfig, MAPPING_FILE_ENV},
    diff::{extract_batch_concurrent, review_candidates},
    mapping::{merge, TerminologyMapping},
};

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "term-mapper", version, about = "Build and apply caption terminology mappings")]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    debug: bool,

    /// Settings file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Mapping file (overrides `[mapping].file` in settings).
    #[arg(long, global = true, env = MAPPING_FILE_ENV)]
    mapping: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Diff an original batch against its spell-checked copy and grow the mapping.
    Diff {
        original: PathBuf,
        corrected: PathBuf,
        /// Where to write the merged mapping (defaults to the loaded one).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Minimum occurrences for a candidate to be kept.
        #[arg(short, long)]
        min_count: Option<u32>,
    },
    /// Apply the mapping to a caption batch.
    Apply {
        batch: PathBuf,
        /// Output file (defaults to overwriting the input).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Directory to write one WebVTT file per video into.
        #[arg(long)]
        vtt: Option<PathBuf>,
    },
    /// Show the current mapping.
    View,
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn run_diff(
    config: &AppConfig,
    mapping_path: &Path,
    original: &Path,
    corrected: &Path,
    output: Option<&Path>,
    min_count: Option<u32>,
) -> Result<()> {
    let existing = TerminologyMapping::load_with(mapping_path, config.mapping.strict)?;

    let original = CaptionBatch::load(original)
        .with_context(|| format!("loading {}", original.display()))?;
    let corrected = CaptionBatch::load(corrected)
        .with_context(|| format!("loading {}", corrected.display()))?;
    let pairs = pair_batches(&original, &corrected);

    // 2 workers: alignment is CPU-bound and batches are small.
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    let min_count = min_count.unwrap_or(config.extract.min_count);
    let candidates = rt.block_on(extract_batch_concurrent(
        pairs,
        config.extract.options(),
        min_count,
    ))?;

    if candidates.is_empty() {
        println!("No differences found.");
        return Ok(());
    }

    let accepted = review_candidates(candidates, None);
    for c in &accepted {
        println!("  '{}' -> '{}' ({}x)", c.original, c.corrected, c.occurrence_count);
    }

    let (mut mapping, report) = merge(existing, &accepted)?;
    if mapping.description.is_empty() {
        mapping.description = config.mapping.description.clone();
    }
    let output = output.unwrap_or(mapping_path);
    mapping.persist(output)?;

    println!();
    println!("New mappings added:  {}", report.added);
    println!("Existing updated:    {}", report.updated);
    println!("Total mappings now:  {}", mapping.len());
    println!("Saved to:            {}", output.display());
    Ok(())
}

fn run_apply(
    config: &AppConfig,
    mapping_path: &Path,
    input: &Path,
    output: Option<&Path>,
    vtt_dir: Option<&Path>,
) -> Result<()> {
    let mapping = TerminologyMapping::load_with(mapping_path, config.mapping.strict)?;
    if mapping.is_empty() {
        log::warn!("no terminology mappings loaded; batch passes through unchanged");
    }

    let batch =
        CaptionBatch::load(input).with_context(|| format!("loading {}", input.display()))?;
    let corrected = apply_mapping(&batch, &mapping, Some(mapping_path));
    corrected.save(output.unwrap_or(input))?;

    if let Some(dir) = vtt_dir {
        std::fs::create_dir_all(dir)?;
        for video in &corrected.videos {
            let path = dir.join(vtt_file_name(&video.video_id));
            std::fs::write(&path, segments_to_vtt(&video.segments))
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
    }

    println!(
        "Corrected {} videos with {} mappings",
        corrected.videos.len(),
        mapping.len()
    );
    Ok(())
}

fn run_view(config: &AppConfig, mapping_path: &Path) -> Result<()> {
    let mapping = TerminologyMapping::load_with(mapping_path, config.mapping.strict)?;
    println!("Terminology mappings from: {}", mapping_path.display());
    if mapping.is_empty() {
        println!("No mappings found.");
        return Ok(());
    }
    println!("Total mappings: {}\n", mapping.len());
    for (original, corrected) in mapping.iter() {
        println!("  '{original}' -> '{corrected}'");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };
    let mapping_path = cli.mapping.clone().unwrap_or_else(|| config.mapping_path());

    match &cli.command {
        Command::Diff {
            original,
            corrected,
            output,
            min_count,
        } => run_diff(
            &config,
            &mapping_path,
            original,
            corrected,
            output.as_deref(),
            *min_count,
        ),
        Command::Apply { batch, output, vtt } => run_apply(
            &config,
            &mapping_path,
            batch,
            output.as_deref(),
            vtt.as_deref(),
        ),
        Command::View => run_view(&config, &mapping_path),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
