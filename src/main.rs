extern crate anyhow;
extern crate clap;
extern crate log;
extern crate zkphash;

use anyhow::Context;
use clap::Parser;
use log::{info, LevelFilter};
use std::path::{Path, PathBuf};
use zkphash::discover::discover_images;
use zkphash::witness::{read_json, write_json};
use zkphash::{build_batch, BatchFile, PhashConfig, PhashPipeline, StageSchedule, WitnessBatch};

/// Command-line interface for the zkphash tool
#[derive(clap::Parser, Debug)]
#[clap(name = "zkphash", version, about = "Circuit-compatible perceptual hashing tool", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[clap(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// JSON file with pipeline parameters (defaults to 32x32, 8x8, 2^64, ascending)
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the bitonic stage schedule
    #[clap(long, value_enum, global = true)]
    schedule: Option<StageSchedule>,

    /// Subcommand to execute
    #[clap(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Compute the pHash of an image
    Hash {
        /// Path to the input image file
        #[clap(short, long)]
        input: PathBuf,

        /// Also write the hash matrix as JSON to this file
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the circuit input (intensity grid and DCT coefficients) for one image
    Prepare {
        /// Path to the input image file
        #[clap(short, long)]
        input: PathBuf,

        /// Output file (default: workdir/<image stem>.json)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Hash every image under a directory into a padded witness batch
    Batch {
        /// Directory scanned recursively for images
        #[clap(short, long)]
        input_dir: PathBuf,

        /// Batch capacity; overrides the configured value
        #[clap(short, long)]
        max_images: Option<usize>,

        /// Output file (default: workdir/dbphashs_<capacity>.json)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Find the closest batch entry to an image's hash
    Match {
        /// Witness batch file
        #[clap(short, long)]
        batch: PathBuf,

        /// Path to the input image file
        #[clap(short, long)]
        input: PathBuf,

        /// Largest Hamming distance accepted as a match
        #[clap(short, long)]
        threshold: Option<usize>,
    },

    /// Commit to a witness batch and write the matching circuit's input file
    #[cfg(feature = "commit")]
    Commit {
        /// Witness batch file
        #[clap(short, long)]
        batch: PathBuf,

        /// Preparation file of the query image
        #[clap(short, long)]
        image: PathBuf,

        /// Blinding value for the image commitment
        #[clap(long, default_value_t = zkphash::commit::DEFAULT_BLINDING)]
        r2: u64,

        /// Largest Hamming distance the circuit accepts
        #[clap(short, long)]
        threshold: Option<usize>,

        /// Output file (default: workdir/<capacity>_circom_input.json)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

fn default_prepare_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Path::new("workdir").join(format!("{}.json", stem))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.debug {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let mut config = match &cli.config {
        Some(path) => PhashConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PhashConfig::default(),
    };
    if let Some(schedule) = cli.schedule {
        config.schedule = schedule;
    }

    match cli.command {
        Commands::Hash { input, output } => {
            info!("Generating pHash for {:?}", input);
            let pipeline = PhashPipeline::new(config)?;
            let hash = pipeline
                .hash_path(&input)
                .with_context(|| format!("Failed to hash image: {}", input.display()))?;

            println!("{}\n{}", hash.to_hex(), hash);
            if let Some(output_path) = output {
                write_json(&output_path, &hash.to_rows())?;
                info!("Hash matrix written to {}", output_path.display());
            }
        }
        Commands::Prepare { input, output } => {
            info!("Preparing circuit input for {:?}", input);
            let scale_bits = config.scale_bits;
            let pipeline = PhashPipeline::new(config)?;
            let prepared = pipeline
                .prepare_path(&input)
                .with_context(|| format!("Failed to process image: {}", input.display()))?;

            let output_path = output.unwrap_or_else(|| default_prepare_output(&input));
            write_json(&output_path, &prepared)?;
            let size = pipeline.config().size;
            println!("Data written to {}", output_path.display());
            println!("Image size: {}x{}", size, size);
            println!("DCT matrix size: {}x{}", size, size);
            println!("Scale: 2^{}", scale_bits);
        }
        Commands::Batch {
            input_dir,
            max_images,
            output,
        } => {
            if let Some(capacity) = max_images {
                config.capacity = capacity;
            }
            let pipeline = PhashPipeline::new(config)?;
            let paths = discover_images(&input_dir)
                .with_context(|| format!("Invalid input directory: {}", input_dir.display()))?;
            if paths.is_empty() {
                anyhow::bail!("No image files found under {}", input_dir.display());
            }

            let (batch, report) = build_batch(&pipeline, &paths)?;
            let output_path = output.unwrap_or_else(|| {
                Path::new("workdir").join(format!("dbphashs_{}.json", batch.capacity()))
            });
            write_json(&output_path, &batch.to_file())
                .with_context(|| format!("Failed to write batch: {}", output_path.display()))?;
            println!("Batch written to {}", output_path.display());
            println!("{}", report);
        }
        Commands::Match {
            batch,
            input,
            threshold,
        } => {
            let threshold = threshold.unwrap_or(config.threshold);
            let file: BatchFile = read_json(&batch)
                .with_context(|| format!("Failed to read batch: {}", batch.display()))?;
            let db = WitnessBatch::from_file(&file)?;
            let pipeline = PhashPipeline::new(config)?;
            let hash = pipeline
                .hash_path(&input)
                .with_context(|| format!("Failed to hash image: {}", input.display()))?;

            info!(
                "Comparing {} against {} entries",
                hash.to_hex(),
                db.real_len()
            );
            match db.closest_match(&hash, threshold)? {
                Some(found) => println!(
                    "✓ Entry {} matches at distance {}",
                    found.index, found.distance
                ),
                None => println!("✗ No entry within distance {}", threshold),
            }
        }
        #[cfg(feature = "commit")]
        Commands::Commit {
            batch,
            image,
            r2,
            threshold,
            output,
        } => {
            let threshold = threshold.unwrap_or(config.threshold);
            let file: BatchFile = read_json(&batch)
                .with_context(|| format!("Failed to read batch: {}", batch.display()))?;
            let prepared: zkphash::PreparedImage = read_json(&image)
                .with_context(|| format!("Failed to read image data: {}", image.display()))?;

            let input = zkphash::commit::circuit_input(&file, &prepared, threshold, r2)?;
            let output_path = output.unwrap_or_else(|| {
                Path::new("workdir").join(format!("{}_circom_input.json", file.db_phashs.len()))
            });
            write_json(&output_path, &input)
                .with_context(|| format!("Failed to write circuit input: {}", output_path.display()))?;
            println!("dbHash (Merkle root): {}", input.db_hash);
            println!("Results saved to: {}", output_path.display());
        }
    }
    Ok(())
}
