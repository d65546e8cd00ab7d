//! Training CLI Tool
//!
//! Command-line interface for assembling transfer-learning image
//! classifiers from a TOML configuration file.

use anyhow::{Context, Result};
use burn_ndarray::{NdArray, NdArrayDevice};
use clap::Parser;
use classifier_core::{
    backend::{self, Device},
    cli, ArchitectureKind, TrainingOptions,
};
use classifier_training::Trainer;
use std::path::PathBuf;
use tracing::info;

/// Transfer-Learning Classifier Training Tool
#[derive(Parser, Debug)]
#[command(
    name = "train",
    about = "Assemble transfer-learning image classifiers",
    long_about = "Assemble transfer-learning image classifiers from a TOML \
                  configuration: a pre-trained backbone, a configurable \
                  fully-connected head, and augmented directory datasets."
)]
struct Args {
    /// Path to training configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Override batch size
    #[arg(short, long, value_name = "SIZE")]
    batch_size: Option<usize>,

    /// Override backbone architecture
    #[arg(short, long, value_name = "ARCH")]
    architecture: Option<String>,

    /// Validate the configuration without building anything
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    cli::setup_logging(args.verbose).context("Failed to initialize logging")?;

    info!("Transfer-Learning Classifier - Training Tool");

    let mut opts: TrainingOptions =
        cli::read_toml_config(&args.config).context("Failed to load configuration file")?;

    apply_overrides(&mut opts, &args)?;

    opts.validate().context("Invalid configuration")?;

    print_options_summary(&opts);

    if args.dry_run {
        info!("Configuration validated successfully (dry run)");
        return Ok(());
    }

    let device = backend::select_device(Device::default());
    if device != Device::Cpu {
        info!("GPU detected, but the bundled backend runs on CPU");
    }

    let trainer = Trainer::new(opts);
    trainer
        .run::<NdArray>(&NdArrayDevice::default())
        .context("Trainer run failed")?;

    Ok(())
}

fn apply_overrides(opts: &mut TrainingOptions, args: &Args) -> Result<()> {
    if let Some(batch_size) = args.batch_size {
        opts.batch_size = batch_size;
    }
    if let Some(ref architecture) = args.architecture {
        opts.architecture = parse_architecture(architecture)?;
    }
    Ok(())
}

fn parse_architecture(name: &str) -> Result<ArchitectureKind> {
    ArchitectureKind::all()
        .into_iter()
        .find(|kind| kind.to_string() == name)
        .with_context(|| {
            let valid: Vec<String> = ArchitectureKind::all()
                .into_iter()
                .map(|kind| kind.to_string())
                .collect();
            format!(
                "Invalid architecture: {}. Valid options: {}",
                name,
                valid.join(", ")
            )
        })
}

fn print_options_summary(opts: &TrainingOptions) {
    info!("");
    info!("Configuration Summary:");
    info!("  Architecture: {}", opts.architecture);
    info!(
        "  Image shape: {}x{}",
        opts.image_shape.width, opts.image_shape.height
    );
    info!("  Classes: {}", opts.output_classes);
    info!(
        "  Head: {} x {} neurones",
        opts.num_fc_layers, opts.fc_neurones
    );
    info!("  Optimiser: {}", opts.optimiser);
    info!("  Loss: {}", opts.loss_function);
    info!("  Batch size: {}", opts.batch_size);
    info!("  Learning rate: {}", opts.learning_rate);
    info!(
        "  Augmentation: hflip={}, vflip={}, rotation={}",
        opts.horizontal_flip, opts.vertical_flip, opts.rotation_angle
    );
    match &opts.training_dir {
        Some(dir) => info!("  Train dir: {}", dir.display()),
        None => info!("  Train dir: (not set)"),
    }
    match &opts.validation_dir {
        Some(dir) => info!("  Val dir: {}", dir.display()),
        None => info!("  Val dir: (not set)"),
    }
    info!("");
}
