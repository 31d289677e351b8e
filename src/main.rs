//! Command-line tool for inspecting diffusion backbones.
//!
//! - Writing a default configuration for any backbone kind
//! - Summarizing a configured backbone (input shape, parameter count)
//! - Running a forward pass on random inputs to check shape preservation

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tch::{nn, Device, Kind, Tensor};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use diffusion_backbones::{
    model::{parameter_count, Backbone, BackboneConfig, BackboneKind},
    utils::Config,
};

/// Denoising backbones for diffusion models
#[derive(Parser)]
#[command(name = "backbones")]
#[command(version)]
#[command(about = "Build and inspect denoising backbones for diffusion models")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize default configuration file
    Init {
        /// Output configuration file path
        #[arg(short, long, default_value = "config.json")]
        output: String,

        /// Backbone kind (mlp, temporal-cnn, conditional-temporal-cnn, unet, controlnet)
        #[arg(short, long, default_value = "temporal-cnn")]
        kind: BackboneKind,
    },

    /// Build the configured backbone and report its layout
    Summary,

    /// Run one forward pass on random inputs and verify the output shape
    Check {
        /// Override the configured batch size
        #[arg(short, long)]
        batch_size: Option<i64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbosity.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { output, kind } => {
            info!("Creating default {} configuration...", kind);
            let config = Config::with_backbone(BackboneConfig::default_for(kind));
            config.to_file(&output)?;
            info!("Configuration saved to: {}", output);
        }
        Commands::Summary => {
            let config = Config::from_file(&cli.config)?;
            summary(&config)?;
        }
        Commands::Check { batch_size } => {
            let config = Config::from_file(&cli.config)?;
            let batch_size = batch_size.unwrap_or(config.batch_size);
            if batch_size < 1 {
                bail!("batch size must be at least 1, got {}", batch_size);
            }
            check(&config, batch_size)?;
        }
    }

    Ok(())
}

fn summary(config: &Config) -> Result<()> {
    let device = config.device.to_device();
    let vs = nn::VarStore::new(device);
    let backbone = config.backbone.build(&vs.root())?;

    info!("Kind:             {}", backbone.kind());
    info!("Device:           {:?}", device);
    info!("Sample shape:     {:?}", backbone.input_shape());
    match backbone.cond_dim() {
        Some(cond_dim) => info!("Conditioning dim: {}", cond_dim),
        None => info!("Conditioning dim: none"),
    }
    info!("Parameters:       {}", parameter_count(&vs));

    Ok(())
}

fn check(config: &Config, batch_size: i64) -> Result<()> {
    let device = config.device.to_device();
    let vs = nn::VarStore::new(device);
    let backbone = config.backbone.build(&vs.root())?;

    let (x, t, cond) = random_inputs(backbone.as_ref(), batch_size, device);
    info!(
        "Running {} on x {:?}, t {:?}{}",
        backbone.kind(),
        x.size(),
        t.size(),
        cond.as_ref()
            .map(|c| format!(", c {:?}", c.size()))
            .unwrap_or_default()
    );

    let output = tch::no_grad(|| backbone.forward(&x, &t, cond.as_ref()))?;
    if output.size() != x.size() {
        bail!(
            "{} changed the shape: input {:?}, output {:?}",
            backbone.kind(),
            x.size(),
            output.size()
        );
    }

    info!("Output shape {:?} matches input", output.size());
    Ok(())
}

fn random_inputs(
    backbone: &dyn Backbone,
    batch_size: i64,
    device: Device,
) -> (Tensor, Tensor, Option<Tensor>) {
    let mut shape = vec![batch_size];
    shape.extend(backbone.input_shape());

    let x = Tensor::randn(shape.as_slice(), (Kind::Float, device));
    let t = Tensor::rand([batch_size], (Kind::Float, device));
    let cond = backbone
        .cond_dim()
        .map(|cond_dim| Tensor::randn([batch_size, cond_dim], (Kind::Float, device)));

    (x, t, cond)
}
