use anyhow::Context;
use buildfleet_cloud::synthesize;
use buildfleet_core::{Deployment, Platform, parse_deployment_file, resolve};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "buildfleet")]
#[command(version)]
#[command(
    about = "Declare CI build-agent fleets and synthesize them for provisioning",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the deployment manifest and controller configuration
    Synth {
        /// Deployment file (searched for when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "dist")]
        out: PathBuf,
    },
    /// Parse and resolve the deployment without writing anything
    Validate {
        /// Deployment file (searched for when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the resolved fleet descriptors
    Fleets {
        /// Deployment file (searched for when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Synth { config, out } => synth(config, &out),
        Commands::Validate { config } => validate(config),
        Commands::Fleets { config } => fleets(config),
    }
}

fn load_deployment(config: Option<PathBuf>) -> anyhow::Result<Deployment> {
    let path = match config {
        Some(path) => path,
        None => buildfleet_config::find_fleet_file()?,
    };

    debug!(path = %path.display(), "loading deployment file");
    let deployment = parse_deployment_file(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    Ok(deployment)
}

fn synth(config: Option<PathBuf>, out: &PathBuf) -> anyhow::Result<()> {
    let deployment = load_deployment(config)?;
    let synthesis = synthesize(&deployment)?;

    fs::create_dir_all(out)
        .with_context(|| format!("failed to create output directory {}", out.display()))?;

    let manifest_path = out.join("manifest.json");
    synthesis.manifest.write_to(&manifest_path)?;

    let payload_path = out.join(format!("controller.{}.yaml", deployment.name));
    fs::write(&payload_path, &synthesis.controller_config)
        .with_context(|| format!("failed to write {}", payload_path.display()))?;

    println!(
        "{} synthesized {} resources for '{}'",
        "✓".green().bold(),
        synthesis.manifest.resources.len(),
        deployment.name.cyan()
    );
    println!("  {}", manifest_path.display());
    println!("  {}", payload_path.display());

    for descriptor in &synthesis.fleets {
        let Some(user_data) = synthesis.user_data.get(&descriptor.name) else {
            continue;
        };
        let extension = match descriptor.platform {
            Platform::Linux => "sh",
            Platform::Windows => "yaml",
        };
        let script_path = out.join(format!("user-data.{}.{extension}", descriptor.name));
        fs::write(&script_path, user_data)
            .with_context(|| format!("failed to write {}", script_path.display()))?;
        println!("  {}", script_path.display());
    }

    Ok(())
}

fn validate(config: Option<PathBuf>) -> anyhow::Result<()> {
    let deployment = load_deployment(config)?;
    let synthesis = synthesize(&deployment)?;

    println!(
        "{} deployment '{}' is valid ({} fleets, {} desktops, {} resources)",
        "✓".green().bold(),
        deployment.name.cyan(),
        synthesis.fleets.len(),
        deployment.desktops.len(),
        synthesis.manifest.resources.len()
    );

    Ok(())
}

fn fleets(config: Option<PathBuf>) -> anyhow::Result<()> {
    let deployment = load_deployment(config)?;

    if deployment.fleets.is_empty() {
        println!("no fleets declared in '{}'", deployment.name);
        return Ok(());
    }

    for request in &deployment.fleets {
        let descriptor = resolve(&deployment.name, request)?;

        println!(
            "{} ({}, label {})",
            descriptor.name.cyan().bold(),
            descriptor.platform,
            descriptor.label
        );
        println!(
            "  capacity: {}-{}  executors per node: {}",
            descriptor.min_capacity, descriptor.max_capacity, descriptor.executors
        );
        println!("  instance types: {}", descriptor.instance_types.join(", "));
        println!("  image: {}", descriptor.image_id);
        println!(
            "  root volume: {} GiB  fs root: {}",
            descriptor.root_volume_gb, descriptor.fs_root
        );
        println!(
            "  placements: {}",
            descriptor
                .placements
                .iter()
                .map(|p| p.availability_zone.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        if let Some(volume) = &descriptor.data_volume {
            println!(
                "  data volume: {} GiB ({} pool volumes tagged {})",
                volume.size_gb,
                descriptor.volume_pool.len(),
                descriptor.kind_tag
            );
        }
    }

    Ok(())
}
