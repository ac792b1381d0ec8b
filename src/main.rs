use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

use clusterglow::{AppError, Config};

/// Particle clustering animation
#[derive(Parser)]
#[command(name = "clusterglow")]
#[command(version)]
#[command(about = "Points drift into glowing clusters, scatter, and regroup")]
struct Cli {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Do not animate; show the background only
    #[arg(long)]
    reduced_motion: bool,

    /// Initial number of points
    #[arg(long)]
    points: Option<usize>,

    /// Number of clusters
    #[arg(long)]
    clusters: Option<usize>,

    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn reduced_motion_from_env() -> bool {
    std::env::var("CLUSTERGLOW_REDUCED_MOTION").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn build_config(cli: &Cli) -> Result<Config, AppError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(points) = cli.points {
        config.point_count = points;
    }
    if let Some(clusters) = cli.clusters {
        config.cluster_count = clusters;
    }
    if cli.reduced_motion || reduced_motion_from_env() {
        config.reduced_motion = true;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let result = build_config(&cli).and_then(clusterglow::run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
