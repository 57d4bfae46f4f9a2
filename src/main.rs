use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use chaos_compositor::{
    composition::CompositionEngine,
    config::{Config, Preset},
    input::{self, RequestOverrides, SeedChoice},
    CompositorError,
};

#[derive(Parser)]
#[command(
    name = "chaos-compositor",
    version,
    about = "Generate randomized compilation videos",
    long_about = "Chaos-Compositor samples clips from a folder of videos, trims them, applies random effects, concatenates them and scatters sounds from a folder of audio over the result. The same seed always gives the same video."
)]
struct Cli {
    /// Configuration file (optional, overrides --preset)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in settings to start from (default, chaos)
    #[arg(short, long, default_value_t = Preset::Default)]
    preset: Preset,

    /// Directory containing the source videos
    #[arg(long)]
    video_dir: Option<PathBuf>,

    /// Directory containing the source sounds
    #[arg(long)]
    audio_dir: Option<PathBuf>,

    /// Directory the result is written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Seed, or 'any' to pick one automatically (prompted if omitted)
    #[arg(short, long, value_parser = seed_arg)]
    seed: Option<SeedChoice>,

    /// Number of video clips (prompted if omitted)
    #[arg(short = 'n', long, value_parser = count_arg)]
    count: Option<usize>,

    /// Apply video effects: y/n (prompted if omitted)
    #[arg(short, long, value_parser = effects_arg)]
    effects: Option<bool>,

    /// Print the composition plan as JSON instead of rendering
    #[arg(long)]
    plan_only: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn seed_arg(value: &str) -> std::result::Result<SeedChoice, String> {
    input::parse_seed(value).ok_or_else(|| format!("'{}' is not a seed or 'any'", value))
}

fn count_arg(value: &str) -> std::result::Result<usize, String> {
    input::parse_count(value).ok_or_else(|| format!("'{}' is not a non-negative integer", value))
}

fn effects_arg(value: &str) -> std::result::Result<bool, String> {
    input::parse_effects_toggle(value).ok_or_else(|| format!("'{}' is not y/n", value))
}

fn friendly(error: CompositorError) -> anyhow::Error {
    anyhow::anyhow!(error.user_message())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is kept for prompts and the plan
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Chaos-Compositor v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path).map_err(friendly)?
        }
        None => {
            info!("Using {} preset", cli.preset);
            Config::preset(cli.preset)
        }
    };

    if let Some(dir) = cli.video_dir {
        config.sources.video_dir = dir;
    }
    if let Some(dir) = cli.audio_dir {
        config.sources.audio_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.sources.output_dir = dir;
    }
    config.validate().map_err(friendly)?;

    let overrides = RequestOverrides {
        seed: cli.seed,
        video_count: cli.count,
        effects: cli.effects,
    };
    let request = {
        let stdin = std::io::stdin();
        input::collect_request(&mut stdin.lock(), &mut std::io::stdout(), overrides)
            .map_err(friendly)?
    };

    let engine = CompositionEngine::with_ffmpeg(config);

    if cli.plan_only {
        let plan = engine.plan_only(&request).map_err(friendly)?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let outcome = engine.compose(&request).await.map_err(friendly)?;

    info!("Composition complete! Output saved to: {:?}", outcome.video.path);
    Ok(())
}
