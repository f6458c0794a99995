use anyhow::Result;
use clap::Parser;
use tracing::info;

mod config;
mod display;
mod engine;
mod error;
mod player;
mod render;
mod spectrum;
mod surface;
mod viz;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "playvibe")]
#[command(author, version, about = "Track player with a playback-synced bar visualizer")]
struct Args {
    /// Audio files to queue, in play order
    tracks: Vec<std::path::PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Bar weight: higher = wider, fewer bars
    #[arg(long)]
    bar_weight: Option<f32>,

    /// Analysis window size in samples
    #[arg(long)]
    fft_size: Option<usize>,

    /// Start playing the first track immediately
    #[arg(long)]
    autoplay: bool,

    /// Do not advance to the next track when one finishes
    #[arg(long)]
    no_advance: bool,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("playvibe=info".parse()?),
        )
        .init();

    let args = Args::parse();

    if args.init_config {
        let path = Config::init_default_config()?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    // Load or create config
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_from_default_path().unwrap_or_default(),
    };
    if let Some(bar_weight) = args.bar_weight {
        config.visualizer.bar_weight = bar_weight;
    }
    if let Some(fft_size) = args.fft_size {
        config.audio.fft_size = fft_size;
    }
    if args.autoplay {
        config.player.autoplay = true;
    }
    if args.no_advance {
        config.player.advance = false;
    }

    let tracks: Vec<String> = args
        .tracks
        .iter()
        .map(|p| p.display().to_string())
        .collect();

    info!(tracks = tracks.len(), "Starting Playvibe");

    display::terminal::run(config, tracks).await
}
