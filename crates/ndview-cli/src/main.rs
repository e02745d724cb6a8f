mod commands;
mod dataset;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ndview", about = "Multi-dimensional microscopy image viewer")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show axes, channels and contrast of a dataset
    Info(commands::info::InfoArgs),
    /// Render one view of a dataset to PNG
    Render(commands::render::RenderArgs),
    /// Step through an axis and write one PNG per position
    Animate(commands::animate::AnimateArgs),
    /// Print a default viewer config or display settings file
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Animate(args) => commands::animate::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
