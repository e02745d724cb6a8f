use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ndview_core::config::ViewerConfig;
use ndview_core::viewer::DisplaySettings;

use crate::dataset::DEMO_CHANNELS;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print display settings (for `--settings`) instead of a viewer config
    #[arg(long)]
    pub settings: bool,
}

/// Print or save a full default ViewerConfig, or DisplaySettings for the
/// demo channels, as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let toml_str = if args.settings {
        let mut settings = DisplaySettings::default();
        for channel in DEMO_CHANNELS {
            settings.ensure_channel(channel);
        }
        toml::to_string_pretty(&settings)?
    } else {
        toml::to_string_pretty(&ViewerConfig::default())?
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
