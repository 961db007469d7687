//! Init and Config commands.

use anyhow::{Context, Result};

use crate::config::Settings;

/// Run init command - create configuration file in the current directory.
pub fn run_init(force: bool) -> Result<()> {
    let current_dir = std::env::current_dir().context("cannot determine current directory")?;

    let path = Settings::init_config_file(&current_dir, force)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if force {
        println!("Wrote configuration file at: {}", path.display());
    } else {
        println!("Created configuration file at: {}", path.display());
    }
    println!("Put PDFs in ./documents and edit the file to customize your settings.");
    Ok(())
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) -> Result<()> {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    println!("{}", config.to_toml().context("failed to render settings")?);
    Ok(())
}
