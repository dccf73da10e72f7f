pub mod check;
pub mod init;
pub mod pending;
pub mod poll;
pub mod status;
pub mod watch;

use std::path::Path;

use anyhow::Context;
use homeroom_core::config::HomeroomConfig;
use tracing::info;

/// Load and validate the configuration file.
pub fn load_config(config_path: &str) -> anyhow::Result<HomeroomConfig> {
    let config = HomeroomConfig::load(Path::new(config_path))
        .with_context(|| format!("Failed to load configuration from {config_path}"))?;
    config.validate()?;
    info!("Loaded configuration from {}", config_path);
    Ok(config)
}
