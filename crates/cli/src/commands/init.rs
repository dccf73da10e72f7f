use std::path::Path;

use homeroom_core::config::HomeroomConfig;
use tracing::info;

/// Run the `init` command: create the data directory and write a default config.
pub async fn run(data_dir: &str) -> anyhow::Result<()> {
    let data_path = Path::new(data_dir);

    if !data_path.exists() {
        std::fs::create_dir_all(data_path)?;
        info!("Created data directory: {}", data_dir);
    }

    let config_path = data_path.join("homeroom.toml");
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists; remove it first to generate a new one",
            config_path.display()
        );
    }

    let mut config = HomeroomConfig::generate_default();
    config.homeroom.data_dir = data_dir.to_string();
    config.tracking.sensor_file = Some(
        data_path
            .join("sensors.json")
            .to_string_lossy()
            .to_string(),
    );

    let toml_str = toml::to_string_pretty(&config)?;
    std::fs::write(&config_path, &toml_str)?;
    info!("Wrote configuration to {}", config_path.display());

    println!("Homeroom initialized successfully!");
    println!("  Data directory: {}", data_dir);
    println!("  Configuration:  {}", config_path.display());
    println!("  State file:     {}", config.state_path().display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit {} and set your Canvas URL and observer token",
        config_path.display()
    );
    println!(
        "  2. Run `homeroom --config {} check` to test the connection",
        config_path.display()
    );
    println!("  3. Run `homeroom --config {} watch`", config_path.display());

    Ok(())
}
