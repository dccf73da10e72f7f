use homeroom_core::connectors::canvas::CanvasConnector;
use homeroom_core::connectors::LmsConnector;
use tracing::{error, info};

use super::load_config;

/// Run the `check` command: verify the token and list the observed students.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let connector = CanvasConnector::new(&config.canvas)?;

    println!("Provider: {}", connector.provider_name());
    println!("Base URL: {}", config.canvas.base_url);

    if let Err(e) = connector.test_connection().await {
        println!("Connection test: FAILED - {e}");
        error!("Canvas connection test failed: {e}");
        anyhow::bail!("connection test failed");
    }
    println!("Connection test: SUCCESS");

    let students = connector.list_students().await?;
    info!(count = students.len(), "Observed students");
    println!();
    println!("Observed students: {}", students.len());
    for student in &students {
        println!("  {} ({})", student.name, student.id);
    }

    Ok(())
}
