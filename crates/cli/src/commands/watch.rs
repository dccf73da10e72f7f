use homeroom_core::monitor::HomeworkMonitor;
use homeroom_core::presentation::write_sensor_file;
use homeroom_core::scheduler;
use tracing::{info, warn};

use super::load_config;

/// Run the `watch` command: poll on the configured interval until Ctrl-C.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut monitor = HomeworkMonitor::from_config(&config)?;
    let sensor_path = config.sensor_path();

    info!(
        instance = %config.homeroom.instance_name,
        persistence = !config.tracking.disable_persistence,
        "Watching Canvas for homework changes"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    let cycles = scheduler::run(&mut monitor, config.poll_interval(), shutdown, |monitor, _| {
        if let Some(path) = &sensor_path {
            if let Err(e) = write_sensor_file(path, &monitor.sensors()) {
                warn!("Failed to write sensor file {}: {e}", path.display());
            }
        }
    })
    .await;

    println!("Stopped after {cycles} update cycle(s).");
    Ok(())
}
