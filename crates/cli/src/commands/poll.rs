use homeroom_core::monitor::{CycleReport, HomeworkMonitor};
use homeroom_core::notify::HomeworkEvent;
use homeroom_core::presentation::{write_sensor_file, SensorState};
use serde_json::json;
use tracing::{info, warn};

use super::load_config;

/// Run the `poll` command: one update cycle, then print sensors and events.
pub async fn run(config_path: &str, as_json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut monitor = HomeworkMonitor::from_config(&config)?;

    let report = monitor.update().await;
    let sensors = monitor.sensors();

    if let Some(path) = config.sensor_path() {
        match write_sensor_file(&path, &sensors) {
            Ok(()) => info!("Wrote sensor states to {}", path.display()),
            Err(e) => warn!("Failed to write sensor file {}: {e}", path.display()),
        }
    }

    if as_json {
        let mut events = Vec::with_capacity(report.events.len());
        for event in &report.events {
            let data = event.payload()?;
            events.push(json!({ "event": event.name(), "data": data }));
        }
        let output = json!({
            "report": report,
            "events": events,
            "sensors": sensors,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&report, &sensors);
    }

    if let Some(message) = &report.error_message {
        anyhow::bail!("update cycle failed: {message}");
    }
    Ok(())
}

fn print_summary(report: &CycleReport, sensors: &[SensorState]) {
    println!("Update cycle: {:?}", report.status);
    println!(
        "  New: {}  Completed: {}  Evicted: {}  Saved: {}",
        report.appeared, report.completed, report.evicted, report.saved
    );
    println!();

    println!("Sensors");
    println!("-------");
    for sensor in sensors {
        println!("{:<24} {}", sensor.name, sensor.state);
    }

    if !report.events.is_empty() {
        println!();
        println!("Events");
        println!("------");
        for event in &report.events {
            println!("{}", describe(event));
        }
    }
}

fn describe(event: &HomeworkEvent) -> String {
    match event {
        HomeworkEvent::Appeared(e) => format!(
            "[new]  {}: {} ({}) due {}",
            e.student_short_name,
            e.assignment_name,
            e.course_name,
            e.due_at.as_deref().unwrap_or("-")
        ),
        HomeworkEvent::Completed(e) => format!(
            "[done] {}: {} ({}) turned in {}",
            e.student_short_name,
            e.assignment_name,
            e.course_name,
            e.submitted_at.as_deref().unwrap_or("-")
        ),
    }
}
