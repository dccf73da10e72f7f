use std::collections::BTreeMap;
use std::sync::Arc;

use homeroom_core::connectors::canvas::CanvasConnector;
use homeroom_core::gate::FetchGate;
use homeroom_core::models::Assignment;
use homeroom_core::poller::Poller;

use super::load_config;

/// Run the `pending` command: list assignments not yet turned in, by course.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let connector = CanvasConnector::new(&config.canvas)?;
    let poller = Poller::new(
        Arc::new(connector),
        FetchGate::new(config.canvas.concurrency_limit),
    );

    let pending = poller.poll_pending_assignments().await?;
    if pending.is_empty() {
        println!("Nothing pending.");
        return Ok(());
    }

    println!("Pending assignments: {}", pending.len());
    for (course, assignments) in by_course(&pending) {
        println!();
        println!("{course}");
        for assignment in assignments {
            println!(
                "  {:<40} due {}",
                assignment.name,
                assignment.due_at.as_deref().unwrap_or("-")
            );
        }
    }

    Ok(())
}

/// Group by course name, each group sorted by due date (undated last).
fn by_course(assignments: &[Assignment]) -> BTreeMap<&str, Vec<&Assignment>> {
    let mut grouped: BTreeMap<&str, Vec<&Assignment>> = BTreeMap::new();
    for assignment in assignments {
        grouped
            .entry(assignment.course_name.as_str())
            .or_default()
            .push(assignment);
    }
    for group in grouped.values_mut() {
        group.sort_by(|a, b| match (&a.due_at, &b.due_at) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        });
    }
    grouped
}
