use homeroom_core::store::JsonFileStore;
use homeroom_core::tracker::TrackingMemory;

use super::load_config;

/// Run the `status` command: show what the saved tracking state knows.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    println!("Homeroom Status");
    println!("===============");
    println!("Instance: {}", config.homeroom.instance_name);
    println!("Canvas:   {}", config.canvas.base_url);
    println!(
        "Interval: {} min",
        config.tracking.poll_interval_minutes
    );

    if config.tracking.disable_persistence {
        println!();
        println!("Persistence is disabled; tracking state only lives in a running `watch`.");
        return Ok(());
    }

    let state_path = config.state_path();
    println!("State:    {}", state_path.display());
    println!();

    match JsonFileStore::read(&state_path)? {
        Some(state) => {
            let last_saved = state.last_saved.clone();
            let memory = TrackingMemory::from_stored(state);
            println!("Last saved: {}", display_or_dash(&last_saved));
            println!();
            print!("{}", render_table(&memory));
        }
        None => println!("No saved state yet. Run `homeroom poll` or `homeroom watch` first."),
    }

    Ok(())
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn render_table(memory: &TrackingMemory) -> String {
    let mut out = format!(
        "{:<24} {:>6} {:>10} {:>8}\n",
        "Student", "Known", "Completed", "Pending"
    );
    for summary in memory.summaries().values() {
        out.push_str(&format!(
            "{:<24} {:>6} {:>10} {:>8}\n",
            summary.name,
            summary.known_assignments,
            summary.completed_assignments,
            summary.pending_assignments
        ));
    }
    out.push_str(&format!(
        "{:<24} {:>6} {:>10} {:>8}\n",
        "Total",
        memory.total_known(),
        memory.total_completed(),
        memory.total_pending()
    ));
    out
}
