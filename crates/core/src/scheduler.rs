//! Fixed-interval driver for [`HomeworkMonitor`].

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::monitor::{CycleReport, HomeworkMonitor};

/// Run update cycles every `every` until `shutdown` resolves.
///
/// The first cycle starts immediately. A cycle always runs to completion
/// before the next tick is awaited, and a slow cycle pushes later ticks
/// back instead of bunching them up. `on_cycle` sees the monitor and the
/// report after each cycle. Returns the number of cycles run.
pub async fn run<S, C>(
    monitor: &mut HomeworkMonitor,
    every: Duration,
    shutdown: S,
    mut on_cycle: C,
) -> usize
where
    S: Future<Output = ()>,
    C: FnMut(&HomeworkMonitor, &CycleReport),
{
    let mut ticker = interval(every.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!(interval_secs = every.as_secs(), "Homework monitor started");

    let mut cycles = 0;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!(cycles, "Shutdown requested, stopping homework monitor");
                break;
            }
            _ = ticker.tick() => {}
        }

        let report = monitor.update().await;
        cycles += 1;
        on_cycle(monitor, &report);
    }
    cycles
}
