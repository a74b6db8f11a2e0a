use std::time::Duration;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use crate::collector::{Collector, RunOutcome};

/// Time left until the next full hour, never zero.
pub fn until_next_hour(now: DateTime<Utc>) -> Duration {
    let hour = TimeDelta::hours(1);
    let next = now
        .duration_trunc(hour)
        .map(|start| start + hour)
        .unwrap_or(now + hour);
    (next - now).to_std().unwrap_or(Duration::from_secs(3600))
}

fn spawn_run(trigger: &'static str, collector: Collector) {
    tokio::spawn(async move {
        match collector.run_once().await {
            RunOutcome::Completed(summary) => log::debug!(
                "{trigger} run stored {} of {} rates at {} (fallback timestamp: {})",
                summary.persisted,
                summary.attempted,
                summary.timestamp,
                summary.timestamp_fallback
            ),
            RunOutcome::Aborted(e) => log::debug!("{trigger} run aborted: {e}"),
        }
    });
}

/// Starts a run right away and one more at the top of every hour.
///
/// Each run is its own task, so a stalled run never holds back the timer.
pub fn start(collector: Collector) {
    spawn_run("startup", collector.clone());

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(until_next_hour(Utc::now())).await;
            spawn_run("hourly", collector.clone());
        }
    });
}
