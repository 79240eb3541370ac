use crate::CorrelationTable;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Periodically expires overdue rows, independently of the I/O path and of
/// whether anybody is awaiting them. Stops once the table is dropped.
pub fn spawn_deadline_sweeper(table: Weak<CorrelationTable>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(table) = table.upgrade() else {
                break;
            };

            let expired = table.sweep_expired(Instant::now());
            if expired > 0 {
                tracing::warn!("Expired {} overdue request(s)", expired);
            }
        }
    })
}
