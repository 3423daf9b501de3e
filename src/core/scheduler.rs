// Scheduled broadcasts. One task per rule; each ticks on its own interval
// and hands a broadcast action to the sink.

use std::time::Duration;

use chrono::Local;
use log::{debug, info};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use super::alerts::ScheduledRule;
use super::model::OutboundAction;

/// Runs one broadcast rule until shutdown. The first broadcast fires
/// immediately, then every `interval_seconds` after that.
pub async fn run_broadcaster(
    rule: ScheduledRule,
    actions: mpsc::Sender<OutboundAction>,
    shutdown: watch::Receiver<bool>,
) {
    let period = Duration::from_secs(rule.interval_seconds.max(1));
    run_with_interval(rule, period, actions, shutdown).await;
}

async fn run_with_interval(
    rule: ScheduledRule,
    period: Duration,
    actions: mpsc::Sender<OutboundAction>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    // If ticks were missed (suspend, long stall) resume the cadence instead
    // of firing a burst of stale broadcasts.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    debug!("broadcaster stopping: {}", rule.message);
                    break;
                }
            }
            _ = ticker.tick() => {
                let text = rule.format_message(&Local::now());
                info!("scheduled broadcast: {}", text);
                let action = OutboundAction::SendMeshMessage {
                    text,
                    destination: None,
                    channel: Some(rule.channel),
                };
                if actions.send(action).await.is_err() {
                    break; // sink is gone
                }
            }
        }
    }
}
