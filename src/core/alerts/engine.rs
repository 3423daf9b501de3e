// Alert engine - evaluates rules per inbound event and manages cooldowns.
//
// The engine owns the node state store outright. It is driven from a single
// dispatch loop, so per-node read-then-write of cooldown timestamps is
// serialized by construction. It never fails the caller: anything it cannot
// handle classifies as "no action".

use std::time::{Duration, Instant};

use log::info;

use super::model::{KeywordRule, ThresholdRule};
use crate::core::model::{InboundEvent, Metric, OutboundAction, RecordEvent};
use crate::core::state::NodeStateStore;

pub struct AlertEngine {
    keyword_rules: Vec<KeywordRule>,
    threshold_rules: Vec<ThresholdRule>,
    store: NodeStateStore,
}

impl AlertEngine {
    pub fn new(keyword_rules: Vec<KeywordRule>, threshold_rules: Vec<ThresholdRule>) -> Self {
        Self {
            keyword_rules,
            threshold_rules,
            store: NodeStateStore::new(),
        }
    }

    /// Read access to per-node state for inspection.
    pub fn store(&self) -> &NodeStateStore {
        &self.store
    }

    /// Produces at most one outbound action for the event. State mutations
    /// (cooldown timestamps, last readings) are applied before the action is
    /// returned, so a sink failure downstream never rolls them back.
    pub fn handle(&mut self, event: &InboundEvent) -> Option<OutboundAction> {
        self.handle_at(event, Instant::now())
    }

    /// Same as [`handle`](Self::handle) with an explicit clock, for
    /// deterministic tests.
    pub fn handle_at(&mut self, event: &InboundEvent, now: Instant) -> Option<OutboundAction> {
        match event {
            InboundEvent::TextMessage { sender, body } => self.handle_text(sender, body, now),
            InboundEvent::BatteryTelemetry {
                sender,
                level_percent,
                ..
            } => self.handle_metric(sender, Metric::Battery, *level_percent, now),
            InboundEvent::EnvironmentTelemetry {
                sender,
                temperature_c,
            } => self.handle_metric(sender, Metric::Temperature, *temperature_c, now),
            InboundEvent::Position {
                sender,
                latitude,
                longitude,
                altitude,
                speed,
                heading,
            } => Some(OutboundAction::Record(RecordEvent::Position {
                node: sender.clone(),
                latitude: *latitude,
                longitude: *longitude,
                altitude: *altitude,
                speed: *speed,
                heading: *heading,
            })),
            InboundEvent::NodeInfo { .. } => None,
        }
    }

    /// First keyword rule whose trigger is a case-insensitive substring of the
    /// message wins; later rules are not considered for this event. The
    /// per-sender response cooldown suppresses without touching state.
    fn handle_text(&mut self, sender: &str, body: &str, now: Instant) -> Option<OutboundAction> {
        let needle = body.trim().to_lowercase();
        let rule = self
            .keyword_rules
            .iter()
            .find(|rule| needle.contains(&rule.keyword.to_lowercase()))?;

        let state = self.store.entry(sender);
        if let Some(last) = state.last_response {
            if now.duration_since(last) < Duration::from_secs(rule.cooldown_seconds) {
                info!("cooldown active for {}, not responding", sender);
                return None;
            }
        }

        state.last_response = Some(now);
        info!(">>> responding to '{}' from {}", rule.keyword, sender);
        Some(OutboundAction::SendMeshMessage {
            text: rule.response.clone(),
            destination: Some(sender.to_string()),
            channel: None,
        })
    }

    /// Threshold rules for the matching metric run in declared order (low
    /// before high in the default config); the first crossing is the only
    /// candidate, gated by the per-(node, metric) cooldown. The last observed
    /// reading is retained whether or not anything fires.
    fn handle_metric(
        &mut self,
        sender: &str,
        metric: Metric,
        observed: f64,
        now: Instant,
    ) -> Option<OutboundAction> {
        let state = self.store.entry(sender);
        state.last_metric.insert(metric, observed);

        for rule in &self.threshold_rules {
            if rule.metric != metric {
                continue;
            }
            let value = match metric {
                Metric::Temperature => rule.unit.from_celsius(observed),
                Metric::Battery => observed,
            };
            if !rule.comparator.crossed(value, rule.threshold) {
                continue;
            }

            if let Some(last) = state.last_alert.get(&metric) {
                if now.duration_since(*last) < Duration::from_secs(rule.cooldown_seconds) {
                    info!(
                        "cooldown active for {} {} alert, suppressed",
                        sender,
                        metric.name()
                    );
                    return None;
                }
            }

            state.last_alert.insert(metric, now);
            let text = rule.alert_text(sender, value);
            info!(">>> ALERT: {}", text);
            return Some(OutboundAction::SendMeshMessage {
                text,
                destination: None,
                channel: None,
            });
        }
        None
    }
}
