// Event dispatcher. Single owner of the alert engine and the only writer to
// the node directory: every classified event flows through `process` in
// arrival order, which is what makes the engine's read-then-write of cooldown
// state safe without locks around it.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use log::info;

use super::alerts::AlertEngine;
use super::directory::NodeDirectory;
use super::model::{InboundEvent, OutboundAction, RecordEvent};

pub struct Dispatcher {
    engine: AlertEngine,
    directory: Arc<RwLock<NodeDirectory>>,
}

impl Dispatcher {
    pub fn new(engine: AlertEngine, directory: Arc<RwLock<NodeDirectory>>) -> Self {
        Self { engine, directory }
    }

    /// Turns one inbound event into the actions it warrants: bookkeeping
    /// records first, then whatever the engine decides (at most one).
    pub fn process(&mut self, event: &InboundEvent) -> Vec<OutboundAction> {
        self.process_at(event, Instant::now())
    }

    pub fn process_at(&mut self, event: &InboundEvent, now: Instant) -> Vec<OutboundAction> {
        let mut actions = Vec::new();

        match event {
            InboundEvent::TextMessage { sender, body } => {
                let name = self.resolve(sender);
                info!("{}: {}", name, body);
                actions.push(OutboundAction::Record(RecordEvent::Message {
                    node: sender.clone(),
                    text: body.clone(),
                }));
            }
            InboundEvent::BatteryTelemetry {
                sender,
                level_percent,
                voltage,
            } => {
                info!("{}: battery {:.0}%", self.resolve(sender), level_percent);
                actions.push(OutboundAction::Record(RecordEvent::Battery {
                    node: sender.clone(),
                    level_percent: *level_percent,
                    voltage: *voltage,
                }));
            }
            InboundEvent::EnvironmentTelemetry {
                sender,
                temperature_c,
            } => {
                info!("{}: {:.1}\u{b0}C", self.resolve(sender), temperature_c);
            }
            InboundEvent::Position {
                sender,
                latitude,
                longitude,
                ..
            } => {
                info!(
                    "{}: position {:.5}, {:.5}",
                    self.resolve(sender),
                    latitude,
                    longitude
                );
            }
            InboundEvent::NodeInfo { sender, long_name } => {
                info!("node info: {} is '{}'", sender, long_name);
                self.directory.write().unwrap().insert(sender, long_name);
            }
        }

        actions.extend(self.engine.handle_at(event, now));
        actions
    }

    fn resolve(&self, id: &str) -> String {
        self.directory.read().unwrap().resolve(id).to_string()
    }
}
