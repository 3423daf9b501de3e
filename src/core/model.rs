use serde::{Deserialize, Serialize};

pub type NodeId = String;

/// Metric kinds tracked per node. Used as the cooldown key so battery and
/// temperature alerts for the same node never share a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Battery,
    Temperature,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Self::Battery => "battery",
            Self::Temperature => "temperature",
        }
    }
}

/// A classified inbound event, one per decoded packet.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundEvent {
    TextMessage {
        sender: NodeId,
        body: String,
    },
    BatteryTelemetry {
        sender: NodeId,
        level_percent: f64,
        voltage: Option<f64>,
    },
    EnvironmentTelemetry {
        sender: NodeId,
        temperature_c: f64,
    },
    Position {
        sender: NodeId,
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
        speed: Option<f64>,
        heading: Option<f64>,
    },
    /// Node announcing its user info. Feeds the name directory only.
    NodeInfo {
        sender: NodeId,
        long_name: String,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> &str {
        match self {
            Self::TextMessage { sender, .. }
            | Self::BatteryTelemetry { sender, .. }
            | Self::EnvironmentTelemetry { sender, .. }
            | Self::Position { sender, .. }
            | Self::NodeInfo { sender, .. } => sender,
        }
    }
}

/// An action produced by the engine, dispatcher or scheduler and performed by
/// the action sink. The engine emits at most one per inbound event.
#[derive(Clone, Debug, PartialEq)]
pub enum OutboundAction {
    SendMeshMessage {
        text: String,
        /// None broadcasts to the whole mesh.
        destination: Option<NodeId>,
        /// None uses the configured default channel.
        channel: Option<u32>,
    },
    Record(RecordEvent),
}

/// A structured record destined for the append-only logs. Timestamps are
/// stamped by the recorder at write time.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordEvent {
    Message {
        node: NodeId,
        text: String,
    },
    Battery {
        node: NodeId,
        level_percent: f64,
        voltage: Option<f64>,
    },
    Position {
        node: NodeId,
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
        speed: Option<f64>,
        heading: Option<f64>,
    },
}

impl RecordEvent {
    pub fn node(&self) -> &str {
        match self {
            Self::Message { node, .. } | Self::Battery { node, .. } | Self::Position { node, .. } => {
                node
            }
        }
    }
}
