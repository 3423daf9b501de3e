use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::alerts::{Comparator, KeywordRule, ScheduledRule, TemperatureUnit, ThresholdRule};
use super::model::{Metric, NodeId};

/// Application settings: where the bridge lives, the rule set, and the log
/// file locations. Missing fields fall back to the defaults below, so a
/// partial settings.json is fine.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_bridge_addr")]
    pub bridge_addr: String,
    /// Channel used for sends that do not specify one (0 = primary).
    #[serde(default)]
    pub channel_index: u32,
    /// Seed names for nodes that have not sent NodeInfo yet.
    #[serde(default)]
    pub node_names: HashMap<NodeId, String>,
    #[serde(default = "default_keyword_rules")]
    pub keyword_rules: Vec<KeywordRule>,
    #[serde(default = "default_threshold_rules")]
    pub threshold_rules: Vec<ThresholdRule>,
    #[serde(default = "default_broadcasts")]
    pub broadcasts: Vec<ScheduledRule>,
    #[serde(default = "default_message_log")]
    pub message_log: PathBuf,
    #[serde(default = "default_battery_log")]
    pub battery_log: PathBuf,
    #[serde(default = "default_position_log")]
    pub position_log: PathBuf,
}

fn default_bridge_addr() -> String {
    "127.0.0.1:4403".to_string()
}

fn default_keyword_rules() -> Vec<KeywordRule> {
    let replies = [
        ("status", "AUTO-REPLY: Node is online and operational."),
        ("help", "AUTO-REPLY: Commands: status, info, ping"),
        ("info", "AUTO-REPLY: Solar-powered relay node."),
        ("ping", "AUTO-REPLY: Pong!"),
    ];
    replies
        .into_iter()
        .map(|(keyword, response)| KeywordRule {
            keyword: keyword.to_string(),
            response: response.to_string(),
            cooldown_seconds: 60,
        })
        .collect()
}

fn default_threshold_rules() -> Vec<ThresholdRule> {
    vec![
        ThresholdRule {
            metric: Metric::Battery,
            comparator: Comparator::BelowOrEqual,
            threshold: 20.0,
            unit: TemperatureUnit::Celsius,
            cooldown_seconds: 3600,
        },
        // Low before high: a reading breaching both fires the low alert.
        ThresholdRule {
            metric: Metric::Temperature,
            comparator: Comparator::Below,
            threshold: 40.0,
            unit: TemperatureUnit::Fahrenheit,
            cooldown_seconds: 1800,
        },
        ThresholdRule {
            metric: Metric::Temperature,
            comparator: Comparator::Above,
            threshold: 90.0,
            unit: TemperatureUnit::Fahrenheit,
            cooldown_seconds: 1800,
        },
    ]
}

fn default_broadcasts() -> Vec<ScheduledRule> {
    vec![ScheduledRule {
        interval_seconds: 3600,
        message: "Automated check-in at {time}".to_string(),
        channel: 0,
    }]
}

fn default_message_log() -> PathBuf {
    PathBuf::from("meshtastic_messages.log")
}

fn default_battery_log() -> PathBuf {
    PathBuf::from("battery_log.csv")
}

fn default_position_log() -> PathBuf {
    PathBuf::from("positions.csv")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bridge_addr: default_bridge_addr(),
            channel_index: 0,
            node_names: HashMap::new(),
            keyword_rules: default_keyword_rules(),
            threshold_rules: default_threshold_rules(),
            broadcasts: default_broadcasts(),
            message_log: default_message_log(),
            battery_log: default_battery_log(),
            position_log: default_position_log(),
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(app_config_dir: PathBuf) -> Self {
        Self {
            config_path: app_config_dir.join("settings.json"),
        }
    }

    pub fn load(&self) -> Settings {
        if self.config_path.exists() {
            if let Ok(content) = fs::read_to_string(&self.config_path) {
                if let Ok(settings) = serde_json::from_str(&content) {
                    return settings;
                }
            }
        }
        Settings::default()
    }

    pub fn save(&self, settings: &Settings) -> io::Result<()> {
        // Ensure directory exists
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)
    }
}
