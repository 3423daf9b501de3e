// Rule configuration types. Static during execution, read from settings.json.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::core::model::Metric;

/// Auto-reply rule: a case-insensitive substring trigger and its response.
/// Rules are evaluated in declared order; the first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub response: String,
    /// Per-sender response cooldown in seconds (default: 60)
    #[serde(default = "default_response_cooldown")]
    pub cooldown_seconds: u64,
}

fn default_response_cooldown() -> u64 {
    60
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Below,
    BelowOrEqual,
    Above,
}

impl Comparator {
    pub fn crossed(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Below => value < threshold,
            Self::BelowOrEqual => value <= threshold,
            Self::Above => value > threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Converts an observed Celsius reading into this unit.
    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius_to_fahrenheit(celsius),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Telemetry threshold rule. Thresholds are expressed in `unit`; observed
/// readings (always Celsius on the wire for temperature) are converted before
/// comparison. `unit` is ignored for battery rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub metric: Metric,
    pub comparator: Comparator,
    pub threshold: f64,
    #[serde(default)]
    pub unit: TemperatureUnit,
    /// Per-(node, metric) alert cooldown in seconds (default: 3600)
    #[serde(default = "default_alert_cooldown")]
    pub cooldown_seconds: u64,
}

fn default_alert_cooldown() -> u64 {
    3600
}

impl ThresholdRule {
    /// Broadcast text for a crossing. `observed` is already in rule units.
    pub fn alert_text(&self, node: &str, observed: f64) -> String {
        match self.metric {
            Metric::Battery => format!("LOW BATTERY: {} at {:.0}%", node, observed),
            Metric::Temperature => {
                let sym = self.unit.symbol();
                match self.comparator {
                    Comparator::Below | Comparator::BelowOrEqual => format!(
                        "LOW TEMP ALERT: {:.1}\u{b0}{} (below {:.0}\u{b0}{})",
                        observed, sym, self.threshold, sym
                    ),
                    Comparator::Above => format!(
                        "HIGH TEMP ALERT: {:.1}\u{b0}{} (above {:.0}\u{b0}{})",
                        observed, sym, self.threshold, sym
                    ),
                }
            }
        }
    }
}

/// Periodic broadcast configuration. The message template supports a `{time}`
/// token replaced with the local HH:MM at send time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledRule {
    pub interval_seconds: u64,
    pub message: String,
    /// Channel to broadcast on (0 = primary)
    #[serde(default)]
    pub channel: u32,
}

impl ScheduledRule {
    pub fn format_message(&self, now: &DateTime<Local>) -> String {
        self.message
            .replace("{time}", &now.format("%H:%M").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparator_semantics() {
        assert!(Comparator::Below.crossed(39.9, 40.0));
        assert!(!Comparator::Below.crossed(40.0, 40.0));
        assert!(Comparator::BelowOrEqual.crossed(20.0, 20.0));
        assert!(!Comparator::BelowOrEqual.crossed(21.0, 20.0));
        assert!(Comparator::Above.crossed(90.1, 90.0));
        assert!(!Comparator::Above.crossed(90.0, 90.0));
    }

    #[test]
    fn test_temperature_round_trip() {
        for threshold in [-40.0, 0.0, 40.0, 90.0, 451.0] {
            let back = celsius_to_fahrenheit(fahrenheit_to_celsius(threshold));
            assert!((back - threshold).abs() < 1e-9);
        }
    }

    #[test]
    fn test_known_conversions() {
        assert!((celsius_to_fahrenheit(0.0) - 32.0).abs() < 1e-9);
        assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < 1e-9);
        assert!((fahrenheit_to_celsius(-40.0) - -40.0).abs() < 1e-9);
    }

    #[test]
    fn test_alert_text_formats() {
        let battery = ThresholdRule {
            metric: Metric::Battery,
            comparator: Comparator::BelowOrEqual,
            threshold: 20.0,
            unit: TemperatureUnit::Celsius,
            cooldown_seconds: 3600,
        };
        assert_eq!(battery.alert_text("!a", 15.0), "LOW BATTERY: !a at 15%");

        let cold = ThresholdRule {
            metric: Metric::Temperature,
            comparator: Comparator::Below,
            threshold: 40.0,
            unit: TemperatureUnit::Fahrenheit,
            cooldown_seconds: 1800,
        };
        assert_eq!(
            cold.alert_text("!shed", 38.3),
            "LOW TEMP ALERT: 38.3\u{b0}F (below 40\u{b0}F)"
        );
    }

    #[test]
    fn test_scheduled_message_time_token() {
        let rule = ScheduledRule {
            interval_seconds: 3600,
            message: "Automated check-in at {time}".to_string(),
            channel: 0,
        };
        let text = rule.format_message(&Local::now());
        assert!(text.starts_with("Automated check-in at "));
        assert!(!text.contains("{time}"));

        let plain = ScheduledRule {
            interval_seconds: 60,
            message: "heartbeat".to_string(),
            channel: 0,
        };
        assert_eq!(plain.format_message(&Local::now()), "heartbeat");
    }

    #[test]
    fn test_rule_defaults_from_json() {
        let keyword: KeywordRule =
            serde_json::from_str(r#"{"keyword":"ping","response":"Pong!"}"#).unwrap();
        assert_eq!(keyword.cooldown_seconds, 60);

        let threshold: ThresholdRule = serde_json::from_str(
            r#"{"metric":"battery","comparator":"below_or_equal","threshold":20.0}"#,
        )
        .unwrap();
        assert_eq!(threshold.cooldown_seconds, 3600);
        assert_eq!(threshold.unit, TemperatureUnit::Celsius);
    }
}
