// Classifies decoded bridge packets into typed inbound events.
//
// Packets arrive as JSON objects shaped like the radio bridge's decoded
// output: {"fromId": "...", "decoded": {"portnum": "...", ...}}. Anything
// unrecognized or incomplete classifies to None and is dropped silently.

use serde_json::Value;

use super::model::InboundEvent;

/// A decoded packet as delivered by the radio bridge.
pub type RawPacket = Value;

pub fn classify(packet: &RawPacket) -> Option<InboundEvent> {
    let decoded = packet.get("decoded")?;
    let sender = packet
        .get("fromId")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    match decoded.get("portnum").and_then(Value::as_str)? {
        "TEXT_MESSAGE_APP" => {
            let body = decode_text(decoded.get("payload")?)?;
            Some(InboundEvent::TextMessage { sender, body })
        }
        "TELEMETRY_APP" => classify_telemetry(sender, decoded.get("telemetry")?),
        "POSITION_APP" => classify_position(sender, decoded.get("position")?),
        "NODEINFO_APP" => {
            let long_name = decoded
                .get("user")?
                .get("longName")
                .and_then(Value::as_str)?
                .to_string();
            Some(InboundEvent::NodeInfo { sender, long_name })
        }
        _ => None,
    }
}

/// Text payloads may be a JSON string or a raw byte array. Byte arrays are
/// decoded lossily: invalid UTF-8 sequences become replacement characters.
fn decode_text(payload: &Value) -> Option<String> {
    match payload {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let mut bytes = Vec::with_capacity(items.len());
            for item in items {
                bytes.push(item.as_u64()? as u8);
            }
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => None,
    }
}

fn classify_telemetry(sender: String, telemetry: &Value) -> Option<InboundEvent> {
    if let Some(device) = telemetry.get("deviceMetrics") {
        if let Some(level_percent) = device.get("batteryLevel").and_then(Value::as_f64) {
            let voltage = device.get("voltage").and_then(Value::as_f64);
            return Some(InboundEvent::BatteryTelemetry {
                sender,
                level_percent,
                voltage,
            });
        }
    }
    let temperature_c = telemetry
        .get("environmentMetrics")?
        .get("temperature")
        .and_then(Value::as_f64)?;
    Some(InboundEvent::EnvironmentTelemetry {
        sender,
        temperature_c,
    })
}

fn classify_position(sender: String, position: &Value) -> Option<InboundEvent> {
    let latitude = coordinate(position, "latitude", "latitudeI")?;
    let longitude = coordinate(position, "longitude", "longitudeI")?;

    Some(InboundEvent::Position {
        sender,
        latitude,
        longitude,
        altitude: position.get("altitude").and_then(Value::as_f64),
        speed: position.get("groundSpeed").and_then(Value::as_f64),
        heading: position.get("groundTrack").and_then(Value::as_f64),
    })
}

/// Coordinates arrive either as decimal degrees or as a fixed-point integer
/// scaled by 1e7. Scale is detected by magnitude: no decimal coordinate can
/// exceed 180. Fixed-point values inside ±180 are indistinguishable from
/// decimal degrees and pass through unscaled.
fn coordinate(position: &Value, direct: &str, fixed: &str) -> Option<f64> {
    let raw = position
        .get(direct)
        .and_then(Value::as_f64)
        .or_else(|| position.get(fixed).and_then(Value::as_f64))?;
    if raw.abs() > 180.0 {
        Some(raw / 1e7)
    } else {
        Some(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_message_from_string_payload() {
        let packet = json!({
            "fromId": "!a1b2c3d4",
            "decoded": { "portnum": "TEXT_MESSAGE_APP", "payload": "Status?" }
        });
        assert_eq!(
            classify(&packet),
            Some(InboundEvent::TextMessage {
                sender: "!a1b2c3d4".to_string(),
                body: "Status?".to_string(),
            })
        );
    }

    #[test]
    fn test_text_message_from_bytes_replaces_invalid_utf8() {
        // "hi" followed by a lone continuation byte
        let packet = json!({
            "fromId": "!a",
            "decoded": { "portnum": "TEXT_MESSAGE_APP", "payload": [104, 105, 0x80] }
        });
        match classify(&packet) {
            Some(InboundEvent::TextMessage { body, .. }) => {
                assert_eq!(body, "hi\u{FFFD}");
            }
            other => panic!("expected text message, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_sender_defaults_to_unknown() {
        let packet = json!({
            "decoded": { "portnum": "TEXT_MESSAGE_APP", "payload": "hey" }
        });
        assert_eq!(classify(&packet).unwrap().sender(), "unknown");
    }

    #[test]
    fn test_malformed_packets_are_dropped() {
        let cases = vec![
            json!({}),
            json!({ "fromId": "!a" }),
            json!({ "fromId": "!a", "decoded": {} }),
            json!({ "fromId": "!a", "decoded": { "portnum": "ADMIN_APP" } }),
            // text with no payload
            json!({ "fromId": "!a", "decoded": { "portnum": "TEXT_MESSAGE_APP" } }),
            // telemetry with neither battery nor temperature
            json!({ "fromId": "!a", "decoded": { "portnum": "TELEMETRY_APP", "telemetry": {} } }),
            // position missing longitude
            json!({ "fromId": "!a", "decoded": {
                "portnum": "POSITION_APP", "position": { "latitude": 45.0 } } }),
            // nodeinfo without a long name
            json!({ "fromId": "!a", "decoded": { "portnum": "NODEINFO_APP", "user": {} } }),
        ];
        for packet in cases {
            assert_eq!(classify(&packet), None, "should drop {}", packet);
        }
    }

    #[test]
    fn test_battery_telemetry() {
        let packet = json!({
            "fromId": "!solar1",
            "decoded": { "portnum": "TELEMETRY_APP", "telemetry": {
                "deviceMetrics": { "batteryLevel": 87, "voltage": 4.01 }
            } }
        });
        assert_eq!(
            classify(&packet),
            Some(InboundEvent::BatteryTelemetry {
                sender: "!solar1".to_string(),
                level_percent: 87.0,
                voltage: Some(4.01),
            })
        );
    }

    #[test]
    fn test_environment_telemetry() {
        let packet = json!({
            "fromId": "!shed",
            "decoded": { "portnum": "TELEMETRY_APP", "telemetry": {
                "environmentMetrics": { "temperature": 3.5 }
            } }
        });
        assert_eq!(
            classify(&packet),
            Some(InboundEvent::EnvironmentTelemetry {
                sender: "!shed".to_string(),
                temperature_c: 3.5,
            })
        );
    }

    #[test]
    fn test_position_fixed_point_and_decimal_normalize_identically() {
        let decimal = json!({
            "fromId": "!gps",
            "decoded": { "portnum": "POSITION_APP", "position": {
                "latitude": 47.606_2, "longitude": -122.332_1, "altitude": 56
            } }
        });
        let fixed = json!({
            "fromId": "!gps",
            "decoded": { "portnum": "POSITION_APP", "position": {
                "latitudeI": 476_062_000i64, "longitudeI": -1_223_321_000i64, "altitude": 56
            } }
        });
        let a = classify(&decimal).unwrap();
        let b = classify(&fixed).unwrap();
        match (&a, &b) {
            (
                InboundEvent::Position {
                    latitude: la,
                    longitude: lo,
                    ..
                },
                InboundEvent::Position {
                    latitude: lb,
                    longitude: lg,
                    ..
                },
            ) => {
                assert!((la - lb).abs() < 1e-9);
                assert!((lo - lg).abs() < 1e-9);
            }
            _ => panic!("expected positions"),
        }
        // Feeding the same packet twice yields identical events.
        assert_eq!(classify(&fixed), classify(&fixed));
    }

    #[test]
    fn test_position_near_180_ambiguity_passes_through() {
        // A fixed-point value inside ±180 cannot be told apart from decimal
        // degrees; the magnitude heuristic leaves it unscaled.
        let packet = json!({
            "fromId": "!edge",
            "decoded": { "portnum": "POSITION_APP", "position": {
                "latitude": 179.9, "longitude": 10.0
            } }
        });
        match classify(&packet).unwrap() {
            InboundEvent::Position { latitude, .. } => assert!((latitude - 179.9).abs() < 1e-9),
            other => panic!("expected position, got {:?}", other),
        }
    }

    #[test]
    fn test_node_info() {
        let packet = json!({
            "fromId": "!beef",
            "decoded": { "portnum": "NODEINFO_APP", "user": { "longName": "Ridge Repeater" } }
        });
        assert_eq!(
            classify(&packet),
            Some(InboundEvent::NodeInfo {
                sender: "!beef".to_string(),
                long_name: "Ridge Repeater".to_string(),
            })
        );
    }
}
