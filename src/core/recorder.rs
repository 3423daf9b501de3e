// Append-only persistence for readings and messages.
//
// Column order is part of the contract: once a CSV header is written, rows
// keep that shape. Timestamps are wall-clock, stamped at write time.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::core::model::RecordEvent;

const BATTERY_HEADER: &str = "timestamp,node_id,node_name,battery_percent,voltage";
const POSITION_HEADER: &str = "timestamp,node_id,node_name,latitude,longitude,altitude,speed,heading";

pub struct Recorder {
    message_log: PathBuf,
    battery_csv: PathBuf,
    position_csv: PathBuf,
}

impl Recorder {
    pub fn new(message_log: PathBuf, battery_csv: PathBuf, position_csv: PathBuf) -> Self {
        Self {
            message_log,
            battery_csv,
            position_csv,
        }
    }

    /// Appends one record. `name` is the resolved display name of the node.
    pub fn record(&self, event: &RecordEvent, name: &str) -> io::Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        match event {
            RecordEvent::Message { text, .. } => append_line(
                &self.message_log,
                None,
                &format!("[{}] {}: {}", timestamp, name, text),
            ),
            RecordEvent::Battery {
                node,
                level_percent,
                voltage,
            } => append_line(
                &self.battery_csv,
                Some(BATTERY_HEADER),
                &format!(
                    "{},{},{},{:.0},{}",
                    timestamp,
                    node,
                    name,
                    level_percent,
                    opt_field(*voltage)
                ),
            ),
            RecordEvent::Position {
                node,
                latitude,
                longitude,
                altitude,
                speed,
                heading,
            } => append_line(
                &self.position_csv,
                Some(POSITION_HEADER),
                &format!(
                    "{},{},{},{},{},{},{},{}",
                    timestamp,
                    node,
                    name,
                    latitude,
                    longitude,
                    opt_field(*altitude),
                    opt_field(*speed),
                    opt_field(*heading)
                ),
            ),
        }
    }
}

fn opt_field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Appends a line, creating the file (and header, when given) on first use.
fn append_line(path: &Path, header: Option<&str>, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let fresh = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if fresh {
        if let Some(header) = header {
            writeln!(file, "{}", header)?;
        }
    }
    writeln!(file, "{}", line)
}
