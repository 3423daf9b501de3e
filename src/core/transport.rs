// Radio bridge transport: newline-delimited JSON over TCP.
//
// The bridge (e.g. a meshtasticd companion) streams decoded packets as JSON
// objects, one per line, and accepts {"sendText": {...}} lines for outbound
// messages. Everything protocol-shaped ends here; the core only ever sees
// classified events and the send_text capability.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::json;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};

use super::classifier::{classify, RawPacket};
use super::model::InboundEvent;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("bridge i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode bridge frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outbound send capability. Fire-and-forget from the caller's point of view:
/// delivery over the mesh is never guaranteed.
#[async_trait]
pub trait MeshTransport: Send + Sync {
    async fn send_text(
        &self,
        text: &str,
        destination: Option<&str>,
        channel: Option<u32>,
    ) -> Result<(), TransportError>;
}

pub struct TcpTransport {
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpTransport {
    /// Connects to the bridge. Failure here is fatal to the daemon; retry and
    /// backoff, if wanted, belong to whatever supervises the process.
    pub async fn connect(addr: &str) -> Result<(Arc<Self>, PacketReader), TransportError> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();
        let transport = Arc::new(Self {
            writer: Mutex::new(write_half),
        });
        let reader = PacketReader {
            lines: BufReader::new(read_half).lines(),
        };
        Ok((transport, reader))
    }
}

#[async_trait]
impl MeshTransport for TcpTransport {
    async fn send_text(
        &self,
        text: &str,
        destination: Option<&str>,
        channel: Option<u32>,
    ) -> Result<(), TransportError> {
        let mut body = serde_json::Map::new();
        body.insert("text".to_string(), json!(text));
        if let Some(dest) = destination {
            body.insert("destinationId".to_string(), json!(dest));
        }
        if let Some(index) = channel {
            body.insert("channelIndex".to_string(), json!(index));
        }
        let mut line = serde_json::to_string(&json!({ "sendText": body }))?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Read half of the bridge connection. Classifies each packet at the boundary
/// and forwards only recognized events; unparseable lines are dropped with a
/// debug log.
pub struct PacketReader {
    lines: Lines<BufReader<OwnedReadHalf>>,
}

impl PacketReader {
    pub async fn run(
        mut self,
        events: mpsc::Sender<InboundEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                line = self.lines.next_line() => match line {
                    Ok(Some(line)) => {
                        let packet: RawPacket = match serde_json::from_str(&line) {
                            Ok(packet) => packet,
                            Err(e) => {
                                debug!("dropping unparseable bridge line: {}", e);
                                continue;
                            }
                        };
                        if let Some(event) = classify(&packet) {
                            if events.send(event).await.is_err() {
                                break; // dispatch loop is gone
                            }
                        }
                    }
                    Ok(None) => {
                        warn!("bridge closed the connection");
                        break;
                    }
                    Err(e) => {
                        warn!("bridge read error: {}", e);
                        break;
                    }
                },
            }
        }
    }
}
