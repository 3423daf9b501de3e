// Action sink - the single place where outbound actions touch the world.
//
// Failures are logged and swallowed: by the time an action reaches the sink
// the engine has already committed its state, so a failed send is an
// at-most-once attempt, never a rollback.

use std::sync::{Arc, RwLock};

use log::{info, warn};
use tokio::sync::mpsc;

use super::directory::NodeDirectory;
use super::model::OutboundAction;
use super::recorder::Recorder;
use super::transport::MeshTransport;

pub struct ActionSink {
    transport: Arc<dyn MeshTransport>,
    recorder: Recorder,
    directory: Arc<RwLock<NodeDirectory>>,
    default_channel: u32,
}

impl ActionSink {
    pub fn new(
        transport: Arc<dyn MeshTransport>,
        recorder: Recorder,
        directory: Arc<RwLock<NodeDirectory>>,
        default_channel: u32,
    ) -> Self {
        Self {
            transport,
            recorder,
            directory,
            default_channel,
        }
    }

    /// Consumes actions until every sender hangs up, then drains and returns.
    pub async fn run(self, mut actions: mpsc::Receiver<OutboundAction>) {
        while let Some(action) = actions.recv().await {
            self.perform(action).await;
        }
    }

    pub async fn perform(&self, action: OutboundAction) {
        match action {
            OutboundAction::SendMeshMessage {
                text,
                destination,
                channel,
            } => {
                let channel = channel.or(Some(self.default_channel));
                match self
                    .transport
                    .send_text(&text, destination.as_deref(), channel)
                    .await
                {
                    Ok(()) => match &destination {
                        Some(dest) => info!("sent to {}: {}", dest, text),
                        None => info!("broadcast: {}", text),
                    },
                    Err(e) => warn!("send failed ({}): {}", e, text),
                }
            }
            OutboundAction::Record(record) => {
                let name = {
                    let directory = self.directory.read().unwrap();
                    directory.resolve(record.node()).to_string()
                };
                if let Err(e) = self.recorder.record(&record, &name) {
                    warn!("failed to record {:?}: {}", record, e);
                }
            }
        }
    }
}
