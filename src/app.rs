// Daemon wiring: load settings, connect to the bridge, spawn the reader,
// broadcasters and action sink, then run the dispatch loop until Ctrl-C or
// the bridge connection drops.

use std::path::PathBuf;
use std::process;
use std::sync::{Arc, RwLock};

use log::{error, info};
use tokio::sync::{mpsc, watch};

use crate::core::alerts::AlertEngine;
use crate::core::config::{ConfigManager, Settings};
use crate::core::directory::NodeDirectory;
use crate::core::dispatch::Dispatcher;
use crate::core::recorder::Recorder;
use crate::core::scheduler;
use crate::core::sink::ActionSink;
use crate::core::transport::TcpTransport;

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let settings = ConfigManager::new(config_dir).load();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to start async runtime: {}", e);
            process::exit(1);
        }
    };
    runtime.block_on(run_daemon(settings));
}

async fn run_daemon(settings: Settings) {
    info!("connecting to bridge at {}", settings.bridge_addr);
    let (transport, reader) = match TcpTransport::connect(&settings.bridge_addr).await {
        Ok(pair) => pair,
        Err(e) => {
            // No bridge, no mesh. Supervision and retry live outside.
            error!("could not connect to {}: {}", settings.bridge_addr, e);
            process::exit(1);
        }
    };
    info!("connected");

    let (event_tx, mut event_rx) = mpsc::channel(256);
    let (action_tx, action_rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let directory = Arc::new(RwLock::new(NodeDirectory::new(settings.node_names)));
    let recorder = Recorder::new(
        settings.message_log,
        settings.battery_log,
        settings.position_log,
    );
    let sink = ActionSink::new(
        transport,
        recorder,
        directory.clone(),
        settings.channel_index,
    );
    let sink_task = tokio::spawn(sink.run(action_rx));

    tokio::spawn(reader.run(event_tx, shutdown_rx.clone()));
    for rule in settings.broadcasts {
        tokio::spawn(scheduler::run_broadcaster(
            rule,
            action_tx.clone(),
            shutdown_rx.clone(),
        ));
    }

    let engine = AlertEngine::new(settings.keyword_rules, settings.threshold_rules);
    let mut dispatcher = Dispatcher::new(engine, directory);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("shutting down");
                break;
            }
            event = event_rx.recv() => match event {
                Some(event) => {
                    for action in dispatcher.process(&event) {
                        if action_tx.send(action).await.is_err() {
                            error!("action sink stopped unexpectedly");
                            return;
                        }
                    }
                }
                None => {
                    info!("event stream ended, shutting down");
                    break;
                }
            },
        }
    }

    // Stop the reader and broadcasters, then let the sink drain what is
    // already queued before exiting.
    let _ = shutdown_tx.send(true);
    drop(action_tx);
    let _ = sink_task.await;
}
