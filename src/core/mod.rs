pub mod alerts;
pub mod classifier;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod model;
pub mod recorder;
pub mod scheduler;
pub mod sink;
pub mod state;
pub mod transport;
