// Alert rules and the engine that evaluates them.

pub mod engine;
pub mod model;

pub use engine::AlertEngine;
pub use model::{Comparator, KeywordRule, ScheduledRule, TemperatureUnit, ThresholdRule};
