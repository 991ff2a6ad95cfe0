mod core;
mod periodic;
mod stick_table;

// Re-export public items
pub use self::core::{GenerationSink, PeriodicCollector};
pub use periodic::{CycleOutcome, Scheduler};
pub use stick_table::StickTableCollector;
