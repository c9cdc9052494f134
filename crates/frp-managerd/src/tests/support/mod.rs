//! Test harness utilities for the daemon behavioural suites.

mod config_loader;
mod process_world;
mod reporter;
mod world;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use process_world::{ProcessTestWorld, TestShutdownSignal};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
