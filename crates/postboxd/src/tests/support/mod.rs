//! Test harness utilities shared by the unit and behavioural suites.

mod config_loader;
mod doubles;
mod metrics;
mod reporter;
mod world;

pub use config_loader::{FailingConfigLoader, InvalidConfigLoader, TestConfigLoader};
pub use doubles::{CountingProvisioner, StaticAuthenticator, TEST_USER, memory_store, session_for};
pub use metrics::RecordingMetricFactory;
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TEST_TOKEN, TestWorld, world};
