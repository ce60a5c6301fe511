//! Configuration contract, an in-memory provider and service settings.

mod memory;
mod provider;
mod settings;

pub use memory::InMemoryConfiguration;
pub use provider::{Configuration, ConfigurationExt};
pub use settings::{LogFormat, LoggingConfig, ServiceSettings, StartupPolicy};
