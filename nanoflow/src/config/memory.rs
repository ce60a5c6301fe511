//! A dashmap-backed configuration provider.

use super::Configuration;
use crate::errors::ConfigurationError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct ConfigEntry {
    value: serde_json::Value,
    updated_by: Option<String>,
}

/// Configuration held in memory, optionally refreshed from a JSON file.
///
/// When a source file is set, `fetch` replaces the stored values with the
/// top-level object of that file. Without a source, `fetch` is a no-op.
#[derive(Debug, Default)]
pub struct InMemoryConfiguration {
    values: DashMap<String, ConfigEntry>,
    consumers: DashMap<String, BTreeSet<String>>,
    source: Option<PathBuf>,
}

impl InMemoryConfiguration {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that loads from a JSON file on `fetch`.
    #[must_use]
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
            ..Self::default()
        }
    }

    /// Adds a value at construction time.
    #[must_use]
    pub fn with_value(self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.values.insert(
            name.into(),
            ConfigEntry {
                value,
                updated_by: None,
            },
        );
        self
    }

    /// Returns the service that last wrote `name`, if any.
    #[must_use]
    pub fn updated_by(&self, name: &str) -> Option<String> {
        self.values.get(name).and_then(|e| e.updated_by.clone())
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait]
impl Configuration for InMemoryConfiguration {
    async fn get_value(
        &self,
        name: &str,
        consumer: Option<&str>,
    ) -> Result<serde_json::Value, ConfigurationError> {
        if let Some(consumer) = consumer {
            self.consumers
                .entry(name.to_string())
                .or_default()
                .insert(consumer.to_string());
        }

        self.values
            .get(name)
            .map(|e| e.value.clone())
            .ok_or_else(|| ConfigurationError::not_found(name))
    }

    async fn upsert_value(
        &self,
        name: &str,
        value: serde_json::Value,
        service: &str,
    ) -> Result<(), ConfigurationError> {
        debug!(config = name, service, "Upserting configuration value");
        self.values.insert(
            name.to_string(),
            ConfigEntry {
                value,
                updated_by: Some(service.to_string()),
            },
        );
        Ok(())
    }

    async fn fetch(&self) -> Result<(), ConfigurationError> {
        let Some(path) = &self.source else {
            return Ok(());
        };

        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigurationError::Fetch(format!("{}: {e}", path.display())))?;
        let parsed: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| ConfigurationError::Fetch(format!("{}: {e}", path.display())))?;

        let serde_json::Value::Object(map) = parsed else {
            return Err(ConfigurationError::Fetch(format!(
                "{}: expected a JSON object at the top level",
                path.display()
            )));
        };

        self.values.clear();
        for (name, value) in map {
            self.values.insert(
                name,
                ConfigEntry {
                    value,
                    updated_by: None,
                },
            );
        }

        info!(source = %path.display(), values = self.values.len(), "Configuration fetched");
        Ok(())
    }

    fn consumer_map(&self, names: &[String]) -> Vec<String> {
        let mut consumers = BTreeSet::new();
        for name in names {
            if let Some(entry) = self.consumers.get(name) {
                consumers.extend(entry.iter().cloned());
            }
        }
        consumers.into_iter().collect()
    }
}
