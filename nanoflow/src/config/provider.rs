//! The configuration capability consumed by pipelines, nanos and adapters.

use crate::errors::ConfigurationError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Live configuration shared by every pipeline of a service.
///
/// Pipelines only read through this contract; changes go through
/// [`Configuration::upsert_value`].
#[async_trait]
pub trait Configuration: Send + Sync {
    /// Gets a configuration value by name.
    ///
    /// `consumer` names the pipeline reading the value so that providers can
    /// report who depends on it.
    async fn get_value(
        &self,
        name: &str,
        consumer: Option<&str>,
    ) -> Result<serde_json::Value, ConfigurationError>;

    /// Adds or replaces a value on behalf of a service.
    async fn upsert_value(
        &self,
        name: &str,
        value: serde_json::Value,
        service: &str,
    ) -> Result<(), ConfigurationError>;

    /// Loads all values from the backing source.
    async fn fetch(&self) -> Result<(), ConfigurationError>;

    /// Returns the consumers registered for any of the given names.
    fn consumer_map(&self, names: &[String]) -> Vec<String>;
}

/// Typed helpers on top of [`Configuration`].
#[async_trait]
pub trait ConfigurationExt: Configuration {
    /// Gets a value and deserializes it into `T`.
    async fn get_typed<T>(&self, name: &str, consumer: Option<&str>) -> Result<T, ConfigurationError>
    where
        T: DeserializeOwned + Send,
    {
        let value = self.get_value(name, consumer).await?;
        serde_json::from_value(value).map_err(|e| ConfigurationError::invalid(name, e.to_string()))
    }
}

impl<C: Configuration + ?Sized> ConfigurationExt for C {}
