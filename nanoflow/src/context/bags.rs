//! Write-once scratch storage shared by the nanos of one execution.

use crate::errors::DuplicateKeyError;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// A thread-safe key/value bag where every key may be written only once.
///
/// Writing to an existing key returns a [`DuplicateKeyError`] and leaves the
/// stored value untouched.
#[derive(Debug, Default)]
pub struct ContextBag {
    data: RwLock<HashMap<String, serde_json::Value>>,
}

impl ContextBag {
    /// Creates a new empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a value from the bag.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.data.read().get(key).cloned()
    }

    /// Gets a value and deserializes it into `T`.
    ///
    /// Returns `None` when the key is absent or the value has another shape.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = self.data.read();
        let value = data.get(key)?;
        T::deserialize(value).ok()
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Sets a value in the bag.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKeyError` if the key already exists.
    pub fn set(&self, key: impl Into<String>, value: serde_json::Value) -> Result<(), DuplicateKeyError> {
        let key = key.into();
        let mut data = self.data.write();

        if data.contains_key(&key) {
            return Err(DuplicateKeyError::new(key));
        }

        data.insert(key, value);
        Ok(())
    }

    /// Returns a copy of all data.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        self.data.read().clone()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Returns all keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bag_set_and_get() {
        let bag = ContextBag::new();
        bag.set("key", json!("value")).unwrap();

        assert_eq!(bag.get("key"), Some(json!("value")));
        assert!(bag.contains_key("key"));
        assert!(!bag.contains_key("other"));
        assert_eq!(bag.get("other"), None);
    }

    #[test]
    fn test_bag_rejects_second_write() {
        let bag = ContextBag::new();
        bag.set("key", json!(1)).unwrap();

        let err = bag.set("key", json!(2)).unwrap_err();
        assert_eq!(err.key, "key");
        assert_eq!(bag.get("key"), Some(json!(1)));
    }

    #[test]
    fn test_bag_rejects_rewrite_of_falsy_value() {
        let bag = ContextBag::new();
        bag.set("flag", json!(false)).unwrap();

        assert!(bag.set("flag", json!(true)).is_err());
        assert_eq!(bag.get("flag"), Some(json!(false)));
    }

    #[test]
    fn test_bag_typed_get() {
        let bag = ContextBag::new();
        bag.set("count", json!(3)).unwrap();

        assert_eq!(bag.get_as::<u32>("count"), Some(3));
        assert_eq!(bag.get_as::<String>("count"), None);
        assert_eq!(bag.get_as::<u32>("missing"), None);
    }

    #[test]
    fn test_bag_to_dict() {
        let bag = ContextBag::new();
        bag.set("a", json!(1)).unwrap();
        bag.set("b", json!(2)).unwrap();

        let dict = bag.to_dict();
        assert_eq!(dict.len(), 2);
        assert_eq!(bag.len(), 2);
        assert!(!bag.is_empty());
    }
}
