// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

use super::consts::{GLOBALS_KEY, KEYMAPPINGS_KEY, TYPE_KEY};
use crate::errors::ConfigurationError;
use crate::streams::KeyMappings;

/// Configuration section of a single component.
///
/// Accessors turn a missing key into [`ConfigurationError::MissingKey`] and a
/// wrongly typed value into [`ConfigurationError::InvalidParameter`], so
/// constructors can simply use `?`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentConfig {
    component: String,
    section: Mapping,
}

impl ComponentConfig {
    pub fn new(component: impl Into<String>, section: Mapping) -> Self {
        Self {
            component: component.into(),
            section,
        }
    }

    /// Build a section from YAML text (mostly useful in tests and demos).
    pub fn from_yaml(component: impl Into<String>, yaml: &str) -> Result<Self, serde_yaml::Error> {
        let section: Mapping = serde_yaml::from_str(yaml)?;
        Ok(Self::new(component, section))
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.section.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.section.contains_key(key)
    }

    pub fn require(&self, key: &str) -> Result<&Value, ConfigurationError> {
        self.get(key)
            .ok_or_else(|| ConfigurationError::missing_key(&self.component, key))
    }

    pub fn type_name(&self) -> Result<&str, ConfigurationError> {
        self.require_str(TYPE_KEY)
    }

    pub fn require_str(&self, key: &str) -> Result<&str, ConfigurationError> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| self.invalid(key, "expected a string"))
    }

    pub fn require_usize(&self, key: &str) -> Result<usize, ConfigurationError> {
        let value = self.require(key)?;
        self.as_usize(key, value)
    }

    pub fn get_usize(&self, key: &str, default: usize) -> Result<usize, ConfigurationError> {
        match self.get(key) {
            Some(value) => self.as_usize(key, value),
            None => Ok(default),
        }
    }

    pub fn get_f64(&self, key: &str, default: f64) -> Result<f64, ConfigurationError> {
        match self.get(key) {
            Some(value) => value
                .as_f64()
                .ok_or_else(|| self.invalid(key, "expected a number")),
            None => Ok(default),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigurationError> {
        match self.get(key) {
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.invalid(key, "expected true or false")),
            None => Ok(None),
        }
    }

    /// Stream name remappings declared under `keymappings`.
    pub fn keymappings(&self) -> Result<KeyMappings, ConfigurationError> {
        self.string_map(KEYMAPPINGS_KEY).map(KeyMappings::new)
    }

    /// Global-parameter name remappings declared under `globals`.
    pub fn global_mappings(&self) -> Result<KeyMappings, ConfigurationError> {
        self.string_map(GLOBALS_KEY).map(KeyMappings::new)
    }

    fn string_map(&self, key: &str) -> Result<HashMap<String, String>, ConfigurationError> {
        let Some(value) = self.get(key) else {
            return Ok(HashMap::new());
        };
        let mapping = value
            .as_mapping()
            .ok_or_else(|| self.invalid(key, "expected a mapping of names"))?;
        mapping
            .iter()
            .map(|(from, to)| match (from.as_str(), to.as_str()) {
                (Some(from), Some(to)) => Ok((from.to_string(), to.to_string())),
                _ => Err(self.invalid(key, "names must be strings")),
            })
            .collect()
    }

    fn as_usize(&self, key: &str, value: &Value) -> Result<usize, ConfigurationError> {
        value
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| self.invalid(key, "expected a non-negative integer"))
    }

    fn invalid(&self, key: &str, reason: &str) -> ConfigurationError {
        ConfigurationError::invalid_parameter(&self.component, key, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> ComponentConfig {
        ComponentConfig::from_yaml(
            "classifier",
            r#"
type: linear_classifier
priority: 2.0
hidden: 8
dropout: 0.25
freeze: true
keymappings:
  inputs: embeddings
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_typed_accessors() {
        let config = section();
        assert_eq!(config.type_name().unwrap(), "linear_classifier");
        assert_eq!(config.require_usize("hidden").unwrap(), 8);
        assert_eq!(config.get_usize("absent", 3).unwrap(), 3);
        assert_eq!(config.get_f64("dropout", 0.0).unwrap(), 0.25);
        assert_eq!(config.get_bool("freeze").unwrap(), Some(true));
        assert_eq!(config.keymappings().unwrap().map("inputs"), "embeddings");
    }

    #[test]
    fn test_missing_key_is_reported_with_component() {
        let err = section().require("vocabulary").unwrap_err();
        assert_eq!(err, ConfigurationError::missing_key("classifier", "vocabulary"));
    }

    #[test]
    fn test_wrong_type_is_invalid_parameter() {
        let err = section().require_usize("dropout").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidParameter { .. }));
    }
}
