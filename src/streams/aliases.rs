// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use super::container::DataStreams;
use super::gradient::{GraphTape, LossValue};
use super::tensor::Tensor;
use super::value::Value;
use crate::errors::StreamError;

/// Renames a component's default stream names (`keymappings` section).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyMappings(HashMap<String, String>);

impl KeyMappings {
    pub fn new(mappings: HashMap<String, String>) -> Self {
        Self(mappings)
    }

    /// Mapped name, or `key` itself when no mapping exists.
    pub fn map<'a>(&'a self, key: &'a str) -> &'a str {
        self.0.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Aliased access to a [`DataStreams`] for one component.
pub struct StreamView<'a> {
    streams: &'a mut DataStreams,
    mappings: &'a KeyMappings,
}

impl<'a> StreamView<'a> {
    pub(crate) fn new(streams: &'a mut DataStreams, mappings: &'a KeyMappings) -> Self {
        Self { streams, mappings }
    }

    pub fn get(&self, key: &str) -> Result<&Value, StreamError> {
        self.streams.get(self.mappings.map(key))
    }

    pub fn tensor(&self, key: &str) -> Result<&Tensor, StreamError> {
        self.streams.tensor(self.mappings.map(key))
    }

    pub fn integers(&self, key: &str) -> Result<&[usize], StreamError> {
        self.streams.integers(self.mappings.map(key))
    }

    pub fn loss(&self, key: &str) -> Result<&LossValue, StreamError> {
        self.streams.loss(self.mappings.map(key))
    }

    pub fn publish(&mut self, key: &str, value: impl Into<Value>) -> Result<(), StreamError> {
        let mapped = self.mappings.map(key).to_string();
        self.streams.publish(mapped, value)
    }

    pub fn tape(&self) -> &GraphTape {
        self.streams.tape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_resolves_aliases() {
        let mappings = KeyMappings::new(HashMap::from([(
            "predictions".to_string(),
            "answer_predictions".to_string(),
        )]));
        let mut streams = DataStreams::new();

        streams
            .view(&mappings)
            .publish("predictions", Tensor::zeros(vec![1, 2]))
            .unwrap();

        assert!(streams.contains("answer_predictions"));
        assert!(!streams.contains("predictions"));
        assert!(streams.view(&mappings).tensor("predictions").is_ok());
    }

    #[test]
    fn test_unmapped_keys_pass_through() {
        let mappings = KeyMappings::default();
        assert_eq!(mappings.map("targets"), "targets");
    }
}
