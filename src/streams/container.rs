// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use indexmap::map::Entry;
use indexmap::IndexMap;

use super::aliases::{KeyMappings, StreamView};
use super::gradient::{GraphTape, LossValue};
use super::tensor::{Device, Tensor};
use super::value::{Value, ValueKind};
use crate::errors::StreamError;

/// Name of the stream holding the sample indices of a batch.
pub const INDICES_STREAM: &str = "indices";

/// Per-batch, append-only named-field carrier threaded through the pipeline.
///
/// Fields are published exactly once and never removed while a batch is in
/// flight. The container also owns the batch's computation graph handle.
#[derive(Debug, Clone, Default)]
pub struct DataStreams {
    fields: IndexMap<String, Value>,
    tape: GraphTape,
}

impl DataStreams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field; fails if the name is already present.
    pub fn publish(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), StreamError> {
        match self.fields.entry(key.into()) {
            Entry::Occupied(entry) => Err(StreamError::AlreadyPresent(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(value.into());
                Ok(())
            }
        }
    }

    /// Publish several fields at once. Nothing is added if any name collides.
    pub fn extend<I, K>(&mut self, entries: I) -> Result<(), StreamError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut staged: IndexMap<String, Value> = IndexMap::new();
        for (key, value) in entries {
            let key = key.into();
            if self.fields.contains_key(&key) || staged.contains_key(&key) {
                return Err(StreamError::AlreadyPresent(key));
            }
            staged.insert(key, value);
        }
        self.fields.extend(staged);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&Value, StreamError> {
        self.fields
            .get(key)
            .ok_or_else(|| StreamError::Missing(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn tensor(&self, key: &str) -> Result<&Tensor, StreamError> {
        match self.get(key)? {
            Value::Tensor(tensor) => Ok(tensor),
            other => Err(kind_mismatch(key, ValueKind::Tensor, other)),
        }
    }

    pub fn integers(&self, key: &str) -> Result<&[usize], StreamError> {
        match self.get(key)? {
            Value::Integers(items) => Ok(items),
            other => Err(kind_mismatch(key, ValueKind::Integers, other)),
        }
    }

    pub fn loss(&self, key: &str) -> Result<&LossValue, StreamError> {
        match self.get(key)? {
            Value::Loss(loss) => Ok(loss),
            other => Err(kind_mismatch(key, ValueKind::Loss, other)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of samples, read from the `indices` stream.
    pub fn batch_size(&self) -> Result<usize, StreamError> {
        self.integers(INDICES_STREAM).map(<[usize]>::len)
    }

    /// Move every tensor field to `device`.
    pub fn to_device(&mut self, device: Device) {
        for value in self.fields.values_mut() {
            value.to_device(device);
        }
    }

    pub fn tape(&self) -> &GraphTape {
        &self.tape
    }

    /// Empty container sharing this batch's computation graph.
    pub(crate) fn sibling(&self) -> Self {
        Self {
            fields: IndexMap::new(),
            tape: self.tape.clone(),
        }
    }

    /// View that resolves names through `mappings` before touching the streams.
    pub fn view<'a>(&'a mut self, mappings: &'a KeyMappings) -> StreamView<'a> {
        StreamView::new(self, mappings)
    }
}

fn kind_mismatch(key: &str, expected: ValueKind, found: &Value) -> StreamError {
    StreamError::KindMismatch {
        key: key.to_string(),
        expected: expected.to_string(),
        found: found.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_is_add_only() {
        let mut streams = DataStreams::new();
        streams.publish("x", 1.0).unwrap();

        let err = streams.publish("x", 2.0).unwrap_err();
        assert_eq!(err, StreamError::AlreadyPresent("x".to_string()));
        assert!(matches!(streams.get("x"), Ok(Value::Float(v)) if *v == 1.0));
    }

    #[test]
    fn test_extend_is_all_or_nothing() {
        let mut streams = DataStreams::new();
        streams.publish("b", 0.0).unwrap();

        let result = streams.extend(vec![("a", Value::Float(1.0)), ("b", Value::Float(2.0))]);
        assert!(result.is_err());
        assert!(!streams.contains("a"));

        streams
            .extend(vec![("a", Value::Float(1.0)), ("c", Value::Float(3.0))])
            .unwrap();
        let keys: Vec<&String> = streams.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_extend_rejects_repeated_name_in_batch() {
        let mut streams = DataStreams::new();
        let result = streams.extend(vec![("a", Value::Float(1.0)), ("a", Value::Float(2.0))]);

        assert_eq!(result, Err(StreamError::AlreadyPresent("a".to_string())));
        assert!(streams.is_empty());
    }

    #[test]
    fn test_typed_getters_report_kind_mismatch() {
        let mut streams = DataStreams::new();
        streams.publish(INDICES_STREAM, vec![0, 1, 2]).unwrap();

        assert_eq!(streams.batch_size().unwrap(), 3);
        assert!(matches!(
            streams.tensor(INDICES_STREAM),
            Err(StreamError::KindMismatch { .. })
        ));
        assert!(matches!(streams.tensor("missing"), Err(StreamError::Missing(_))));
    }

    #[test]
    fn test_to_device_moves_tensors() {
        let mut streams = DataStreams::new();
        streams.publish("x", Tensor::zeros(vec![2, 2])).unwrap();
        streams.to_device(Device::Cuda(0));
        assert_eq!(streams.tensor("x").unwrap().device(), Device::Cuda(0));
    }
}
