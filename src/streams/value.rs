// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

use super::gradient::LossValue;
use super::tensor::{chunk_bounds, Device, Tensor};

/// Kind of value a stream carries; schemas declare which kinds they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Tensor,
    Loss,
    Integers,
    Strings,
    Float,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Tensor => "tensor",
            ValueKind::Loss => "loss",
            ValueKind::Integers => "integers",
            ValueKind::Strings => "strings",
            ValueKind::Float => "float",
        };
        write!(f, "{}", name)
    }
}

/// A single named field of the data streams.
#[derive(Debug, Clone)]
pub enum Value {
    Tensor(Tensor),
    Loss(LossValue),
    Integers(Vec<usize>),
    Strings(Vec<String>),
    Float(f64),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Tensor(_) => ValueKind::Tensor,
            Value::Loss(_) => ValueKind::Loss,
            Value::Integers(_) => ValueKind::Integers,
            Value::Strings(_) => ValueKind::Strings,
            Value::Float(_) => ValueKind::Float,
        }
    }

    pub fn to_device(&mut self, device: Device) {
        if let Value::Tensor(tensor) = self {
            tensor.to_device(device);
        }
    }

    /// Split batch-shaped values into `chunks` parts; scalars are replicated.
    pub fn scatter(&self, chunks: usize) -> Vec<Value> {
        match self {
            Value::Tensor(tensor) => tensor.split_batch(chunks).into_iter().map(Value::Tensor).collect(),
            Value::Integers(items) => split_list(items, chunks).into_iter().map(Value::Integers).collect(),
            Value::Strings(items) => split_list(items, chunks).into_iter().map(Value::Strings).collect(),
            Value::Loss(_) | Value::Float(_) => vec![self.clone(); chunks.max(1)],
        }
    }
}

fn split_list<T: Clone>(items: &[T], chunks: usize) -> Vec<Vec<T>> {
    if items.is_empty() || chunks <= 1 {
        return vec![items.to_vec()];
    }
    chunk_bounds(items.len(), chunks)
        .into_iter()
        .map(|(start, end)| items[start..end].to_vec())
        .collect()
}

impl From<Tensor> for Value {
    fn from(tensor: Tensor) -> Self {
        Value::Tensor(tensor)
    }
}

impl From<LossValue> for Value {
    fn from(loss: LossValue) -> Self {
        Value::Loss(loss)
    }
}

impl From<Vec<usize>> for Value {
    fn from(items: Vec<usize>) -> Self {
        Value::Integers(items)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}
