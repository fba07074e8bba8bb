// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{CheckpointError, StreamError};
use crate::streams::Tensor;

/// Device-agnostic copy of a tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorRecord {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl TensorRecord {
    /// Rebuild the tensor on the default device.
    pub fn to_tensor(&self) -> Result<Tensor, StreamError> {
        Tensor::new(self.data.clone(), self.shape.clone())
    }
}

impl From<&Tensor> for TensorRecord {
    fn from(tensor: &Tensor) -> Self {
        Self {
            shape: tensor.shape().to_vec(),
            data: tensor.data().to_vec(),
        }
    }
}

/// Parameters of a single model, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    pub parameters: BTreeMap<String, TensorRecord>,
}

impl ModelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: &Tensor) {
        self.parameters.insert(name.into(), TensorRecord::from(tensor));
    }

    /// Stored parameter, or `StateMismatch` naming `model` when absent.
    pub fn tensor(&self, model: &str, name: &str) -> Result<Tensor, CheckpointError> {
        let record = self
            .parameters
            .get(name)
            .ok_or_else(|| CheckpointError::StateMismatch {
                model: model.to_string(),
                reason: format!("parameter '{}' is missing", name),
            })?;
        record.to_tensor().map_err(|err| CheckpointError::StateMismatch {
            model: model.to_string(),
            reason: err.to_string(),
        })
    }

    fn encode(&self) -> Result<String, CheckpointError> {
        let bytes = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(bytes))
    }

    fn decode(model: &str, blob: &str) -> Result<Self, CheckpointError> {
        let bytes = STANDARD
            .decode(blob)
            .map_err(|source| CheckpointError::Decode {
                model: model.to_string(),
                source,
            })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Persisted pipeline snapshot.
///
/// Model parameters are opaque base64 blobs keyed by model name, so a record can
/// be inspected, patched and partially restored without decoding every model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub episode: u64,
    pub loss: f64,
    pub status: String,
    pub status_timestamp: DateTime<Utc>,
    #[serde(default)]
    models: BTreeMap<String, String>,
}

impl Checkpoint {
    pub fn new(name: impl Into<String>, episode: u64, loss: f64, status: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            timestamp: now,
            episode,
            loss,
            status: status.into(),
            status_timestamp: now,
            models: BTreeMap::new(),
        }
    }

    pub fn insert_model(&mut self, model: impl Into<String>, state: &ModelState) -> Result<(), CheckpointError> {
        let blob = state.encode()?;
        self.models.insert(model.into(), blob);
        Ok(())
    }

    pub fn model_state(&self, model: &str) -> Result<ModelState, CheckpointError> {
        let blob = self
            .models
            .get(model)
            .ok_or_else(|| CheckpointError::MissingModel(model.to_string()))?;
        ModelState::decode(model, blob)
    }

    pub fn contains_model(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    pub fn model_names(&self) -> impl Iterator<Item = &String> {
        self.models.keys()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.status_timestamp = Utc::now();
    }
}
