// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::components::{globals, keys};
use crate::config::{ComponentConfig, RuntimeContext};
use crate::errors::{ConfigurationError, StreamError};
use crate::streams::{
    DataDefinition, DataDefinitions, DataStreams, Tensor, Value, ValueKind, INDICES_STREAM,
};
use crate::traits::{Component, ComponentBase, Task};

pub const TYPE_NAME: &str = "synthetic_classification";

/// Deterministic, linearly separable classification data.
///
/// Sample `i` belongs to class `i % num_classes`; its feature vector is a
/// one-hot pattern over the features assigned to that class plus a small
/// index-dependent offset. Publishes `input_size` and `num_classes` as global
/// parameters so downstream models can size themselves.
pub struct SyntheticClassificationTask {
    base: ComponentBase,
    size: usize,
    input_size: usize,
    num_classes: usize,
    inputs_key: String,
    targets_key: String,
    indices_key: String,
}

impl SyntheticClassificationTask {
    pub fn new(
        name: &str,
        config: &ComponentConfig,
        context: &mut RuntimeContext,
    ) -> Result<Self, ConfigurationError> {
        let base = ComponentBase::new(name, TYPE_NAME, config.clone())?;
        let size = config.get_usize("size", 64)?;
        let input_size = config.get_usize(globals::INPUT_SIZE, 8)?;
        let num_classes = config.get_usize(globals::NUM_CLASSES, 2)?;
        if num_classes == 0 || input_size < num_classes {
            return Err(ConfigurationError::invalid_parameter(
                name,
                globals::INPUT_SIZE,
                "must be at least num_classes, and num_classes must be positive",
            ));
        }

        context.set_global(base.global_key(globals::INPUT_SIZE), input_size as u64);
        context.set_global(base.global_key(globals::NUM_CLASSES), num_classes as u64);

        Ok(Self {
            inputs_key: base.key(keys::INPUTS),
            targets_key: base.key(keys::TARGETS),
            indices_key: base.key(INDICES_STREAM),
            base,
            size,
            input_size,
            num_classes,
        })
    }

    fn target(&self, index: usize) -> usize {
        index % self.num_classes
    }

    fn features(&self, index: usize) -> impl Iterator<Item = f32> + '_ {
        let class = self.target(index);
        let offset = (index % 7) as f32 * 0.01;
        (0..self.input_size).map(move |feature| {
            if feature % self.num_classes == class {
                1.0 - offset
            } else {
                offset
            }
        })
    }
}

impl Component for SyntheticClassificationTask {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn type_name(&self) -> &str {
        self.base.type_name()
    }

    fn config(&self) -> &ComponentConfig {
        self.base.config()
    }

    fn input_data_definitions(&self) -> DataDefinitions {
        DataDefinitions::new()
    }

    fn output_data_definitions(&self) -> DataDefinitions {
        [
            (
                self.indices_key.clone(),
                DataDefinition::new(&[-1], &[ValueKind::Integers], "Batch of sample indices [BATCH_SIZE]"),
            ),
            (
                self.inputs_key.clone(),
                DataDefinition::new(
                    &[-1, self.input_size as i64],
                    &[ValueKind::Tensor],
                    "Batch of feature vectors [BATCH_SIZE x INPUT_SIZE]",
                ),
            ),
            (
                self.targets_key.clone(),
                DataDefinition::new(&[-1], &[ValueKind::Integers], "Batch of target classes [BATCH_SIZE]"),
            ),
        ]
        .into_iter()
        .collect()
    }

    fn process(&mut self, _streams: &mut DataStreams) -> Result<(), StreamError> {
        Ok(())
    }

    fn as_task(&self) -> Option<&dyn Task> {
        Some(self)
    }
}

impl Task for SyntheticClassificationTask {
    fn len(&self) -> usize {
        self.size
    }

    fn batch(&self, indices: &[usize]) -> Result<DataStreams, StreamError> {
        if let Some(index) = indices.iter().find(|index| **index >= self.size) {
            return Err(StreamError::Shape(format!(
                "sample {} is out of range for '{}' with {} samples",
                index,
                self.name(),
                self.size
            )));
        }

        let data: Vec<f32> = indices.iter().flat_map(|index| self.features(*index)).collect();
        let inputs = Tensor::new(data, vec![indices.len(), self.input_size])?;
        let targets: Vec<usize> = indices.iter().map(|index| self.target(*index)).collect();

        let mut streams = DataStreams::new();
        streams.extend([
            (self.indices_key.clone(), Value::Integers(indices.to_vec())),
            (self.inputs_key.clone(), Value::Tensor(inputs)),
            (self.targets_key.clone(), Value::Integers(targets)),
        ])?;
        Ok(streams)
    }
}
