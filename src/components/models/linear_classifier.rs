// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::checkpoint::ModelState;
use crate::components::{globals, keys};
use crate::config::{ComponentConfig, RuntimeContext};
use crate::errors::{CheckpointError, ConfigurationError, StreamError};
use crate::streams::{DataDefinition, DataDefinitions, DataStreams, Device, Tensor, ValueKind};
use crate::traits::{Component, ComponentBase, Mode, Model, NamedParameter};

pub const TYPE_NAME: &str = "linear_classifier";

const WEIGHTS: &str = "weights";
const BIAS: &str = "bias";

/// Single affine layer followed by log-softmax.
///
/// `input_size` and `num_classes` come from the section or, when absent, from
/// the global parameters published by the task (names remappable via `globals`).
///
/// Streams: `inputs` `[-1, input_size]` -> `predictions` `[-1, num_classes]`
/// (log-probabilities).
pub struct LinearClassifier {
    base: ComponentBase,
    input_size: usize,
    num_classes: usize,
    inputs_key: String,
    predictions_key: String,
    weights: Tensor,
    bias: Tensor,
    frozen: bool,
    mode: Mode,
    device: Device,
}

impl LinearClassifier {
    pub fn new(
        name: &str,
        config: &ComponentConfig,
        context: &mut RuntimeContext,
    ) -> Result<Self, ConfigurationError> {
        let base = ComponentBase::new(name, TYPE_NAME, config.clone())?;
        let input_size = sized(&base, context, globals::INPUT_SIZE)?;
        let num_classes = sized(&base, context, globals::NUM_CLASSES)?;

        Ok(Self {
            inputs_key: base.key(keys::INPUTS),
            predictions_key: base.key(keys::PREDICTIONS),
            weights: initial_weights(input_size, num_classes),
            bias: Tensor::zeros(vec![num_classes]),
            input_size,
            num_classes,
            base,
            frozen: false,
            mode: Mode::Train,
            device: Device::Cpu,
        })
    }

    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }
}

/// Section value, falling back to the (possibly remapped) global parameter.
fn sized(base: &ComponentBase, context: &RuntimeContext, key: &str) -> Result<usize, ConfigurationError> {
    let config = base.config();
    let size = if config.contains(key) {
        config.require_usize(key)?
    } else {
        context
            .global_usize(&base.global_key(key))
            .ok_or_else(|| ConfigurationError::missing_key(base.name(), key))?
    };
    if size == 0 {
        return Err(ConfigurationError::invalid_parameter(base.name(), key, "must be positive"));
    }
    Ok(size)
}

/// Deterministic, zero-centred initialization scaled by `1/sqrt(input_size)`.
fn initial_weights(input_size: usize, num_classes: usize) -> Tensor {
    let scale = 1.0 / (input_size as f32).sqrt();
    let data = (0..input_size * num_classes)
        .map(|i| (((i * 7919) % 101) as f32 / 101.0 - 0.5) * scale)
        .collect();
    Tensor::new(data, vec![input_size, num_classes]).unwrap_or_else(|_| Tensor::zeros(vec![input_size, num_classes]))
}

impl Component for LinearClassifier {
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
        [(
            self.inputs_key.clone(),
            DataDefinition::new(
                &[-1, self.input_size as i64],
                &[ValueKind::Tensor],
                "Batch of feature vectors [BATCH_SIZE x INPUT_SIZE]",
            ),
        )]
        .into_iter()
        .collect()
    }

    fn output_data_definitions(&self) -> DataDefinitions {
        [(
            self.predictions_key.clone(),
            DataDefinition::new(
                &[-1, self.num_classes as i64],
                &[ValueKind::Tensor],
                "Batch of log-probabilities [BATCH_SIZE x NUM_CLASSES]",
            ),
        )]
        .into_iter()
        .collect()
    }

    fn process(&mut self, streams: &mut DataStreams) -> Result<(), StreamError> {
        let inputs = streams.tensor(&self.inputs_key)?;
        if inputs.shape().len() != 2 || inputs.shape()[1] != self.input_size {
            return Err(StreamError::Shape(format!(
                "'{}' expects inputs [-1, {}], got {:?}",
                self.name(),
                self.input_size,
                inputs.shape()
            )));
        }
        let predictions = inputs
            .matmul(&self.weights)?
            .add_row(&self.bias)?
            .log_softmax_rows();
        streams.publish(self.predictions_key.clone(), predictions)
    }

    fn as_model(&self) -> Option<&dyn Model> {
        Some(self)
    }

    fn as_model_mut(&mut self) -> Option<&mut dyn Model> {
        Some(self)
    }
}

impl Model for LinearClassifier {
    fn named_parameters(&self) -> Vec<NamedParameter<'_>> {
        let trainable = !self.frozen;
        vec![
            NamedParameter {
                name: WEIGHTS.to_string(),
                tensor: &self.weights,
                trainable,
            },
            NamedParameter {
                name: BIAS.to_string(),
                tensor: &self.bias,
                trainable,
            },
        ]
    }

    fn load_parameters(&mut self, state: &ModelState) -> Result<(), CheckpointError> {
        let mut weights = state.tensor(self.name(), WEIGHTS)?;
        let mut bias = state.tensor(self.name(), BIAS)?;
        for (stored, current, key) in [(&weights, &self.weights, WEIGHTS), (&bias, &self.bias, BIAS)] {
            if stored.shape() != current.shape() {
                return Err(CheckpointError::StateMismatch {
                    model: self.name().to_string(),
                    reason: format!(
                        "'{}' has shape {:?}, expected {:?}",
                        key,
                        stored.shape(),
                        current.shape()
                    ),
                });
            }
        }
        weights.to_device(self.device);
        bias.to_device(self.device);
        self.weights = weights;
        self.bias = bias;
        Ok(())
    }

    fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn move_to(&mut self, device: Device) {
        self.device = device;
        self.weights.to_device(device);
        self.bias.to_device(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::Checkpoint;
    use crate::streams::INDICES_STREAM;

    fn classifier(yaml: &str, context: &mut RuntimeContext) -> Result<LinearClassifier, ConfigurationError> {
        let config = ComponentConfig::from_yaml("classifier", yaml).unwrap();
        LinearClassifier::new("classifier", &config, context)
    }

    #[test]
    fn test_sizes_from_section() {
        let mut context = RuntimeContext::new();
        let model = classifier("type: linear_classifier\ninput_size: 3\nnum_classes: 2\n", &mut context).unwrap();
        assert_eq!(model.weights().shape(), &[3, 2]);
        assert_eq!(model.bias().shape(), &[2]);
        assert_eq!(model.trainable_parameter_count(), 8);
    }

    #[test]
    fn test_sizes_from_globals() {
        let mut context = RuntimeContext::new();
        context.set_global("features", 4u64);
        context.set_global(globals::NUM_CLASSES, 3u64);
        let model = classifier(
            "type: linear_classifier\nglobals:\n  input_size: features\n",
            &mut context,
        )
        .unwrap();
        assert_eq!(model.weights().shape(), &[4, 3]);
    }

    #[test]
    fn test_missing_size_is_configuration_error() {
        let mut context = RuntimeContext::new();
        let result = classifier("type: linear_classifier\nnum_classes: 2\n", &mut context);
        assert!(matches!(
            result,
            Err(ConfigurationError::MissingKey { ref key, .. }) if key == "input_size"
        ));
    }

    #[test]
    fn test_process_publishes_log_probabilities() {
        let mut context = RuntimeContext::new();
        let mut model = classifier("type: linear_classifier\ninput_size: 2\nnum_classes: 3\n", &mut context).unwrap();

        let mut streams = DataStreams::new();
        streams.publish(INDICES_STREAM, vec![0usize, 1]).unwrap();
        streams
            .publish("inputs", Tensor::new(vec![1.0, 0.0, 0.0, 1.0], vec![2, 2]).unwrap())
            .unwrap();
        model.process(&mut streams).unwrap();

        let predictions = streams.tensor("predictions").unwrap();
        assert_eq!(predictions.shape(), &[2, 3]);
        for row in predictions.data().chunks(3) {
            let total: f32 = row.iter().map(|v| v.exp()).sum();
            assert!((total - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_process_rejects_wrong_width() {
        let mut context = RuntimeContext::new();
        let mut model = classifier("type: linear_classifier\ninput_size: 2\nnum_classes: 3\n", &mut context).unwrap();
        let mut streams = DataStreams::new();
        streams.publish("inputs", Tensor::zeros(vec![1, 5])).unwrap();
        assert!(matches!(model.process(&mut streams), Err(StreamError::Shape(_))));
    }

    #[test]
    fn test_checkpoint_round_trip_and_freeze() {
        let mut context = RuntimeContext::new();
        let source = classifier("type: linear_classifier\ninput_size: 2\nnum_classes: 2\n", &mut context).unwrap();
        let mut checkpoint = Checkpoint::new("pipe", 0, 1.0, "training");
        source.save_to_checkpoint(&mut checkpoint).unwrap();

        let mut target = classifier("type: linear_classifier\ninput_size: 2\nnum_classes: 2\n", &mut context).unwrap();
        target.weights = Tensor::zeros(vec![2, 2]);
        target.load_from_checkpoint(&checkpoint, None).unwrap();
        assert_eq!(target.weights(), source.weights());

        target.freeze();
        assert_eq!(target.trainable_parameter_count(), 0);
        assert!(target.summarize().contains("Non-trainable Params: 6"));
    }

    #[test]
    fn test_load_rejects_shape_mismatch() {
        let mut context = RuntimeContext::new();
        let small = classifier("type: linear_classifier\ninput_size: 2\nnum_classes: 2\n", &mut context).unwrap();
        let mut large = classifier("type: linear_classifier\ninput_size: 3\nnum_classes: 2\n", &mut context).unwrap();
        assert!(matches!(
            large.load_parameters(&small.state()),
            Err(CheckpointError::StateMismatch { .. })
        ));
    }
}
