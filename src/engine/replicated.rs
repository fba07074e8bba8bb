// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data-parallel wrapper around a single model.
//!
//! The wrapper scatters every batch-shaped stream into one chunk per replica,
//! runs the wrapped model on each chunk and gathers the model's declared
//! outputs back along the batch dimension. The gathered result lives in a
//! separate container next to wrapper bookkeeping (`replica_count`); only the
//! declared outputs are meant to reach the shared container.

use crate::checkpoint::{Checkpoint, ModelState};
use crate::config::ComponentConfig;
use crate::errors::{CheckpointError, StatisticsError, StreamError};
use crate::statistics::{StatisticsAggregator, StatisticsCollector};
use crate::streams::{DataDefinitions, DataStreams, Device, LossValue, Tensor, Value};
use crate::traits::{Component, Loss, Mode, Model, NamedParameter};

/// Bookkeeping stream: number of chunks the last batch was split into.
pub const REPLICA_COUNT_STREAM: &str = "replica_count";

pub struct ReplicatedModel {
    inner: Box<dyn Component>,
    replicas: usize,
    device: Device,
}

impl ReplicatedModel {
    /// Wrap `inner`; a component without the Model capability is handed back.
    pub fn wrap(inner: Box<dyn Component>, replicas: usize) -> Result<Self, Box<dyn Component>> {
        if inner.as_model().is_none() {
            return Err(inner);
        }
        Ok(Self {
            inner,
            replicas: replicas.max(1),
            device: Device::Cpu,
        })
    }

    pub fn inner(&self) -> &dyn Component {
        self.inner.as_ref()
    }

    pub fn into_inner(self) -> Box<dyn Component> {
        self.inner
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    fn replica_devices(&self, chunks: usize) -> Vec<Device> {
        (0..chunks)
            .map(|replica| match self.device {
                Device::Cuda(_) => Device::Cuda(replica),
                Device::Cpu => Device::Cpu,
            })
            .collect()
    }

    /// Run the wrapped model chunk by chunk; the result is a new container.
    pub fn forward_replicated(&mut self, streams: &DataStreams) -> Result<DataStreams, StreamError> {
        let batch = streams
            .batch_size()
            .ok()
            .or_else(|| {
                streams.iter().find_map(|(_, value)| match value {
                    Value::Tensor(tensor) => Some(tensor.batch_size()),
                    _ => None,
                })
            })
            .unwrap_or(1);
        let chunks = self.replicas.min(batch).max(1);

        let mut parts: Vec<DataStreams> = (0..chunks).map(|_| streams.sibling()).collect();
        for (key, value) in streams.iter() {
            let pieces = value.scatter(chunks);
            if pieces.len() == chunks {
                for (part, piece) in parts.iter_mut().zip(pieces) {
                    part.publish(key.clone(), piece)?;
                }
            } else {
                for part in parts.iter_mut() {
                    part.publish(key.clone(), value.clone())?;
                }
            }
        }

        for (part, device) in parts.iter_mut().zip(self.replica_devices(chunks)) {
            part.to_device(device);
            self.inner.process(part)?;
        }

        let mut gathered = streams.sibling();
        let outputs = self.inner.output_data_definitions();
        for key in outputs.names() {
            let values = parts
                .iter()
                .map(|part| part.get(key))
                .collect::<Result<Vec<_>, _>>()?;
            let value = gather(key, &values, self.device, &gathered)?;
            gathered.publish(key, value)?;
        }
        gathered.publish(REPLICA_COUNT_STREAM, Value::Integers(vec![chunks]))?;
        Ok(gathered)
    }

    fn model(&self) -> Option<&dyn Model> {
        self.inner.as_model()
    }

    fn not_a_model(&self) -> CheckpointError {
        CheckpointError::StateMismatch {
            model: self.inner.name().to_string(),
            reason: "wrapped component is not a model".to_string(),
        }
    }
}

/// Copy the `declared` outputs from `source` into `target`.
pub(crate) fn copy_declared_outputs(
    declared: &DataDefinitions,
    source: &DataStreams,
    target: &mut DataStreams,
) -> Result<(), StreamError> {
    for key in declared.names() {
        target.publish(key, source.get(key)?.clone())?;
    }
    Ok(())
}

fn kind_mismatch(key: &str, expected: &str, found: &Value) -> StreamError {
    StreamError::KindMismatch {
        key: key.to_string(),
        expected: expected.to_string(),
        found: found.kind().to_string(),
    }
}

fn gather(key: &str, values: &[&Value], device: Device, target: &DataStreams) -> Result<Value, StreamError> {
    let first = match values.first() {
        Some(first) => *first,
        None => return Err(StreamError::Missing(key.to_string())),
    };

    match first {
        Value::Tensor(_) => {
            let mut tensors = Vec::with_capacity(values.len());
            for value in values.iter().copied() {
                match value {
                    Value::Tensor(tensor) => tensors.push(tensor.clone()),
                    other => return Err(kind_mismatch(key, "tensor", other)),
                }
            }
            Ok(Value::Tensor(Tensor::concat_batch(&tensors, device)?))
        }
        Value::Integers(_) => {
            let mut items = Vec::new();
            for value in values.iter().copied() {
                match value {
                    Value::Integers(part) => items.extend_from_slice(part),
                    other => return Err(kind_mismatch(key, "integers", other)),
                }
            }
            Ok(Value::Integers(items))
        }
        Value::Strings(_) => {
            let mut items = Vec::new();
            for value in values.iter().copied() {
                match value {
                    Value::Strings(part) => items.extend_from_slice(part),
                    other => return Err(kind_mismatch(key, "strings", other)),
                }
            }
            Ok(Value::Strings(items))
        }
        Value::Loss(_) => {
            let mut total = 0.0;
            for value in values.iter().copied() {
                match value {
                    Value::Loss(loss) => total += loss.item(),
                    other => return Err(kind_mismatch(key, "loss", other)),
                }
            }
            let mean = total / values.len() as f64;
            Ok(Value::Loss(LossValue::on_tape(mean, target.tape())))
        }
        Value::Float(_) => {
            let mut total = 0.0;
            for value in values.iter().copied() {
                match value {
                    Value::Float(number) => total += *number,
                    other => return Err(kind_mismatch(key, "float", other)),
                }
            }
            Ok(Value::Float(total / values.len() as f64))
        }
    }
}

impl Component for ReplicatedModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn type_name(&self) -> &str {
        self.inner.type_name()
    }

    fn config(&self) -> &ComponentConfig {
        self.inner.config()
    }

    fn input_data_definitions(&self) -> DataDefinitions {
        self.inner.input_data_definitions()
    }

    fn output_data_definitions(&self) -> DataDefinitions {
        self.inner.output_data_definitions()
    }

    fn process(&mut self, streams: &mut DataStreams) -> Result<(), StreamError> {
        let gathered = self.forward_replicated(streams)?;
        copy_declared_outputs(&self.inner.output_data_definitions(), &gathered, streams)
    }

    fn add_statistics(&self, collector: &mut StatisticsCollector) {
        self.inner.add_statistics(collector);
    }

    fn collect_statistics(
        &self,
        collector: &mut StatisticsCollector,
        streams: &DataStreams,
    ) -> Result<(), StatisticsError> {
        self.inner.collect_statistics(collector, streams)
    }

    fn add_aggregators(&self, aggregator: &mut StatisticsAggregator) {
        self.inner.add_aggregators(aggregator);
    }

    fn aggregate_statistics(
        &self,
        collector: &StatisticsCollector,
        aggregator: &mut StatisticsAggregator,
    ) -> Result<(), StatisticsError> {
        self.inner.aggregate_statistics(collector, aggregator)
    }

    fn as_model(&self) -> Option<&dyn Model> {
        Some(self)
    }

    fn as_model_mut(&mut self) -> Option<&mut dyn Model> {
        Some(self)
    }

    fn as_loss(&self) -> Option<&dyn Loss> {
        self.inner.as_loss()
    }

    fn as_replicated_mut(&mut self) -> Option<&mut ReplicatedModel> {
        Some(self)
    }
}

impl Model for ReplicatedModel {
    fn named_parameters(&self) -> Vec<NamedParameter<'_>> {
        self.model()
            .map(|model| model.named_parameters())
            .unwrap_or_default()
    }

    fn load_parameters(&mut self, state: &ModelState) -> Result<(), CheckpointError> {
        let error = self.not_a_model();
        match self.inner.as_model_mut() {
            Some(model) => model.load_parameters(state),
            None => Err(error),
        }
    }

    fn is_frozen(&self) -> bool {
        self.model().map(|model| model.is_frozen()).unwrap_or(false)
    }

    fn set_frozen(&mut self, frozen: bool) {
        if let Some(model) = self.inner.as_model_mut() {
            model.set_frozen(frozen);
        }
    }

    fn mode(&self) -> Mode {
        self.model().map(|model| model.mode()).unwrap_or_default()
    }

    fn set_mode(&mut self, mode: Mode) {
        if let Some(model) = self.inner.as_model_mut() {
            model.set_mode(mode);
        }
    }

    fn move_to(&mut self, device: Device) {
        self.device = device;
        if let Some(model) = self.inner.as_model_mut() {
            model.move_to(device);
        }
    }

    fn is_replicable(&self) -> bool {
        false
    }

    fn save_to_checkpoint(&self, checkpoint: &mut Checkpoint) -> Result<(), CheckpointError> {
        match self.model() {
            Some(model) => model.save_to_checkpoint(checkpoint),
            None => Err(self.not_a_model()),
        }
    }

    fn load_from_checkpoint(
        &mut self,
        checkpoint: &Checkpoint,
        source: Option<&str>,
    ) -> Result<(), CheckpointError> {
        let error = self.not_a_model();
        match self.inner.as_model_mut() {
            Some(model) => model.load_from_checkpoint(checkpoint, source),
            None => Err(error),
        }
    }

    fn summarize(&self) -> String {
        self.model().map(|model| model.summarize()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{LinearClassifier, NllLoss};
    use crate::config::RuntimeContext;
    use crate::streams::INDICES_STREAM;

    fn classifier() -> Box<dyn Component> {
        let config =
            ComponentConfig::from_yaml("clf", "type: linear_classifier\ninput_size: 2\nnum_classes: 2\n").unwrap();
        Box::new(LinearClassifier::new("clf", &config, &mut RuntimeContext::new()).unwrap())
    }

    fn batch(rows: usize) -> DataStreams {
        let mut streams = DataStreams::new();
        streams.publish(INDICES_STREAM, (0..rows).collect::<Vec<_>>()).unwrap();
        let data = (0..rows * 2).map(|v| v as f32 * 0.1).collect();
        streams.publish("inputs", Tensor::new(data, vec![rows, 2]).unwrap()).unwrap();
        streams
    }

    #[test]
    fn test_only_models_can_be_wrapped() {
        let config = ComponentConfig::from_yaml("nll", "type: nll_loss\n").unwrap();
        let loss: Box<dyn Component> = Box::new(NllLoss::new("nll", &config, &mut RuntimeContext::new()).unwrap());
        let rejected = ReplicatedModel::wrap(loss, 2).err().unwrap();
        assert_eq!(rejected.name(), "nll");
    }

    #[test]
    fn test_wrapper_keeps_identity_and_capabilities() {
        let wrapped = ReplicatedModel::wrap(classifier(), 2).ok().unwrap();
        assert_eq!(wrapped.name(), "clf");
        assert!(wrapped.capabilities().is_model());
        assert!(!wrapped.is_replicable());
    }

    #[test]
    fn test_gathered_outputs_match_single_model() {
        let mut reference = classifier();
        let mut single = batch(5);
        reference.process(&mut single).unwrap();

        let mut wrapped = ReplicatedModel::wrap(classifier(), 2).ok().unwrap();
        let gathered = wrapped.forward_replicated(&batch(5)).unwrap();

        assert_eq!(gathered.tensor("predictions").unwrap(), single.tensor("predictions").unwrap());
        assert_eq!(gathered.integers(REPLICA_COUNT_STREAM).unwrap(), &[2]);
        assert!(!gathered.contains("inputs"));
    }

    #[test]
    fn test_replicas_capped_by_batch_size() {
        let mut wrapped = ReplicatedModel::wrap(classifier(), 4).ok().unwrap();
        let gathered = wrapped.forward_replicated(&batch(1)).unwrap();
        assert_eq!(gathered.integers(REPLICA_COUNT_STREAM).unwrap(), &[1]);
        assert_eq!(gathered.tensor("predictions").unwrap().shape(), &[1, 2]);
    }

    #[test]
    fn test_process_copies_only_declared_outputs() {
        let mut wrapped = ReplicatedModel::wrap(classifier(), 2).ok().unwrap();
        let mut streams = batch(4);
        wrapped.process(&mut streams).unwrap();

        assert!(streams.contains("predictions"));
        assert!(!streams.contains(REPLICA_COUNT_STREAM));
    }

    #[test]
    fn test_checkpoint_key_is_wrapped_model_name() {
        let wrapped = ReplicatedModel::wrap(classifier(), 2).ok().unwrap();
        let mut checkpoint = Checkpoint::new("pipe", 0, 1.0, "training");
        wrapped.save_to_checkpoint(&mut checkpoint).unwrap();
        assert!(checkpoint.contains_model("clf"));
    }
}
