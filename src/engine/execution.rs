// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-batch execution and model state transitions.

use crate::config::consts::FREEZE_KEY;
use crate::config::RegistryEntry;
use crate::errors::{ConfigurationError, PipelineError, StreamError};
use crate::observability::messages::execution::{
    BackwardStarted, ModeChanged, ModelFrozen, ModelReplicated, ModelsMoving,
};
use crate::observability::messages::StructuredLog;
use crate::streams::DataStreams;
use crate::traits::{Component, Mode, NamedParameter};

use super::manager::PipelineManager;
use super::replicated::{copy_declared_outputs, ReplicatedModel};

fn component_failure(component: &str, source: StreamError) -> PipelineError {
    PipelineError::Component {
        component: component.to_string(),
        source,
    }
}

impl PipelineManager {
    /// Run every component, in priority order, against `streams`.
    ///
    /// A replicated model computes into a separate container and only its
    /// declared outputs are copied back. After any other component the
    /// container is moved to the context device again.
    pub fn forward(&mut self, streams: &mut DataStreams) -> Result<(), PipelineError> {
        let device = self.context.device;
        if self.context.use_gpu {
            streams.to_device(device);
        }

        for (priority, entry) in self.registry.iter_mut() {
            let component = match entry {
                RegistryEntry::Built(component) => component,
                RegistryEntry::Unbuilt(name) => {
                    return Err(PipelineError::NotBuilt {
                        name: name.clone(),
                        priority: priority.value(),
                    })
                }
            };

            if let Some(replicated) = component.as_replicated_mut() {
                let outputs = replicated
                    .forward_replicated(streams)
                    .map_err(|source| component_failure(replicated.name(), source))?;
                copy_declared_outputs(&replicated.inner().output_data_definitions(), &outputs, streams)
                    .map_err(|source| component_failure(replicated.name(), source))?;
            } else {
                component
                    .process(streams)
                    .map_err(|source| component_failure(component.name(), source))?;
                streams.to_device(device);
            }
        }
        Ok(())
    }

    /// Propagate gradients from every loss field of every loss component.
    ///
    /// All calls but the last retain the graph; the last one releases it.
    pub fn backward(&self, streams: &DataStreams) -> Result<(), PipelineError> {
        if self.losses.is_empty() {
            return Err(ConfigurationError::NoLossComponents.into());
        }

        let keys: Vec<String> = self.losses().flat_map(|loss| loss.loss_keys()).collect();
        let total_passes = keys.len();
        let started = BackwardStarted { total_passes };
        started.log();
        let _backward = started.span("backward").entered();

        for (pass, key) in keys.iter().enumerate() {
            let retain_graph = pass + 1 < total_passes;
            streams
                .loss(key)?
                .backward(retain_graph)
                .map_err(|source| PipelineError::Gradient {
                    key: key.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    pub fn train(&mut self) {
        self.set_mode(Mode::Train);
    }

    pub fn eval(&mut self) {
        self.set_mode(Mode::Eval);
    }

    fn set_mode(&mut self, mode: Mode) {
        let mut models = 0;
        for priority in &self.models {
            if let Some(model) = self
                .registry
                .component_mut(*priority)
                .and_then(|component| component.as_model_mut())
            {
                match mode {
                    Mode::Train => model.train(),
                    Mode::Eval => model.eval(),
                }
                models += 1;
            }
        }
        ModeChanged { mode, models }.log();
    }

    /// Move every model to the context device.
    ///
    /// With data parallelism enabled, replicable models are first wrapped in a
    /// [`ReplicatedModel`] that takes their slot in the registry; the model and
    /// loss lists are re-derived afterwards.
    pub fn to_device(&mut self) {
        let device = self.context.device;
        let replicas = if self.context.use_data_parallel() {
            self.context.data_parallel_replicas
        } else {
            1
        };
        let moving = ModelsMoving {
            device,
            models: self.models.len(),
            replicas,
        };
        moving.log();
        let _moving = moving.span("to_device").entered();

        for priority in self.models.clone() {
            let mut component = match self.registry.remove(priority) {
                Some(RegistryEntry::Built(component)) => component,
                Some(unbuilt) => {
                    self.registry.insert_name(priority, unbuilt.name()).ok();
                    continue;
                }
                None => continue,
            };

            let replicable = component.as_model().map_or(false, |model| model.is_replicable());
            if replicas > 1 && replicable {
                component = match ReplicatedModel::wrap(component, replicas) {
                    Ok(wrapped) => {
                        ModelReplicated {
                            model: wrapped.name(),
                            replicas,
                        }
                        .log();
                        Box::new(wrapped) as Box<dyn Component>
                    }
                    Err(original) => original,
                };
            }

            if let Some(model) = component.as_model_mut() {
                model.move_to(device);
            }
            self.registry.install(priority, component);
        }

        self.classify();
    }

    /// Freeze models according to their own `freeze` entry, falling back to
    /// the pipeline-wide `freeze` switch. Returns the number of frozen models.
    pub fn freeze_models(&mut self) -> Result<usize, ConfigurationError> {
        let pipeline_wide = self.config.freeze_all()?;
        let mut frozen = 0;

        for priority in &self.models {
            let Some(model) = self
                .registry
                .component_mut(*priority)
                .and_then(|component| component.as_model_mut())
            else {
                continue;
            };

            let own_setting = model.config().get_bool(FREEZE_KEY)?;
            if own_setting.unwrap_or(pipeline_wide) {
                model.freeze();
                ModelFrozen {
                    model: model.name(),
                    pipeline_wide: own_setting.is_none(),
                }
                .log();
                frozen += 1;
            }
        }
        Ok(frozen)
    }

    /// Parameters of every model, tagged with the owning model's name.
    pub fn named_parameters(&self) -> Vec<(&str, NamedParameter<'_>)> {
        self.models()
            .flat_map(|model| {
                let owner = model.name();
                model
                    .named_parameters()
                    .into_iter()
                    .map(move |parameter| (owner, parameter))
            })
            .collect()
    }

    pub fn trainable_parameter_count(&self) -> usize {
        self.models().map(|model| model.trainable_parameter_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{PipelineConfig, RuntimeContext};
    use crate::engine::replicated::REPLICA_COUNT_STREAM;
    use crate::engine::{ComponentFactory, PipelineManager};
    use crate::errors::{ConfigurationError, PipelineError};
    use crate::streams::{DataStreams, Device, Tensor, INDICES_STREAM};
    use crate::traits::Mode;

    const PIPELINE: &str = "\
name: exec
classifier:
  type: linear_classifier
  priority: 1
  input_size: 2
  num_classes: 2
nll:
  type: nll_loss
  priority: 2
";

    fn built(yaml: &str, context: RuntimeContext) -> PipelineManager {
        let config = PipelineConfig::from_yaml_str(yaml).unwrap();
        let mut manager = PipelineManager::new(config, context);
        assert_eq!(manager.build(&ComponentFactory::with_builtins()), 0);
        manager
    }

    fn batch(rows: usize) -> DataStreams {
        let mut streams = DataStreams::new();
        streams.publish(INDICES_STREAM, (0..rows).collect::<Vec<usize>>()).unwrap();
        let data = (0..rows * 2).map(|v| v as f32).collect();
        streams.publish("inputs", Tensor::new(data, vec![rows, 2]).unwrap()).unwrap();
        streams.publish("targets", vec![0usize; rows]).unwrap();
        streams
    }

    #[test]
    fn test_forward_publishes_every_output() {
        let mut manager = built(PIPELINE, RuntimeContext::new());
        let mut streams = batch(3);
        manager.forward(&mut streams).unwrap();

        assert_eq!(streams.tensor("predictions").unwrap().shape(), &[3, 2]);
        assert!(streams.loss("loss").unwrap().item() > 0.0);
    }

    #[test]
    fn test_forward_moves_streams_to_device() {
        let context = RuntimeContext::new().with_device(Device::Cuda(0));
        let mut manager = built(PIPELINE, context);
        let mut streams = batch(2);
        manager.forward(&mut streams).unwrap();
        assert_eq!(streams.tensor("inputs").unwrap().device(), Device::Cuda(0));
        assert_eq!(streams.tensor("predictions").unwrap().device(), Device::Cuda(0));
    }

    #[test]
    fn test_forward_reports_failing_component() {
        let mut manager = built(PIPELINE, RuntimeContext::new());
        let mut streams = DataStreams::new();
        let result = manager.forward(&mut streams);
        assert!(matches!(
            result,
            Err(PipelineError::Component { ref component, .. }) if component == "classifier"
        ));
    }

    #[test]
    fn test_forward_refuses_unbuilt_pipeline() {
        let config = PipelineConfig::from_yaml_str(PIPELINE).unwrap();
        let mut manager = PipelineManager::new(config, RuntimeContext::new());
        assert_eq!(manager.build(&ComponentFactory::new()), 2);
        let result = manager.forward(&mut batch(1));
        assert!(matches!(result, Err(PipelineError::NotBuilt { .. })));
    }

    #[test]
    fn test_backward_without_losses() {
        let manager = built(
            "\
classifier:
  type: linear_classifier
  priority: 1
  input_size: 2
  num_classes: 2
",
            RuntimeContext::new(),
        );
        let result = manager.backward(&batch(1));
        assert!(matches!(
            result,
            Err(PipelineError::Configuration(ConfigurationError::NoLossComponents))
        ));
    }

    #[test]
    fn test_single_backward_releases_graph() {
        let mut manager = built(PIPELINE, RuntimeContext::new());
        let mut streams = batch(2);
        manager.forward(&mut streams).unwrap();
        manager.backward(&streams).unwrap();

        assert_eq!(streams.tape().passes(), vec![false]);
        assert!(matches!(
            manager.backward(&streams),
            Err(PipelineError::Gradient { .. })
        ));
    }

    #[test]
    fn test_eval_and_train_switch_modes() {
        let mut manager = built(PIPELINE, RuntimeContext::new());
        manager.eval();
        assert!(manager.models().all(|model| model.mode() == Mode::Eval));
        manager.train();
        assert!(manager.models().all(|model| model.mode() == Mode::Train));
    }

    #[test]
    fn test_freeze_settings() {
        let mut manager = built(
            "\
freeze: true
first:
  type: linear_classifier
  priority: 1
  input_size: 2
  num_classes: 2
second:
  type: linear_classifier
  priority: 2
  input_size: 2
  num_classes: 2
  freeze: false
  keymappings:
    predictions: second_predictions
",
            RuntimeContext::new(),
        );
        assert_eq!(manager.freeze_models().unwrap(), 1);

        let frozen: Vec<(&str, bool)> = manager.models().map(|m| (m.name(), m.is_frozen())).collect();
        assert_eq!(frozen, vec![("first", true), ("second", false)]);
        assert_eq!(manager.trainable_parameter_count(), 6);
        assert_eq!(manager.named_parameters().len(), 4);
        assert_eq!(manager.named_parameters()[0].0, "first");
    }

    #[test]
    fn test_to_device_wraps_replicable_models() {
        let context = RuntimeContext::new().with_device(Device::Cuda(0)).with_replicas(2);
        let mut manager = built(PIPELINE, context);
        manager.to_device();

        assert_eq!(manager.models().count(), 1);
        assert_eq!(manager.get(0).map(|c| c.name()), Some("classifier"));
        assert!(!manager.models().any(|model| model.is_replicable()));

        let mut streams = batch(4);
        manager.forward(&mut streams).unwrap();
        assert_eq!(streams.tensor("predictions").unwrap().shape(), &[4, 2]);
        assert!(!streams.contains(REPLICA_COUNT_STREAM));
        assert!(streams.contains("loss"));
    }

    #[test]
    fn test_to_device_without_parallelism_keeps_models() {
        let mut manager = built(PIPELINE, RuntimeContext::new().with_device(Device::Cuda(1)));
        manager.to_device();
        assert!(manager.models().all(|model| model.is_replicable()));
        assert!(manager
            .named_parameters()
            .iter()
            .all(|(_, parameter)| parameter.tensor.device() == Device::Cuda(1)));
    }
}
