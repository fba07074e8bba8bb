// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt::Write as _;

use super::capabilities::{Capabilities, Capability};
use crate::checkpoint::{Checkpoint, ModelState};
use crate::config::ComponentConfig;
use crate::engine::ReplicatedModel;
use crate::errors::{CheckpointError, ConfigurationError, SchemaError, StatisticsError, StreamError};
use crate::statistics::{StatisticsAggregator, StatisticsCollector};
use crate::streams::{DataDefinitions, DataStreams, Device, KeyMappings, Tensor};

/// A named, configured unit of the pipeline.
///
/// Schemas are static: `input_data_definitions` and `output_data_definitions`
/// are derived from configuration alone and use the already mapped stream
/// names. `process` reads its inputs from the shared container and publishes
/// its outputs into it.
///
/// Roles are exposed through the `as_*` accessors; [`capabilities`](Self::capabilities)
/// is derived from them, so it stays correct after a component is wrapped.
pub trait Component: Send + Sync {
    fn name(&self) -> &str;

    /// Registered type name (the `type` key of the configuration section).
    fn type_name(&self) -> &str;

    fn config(&self) -> &ComponentConfig;

    fn input_data_definitions(&self) -> DataDefinitions;

    fn output_data_definitions(&self) -> DataDefinitions;

    fn process(&mut self, streams: &mut DataStreams) -> Result<(), StreamError>;

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::none();
        if self.as_model().is_some() {
            capabilities = capabilities.with(Capability::Model);
        }
        if self.as_loss().is_some() {
            capabilities = capabilities.with(Capability::Loss);
        }
        if self.as_task().is_some() {
            capabilities = capabilities.with(Capability::Task);
        }
        capabilities
    }

    /// Check the declared inputs against the accumulated schema.
    fn handshake_input_definitions(&self, available: &DataDefinitions) -> Vec<SchemaError> {
        self.input_data_definitions().check_inputs(available)
    }

    /// Append the declared outputs to the accumulated schema.
    fn export_output_definitions(&self, schema: &mut DataDefinitions) -> Vec<SchemaError> {
        schema.export(&self.output_data_definitions())
    }

    fn add_statistics(&self, _collector: &mut StatisticsCollector) {}

    fn collect_statistics(
        &self,
        _collector: &mut StatisticsCollector,
        _streams: &DataStreams,
    ) -> Result<(), StatisticsError> {
        Ok(())
    }

    fn add_aggregators(&self, _aggregator: &mut StatisticsAggregator) {}

    fn aggregate_statistics(
        &self,
        _collector: &StatisticsCollector,
        _aggregator: &mut StatisticsAggregator,
    ) -> Result<(), StatisticsError> {
        Ok(())
    }

    /// Schema listing of this component for the pipeline summary.
    fn summarize_io(&self, priority: f64) -> String {
        let mut summary = String::new();
        let _ = writeln!(summary, "  + {} ({}) [{}]", self.name(), self.type_name(), priority);
        let _ = writeln!(summary, "      Inputs:");
        for (key, definition) in self.input_data_definitions().iter() {
            let _ = writeln!(summary, "        {}: {}", key, definition);
        }
        let _ = writeln!(summary, "      Outputs:");
        for (key, definition) in self.output_data_definitions().iter() {
            let _ = writeln!(summary, "        {}: {}", key, definition);
        }
        summary
    }

    fn as_model(&self) -> Option<&dyn Model> {
        None
    }

    fn as_model_mut(&mut self) -> Option<&mut dyn Model> {
        None
    }

    fn as_loss(&self) -> Option<&dyn Loss> {
        None
    }

    fn as_task(&self) -> Option<&dyn Task> {
        None
    }

    /// Set only by the data-parallel wrapper.
    fn as_replicated_mut(&mut self) -> Option<&mut ReplicatedModel> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Train,
    Eval,
}

/// A parameter tensor exposed for optimizers, summaries and checkpoints.
#[derive(Debug, Clone)]
pub struct NamedParameter<'a> {
    pub name: String,
    pub tensor: &'a Tensor,
    pub trainable: bool,
}

/// A component with trainable parameters.
pub trait Model: Component {
    fn named_parameters(&self) -> Vec<NamedParameter<'_>>;

    /// Replace parameters with `state`; shapes must match the current ones.
    fn load_parameters(&mut self, state: &ModelState) -> Result<(), CheckpointError>;

    fn is_frozen(&self) -> bool;

    fn set_frozen(&mut self, frozen: bool);

    fn mode(&self) -> Mode;

    fn set_mode(&mut self, mode: Mode);

    fn move_to(&mut self, device: Device);

    /// Whether the model may be wrapped for data-parallel execution.
    fn is_replicable(&self) -> bool {
        true
    }

    fn freeze(&mut self) {
        self.set_frozen(true);
    }

    fn unfreeze(&mut self) {
        self.set_frozen(false);
    }

    fn train(&mut self) {
        self.set_mode(Mode::Train);
    }

    fn eval(&mut self) {
        self.set_mode(Mode::Eval);
    }

    fn state(&self) -> ModelState {
        let mut state = ModelState::new();
        for parameter in self.named_parameters() {
            state.insert(parameter.name, parameter.tensor);
        }
        state
    }

    fn save_to_checkpoint(&self, checkpoint: &mut Checkpoint) -> Result<(), CheckpointError> {
        checkpoint.insert_model(self.name(), &self.state())
    }

    /// Restore from the record entry named `source`, or from this model's own name.
    fn load_from_checkpoint(
        &mut self,
        checkpoint: &Checkpoint,
        source: Option<&str>,
    ) -> Result<(), CheckpointError> {
        let state = checkpoint.model_state(source.unwrap_or(self.name()))?;
        self.load_parameters(&state)
    }

    fn trainable_parameter_count(&self) -> usize {
        self.named_parameters()
            .iter()
            .filter(|parameter| parameter.trainable)
            .map(|parameter| parameter.tensor.numel())
            .sum()
    }

    fn summarize(&self) -> String {
        let parameters = self.named_parameters();
        let matrices: Vec<String> = parameters
            .iter()
            .map(|parameter| format!("({}, {:?})", parameter.name, parameter.tensor.shape()))
            .collect();
        let count = |trainable: bool| -> usize {
            parameters
                .iter()
                .filter(|parameter| parameter.trainable == trainable)
                .map(|parameter| parameter.tensor.numel())
                .sum()
        };

        let mut summary = String::new();
        let _ = writeln!(summary, "{} ({})", self.name(), self.type_name());
        let _ = writeln!(summary, "      Matrices: [{}]", matrices.join(", "));
        let _ = writeln!(summary, "      Trainable Params: {}", count(true));
        let _ = writeln!(summary, "      Non-trainable Params: {}", count(false));
        summary
    }
}

/// A component publishing scalar loss values.
pub trait Loss: Component {
    /// Mapped names of the loss streams, in backward order.
    fn loss_keys(&self) -> Vec<String>;
}

/// Source of batches. Never part of a pipeline body.
pub trait Task: Component {
    /// Schema of the streams every batch carries.
    fn data_definitions(&self) -> DataDefinitions {
        self.output_data_definitions()
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn batch(&self, indices: &[usize]) -> Result<DataStreams, StreamError>;
}

/// Shared state of every built-in component: identity, configuration and
/// stream-name mappings.
#[derive(Debug, Clone)]
pub struct ComponentBase {
    name: String,
    type_name: String,
    config: ComponentConfig,
    keymappings: KeyMappings,
    global_mappings: KeyMappings,
}

impl ComponentBase {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        config: ComponentConfig,
    ) -> Result<Self, ConfigurationError> {
        let keymappings = config.keymappings()?;
        let global_mappings = config.global_mappings()?;
        Ok(Self {
            name: name.into(),
            type_name: type_name.into(),
            config,
            keymappings,
            global_mappings,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    pub fn keymappings(&self) -> &KeyMappings {
        &self.keymappings
    }

    /// Actual stream name for the default name `key`.
    pub fn key(&self, key: &str) -> String {
        self.keymappings.map(key).to_string()
    }

    /// Actual global-parameter name for the default name `key`.
    pub fn global_key(&self, key: &str) -> String {
        self.global_mappings.map(key).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_applies_keymappings() {
        let config = ComponentConfig::from_yaml(
            "clf",
            r#"
type: linear_classifier
priority: 1
keymappings:
  inputs: embeddings
globals:
  input_size: embedding_size
"#,
        )
        .unwrap();

        let base = ComponentBase::new("clf", "linear_classifier", config).unwrap();
        assert_eq!(base.key("inputs"), "embeddings");
        assert_eq!(base.key("predictions"), "predictions");
        assert_eq!(base.global_key("input_size"), "embedding_size");
    }

    #[test]
    fn test_base_rejects_malformed_keymappings() {
        let config =
            ComponentConfig::from_yaml("clf", "type: x\npriority: 1\nkeymappings: [a, b]\n").unwrap();
        assert!(matches!(
            ComponentBase::new("clf", "x", config),
            Err(ConfigurationError::InvalidParameter { .. })
        ));
    }
}
