// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SchemaError;
use crate::observability::messages::handshake::{HandshakeFailed, HandshakeSucceeded, SchemaMismatch};
use crate::observability::messages::StructuredLog;
use crate::streams::DataDefinitions;

use super::manager::PipelineManager;

impl PipelineManager {
    /// Check every component's inputs against the schema accumulated so far,
    /// then append its outputs.
    ///
    /// `schema` starts as the task's definitions and ends as the full stream
    /// layout of one batch. Every mismatch is logged and counted; the return
    /// value is the total error count. Unbuilt entries are skipped.
    pub fn handshake(&self, schema: &mut DataDefinitions) -> usize {
        let mut errors = 0;

        for (_, component) in self.registry.components() {
            let mut report = |found: Vec<SchemaError>| {
                for error in &found {
                    SchemaMismatch {
                        component: component.name(),
                        error,
                    }
                    .log();
                }
                errors += found.len();
            };

            report(component.handshake_input_definitions(schema));
            report(component.export_output_definitions(schema));
        }

        if errors == 0 {
            HandshakeSucceeded {
                pipeline: &self.name,
                schema: &*schema,
            }
            .log();
        } else {
            HandshakeFailed {
                pipeline: &self.name,
                errors,
            }
            .log();
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{PipelineConfig, RuntimeContext};
    use crate::engine::{ComponentFactory, PipelineManager};
    use crate::errors::SchemaError;
    use crate::streams::{DataDefinition, DataDefinitions, ValueKind};

    fn built(yaml: &str) -> PipelineManager {
        let config = PipelineConfig::from_yaml_str(yaml).unwrap();
        let mut manager = PipelineManager::new(config, RuntimeContext::new());
        assert_eq!(manager.build(&ComponentFactory::with_builtins()), 0);
        manager
    }

    fn task_schema(input_size: i64) -> DataDefinitions {
        [
            ("indices", DataDefinition::new(&[-1], &[ValueKind::Integers], "indices")),
            ("inputs", DataDefinition::new(&[-1, input_size], &[ValueKind::Tensor], "inputs")),
            ("targets", DataDefinition::new(&[-1], &[ValueKind::Integers], "targets")),
        ]
        .into_iter()
        .collect()
    }

    const CLASSIFIER: &str = "\
classifier:
  type: linear_classifier
  priority: 1
  input_size: 4
  num_classes: 3
nll:
  type: nll_loss
  priority: 2
";

    #[test]
    fn test_matching_chain_has_no_errors() {
        let manager = built(CLASSIFIER);
        let mut schema = task_schema(4);
        assert_eq!(manager.handshake(&mut schema), 0);
        assert_eq!(schema.names(), vec!["indices", "inputs", "targets", "predictions", "loss"]);
    }

    #[test]
    fn test_dimension_mismatch_is_counted() {
        let manager = built(CLASSIFIER);
        let mut schema = task_schema(5);
        assert_eq!(manager.handshake(&mut schema), 1);
        assert!(schema.contains("loss"));
    }

    #[test]
    fn test_inputs_only_see_earlier_outputs() {
        let manager = built(
            "\
nll:
  type: nll_loss
  priority: 1
classifier:
  type: linear_classifier
  priority: 2
  input_size: 4
  num_classes: 3
",
        );
        let mut schema = task_schema(4);
        // The loss runs first and cannot see `predictions` yet.
        assert_eq!(manager.handshake(&mut schema), 1);
    }

    #[test]
    fn test_missing_field_lists_available_streams() {
        let manager = built(CLASSIFIER);
        let mut schema = DataDefinitions::new();
        let inputs = manager.get(0).unwrap().input_data_definitions();
        let errors = inputs.check_inputs(&schema);
        assert_eq!(
            errors,
            vec![SchemaError::MissingField {
                field: "inputs".to_string(),
                available: String::new(),
            }]
        );
        // the classifier still exports predictions, so only inputs and targets are missing
        assert_eq!(manager.handshake(&mut schema), 2);
    }
}
