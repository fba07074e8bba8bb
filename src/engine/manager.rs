// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The Pipeline Manager: owner of the priority-ordered component sequence.
//!
//! A manager goes through a fixed life cycle:
//!
//! 1. [`PipelineManager::build`] resolves priorities from the configuration and
//!    instantiates every section through a [`ComponentFactory`], classifying the
//!    results into models and losses.
//! 2. [`PipelineManager::handshake`] walks the components in order, checking
//!    each declared input against the schema accumulated so far and appending
//!    the declared outputs.
//! 3. [`PipelineManager::forward`], [`PipelineManager::backward`] and the
//!    statistics hooks run once per batch.
//! 4. [`PipelineManager::save`] persists checkpoints and tracks the plateau
//!    counter used for early stopping.
//!
//! Build and handshake are best-effort: every problem is logged and counted so
//! a single call reports all of them. Callers inspect the returned count and
//! decide whether to abort.
//!
//! # Example
//! ```
//! use pipewright::config::{PipelineConfig, RuntimeContext};
//! use pipewright::engine::{ComponentFactory, PipelineManager};
//!
//! let config = PipelineConfig::from_yaml_str(
//!     "name: demo\n\
//!      classifier:\n  type: linear_classifier\n  priority: 1\n  input_size: 4\n  num_classes: 2\n\
//!      nll:\n  type: nll_loss\n  priority: 2\n",
//! )
//! .unwrap();
//!
//! let mut pipeline = PipelineManager::new(config, RuntimeContext::new());
//! assert_eq!(pipeline.build(&ComponentFactory::with_builtins()), 0);
//! assert_eq!(pipeline.len(), 2);
//! assert_eq!(pipeline.models().count(), 1);
//! ```

use std::fmt::Write;

use crate::config::{
    disabled_components, resolve_priorities, ComponentConfig, ComponentRegistry, PipelineConfig, Priority,
    RegistryEntry, RuntimeContext,
};
use crate::errors::ConfigurationError;
use crate::observability::messages::build::{
    ComponentCreating, ComponentCreationFailed, ComponentDisabled, OrderingFailed, PipelineBuildCompleted,
    PipelineBuildStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{Capability, Component, Loss, Model};

use super::factory::ComponentFactory;

/// Status recorded before the first best checkpoint is written.
pub const INITIAL_BEST_STATUS: &str = "Unknown";

const RULE_WIDTH: usize = 80;

pub struct PipelineManager {
    pub(crate) name: String,
    pub(crate) config: PipelineConfig,
    pub(crate) context: RuntimeContext,
    pub(crate) registry: ComponentRegistry,
    /// Priorities of components exposing the Model capability, ascending.
    pub(crate) models: Vec<Priority>,
    /// Priorities of components exposing the Loss capability, ascending.
    pub(crate) losses: Vec<Priority>,
    pub(crate) best_loss: f64,
    pub(crate) best_status: String,
    pub(crate) validation_loss_down_counter: u32,
}

impl PipelineManager {
    pub fn new(config: PipelineConfig, context: RuntimeContext) -> Self {
        Self {
            name: config.name().to_string(),
            config,
            context,
            registry: ComponentRegistry::new(),
            models: Vec::new(),
            losses: Vec::new(),
            best_loss: f64::INFINITY,
            best_status: INITIAL_BEST_STATUS.to_string(),
            validation_loss_down_counter: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RuntimeContext {
        &mut self.context
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    pub fn best_status(&self) -> &str {
        &self.best_status
    }

    /// Consecutive non-improving saves since the last best checkpoint.
    pub fn validation_loss_down_counter(&self) -> u32 {
        self.validation_loss_down_counter
    }

    /// Resolve priorities and instantiate every enabled section.
    ///
    /// Returns the number of configuration errors; zero means the pipeline
    /// is executable. Ordering errors stop the build before instantiation.
    pub fn build(&mut self, factory: &ComponentFactory) -> usize {
        self.registry.clear();
        self.models.clear();
        self.losses.clear();

        let disabled = disabled_components(&self.config, &self.context.disable);
        for component in &disabled {
            ComponentDisabled {
                component: component.as_str(),
            }
            .log();
        }

        let (registry, ordering_errors) = resolve_priorities(&self.config, &disabled);
        for error in &ordering_errors {
            OrderingFailed { error }.log();
        }
        self.registry = registry;

        let started = PipelineBuildStarted {
            pipeline: &self.name,
            component_count: self.registry.len(),
        };
        started.log();
        let _build = started.span("pipeline_build").entered();

        if !ordering_errors.is_empty() {
            return ordering_errors.len();
        }

        let mut errors = 0;
        for priority in self.registry.priorities() {
            let name = match self.registry.get(priority) {
                Some(entry) => entry.name().to_string(),
                None => continue,
            };
            let Some(section) = self.config.section(&name) else {
                continue;
            };

            match self.instantiate(factory, &name, &section, priority) {
                Ok(component) => {
                    self.registry.install(priority, component);
                }
                Err(error) => {
                    ComponentCreationFailed {
                        component: &name,
                        error: &error,
                    }
                    .log();
                    errors += 1;
                }
            }
        }

        self.classify();

        PipelineBuildCompleted {
            pipeline: &self.name,
            components: self.registry.components().count(),
            models: self.models.len(),
            losses: self.losses.len(),
            errors,
        }
        .log();

        errors
    }

    fn instantiate(
        &mut self,
        factory: &ComponentFactory,
        name: &str,
        section: &ComponentConfig,
        priority: Priority,
    ) -> Result<Box<dyn Component>, ConfigurationError> {
        ComponentCreating {
            component: name,
            component_type: section.type_name().unwrap_or("?"),
            priority: priority.value(),
        }
        .log();

        let (component, capabilities) = factory.build(name, section, &mut self.context)?;
        if ComponentFactory::check_inheritance(&capabilities, Capability::Task) {
            return Err(ConfigurationError::TaskInPipeline {
                component: name.to_string(),
                component_type: component.type_name().to_string(),
            });
        }
        Ok(component)
    }

    /// Re-derive the model and loss lists from the capability sets of the
    /// components currently installed.
    pub(crate) fn classify(&mut self) {
        let with_role = |role: Capability| -> Vec<Priority> {
            self.registry
                .components()
                .filter(|(_, component)| ComponentFactory::check_inheritance(&component.capabilities(), role))
                .map(|(priority, _)| priority)
                .collect()
        };
        let models = with_role(Capability::Model);
        let losses = with_role(Capability::Loss);
        self.models = models;
        self.losses = losses;
    }

    /// Number of components in the pipeline body (tasks excluded).
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Component at execution position `number`, if it was built.
    pub fn get(&self, number: usize) -> Option<&dyn Component> {
        self.registry.nth(number).and_then(|(_, entry)| entry.component())
    }

    pub fn get_mut(&mut self, number: usize) -> Option<&mut (dyn Component + 'static)> {
        let (priority, _) = self.registry.nth(number)?;
        self.registry.component_mut(priority)
    }

    /// Models in execution order.
    pub fn models(&self) -> impl Iterator<Item = &dyn Model> + '_ {
        self.models
            .iter()
            .filter_map(move |priority| self.registry.component(*priority))
            .filter_map(|component| component.as_model())
    }

    /// Losses in execution order.
    pub fn losses(&self) -> impl Iterator<Item = &dyn Loss> + '_ {
        self.losses
            .iter()
            .filter_map(move |priority| self.registry.component(*priority))
            .filter_map(|component| component.as_loss())
    }

    pub fn summarize_all_components_header(&self) -> String {
        let mut summary = String::new();
        let _ = writeln!(summary, "Summary of the created pipeline:");
        let _ = writeln!(summary, "{}", "=".repeat(RULE_WIDTH));
        let _ = writeln!(summary, "Pipeline");
        let _ = writeln!(summary, "  + Component name (type) [priority]");
        let _ = writeln!(summary, "      Inputs:");
        let _ = writeln!(summary, "        key: dims, kinds, description");
        let _ = writeln!(summary, "      Outputs:");
        let _ = writeln!(summary, "        key: dims, kinds, description");
        let _ = writeln!(summary, "{}", "=".repeat(RULE_WIDTH));
        summary
    }

    /// Priority-ordered I/O listing; entries that failed to build are marked.
    pub fn summarize_all_components(&self) -> String {
        let mut summary = String::new();
        for (priority, entry) in self.registry.iter() {
            match entry {
                RegistryEntry::Built(component) => summary.push_str(&component.summarize_io(priority.value())),
                RegistryEntry::Unbuilt(name) => {
                    let _ = writeln!(summary, "  + {} (None: not created) [{}]", name, priority);
                }
            }
        }
        let _ = writeln!(summary, "{}", "=".repeat(RULE_WIDTH));
        summary
    }

    pub fn summarize_models_header(&self) -> String {
        let mut summary = String::new();
        let _ = writeln!(summary, "Summary of the models in the pipeline:");
        let _ = writeln!(summary, "{}", "=".repeat(RULE_WIDTH));
        let _ = writeln!(summary, "Model name (type)");
        let _ = writeln!(summary, "      Matrices: [(name, dims), ...]");
        let _ = writeln!(summary, "      Trainable Params: #");
        let _ = writeln!(summary, "      Non-trainable Params: #");
        let _ = writeln!(summary, "{}", "=".repeat(RULE_WIDTH));
        summary
    }

    pub fn summarize_models(&self) -> String {
        self.models().map(|model| model.summarize()).collect()
    }
}
