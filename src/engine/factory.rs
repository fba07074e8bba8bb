// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;

use crate::components::{
    losses, models, statistics, tasks, AccuracyStatistics, BatchSizeStatistics, LinearClassifier,
    NllLoss, SyntheticClassificationTask,
};
use crate::config::{ComponentConfig, RuntimeContext};
use crate::errors::ConfigurationError;
use crate::traits::{Capabilities, Capability, Component};

/// Builds a component from its name, section and the run context.
pub type Constructor = Box<
    dyn Fn(&str, &ComponentConfig, &mut RuntimeContext) -> Result<Box<dyn Component>, ConfigurationError>
        + Send
        + Sync,
>;

/// Registry of component constructors keyed by the `type` of a section.
pub struct ComponentFactory {
    constructors: BTreeMap<String, Constructor>,
}

impl ComponentFactory {
    /// Factory without any registered type.
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Factory knowing every built-in component type.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register(models::linear_classifier::TYPE_NAME, |name, config, context| {
            Ok(Box::new(LinearClassifier::new(name, config, context)?))
        });
        factory.register(losses::nll_loss::TYPE_NAME, |name, config, context| {
            Ok(Box::new(NllLoss::new(name, config, context)?))
        });
        factory.register(statistics::batch_size::TYPE_NAME, |name, config, context| {
            Ok(Box::new(BatchSizeStatistics::new(name, config, context)?))
        });
        factory.register(statistics::accuracy::TYPE_NAME, |name, config, context| {
            Ok(Box::new(AccuracyStatistics::new(name, config, context)?))
        });
        factory.register(tasks::synthetic::TYPE_NAME, |name, config, context| {
            Ok(Box::new(SyntheticClassificationTask::new(name, config, context)?))
        });
        factory
    }

    /// Register (or replace) the constructor of `type_name`.
    pub fn register<F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn(&str, &ComponentConfig, &mut RuntimeContext) -> Result<Box<dyn Component>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors.insert(type_name.into(), Box::new(constructor));
    }

    /// Instantiate the component described by `config` and report its capabilities.
    pub fn build(
        &self,
        name: &str,
        config: &ComponentConfig,
        context: &mut RuntimeContext,
    ) -> Result<(Box<dyn Component>, Capabilities), ConfigurationError> {
        let type_name = config.type_name()?;
        let constructor =
            self.constructors
                .get(type_name)
                .ok_or_else(|| ConfigurationError::UnknownComponentType {
                    component: name.to_string(),
                    component_type: type_name.to_string(),
                })?;
        let component = constructor(name, config, context)?;
        let capabilities = component.capabilities();
        Ok((component, capabilities))
    }

    /// Whether a component with `capabilities` plays `role`.
    pub fn check_inheritance(capabilities: &Capabilities, role: Capability) -> bool {
        capabilities.check(role)
    }

    /// Registered type names, sorted.
    pub fn list_available_types(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    pub fn is_type_available(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }
}

impl Default for ComponentFactory {
    fn default() -> Self {
        Self::with_builtins()
    }
}
