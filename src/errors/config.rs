// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while ordering, instantiating or configuring pipeline components.
///
/// Every variant is recoverable at the point of origin: the offending component is
/// skipped and its siblings keep building, so a single `build()` surfaces all of them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A component section does not define the `priority` key
    #[error("Section '{section}' does not contain the key 'priority' defining the pipeline order")]
    MissingPriority { section: String },

    /// The `priority` value cannot be read as a floating point number
    #[error("Priority [{value}] in section '{section}' is not a floating point number")]
    InvalidPriority { section: String, value: String },

    /// Two sections share one priority value
    #[error("Found more than one component with the same priority [{priority}]: '{section}' collides with '{existing}'")]
    DuplicatePriority {
        section: String,
        existing: String,
        priority: f64,
    },

    /// A section is not a mapping
    #[error("Section '{section}' must be a mapping of component parameters")]
    MalformedSection { section: String },

    /// A component carrying the Task capability was placed in the pipeline body
    #[error("Object '{component}' cannot be instantiated as part of pipeline, as its type '{component_type}' is a Task")]
    TaskInPipeline {
        component: String,
        component_type: String,
    },

    /// The factory does not know the requested component type
    #[error("Component '{component}' requests unknown type '{component_type}'")]
    UnknownComponentType {
        component: String,
        component_type: String,
    },

    /// A required configuration key is absent
    #[error("Component '{component}' is missing the required key '{key}'")]
    MissingKey { component: String, key: String },

    /// A configuration key holds a value of the wrong shape or range
    #[error("Component '{component}' has invalid parameter '{key}': {reason}")]
    InvalidParameter {
        component: String,
        key: String,
        reason: String,
    },

    /// Backward was requested but no component exposes the Loss capability
    #[error("Cannot train using backpropagation as there are no 'Loss' components")]
    NoLossComponents,
}

impl ConfigurationError {
    pub fn missing_key(component: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MissingKey {
            component: component.into(),
            key: key.into(),
        }
    }

    pub fn invalid_parameter(
        component: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            component: component.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while reading a pipeline configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to read configuration '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported configuration extension for '{0}' (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(PathBuf),

    #[error("The root of a pipeline configuration must be a mapping of sections")]
    NotAMapping,
}
