// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline construction.
//!
//! This module contains message types for logging events related to:
//! * Disabled sections
//! * Ordering and instantiation errors
//! * Component creation progress and the final build tally

use crate::errors::ConfigurationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A section was skipped because it is listed in `disable`.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ComponentDisabled<'a> {
    pub component: &'a str,
}

impl Display for ComponentDisabled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Disabling component '{}'", self.component)
    }
}

impl StructuredLog for ComponentDisabled<'_> {
    fn log(&self) {
        tracing::info!(component = self.component, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("build", span_name = name, component = self.component)
    }
}

/// Priority resolution finished and instantiation is about to start.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use pipewright::observability::messages::build::PipelineBuildStarted;
///
/// let msg = PipelineBuildStarted {
///     pipeline: "mnist",
///     component_count: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipelineBuildStarted<'a> {
    pub pipeline: &'a str,
    pub component_count: usize,
}

impl Display for PipelineBuildStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Building pipeline '{}' with {} components",
            self.pipeline, self.component_count
        )
    }
}

impl StructuredLog for PipelineBuildStarted<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            component_count = self.component_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "build",
            span_name = name,
            pipeline = self.pipeline,
            component_count = self.component_count,
        )
    }
}

/// Priority resolution rejected a section.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct OrderingFailed<'a> {
    pub error: &'a ConfigurationError,
}

impl Display for OrderingFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl StructuredLog for OrderingFailed<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("build", span_name = name, error = %self.error)
    }
}

/// A component is about to be instantiated.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ComponentCreating<'a> {
    pub component: &'a str,
    pub component_type: &'a str,
    pub priority: f64,
}

impl Display for ComponentCreating<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Creating component '{}' ({}) with priority [{}]",
            self.component, self.component_type, self.priority
        )
    }
}

impl StructuredLog for ComponentCreating<'_> {
    fn log(&self) {
        tracing::info!(
            component = self.component,
            component_type = self.component_type,
            priority = self.priority,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "component_creation",
            span_name = name,
            component = self.component,
            component_type = self.component_type,
            priority = self.priority,
        )
    }
}

/// A component could not be instantiated; its siblings keep building.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use pipewright::errors::ConfigurationError;
/// use pipewright::observability::messages::build::ComponentCreationFailed;
///
/// let error = ConfigurationError::MissingKey {
///     component: "classifier".to_string(),
///     key: "input_size".to_string(),
/// };
/// let msg = ComponentCreationFailed {
///     component: "classifier",
///     error: &error,
/// };
///
/// assert!(msg.to_string().contains("input_size"));
/// ```
pub struct ComponentCreationFailed<'a> {
    pub component: &'a str,
    pub error: &'a ConfigurationError,
}

impl Display for ComponentCreationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Detected configuration error while creating the component '{}' instance:\n  {}",
            self.component, self.error
        )
    }
}

impl StructuredLog for ComponentCreationFailed<'_> {
    fn log(&self) {
        tracing::error!(component = self.component, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "component_creation",
            span_name = name,
            component = self.component,
            error = %self.error,
        )
    }
}

/// Build finished.
///
/// # Log Level
/// `info!` on success, `error!` when errors were counted
pub struct PipelineBuildCompleted<'a> {
    pub pipeline: &'a str,
    pub components: usize,
    pub models: usize,
    pub losses: usize,
    pub errors: usize,
}

impl Display for PipelineBuildCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline '{}' built: {} components ({} models, {} losses), {} errors",
            self.pipeline, self.components, self.models, self.losses, self.errors
        )
    }
}

impl StructuredLog for PipelineBuildCompleted<'_> {
    fn log(&self) {
        if self.errors > 0 {
            tracing::error!(
                pipeline = self.pipeline,
                components = self.components,
                errors = self.errors,
                "{}", self
            );
        } else {
            tracing::info!(
                pipeline = self.pipeline,
                components = self.components,
                models = self.models,
                losses = self.losses,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "build",
            span_name = name,
            pipeline = self.pipeline,
            components = self.components,
            errors = self.errors,
        )
    }
}
