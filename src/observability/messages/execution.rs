// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for runtime transitions of the pipeline models.

use crate::observability::messages::StructuredLog;
use crate::streams::Device;
use crate::traits::Mode;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Models are being moved to the target device.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ModelsMoving {
    pub device: Device,
    pub models: usize,
    pub replicas: usize,
}

impl Display for ModelsMoving {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Moving {} model(s) to {}", self.models, self.device)?;
        if self.replicas > 1 {
            write!(f, " using data parallelization on {} devices", self.replicas)?;
        }
        Ok(())
    }
}

impl StructuredLog for ModelsMoving {
    fn log(&self) {
        tracing::info!(
            device = %self.device,
            models = self.models,
            replicas = self.replicas,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("to_device", span_name = name, device = %self.device)
    }
}

/// A model was wrapped for data-parallel execution.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct ModelReplicated<'a> {
    pub model: &'a str,
    pub replicas: usize,
}

impl Display for ModelReplicated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Model '{}' wrapped for data parallelization over {} replicas",
            self.model, self.replicas
        )
    }
}

impl StructuredLog for ModelReplicated<'_> {
    fn log(&self) {
        tracing::debug!(model = self.model, replicas = self.replicas, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("to_device", span_name = name, model = self.model)
    }
}

/// A model was frozen by configuration.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ModelFrozen<'a> {
    pub model: &'a str,
    pub pipeline_wide: bool,
}

impl Display for ModelFrozen<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let origin = if self.pipeline_wide { "pipeline" } else { "model" };
        write!(f, "Freezing model '{}' ({} setting)", self.model, origin)
    }
}

impl StructuredLog for ModelFrozen<'_> {
    fn log(&self) {
        tracing::info!(model = self.model, pipeline_wide = self.pipeline_wide, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("freeze", span_name = name, model = self.model)
    }
}

/// Every model switched to a new mode.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct ModeChanged {
    pub mode: Mode,
    pub models: usize,
}

impl Display for ModeChanged {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Switched {} model(s) to {:?} mode", self.models, self.mode)
    }
}

impl StructuredLog for ModeChanged {
    fn log(&self) {
        tracing::debug!(mode = ?self.mode, models = self.models, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("mode", span_name = name, mode = ?self.mode)
    }
}

/// Backward pass plan for one batch.
///
/// # Log Level
/// `trace!` - Per-batch detail
pub struct BackwardStarted {
    pub total_passes: usize,
}

impl Display for BackwardStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Propagating gradients from {} loss fields", self.total_passes)
    }
}

impl StructuredLog for BackwardStarted {
    fn log(&self) {
        tracing::trace!(total_passes = self.total_passes, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("backward", span_name = name, total_passes = self.total_passes)
    }
}
