// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for checkpoint export, status patching and restore.

use crate::errors::LoadError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// Model parameters were written to a checkpoint file.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use pipewright::observability::messages::checkpoint::CheckpointExported;
/// use std::path::Path;
///
/// let models = vec!["classifier".to_string()];
/// let msg = CheckpointExported {
///     pipeline: "mnist",
///     path: Path::new("/tmp/mnist_best.ckpt"),
///     models: &models,
/// };
///
/// assert!(msg.to_string().contains("Model 'classifier' params saved"));
/// ```
pub struct CheckpointExported<'a> {
    pub pipeline: &'a str,
    pub path: &'a Path,
    pub models: &'a [String],
}

impl Display for CheckpointExported<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Exporting pipeline '{}' parameters to checkpoint:\n {}",
            self.pipeline,
            self.path.display()
        )?;
        for model in self.models {
            write!(f, "\n  + Model '{}' params saved", model)?;
        }
        Ok(())
    }
}

impl StructuredLog for CheckpointExported<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            path = %self.path.display(),
            models = self.models.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("checkpoint", span_name = name, path = %self.path.display())
    }
}

/// The best checkpoint kept its parameters but received a new status.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CheckpointStatusUpdated<'a> {
    pub path: &'a Path,
    pub status: &'a str,
}

impl Display for CheckpointStatusUpdated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Updated training status in checkpoint to '{}':\n {}",
            self.status,
            self.path.display()
        )
    }
}

impl StructuredLog for CheckpointStatusUpdated<'_> {
    fn log(&self) {
        tracing::info!(path = %self.path.display(), status = self.status, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("checkpoint", span_name = name, path = %self.path.display())
    }
}

/// A status change could not be recorded because no best checkpoint exists yet.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
pub struct BestCheckpointMissing<'a> {
    pub path: &'a Path,
    pub status: &'a str,
}

impl Display for BestCheckpointMissing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Cannot record status '{}': no best checkpoint at {}",
            self.status,
            self.path.display()
        )
    }
}

impl StructuredLog for BestCheckpointMissing<'_> {
    fn log(&self) {
        tracing::warn!(path = %self.path.display(), status = self.status, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("checkpoint", span_name = name, path = %self.path.display())
    }
}

/// A checkpoint record was opened for restoring models.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CheckpointOpened<'a> {
    pub pipeline: &'a str,
    pub path: &'a Path,
    pub episode: u64,
    pub loss: f64,
    pub status: &'a str,
}

impl Display for CheckpointOpened<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loading models of the '{}' pipeline from checkpoint {} (episode: {}, loss: {}, status: {})",
            self.pipeline,
            self.path.display(),
            self.episode,
            self.loss,
            self.status
        )
    }
}

impl StructuredLog for CheckpointOpened<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            path = %self.path.display(),
            episode = self.episode,
            loss = self.loss,
            status = self.status,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("checkpoint_load", span_name = name, path = %self.path.display())
    }
}

/// A model's parameters were restored.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ModelRestored<'a> {
    pub model: &'a str,
    pub model_type: &'a str,
    pub source: &'a str,
}

impl Display for ModelRestored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "  + Model '{}' [{}] params loaded (from '{}')",
            self.model, self.model_type, self.source
        )
    }
}

impl StructuredLog for ModelRestored<'_> {
    fn log(&self) {
        tracing::info!(model = self.model, model_type = self.model_type, source = self.source, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("checkpoint_load", span_name = name, model = self.model)
    }
}

/// A model has no entry in the record; the other models are still restored.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
pub struct ModelMissingInCheckpoint<'a> {
    pub model: &'a str,
    pub model_type: &'a str,
    pub path: &'a Path,
}

impl Display for ModelMissingInCheckpoint<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "  + Model '{}' [{}] params not found in checkpoint {}",
            self.model,
            self.model_type,
            self.path.display()
        )
    }
}

impl StructuredLog for ModelMissingInCheckpoint<'_> {
    fn log(&self) {
        tracing::warn!(model = self.model, path = %self.path.display(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("checkpoint_load", span_name = name, model = self.model)
    }
}

/// Explicitly requested parameters could not be restored. Fatal for the run.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ModelsLoadFailed<'a> {
    pub error: &'a LoadError,
}

impl Display for ModelsLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl StructuredLog for ModelsLoadFailed<'_> {
    fn log(&self) {
        tracing::error!("{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("checkpoint_load", span_name = name)
    }
}
