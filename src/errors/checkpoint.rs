// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing, reading or applying checkpoint records.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parameter blob of model '{model}' is not valid base64: {source}")]
    Decode {
        model: String,
        #[source]
        source: base64::DecodeError,
    },

    /// The record has no entry under the requested model name
    #[error("Model '{0}' params not found in checkpoint")]
    MissingModel(String),

    /// The stored parameters do not fit the receiving model
    #[error("Model '{model}' cannot load stored parameters: {reason}")]
    StateMismatch { model: String, reason: String },
}

/// A single reason why an explicitly requested model load could not be satisfied.
#[derive(Debug)]
pub enum LoadFailure {
    /// The `load` entry is neither a path nor a `{file, model}` mapping
    MalformedSection { model: String },
    /// The referenced checkpoint file does not exist
    FileNotFound { model: String, path: PathBuf },
    /// The file exists but the parameters could not be restored
    Restore {
        model: String,
        path: PathBuf,
        source: CheckpointError,
    },
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFailure::MalformedSection { model } => write!(
                f,
                "The 'load' section of model '{}' is incorrect: it must contain a single string (with checkpoint filename) or a mapping (with two keys: checkpoint 'file' and 'model' to load)",
                model
            ),
            LoadFailure::FileNotFound { model, path } => write!(
                f,
                "Could not import parameters of model '{}' from checkpoint '{}' as file does not exist",
                model,
                path.display()
            ),
            LoadFailure::Restore { model, path, source } => write!(
                f,
                "Could not import parameters of model '{}' from checkpoint '{}': {}",
                model,
                path.display(),
                source
            ),
        }
    }
}

/// Fatal: the user asked for pre-trained parameters and they could not be restored.
///
/// Continuing would silently train from random initialization, so callers are
/// expected to stop the run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed while trying to load the pre-trained models:\n{}", render_failures(.0))]
    Models(Vec<LoadFailure>),

    #[error("Failed to load pipeline checkpoint '{path}': {source}")]
    Pipeline {
        path: PathBuf,
        #[source]
        source: CheckpointError,
    },
}

impl LoadError {
    /// Exit status a binary should use when terminating on this error.
    pub const EXIT_CODE: i32 = 6;
}

fn render_failures(failures: &[LoadFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  + {}", failure))
        .collect::<Vec<_>>()
        .join("\n")
}
