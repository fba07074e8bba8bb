// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::{ConfigurationError, GradientError, StatisticsError, StreamError};

/// Errors that abort a forward, backward or statistics pass.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Statistics(#[from] StatisticsError),

    #[error("Backward pass through '{key}' failed: {source}")]
    Gradient {
        key: String,
        #[source]
        source: GradientError,
    },

    #[error("Component '{component}' failed: {source}")]
    Component {
        component: String,
        #[source]
        source: StreamError,
    },

    #[error("Pipeline entry at priority [{priority}] ('{name}') has not been built")]
    NotBuilt { name: String, priority: f64 },
}
