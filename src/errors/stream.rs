// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised by the data stream container and the values it carries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    #[error("Cannot publish '{0}': the stream is already present")]
    AlreadyPresent(String),

    #[error("Stream '{0}' is not present in the container")]
    Missing(String),

    #[error("Stream '{key}' holds a {found} value, expected {expected}")]
    KindMismatch {
        key: String,
        expected: String,
        found: String,
    },

    #[error("Shape error: {0}")]
    Shape(String),
}

/// Errors raised by gradient propagation through a computation graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradientError {
    /// The graph was released by an earlier backward call without retention
    #[error("Trying to backward through the graph a second time, but its buffers have already been freed")]
    GraphReleased,
}
