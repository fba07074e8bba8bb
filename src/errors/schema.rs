// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Handshake incompatibilities between a component and the accumulated schema.
///
/// None of these abort the handshake; each one is logged and counted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Input definition: expected field '{field}' not found in stream keys ({available})")]
    MissingField { field: String, available: String },

    #[error("Input definition: field '{field}' has different dimensions from expected (expected {expected} while received {received})")]
    DimensionCountMismatch {
        field: String,
        expected: String,
        received: String,
    },

    #[error("Input definition: field '{field}' has dimension {index} different from expected (expected {expected} while received {received})")]
    DimensionMismatch {
        field: String,
        index: usize,
        expected: String,
        received: String,
    },

    #[error("Input definition: field '{field}' has number of kinds different from expected (expected {expected} while received {received})")]
    KindCountMismatch {
        field: String,
        expected: String,
        received: String,
    },

    #[error("Input definition: field '{field}' has kind {index} different from expected (expected {expected} while received {received})")]
    KindMismatch {
        field: String,
        index: usize,
        expected: String,
        received: String,
    },

    #[error("Output definition: field '{field}' cannot be added to the streams, as it is already present")]
    DuplicateOutput { field: String },
}
