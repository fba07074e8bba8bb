// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the schema handshake.

use crate::errors::SchemaError;
use crate::observability::messages::StructuredLog;
use crate::streams::DataDefinitions;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A component's declared schema does not fit the accumulated one.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct SchemaMismatch<'a> {
    pub component: &'a str,
    pub error: &'a SchemaError,
}

impl Display for SchemaMismatch<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] {}", self.component, self.error)
    }
}

impl StructuredLog for SchemaMismatch<'_> {
    fn log(&self) {
        tracing::error!(component = self.component, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("handshake", span_name = name, component = self.component)
    }
}

/// Every component accepted the schema chain; lists the final definitions.
///
/// # Log Level
/// `info!` - Important operational event
pub struct HandshakeSucceeded<'a> {
    pub pipeline: &'a str,
    pub schema: &'a DataDefinitions,
}

impl Display for HandshakeSucceeded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        writeln!(f, "Handshake successful")?;
        writeln!(f, "Final definition of DataStreams used in pipeline '{}':", self.pipeline)?;
        writeln!(f, "{}", "=".repeat(80))?;
        for (key, definition) in self.schema.iter() {
            writeln!(f, "  {}: {}", key, definition)?;
        }
        write!(f, "{}", "=".repeat(80))
    }
}

impl StructuredLog for HandshakeSucceeded<'_> {
    fn log(&self) {
        tracing::info!(pipeline = self.pipeline, fields = self.schema.len(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("handshake", span_name = name, pipeline = self.pipeline)
    }
}

/// Handshake finished with errors.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct HandshakeFailed<'a> {
    pub pipeline: &'a str,
    pub errors: usize,
}

impl Display for HandshakeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Handshake of pipeline '{}' found {} errors",
            self.pipeline, self.errors
        )
    }
}

impl StructuredLog for HandshakeFailed<'_> {
    fn log(&self) {
        tracing::error!(pipeline = self.pipeline, errors = self.errors, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "handshake",
            span_name = name,
            pipeline = self.pipeline,
            errors = self.errors,
        )
    }
}
