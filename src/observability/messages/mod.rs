// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `build` - pipeline construction events
//! * `handshake` - schema chain validation
//! * `execution` - runtime transitions of the models
//! * `checkpoint` - persistence events

use std::fmt::Display;
use tracing::Span;

pub mod build;
pub mod checkpoint;
pub mod execution;
pub mod handshake;

/// A log message that knows its level and structured fields.
pub trait StructuredLog: Display {
    /// Emit the event at its documented level.
    fn log(&self);

    /// Span carrying the same fields, for wrapping longer operations.
    fn span(&self, name: &str) -> Span;
}

#[cfg(test)]
mod tests {
    use super::build::PipelineBuildStarted;
    use super::execution::BackwardStarted;
    use super::StructuredLog;

    #[test]
    fn test_spans_carry_message_fields() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let span = PipelineBuildStarted {
                pipeline: "demo",
                component_count: 4,
            }
            .span("pipeline_build");
            let metadata = span.metadata().expect("span should be enabled");
            assert_eq!(metadata.name(), "build");
            assert!(metadata.fields().field("pipeline").is_some());
            assert!(metadata.fields().field("component_count").is_some());

            let span = BackwardStarted { total_passes: 3 }.span("backward");
            let metadata = span.metadata().expect("span should be enabled");
            assert_eq!(metadata.name(), "backward");
            assert!(metadata.fields().field("total_passes").is_some());
            let _entered = span.entered();
        });
    }
}
