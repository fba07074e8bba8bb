// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod checkpoint;
mod config;
mod pipeline;
mod schema;
mod statistics;
mod stream;

pub use checkpoint::{CheckpointError, LoadError, LoadFailure};
pub use config::{ConfigLoadError, ConfigurationError};
pub use pipeline::PipelineError;
pub use schema::SchemaError;
pub use statistics::StatisticsError;
pub use stream::{GradientError, StreamError};
