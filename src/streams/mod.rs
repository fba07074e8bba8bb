// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Values, schemas and the per-batch data stream container.

mod aliases;
mod container;
mod definition;
mod gradient;
mod tensor;
mod value;

pub use aliases::{KeyMappings, StreamView};
pub use container::{DataStreams, INDICES_STREAM};
pub use definition::{DataDefinition, DataDefinitions, Dim};
pub use gradient::{GradientNode, GraphTape, LossValue};
pub use tensor::{Device, Tensor};
pub use value::{Value, ValueKind};
