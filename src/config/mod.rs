// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod registry;
mod runtime;
mod section;
mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use loader::{load_config, PipelineConfig};
pub use registry::{ComponentRegistry, Priority, RegistryEntry};
pub use runtime::{split_names, RuntimeContext};
pub use section::ComponentConfig;
pub use validation::{disabled_components, resolve_priorities};
