// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_yaml::Value;
use std::collections::HashMap;

use crate::streams::Device;

/// Explicit run context handed to the manager and to component constructors.
///
/// Holds what would otherwise be process-wide state: device placement,
/// checkpointing switches, the runtime `disable` override, the current
/// episode, and a registry of global parameters components share
/// (e.g. an embedding publishing its output size for a downstream classifier).
#[derive(Debug, Clone, Default)]
pub struct RuntimeContext {
    pub device: Device,
    pub use_gpu: bool,
    /// Number of replicas a model is fanned out to; `<= 1` disables replication
    pub data_parallel_replicas: usize,
    pub save_intermediate: bool,
    pub disable: Vec<String>,
    pub episode: u64,
    globals: HashMap<String, Value>,
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.use_gpu = device != Device::Cpu;
        self.device = device;
        self
    }

    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.data_parallel_replicas = replicas;
        self
    }

    pub fn with_save_intermediate(mut self, enabled: bool) -> Self {
        self.save_intermediate = enabled;
        self
    }

    /// Add a comma-separated list of component names to disable.
    pub fn with_disabled(mut self, names: &str) -> Self {
        self.disable.extend(split_names(names));
        self
    }

    pub fn use_data_parallel(&self) -> bool {
        self.use_gpu && self.data_parallel_replicas > 1
    }

    pub fn global(&self, key: &str) -> Option<&Value> {
        self.globals.get(key)
    }

    pub fn global_usize(&self, key: &str) -> Option<usize> {
        self.global(key)
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
    }

    pub fn set_global(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.globals.insert(key.into(), value.into());
    }
}

/// Split a comma-separated name list, trimming whitespace and dropping empties.
pub fn split_names(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_names_trims() {
        assert_eq!(split_names(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_names("").is_empty());
    }

    #[test]
    fn test_globals_round_trip() {
        let mut ctx = RuntimeContext::new();
        ctx.set_global("input_size", 16u64);
        assert_eq!(ctx.global_usize("input_size"), Some(16));
        assert_eq!(ctx.global_usize("missing"), None);
    }

    #[test]
    fn test_gpu_device_enables_data_parallel_only_with_replicas() {
        let ctx = RuntimeContext::new().with_device(Device::Cuda(0));
        assert!(!ctx.use_data_parallel());
        assert!(ctx.with_replicas(2).use_data_parallel());
    }
}
