// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Top-level sections that configure the pipeline itself rather than a component.
pub const RESERVED_SECTIONS: [&str; 4] = ["name", "load", "freeze", "disable"];

/// Key holding a component's execution priority.
pub const PRIORITY_KEY: &str = "priority";
/// Key holding a component's type name.
pub const TYPE_KEY: &str = "type";
/// Key holding a component's stream name remappings.
pub const KEYMAPPINGS_KEY: &str = "keymappings";
/// Key holding a component's global-parameter name remappings.
pub const GLOBALS_KEY: &str = "globals";
/// Key holding a model's (or the pipeline's) checkpoint to load.
pub const LOAD_KEY: &str = "load";
/// Key holding a model's (or the pipeline's) freeze flag.
pub const FREEZE_KEY: &str = "freeze";
/// Key holding the comma-separated list of disabled components.
pub const DISABLE_KEY: &str = "disable";
/// Key holding the pipeline name.
pub const NAME_KEY: &str = "name";

/// Synthetic statistic summing every loss stream of a batch.
pub const TOTAL_LOSS_KEY: &str = "total_loss";
/// Batch size recorded alongside `total_loss`, used as aggregation weight.
pub const TOTAL_LOSS_SUPPORT_KEY: &str = "total_loss_support";

/// Pipeline name used when the configuration does not provide one.
pub const DEFAULT_PIPELINE_NAME: &str = "pipeline";
