// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in components registered with the default factory.

pub mod losses;
pub mod models;
pub mod statistics;
pub mod tasks;

pub use losses::NllLoss;
pub use models::LinearClassifier;
pub use statistics::{AccuracyStatistics, BatchSizeStatistics};
pub use tasks::SyntheticClassificationTask;

/// Default stream names shared by the built-ins.
pub mod keys {
    pub const INPUTS: &str = "inputs";
    pub const TARGETS: &str = "targets";
    pub const PREDICTIONS: &str = "predictions";
    pub const LOSS: &str = "loss";
}

/// Names of the global parameters the built-ins publish and consume.
pub mod globals {
    pub const INPUT_SIZE: &str = "input_size";
    pub const NUM_CLASSES: &str = "num_classes";
}
