// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod accuracy;
pub mod batch_size;

pub use accuracy::AccuracyStatistics;
pub use batch_size::BatchSizeStatistics;
