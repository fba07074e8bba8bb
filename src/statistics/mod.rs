// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Two-stage statistics: per-batch collection and per-epoch aggregation.

mod aggregator;
mod collector;

pub use aggregator::StatisticsAggregator;
pub use collector::StatisticsCollector;

/// Fixed display format of a statistic: right-aligned `width`, `precision` decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formatting {
    pub width: usize,
    pub precision: usize,
}

impl Formatting {
    pub const fn new(width: usize, precision: usize) -> Self {
        Self { width, precision }
    }

    pub fn render(&self, value: f64) -> String {
        format!("{:>width$.precision$}", value, width = self.width, precision = self.precision)
    }
}

/// Weighted mean of `values`; zero total weight yields `0.0`.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> f64 {
    let total_weight: f64 = weights.iter().sum();
    if total_weight == 0.0 {
        return 0.0;
    }
    values
        .iter()
        .zip(weights)
        .map(|(value, weight)| value * weight)
        .sum::<f64>()
        / total_weight
}
