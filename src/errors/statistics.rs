// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::StreamError;

/// Errors raised while collecting or aggregating statistics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatisticsError {
    #[error("Statistic '{0}' was not registered with the collector")]
    UnknownStatistic(String),

    #[error("Aggregator '{0}' was not registered with the aggregator")]
    UnknownAggregator(String),

    #[error(transparent)]
    Stream(#[from] StreamError),
}
