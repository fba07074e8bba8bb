// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{ComponentConfig, RuntimeContext};
use crate::errors::{ConfigurationError, StatisticsError, StreamError};
use crate::statistics::{Formatting, StatisticsAggregator, StatisticsCollector};
use crate::streams::{DataDefinition, DataDefinitions, DataStreams, ValueKind, INDICES_STREAM};
use crate::traits::{Component, ComponentBase};

pub const TYPE_NAME: &str = "batch_size_statistics";

const BATCH_SIZE: &str = "batch_size";
const EPOCH_SIZE: &str = "epoch_size";

/// Records the size of every batch and the number of samples seen per epoch.
pub struct BatchSizeStatistics {
    base: ComponentBase,
    indices_key: String,
}

impl BatchSizeStatistics {
    pub fn new(
        name: &str,
        config: &ComponentConfig,
        _context: &mut RuntimeContext,
    ) -> Result<Self, ConfigurationError> {
        let base = ComponentBase::new(name, TYPE_NAME, config.clone())?;
        Ok(Self {
            indices_key: base.key(INDICES_STREAM),
            base,
        })
    }
}

impl Component for BatchSizeStatistics {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn type_name(&self) -> &str {
        self.base.type_name()
    }

    fn config(&self) -> &ComponentConfig {
        self.base.config()
    }

    fn input_data_definitions(&self) -> DataDefinitions {
        [(
            self.indices_key.clone(),
            DataDefinition::new(&[-1], &[ValueKind::Integers], "Batch of sample indices [BATCH_SIZE]"),
        )]
        .into_iter()
        .collect()
    }

    fn output_data_definitions(&self) -> DataDefinitions {
        DataDefinitions::new()
    }

    fn process(&mut self, _streams: &mut DataStreams) -> Result<(), StreamError> {
        Ok(())
    }

    fn add_statistics(&self, collector: &mut StatisticsCollector) {
        collector.add_statistic(BATCH_SIZE, Some(Formatting::new(4, 0)));
    }

    fn collect_statistics(
        &self,
        collector: &mut StatisticsCollector,
        streams: &DataStreams,
    ) -> Result<(), StatisticsError> {
        let size = streams.integers(&self.indices_key)?.len();
        collector.add(BATCH_SIZE, size as f64)
    }

    fn add_aggregators(&self, aggregator: &mut StatisticsAggregator) {
        aggregator.add_aggregator(EPOCH_SIZE, Some(Formatting::new(6, 0)));
    }

    fn aggregate_statistics(
        &self,
        collector: &StatisticsCollector,
        aggregator: &mut StatisticsAggregator,
    ) -> Result<(), StatisticsError> {
        let total: f64 = collector.values(BATCH_SIZE).unwrap_or_default().iter().sum();
        aggregator.set(EPOCH_SIZE, total)
    }
}
