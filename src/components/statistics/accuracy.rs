// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::components::keys;
use crate::config::{ComponentConfig, RuntimeContext};
use crate::errors::{ConfigurationError, StatisticsError, StreamError};
use crate::statistics::{weighted_mean, Formatting, StatisticsAggregator, StatisticsCollector};
use crate::streams::{DataDefinition, DataDefinitions, DataStreams, ValueKind};
use crate::traits::{Component, ComponentBase};

pub const TYPE_NAME: &str = "accuracy_statistics";

const ACCURACY_FORMAT: Formatting = Formatting::new(6, 4);

/// Fraction of samples whose most probable class equals the target.
///
/// The statistic name defaults to `accuracy` and can be changed with the
/// `statistic` key. The per-epoch value is weighted by batch size.
pub struct AccuracyStatistics {
    base: ComponentBase,
    predictions_key: String,
    targets_key: String,
    statistic: String,
    support: String,
}

impl AccuracyStatistics {
    pub fn new(
        name: &str,
        config: &ComponentConfig,
        _context: &mut RuntimeContext,
    ) -> Result<Self, ConfigurationError> {
        let base = ComponentBase::new(name, TYPE_NAME, config.clone())?;
        let statistic = match config.get("statistic") {
            Some(_) => config.require_str("statistic")?.to_string(),
            None => "accuracy".to_string(),
        };
        Ok(Self {
            predictions_key: base.key(keys::PREDICTIONS),
            targets_key: base.key(keys::TARGETS),
            support: format!("{}_support", statistic),
            statistic,
            base,
        })
    }

    fn accuracy(&self, streams: &DataStreams) -> Result<(f64, usize), StreamError> {
        let predictions = streams.tensor(&self.predictions_key)?.argmax_rows();
        let targets = streams.integers(&self.targets_key)?;
        if targets.is_empty() {
            return Ok((0.0, 0));
        }
        let correct = predictions
            .iter()
            .zip(targets)
            .filter(|(predicted, target)| predicted == target)
            .count();
        Ok((correct as f64 / targets.len() as f64, targets.len()))
    }
}

impl Component for AccuracyStatistics {
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
        [
            (
                self.predictions_key.clone(),
                DataDefinition::new(
                    &[-1, -1],
                    &[ValueKind::Tensor],
                    "Batch of class scores [BATCH_SIZE x NUM_CLASSES]",
                ),
            ),
            (
                self.targets_key.clone(),
                DataDefinition::new(&[-1], &[ValueKind::Integers], "Batch of target classes [BATCH_SIZE]"),
            ),
        ]
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
        collector.add_statistic(self.statistic.clone(), Some(ACCURACY_FORMAT));
        collector.add_statistic(self.support.clone(), None);
    }

    fn collect_statistics(
        &self,
        collector: &mut StatisticsCollector,
        streams: &DataStreams,
    ) -> Result<(), StatisticsError> {
        let (accuracy, support) = self.accuracy(streams)?;
        collector.add(&self.statistic, accuracy)?;
        collector.add(&self.support, support as f64)
    }

    fn add_aggregators(&self, aggregator: &mut StatisticsAggregator) {
        aggregator.add_aggregator(self.statistic.clone(), Some(ACCURACY_FORMAT));
    }

    fn aggregate_statistics(
        &self,
        collector: &StatisticsCollector,
        aggregator: &mut StatisticsAggregator,
    ) -> Result<(), StatisticsError> {
        let values = collector.values(&self.statistic).unwrap_or_default();
        let supports = collector.values(&self.support).unwrap_or_default();
        aggregator.set(&self.statistic, weighted_mean(values, supports))
    }
}
