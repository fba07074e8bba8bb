// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{TOTAL_LOSS_KEY, TOTAL_LOSS_SUPPORT_KEY};
use crate::errors::PipelineError;
use crate::statistics::{weighted_mean, Formatting, StatisticsAggregator, StatisticsCollector};
use crate::streams::DataStreams;

use super::manager::PipelineManager;

const TOTAL_LOSS_FORMAT: Formatting = Formatting::new(12, 10);

impl PipelineManager {
    /// Displayed only when there is more than one loss field.
    fn total_loss_format(&self) -> Option<Formatting> {
        let loss_fields: usize = self.losses().map(|loss| loss.loss_keys().len()).sum();
        (loss_fields > 1).then_some(TOTAL_LOSS_FORMAT)
    }

    pub fn add_statistics(&self, collector: &mut StatisticsCollector) {
        for (_, component) in self.registry.components() {
            component.add_statistics(collector);
        }
        collector.add_statistic(TOTAL_LOSS_KEY, self.total_loss_format());
        collector.add_statistic(TOTAL_LOSS_SUPPORT_KEY, None);
    }

    /// Collect every component's statistics, then the batch's summed loss
    /// with the batch size as its support.
    pub fn collect_statistics(
        &self,
        collector: &mut StatisticsCollector,
        streams: &DataStreams,
    ) -> Result<(), PipelineError> {
        for (_, component) in self.registry.components() {
            component.collect_statistics(collector, streams)?;
        }

        let mut total_loss = 0.0;
        for loss in self.losses() {
            for key in loss.loss_keys() {
                total_loss += streams.loss(&key)?.item();
            }
        }
        collector.add(TOTAL_LOSS_KEY, total_loss)?;
        collector.add(TOTAL_LOSS_SUPPORT_KEY, streams.batch_size()? as f64)?;
        Ok(())
    }

    pub fn add_aggregators(&self, aggregator: &mut StatisticsAggregator) {
        for (_, component) in self.registry.components() {
            component.add_aggregators(aggregator);
        }
        aggregator.add_aggregator(TOTAL_LOSS_KEY, self.total_loss_format());
    }

    /// Aggregate every component's statistics; `total_loss` becomes the
    /// support-weighted mean of the per-batch totals (0 without support).
    pub fn aggregate_statistics(
        &self,
        collector: &StatisticsCollector,
        aggregator: &mut StatisticsAggregator,
    ) -> Result<(), PipelineError> {
        for (_, component) in self.registry.components() {
            component.aggregate_statistics(collector, aggregator)?;
        }

        let losses = collector.values(TOTAL_LOSS_KEY).unwrap_or_default();
        let supports = collector.values(TOTAL_LOSS_SUPPORT_KEY).unwrap_or_default();
        aggregator.set(TOTAL_LOSS_KEY, weighted_mean(losses, supports))?;
        Ok(())
    }

    /// `total_loss` of the last collected batch.
    pub fn return_loss_on_batch(&self, collector: &StatisticsCollector) -> Option<f64> {
        collector.last(TOTAL_LOSS_KEY)
    }

    pub fn return_loss_on_set(&self, aggregator: &StatisticsAggregator) -> Option<f64> {
        aggregator.get(TOTAL_LOSS_KEY)
    }
}
