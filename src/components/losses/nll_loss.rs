// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::components::keys;
use crate::config::{ComponentConfig, RuntimeContext};
use crate::errors::{ConfigurationError, StatisticsError, StreamError};
use crate::statistics::{Formatting, StatisticsAggregator, StatisticsCollector};
use crate::streams::{DataDefinition, DataDefinitions, DataStreams, LossValue, ValueKind};
use crate::traits::{Component, ComponentBase, Loss};

pub const TYPE_NAME: &str = "nll_loss";

const LOSS_FORMAT: Formatting = Formatting::new(12, 6);

/// Negative log-likelihood of the target class, averaged over the batch.
///
/// Streams: `predictions` `[-1, -1]` (log-probabilities) and `targets` `[-1]`
/// -> `loss` `[1]`.
pub struct NllLoss {
    base: ComponentBase,
    predictions_key: String,
    targets_key: String,
    loss_key: String,
}

impl NllLoss {
    pub fn new(
        name: &str,
        config: &ComponentConfig,
        _context: &mut RuntimeContext,
    ) -> Result<Self, ConfigurationError> {
        let base = ComponentBase::new(name, TYPE_NAME, config.clone())?;
        Ok(Self {
            predictions_key: base.key(keys::PREDICTIONS),
            targets_key: base.key(keys::TARGETS),
            loss_key: base.key(keys::LOSS),
            base,
        })
    }
}

impl Component for NllLoss {
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
                    "Batch of log-probabilities [BATCH_SIZE x NUM_CLASSES]",
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
        [(
            self.loss_key.clone(),
            DataDefinition::new(&[1], &[ValueKind::Loss], "Loss value [1]"),
        )]
        .into_iter()
        .collect()
    }

    fn process(&mut self, streams: &mut DataStreams) -> Result<(), StreamError> {
        let predictions = streams.tensor(&self.predictions_key)?;
        let targets = streams.integers(&self.targets_key)?;
        if predictions.batch_size() != targets.len() {
            return Err(StreamError::Shape(format!(
                "'{}' got {} predictions for {} targets",
                self.name(),
                predictions.batch_size(),
                targets.len()
            )));
        }

        let mut total = 0.0f64;
        for (row, target) in targets.iter().enumerate() {
            let log_probability = predictions.at(row, *target).ok_or_else(|| {
                StreamError::Shape(format!("target class {} is out of range", target))
            })?;
            total -= f64::from(log_probability);
        }
        let mean = if targets.is_empty() { 0.0 } else { total / targets.len() as f64 };

        let loss = LossValue::on_tape(mean, streams.tape());
        streams.publish(self.loss_key.clone(), loss)
    }

    fn add_statistics(&self, collector: &mut StatisticsCollector) {
        collector.add_statistic(self.loss_key.clone(), Some(LOSS_FORMAT));
    }

    fn collect_statistics(
        &self,
        collector: &mut StatisticsCollector,
        streams: &DataStreams,
    ) -> Result<(), StatisticsError> {
        let loss = streams.loss(&self.loss_key)?.item();
        collector.add(&self.loss_key, loss)
    }

    fn add_aggregators(&self, aggregator: &mut StatisticsAggregator) {
        aggregator.add_aggregator(self.loss_key.clone(), Some(LOSS_FORMAT));
    }

    fn aggregate_statistics(
        &self,
        collector: &StatisticsCollector,
        aggregator: &mut StatisticsAggregator,
    ) -> Result<(), StatisticsError> {
        let values = collector.values(&self.loss_key).unwrap_or_default();
        let mean = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };
        aggregator.set(&self.loss_key, mean)
    }

    fn as_loss(&self) -> Option<&dyn Loss> {
        Some(self)
    }
}

impl Loss for NllLoss {
    fn loss_keys(&self) -> Vec<String> {
        vec![self.loss_key.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::Tensor;

    fn loss(yaml: &str) -> NllLoss {
        let config = ComponentConfig::from_yaml("nll", yaml).unwrap();
        NllLoss::new("nll", &config, &mut RuntimeContext::new()).unwrap()
    }

    fn streams() -> DataStreams {
        let mut streams = DataStreams::new();
        let log_half = 0.5f32.ln();
        streams
            .publish(
                "predictions",
                Tensor::new(vec![log_half, log_half, 0.0, f32::NEG_INFINITY], vec![2, 2]).unwrap(),
            )
            .unwrap();
        streams.publish("targets", vec![1usize, 0]).unwrap();
        streams
    }

    #[test]
    fn test_mean_negative_log_likelihood() {
        let mut nll = loss("type: nll_loss\n");
        let mut streams = streams();
        nll.process(&mut streams).unwrap();

        let value = streams.loss("loss").unwrap().item();
        assert!((value - std::f64::consts::LN_2 / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_loss_keys_follow_keymappings() {
        let nll = loss("type: nll_loss\nkeymappings:\n  loss: answer_loss\n");
        assert_eq!(nll.loss_keys(), vec!["answer_loss"]);
        assert!(nll.output_data_definitions().contains("answer_loss"));
        assert!(nll.capabilities().is_loss());
        assert!(!nll.capabilities().is_model());
    }

    #[test]
    fn test_loss_backward_uses_batch_tape() {
        let mut nll = loss("type: nll_loss\n");
        let mut streams = streams();
        nll.process(&mut streams).unwrap();

        streams.loss("loss").unwrap().backward(false).unwrap();
        assert_eq!(streams.tape().passes(), vec![false]);
    }

    #[test]
    fn test_out_of_range_target() {
        let mut nll = loss("type: nll_loss\n");
        let mut streams = DataStreams::new();
        streams.publish("predictions", Tensor::zeros(vec![1, 2])).unwrap();
        streams.publish("targets", vec![5usize]).unwrap();
        assert!(matches!(nll.process(&mut streams), Err(StreamError::Shape(_))));
    }

    #[test]
    fn test_statistics_mean() {
        let nll = loss("type: nll_loss\n");
        let mut collector = StatisticsCollector::new();
        let mut aggregator = StatisticsAggregator::new();
        nll.add_statistics(&mut collector);
        nll.add_aggregators(&mut aggregator);
        collector.add("loss", 1.0).unwrap();
        collector.add("loss", 3.0).unwrap();

        nll.aggregate_statistics(&collector, &mut aggregator).unwrap();
        assert_eq!(aggregator.get("loss"), Some(2.0));
    }
}
