// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use indexmap::map::Entry;
use indexmap::IndexMap;

use super::Formatting;
use crate::errors::StatisticsError;

#[derive(Debug, Clone, Default)]
struct Series {
    format: Option<Formatting>,
    values: Vec<f64>,
}

/// Per-batch scalar registry.
///
/// Components register named series in `add_statistics` and append one value
/// per batch in `collect_statistics`. Series registered without a format are
/// recorded but left out of [`export`](Self::export).
#[derive(Debug, Clone, Default)]
pub struct StatisticsCollector {
    series: IndexMap<String, Series>,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-format) a series. Existing values are kept.
    pub fn add_statistic(&mut self, name: impl Into<String>, format: Option<Formatting>) {
        match self.series.entry(name.into()) {
            Entry::Occupied(mut entry) => entry.get_mut().format = format,
            Entry::Vacant(entry) => {
                entry.insert(Series {
                    format,
                    values: Vec::new(),
                });
            }
        }
    }

    pub fn add(&mut self, name: &str, value: f64) -> Result<(), StatisticsError> {
        self.series
            .get_mut(name)
            .map(|series| series.values.push(value))
            .ok_or_else(|| StatisticsError::UnknownStatistic(name.to_string()))
    }

    pub fn values(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|series| series.values.as_slice())
    }

    pub fn last(&self, name: &str) -> Option<f64> {
        self.values(name).and_then(|values| values.last().copied())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.series
            .get(name)
            .map(|series| series.format.is_some())
            .unwrap_or(false)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.series.keys()
    }

    /// Drop every collected value, keeping registrations and formats.
    pub fn empty(&mut self) {
        for series in self.series.values_mut() {
            series.values.clear();
        }
    }

    /// Last value of every visible series as `name value` pairs joined by `; `.
    pub fn export(&self) -> String {
        self.series
            .iter()
            .filter_map(|(name, series)| {
                let format = series.format?;
                let value = series.values.last()?;
                Some(format!("{} {}", name, format.render(*value)))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::weighted_mean;

    #[test]
    fn test_unregistered_statistic_is_rejected() {
        let mut collector = StatisticsCollector::new();
        assert_eq!(
            collector.add("loss", 1.0),
            Err(StatisticsError::UnknownStatistic("loss".into()))
        );
    }

    #[test]
    fn test_collect_and_empty() {
        let mut collector = StatisticsCollector::new();
        collector.add_statistic("loss", Some(Formatting::new(6, 2)));
        collector.add("loss", 1.0).unwrap();
        collector.add("loss", 0.5).unwrap();

        assert_eq!(collector.values("loss"), Some(&[1.0, 0.5][..]));
        assert_eq!(collector.last("loss"), Some(0.5));

        collector.empty();
        assert!(collector.contains("loss"));
        assert_eq!(collector.last("loss"), None);
    }

    #[test]
    fn test_hidden_series_not_exported() {
        let mut collector = StatisticsCollector::new();
        collector.add_statistic("loss", Some(Formatting::new(6, 2)));
        collector.add_statistic("support", None);
        collector.add("loss", 0.25).unwrap();
        collector.add("support", 8.0).unwrap();

        assert!(!collector.is_visible("support"));
        assert_eq!(collector.export(), "loss   0.25");
    }

    #[test]
    fn test_repeated_registration_keeps_values() {
        let mut collector = StatisticsCollector::new();
        collector.add_statistic("loss", Some(Formatting::new(6, 2)));
        collector.add("loss", 0.75).unwrap();
        collector.add_statistic("loss", None);

        assert_eq!(collector.names().count(), 1);
        assert_eq!(collector.values("loss"), Some(&[0.75][..]));
        assert!(!collector.is_visible("loss"));
        assert_eq!(collector.export(), "");
    }

    #[test]
    fn test_weighted_mean_of_collected_series() {
        let mut collector = StatisticsCollector::new();
        collector.add_statistic("loss", Some(Formatting::new(6, 2)));
        collector.add_statistic("support", None);
        for (loss, support) in [(1.0, 3.0), (3.0, 1.0)] {
            collector.add("loss", loss).unwrap();
            collector.add("support", support).unwrap();
        }

        let mean = weighted_mean(
            collector.values("loss").unwrap(),
            collector.values("support").unwrap(),
        );
        assert_eq!(mean, 1.5);
    }

    #[test]
    fn test_weighted_mean_with_nan_values() {
        assert!(weighted_mean(&[f64::NAN, 1.0], &[2.0, 2.0]).is_nan());
        assert!(weighted_mean(&[f64::NAN, 1.0], &[0.0, 2.0]).is_nan());
        assert_eq!(weighted_mean(&[f64::NAN], &[0.0]), 0.0);
    }
}
