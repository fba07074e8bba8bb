// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use indexmap::map::Entry;
use indexmap::IndexMap;

use super::Formatting;
use crate::errors::StatisticsError;

#[derive(Debug, Clone, Default)]
struct Aggregate {
    format: Option<Formatting>,
    value: Option<f64>,
}

/// Per-epoch reductions of the collected series.
#[derive(Debug, Clone, Default)]
pub struct StatisticsAggregator {
    aggregates: IndexMap<String, Aggregate>,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_aggregator(&mut self, name: impl Into<String>, format: Option<Formatting>) {
        match self.aggregates.entry(name.into()) {
            Entry::Occupied(mut entry) => entry.get_mut().format = format,
            Entry::Vacant(entry) => {
                entry.insert(Aggregate { format, value: None });
            }
        }
    }

    pub fn set(&mut self, name: &str, value: f64) -> Result<(), StatisticsError> {
        self.aggregates
            .get_mut(name)
            .map(|aggregate| aggregate.value = Some(value))
            .ok_or_else(|| StatisticsError::UnknownAggregator(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.aggregates.get(name).and_then(|aggregate| aggregate.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.aggregates.contains_key(name)
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.aggregates
            .get(name)
            .map(|aggregate| aggregate.format.is_some())
            .unwrap_or(false)
    }

    /// Visible aggregates as `name value` pairs joined by `; `.
    pub fn export(&self) -> String {
        self.aggregates
            .iter()
            .filter_map(|(name, aggregate)| {
                let format = aggregate.format?;
                let value = aggregate.value?;
                Some(format!("{} {}", name, format.render(value)))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_requires_registration() {
        let mut aggregator = StatisticsAggregator::new();
        assert!(aggregator.set("acc", 0.5).is_err());

        aggregator.add_aggregator("acc", Some(Formatting::new(5, 2)));
        aggregator.set("acc", 0.5).unwrap();
        assert_eq!(aggregator.get("acc"), Some(0.5));
        assert_eq!(aggregator.export(), "acc  0.50");
    }

    #[test]
    fn test_repeated_registration_keeps_value() {
        let mut aggregator = StatisticsAggregator::new();
        aggregator.add_aggregator("loss", None);
        aggregator.set("loss", 1.25).unwrap();
        aggregator.add_aggregator("loss", Some(Formatting::new(6, 2)));

        assert!(aggregator.is_visible("loss"));
        assert_eq!(aggregator.get("loss"), Some(1.25));
        assert_eq!(aggregator.export(), "loss   1.25");
    }
}
