// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::ConfigurationError;
use crate::traits::Component;

/// Execution-order key of a pipeline component.
///
/// A totally ordered `f64`: NaN is rejected at construction and `-0.0` is folded
/// into `0.0`, so equality and ordering agree with the numeric value.
#[derive(Debug, Clone, Copy)]
pub struct Priority(f64);

impl Priority {
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        Some(Self(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registry slot: the component name before `build()`, the live instance after.
pub enum RegistryEntry {
    Unbuilt(String),
    Built(Box<dyn Component>),
}

impl RegistryEntry {
    pub fn name(&self) -> &str {
        match self {
            RegistryEntry::Unbuilt(name) => name,
            RegistryEntry::Built(component) => component.name(),
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self, RegistryEntry::Built(_))
    }

    pub fn component(&self) -> Option<&dyn Component> {
        match self {
            RegistryEntry::Built(component) => Some(component.as_ref()),
            RegistryEntry::Unbuilt(_) => None,
        }
    }

    pub fn component_mut(&mut self) -> Option<&mut (dyn Component + 'static)> {
        match self {
            RegistryEntry::Built(component) => Some(component.as_mut()),
            RegistryEntry::Unbuilt(_) => None,
        }
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEntry::Unbuilt(name) => f.debug_tuple("Unbuilt").field(name).finish(),
            RegistryEntry::Built(component) => f
                .debug_struct("Built")
                .field("name", &component.name())
                .field("type", &component.type_name())
                .finish(),
        }
    }
}

/// Priority-ordered mapping of pipeline entries.
///
/// Iteration order is always ascending priority, which is the forward-pass order.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    entries: BTreeMap<Priority, RegistryEntry>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` under `priority`; a taken priority is a configuration error
    /// and keeps the first name.
    pub fn insert_name(
        &mut self,
        priority: Priority,
        name: impl Into<String>,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        if let Some(existing) = self.entries.get(&priority) {
            return Err(ConfigurationError::DuplicatePriority {
                section: name,
                existing: existing.name().to_string(),
                priority: priority.value(),
            });
        }
        self.entries.insert(priority, RegistryEntry::Unbuilt(name));
        Ok(())
    }

    /// Install a live component in an existing slot, returning the previous entry.
    pub fn install(
        &mut self,
        priority: Priority,
        component: Box<dyn Component>,
    ) -> Option<RegistryEntry> {
        self.entries
            .insert(priority, RegistryEntry::Built(component))
    }

    pub fn remove(&mut self, priority: Priority) -> Option<RegistryEntry> {
        self.entries.remove(&priority)
    }

    pub fn get(&self, priority: Priority) -> Option<&RegistryEntry> {
        self.entries.get(&priority)
    }

    pub fn get_mut(&mut self, priority: Priority) -> Option<&mut RegistryEntry> {
        self.entries.get_mut(&priority)
    }

    pub fn component(&self, priority: Priority) -> Option<&dyn Component> {
        self.get(priority).and_then(RegistryEntry::component)
    }

    pub fn component_mut(&mut self, priority: Priority) -> Option<&mut (dyn Component + 'static)> {
        self.get_mut(priority).and_then(RegistryEntry::component_mut)
    }

    /// Priorities in ascending order.
    pub fn priorities(&self) -> Vec<Priority> {
        self.entries.keys().copied().collect()
    }

    /// Entry at execution ordinal `index`.
    pub fn nth(&self, index: usize) -> Option<(Priority, &RegistryEntry)> {
        self.entries
            .iter()
            .nth(index)
            .map(|(priority, entry)| (*priority, entry))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.values().map(RegistryEntry::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Priority, &RegistryEntry)> {
        self.entries.iter().map(|(priority, entry)| (*priority, entry))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Priority, &mut RegistryEntry)> {
        self.entries
            .iter_mut()
            .map(|(priority, entry)| (*priority, entry))
    }

    /// Live components in ascending priority; unbuilt slots are skipped.
    pub fn components(&self) -> impl Iterator<Item = (Priority, &dyn Component)> {
        self.iter()
            .filter_map(|(priority, entry)| entry.component().map(|c| (priority, c)))
    }

    pub fn components_mut(
        &mut self,
    ) -> impl Iterator<Item = (Priority, &mut (dyn Component + 'static))> {
        self.iter_mut()
            .filter_map(|(priority, entry)| entry.component_mut().map(|c| (priority, c)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(value: f64) -> Priority {
        Priority::new(value).unwrap()
    }

    #[test]
    fn test_priority_rejects_nan() {
        assert!(Priority::new(f64::NAN).is_none());
    }

    #[test]
    fn test_priority_negative_zero_equals_zero() {
        assert_eq!(p(-0.0), p(0.0));
    }

    #[test]
    fn test_priorities_are_sorted_ascending() {
        let mut registry = ComponentRegistry::new();
        registry.insert_name(p(3.0), "c").unwrap();
        registry.insert_name(p(-1.5), "a").unwrap();
        registry.insert_name(p(2.25), "b").unwrap();

        assert_eq!(registry.names(), vec!["a", "b", "c"]);
        let values: Vec<f64> = registry.priorities().into_iter().map(Priority::value).collect();
        assert_eq!(values, vec![-1.5, 2.25, 3.0]);
        assert_eq!(registry.nth(1).map(|(_, entry)| entry.name()), Some("b"));
    }

    #[test]
    fn test_duplicate_priority_keeps_first_name() {
        let mut registry = ComponentRegistry::new();
        registry.insert_name(p(1.0), "first").unwrap();

        let err = registry.insert_name(p(1.0), "second").unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicatePriority {
                section: "second".to_string(),
                existing: "first".to_string(),
                priority: 1.0,
            }
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), vec!["first"]);
    }

    #[test]
    fn test_unbuilt_entries_have_no_component() {
        let mut registry = ComponentRegistry::new();
        registry.insert_name(p(1.0), "pending").unwrap();
        assert!(registry.component(p(1.0)).is_none());
        assert_eq!(registry.components().count(), 0);
        assert!(!registry.get(p(1.0)).unwrap().is_built());
    }
}
