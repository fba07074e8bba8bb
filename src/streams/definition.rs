// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Declared stream schemas and the checks the handshake performs on them.

use indexmap::map::Entry;
use indexmap::IndexMap;
use std::fmt;

use super::value::ValueKind;
use crate::errors::SchemaError;

/// One entry of a shape pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    /// Matches any size
    Any,
    Exact(usize),
}

impl From<i64> for Dim {
    /// Negative sizes denote the wildcard.
    fn from(size: i64) -> Self {
        usize::try_from(size).map(Dim::Exact).unwrap_or(Dim::Any)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Any => write!(f, "-1"),
            Dim::Exact(size) => write!(f, "{}", size),
        }
    }
}

/// Schema of a single stream: shape pattern, accepted kinds and a description.
#[derive(Debug, Clone, PartialEq)]
pub struct DataDefinition {
    pub dimensions: Vec<Dim>,
    pub kinds: Vec<ValueKind>,
    pub description: String,
}

impl DataDefinition {
    pub fn new(dimensions: &[i64], kinds: &[ValueKind], description: impl Into<String>) -> Self {
        Self {
            dimensions: dimensions.iter().map(|d| Dim::from(*d)).collect(),
            kinds: kinds.to_vec(),
            description: description.into(),
        }
    }

    fn render_dimensions(&self) -> String {
        let dims: Vec<String> = self.dimensions.iter().map(Dim::to_string).collect();
        format!("[{}]", dims.join(", "))
    }

    fn render_kinds(&self) -> String {
        let kinds: Vec<String> = self.kinds.iter().map(ValueKind::to_string).collect();
        format!("[{}]", kinds.join(", "))
    }

    /// Check that `provided` satisfies this (expected) definition of `field`.
    ///
    /// Arity is compared first; pairwise checks only run when the arities agree,
    /// and every pairwise mismatch is reported on its own.
    pub fn check_satisfied_by(&self, field: &str, provided: &DataDefinition) -> Vec<SchemaError> {
        let mut errors = Vec::new();

        if self.dimensions.len() != provided.dimensions.len() {
            errors.push(SchemaError::DimensionCountMismatch {
                field: field.to_string(),
                expected: self.render_dimensions(),
                received: provided.render_dimensions(),
            });
        } else {
            for (index, (expected, received)) in
                self.dimensions.iter().zip(&provided.dimensions).enumerate()
            {
                if *expected != Dim::Any && expected != received {
                    errors.push(SchemaError::DimensionMismatch {
                        field: field.to_string(),
                        index,
                        expected: self.render_dimensions(),
                        received: provided.render_dimensions(),
                    });
                }
            }
        }

        if self.kinds.len() != provided.kinds.len() {
            errors.push(SchemaError::KindCountMismatch {
                field: field.to_string(),
                expected: self.render_kinds(),
                received: provided.render_kinds(),
            });
        } else {
            for (index, (expected, received)) in self.kinds.iter().zip(&provided.kinds).enumerate() {
                if expected != received {
                    errors.push(SchemaError::KindMismatch {
                        field: field.to_string(),
                        index,
                        expected: self.render_kinds(),
                        received: provided.render_kinds(),
                    });
                }
            }
        }

        errors
    }
}

impl fmt::Display for DataDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}",
            self.render_dimensions(),
            self.render_kinds(),
            self.description
        )
    }
}

/// Ordered mapping from stream name to its definition.
///
/// During the handshake this is the accumulated schema chain: write-once per
/// name, growing in component priority order.
#[derive(Debug, Clone, Default)]
pub struct DataDefinitions(IndexMap<String, DataDefinition>);

impl DataDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition unless the name is taken. Returns whether it was added.
    pub fn insert(&mut self, name: impl Into<String>, definition: DataDefinition) -> bool {
        match self.0.entry(name.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(definition);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&DataDefinition> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DataDefinition)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Verify that every definition in `self` (the inputs a component requires)
    /// is satisfied by `available`.
    pub fn check_inputs(&self, available: &DataDefinitions) -> Vec<SchemaError> {
        let mut errors = Vec::new();
        for (field, expected) in self.iter() {
            match available.get(field) {
                Some(provided) => errors.extend(expected.check_satisfied_by(field, provided)),
                None => errors.push(SchemaError::MissingField {
                    field: field.clone(),
                    available: available.names().join(", "),
                }),
            }
        }
        errors
    }

    /// Append every definition of `outputs`, rejecting names that already exist.
    ///
    /// The first writer wins: a duplicate leaves the existing definition untouched.
    pub fn export(&mut self, outputs: &DataDefinitions) -> Vec<SchemaError> {
        let mut errors = Vec::new();
        for (field, definition) in outputs.iter() {
            if !self.insert(field.clone(), definition.clone()) {
                errors.push(SchemaError::DuplicateOutput {
                    field: field.clone(),
                });
            }
        }
        errors
    }
}

/// Schemas are equal only when they list the same streams in the same order.
impl PartialEq for DataDefinitions {
    fn eq(&self, other: &Self) -> bool {
        self.0.iter().eq(other.0.iter())
    }
}

impl<K: Into<String>> FromIterator<(K, DataDefinition)> for DataDefinitions {
    fn from_iter<I: IntoIterator<Item = (K, DataDefinition)>>(iter: I) -> Self {
        let mut definitions = Self::new();
        for (name, definition) in iter {
            definitions.insert(name, definition);
        }
        definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor_def(dims: &[i64]) -> DataDefinition {
        DataDefinition::new(dims, &[ValueKind::Tensor], "test")
    }

    #[test]
    fn test_wildcard_matches_any_size() {
        let expected = tensor_def(&[-1, 10]);
        assert!(expected.check_satisfied_by("x", &tensor_def(&[32, 10])).is_empty());
        assert!(expected.check_satisfied_by("x", &tensor_def(&[-1, 10])).is_empty());
    }

    #[test]
    fn test_provided_wildcard_does_not_satisfy_exact_size() {
        let expected = tensor_def(&[-1, 10]);
        let errors = expected.check_satisfied_by("x", &tensor_def(&[-1, -1]));
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SchemaError::DimensionMismatch { index: 1, .. }));
    }

    #[test]
    fn test_arity_mismatch_is_one_error() {
        let expected = tensor_def(&[-1, 10]);
        let errors = expected.check_satisfied_by("x", &tensor_def(&[4, 10, 3]));
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SchemaError::DimensionCountMismatch { .. }));
    }

    #[test]
    fn test_kind_mismatch_is_reported_with_dimension_mismatch() {
        let expected = tensor_def(&[5]);
        let provided = DataDefinition::new(&[6], &[ValueKind::Integers], "ids");
        let errors = expected.check_satisfied_by("x", &provided);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_missing_input_is_reported() {
        let inputs: DataDefinitions = [("inputs", tensor_def(&[-1, 4]))].into_iter().collect();
        let errors = inputs.check_inputs(&DataDefinitions::new());
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SchemaError::MissingField { .. }));
    }

    #[test]
    fn test_export_first_writer_wins() {
        let mut schema: DataDefinitions = [("x", tensor_def(&[1]))].into_iter().collect();
        let outputs: DataDefinitions = [("x", tensor_def(&[2])), ("y", tensor_def(&[3]))]
            .into_iter()
            .collect();

        let errors = schema.export(&outputs);

        assert_eq!(errors, vec![SchemaError::DuplicateOutput { field: "x".to_string() }]);
        assert_eq!(schema.get("x"), Some(&tensor_def(&[1])));
        assert!(schema.contains("y"));
    }

    #[test]
    fn test_schema_equality_follows_order() {
        let forward: DataDefinitions = [("x", tensor_def(&[1])), ("y", tensor_def(&[2]))]
            .into_iter()
            .collect();
        let reversed: DataDefinitions = [("y", tensor_def(&[2])), ("x", tensor_def(&[1]))]
            .into_iter()
            .collect();

        assert_eq!(forward, forward.clone());
        assert_ne!(forward, reversed);
        assert_eq!(forward.names(), vec!["x", "y"]);
    }
}
