// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Priority resolution for pipeline configurations.
//!
//! Ordering is validated before anything is instantiated: every enabled,
//! non-reserved section must carry a numeric `priority`, and priorities must be
//! unique. Problems are collected rather than returned on first sight so that a
//! single pass reports every broken section.

use serde_yaml::Value;
use std::collections::BTreeSet;

use super::consts::{PRIORITY_KEY, RESERVED_SECTIONS};
use super::loader::PipelineConfig;
use super::registry::{ComponentRegistry, Priority};
use super::runtime::split_names;
use crate::errors::ConfigurationError;

/// Union of the configuration `disable` list and the runtime override list.
pub fn disabled_components(
    config: &PipelineConfig,
    runtime_override: &[String],
) -> BTreeSet<String> {
    let mut disabled: BTreeSet<String> = config
        .disable()
        .map(split_names)
        .unwrap_or_default()
        .into_iter()
        .collect();
    disabled.extend(runtime_override.iter().flat_map(|names| split_names(names)));
    disabled
}

/// Record every enabled component section under its priority.
///
/// Returns the (unbuilt) registry together with every ordering problem found.
/// The registry keeps the sections that were valid so the caller can report on
/// them; it must not be instantiated unless the error list is empty.
pub fn resolve_priorities(
    config: &PipelineConfig,
    disabled: &BTreeSet<String>,
) -> (ComponentRegistry, Vec<ConfigurationError>) {
    let mut registry = ComponentRegistry::new();
    let mut errors = Vec::new();

    for (name, section) in config.sections() {
        if RESERVED_SECTIONS.contains(&name.as_str()) || disabled.contains(&name) {
            continue;
        }

        let result = section_priority(&name, section)
            .and_then(|priority| registry.insert_name(priority, name.clone()));
        if let Err(err) = result {
            errors.push(err);
        }
    }

    (registry, errors)
}

fn section_priority(name: &str, section: &Value) -> Result<Priority, ConfigurationError> {
    let mapping = section
        .as_mapping()
        .ok_or_else(|| ConfigurationError::MalformedSection {
            section: name.to_string(),
        })?;

    let raw = mapping
        .get(PRIORITY_KEY)
        .ok_or_else(|| ConfigurationError::MissingPriority {
            section: name.to_string(),
        })?;

    let invalid = || ConfigurationError::InvalidPriority {
        section: name.to_string(),
        value: render(raw),
    };

    let value = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(invalid)?;

    Priority::new(value).ok_or_else(invalid)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_yaml::to_string(other)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_else(|_| format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> PipelineConfig {
        PipelineConfig::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_valid_priorities() {
        let cfg = config(
            r#"
name: ordered
third:
  priority: 3
first:
  priority: 1.0
second:
  priority: "2.5"
"#,
        );

        let (registry, errors) = resolve_priorities(&cfg, &BTreeSet::new());
        assert!(errors.is_empty());
        assert_eq!(registry.names(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_missing_and_invalid_priority() {
        let cfg = config(
            r#"
no_priority:
  type: a
bad_priority:
  priority: high
list_priority:
  priority: [1, 2]
ok:
  priority: 1
"#,
        );

        let (registry, errors) = resolve_priorities(&cfg, &BTreeSet::new());
        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors[0],
            ConfigurationError::MissingPriority {
                section: "no_priority".into()
            }
        );
        assert_eq!(
            errors[1],
            ConfigurationError::InvalidPriority {
                section: "bad_priority".into(),
                value: "high".into()
            }
        );
        assert!(matches!(
            errors[2],
            ConfigurationError::InvalidPriority { ref section, .. } if section == "list_priority"
        ));
        assert_eq!(registry.names(), vec!["ok"]);
    }

    #[test]
    fn test_duplicate_priority_yields_single_error() {
        let cfg = config(
            r#"
a:
  priority: 1
b:
  priority: 1.0
c:
  priority: 2
"#,
        );

        let (registry, errors) = resolve_priorities(&cfg, &BTreeSet::new());
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            ConfigurationError::DuplicatePriority { ref section, ref existing, .. }
                if section == "b" && existing == "a"
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_reserved_and_disabled_sections_are_skipped() {
        let cfg = config(
            r#"
name: pipeline
freeze: true
load: /tmp/none.ckpt
disable: "skipped , other"
skipped:
  priority: 1
kept:
  priority: 2
runtime_skipped:
  type: x
"#,
        );

        let disabled = disabled_components(&cfg, &["runtime_skipped".to_string()]);
        assert_eq!(
            disabled.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["other", "runtime_skipped", "skipped"]
        );

        let (registry, errors) = resolve_priorities(&cfg, &disabled);
        assert!(errors.is_empty());
        assert_eq!(registry.names(), vec!["kept"]);
    }

    #[test]
    fn test_malformed_section() {
        let cfg = config("scalar_section: 5\n");
        let (_, errors) = resolve_priorities(&cfg, &BTreeSet::new());
        assert_eq!(
            errors,
            vec![ConfigurationError::MalformedSection {
                section: "scalar_section".into()
            }]
        );
    }
}
