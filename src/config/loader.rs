// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

use super::consts::{DEFAULT_PIPELINE_NAME, DISABLE_KEY, FREEZE_KEY, LOAD_KEY, NAME_KEY};
use super::section::ComponentConfig;
use crate::errors::{ConfigLoadError, ConfigurationError};

/// Declarative pipeline description.
///
/// The root mapping holds one section per component (keyed by component name)
/// plus the reserved control sections `name`, `load`, `freeze` and `disable`.
/// Declaration order is preserved.
///
/// # Example
/// ```yaml
/// name: mnist_linear
/// disable: accuracy
/// classifier:
///   type: linear_classifier
///   priority: 1
///   input_size: 784
///   num_classes: 10
/// nll:
///   type: nll_loss
///   priority: 2
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    root: Mapping,
}

impl PipelineConfig {
    pub fn new(root: Mapping) -> Self {
        Self { root }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigLoadError> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigLoadError> {
        let value: Value = toml::from_str(text)?;
        Self::from_value(value)
    }

    fn from_value(value: Value) -> Result<Self, ConfigLoadError> {
        match value {
            Value::Mapping(root) => Ok(Self::new(root)),
            _ => Err(ConfigLoadError::NotAMapping),
        }
    }

    /// Pipeline name from the `name` section.
    pub fn name(&self) -> &str {
        self.root
            .get(NAME_KEY)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PIPELINE_NAME)
    }

    /// Raw comma-separated content of the `disable` section.
    pub fn disable(&self) -> Option<&str> {
        self.root.get(DISABLE_KEY).and_then(Value::as_str)
    }

    /// Pipeline-wide freeze flag; absent means false.
    pub fn freeze_all(&self) -> Result<bool, ConfigurationError> {
        match self.root.get(FREEZE_KEY) {
            Some(value) => value.as_bool().ok_or_else(|| {
                ConfigurationError::invalid_parameter(self.name(), FREEZE_KEY, "expected true or false")
            }),
            None => Ok(false),
        }
    }

    /// Pipeline checkpoint requested by the `load` section.
    pub fn load(&self) -> Option<&str> {
        self.root.get(LOAD_KEY).and_then(Value::as_str)
    }

    /// Every top-level entry in declaration order, keys rendered as strings.
    pub fn sections(&self) -> impl Iterator<Item = (String, &Value)> {
        self.root
            .iter()
            .filter_map(|(key, value)| section_name(key).map(|name| (name, value)))
    }

    /// Component section by name, if it exists and is a mapping.
    pub fn section(&self, name: &str) -> Option<ComponentConfig> {
        self.root
            .get(name)
            .and_then(Value::as_mapping)
            .map(|mapping| ComponentConfig::new(name, mapping.clone()))
    }

    /// Mapping stored under `key`, read as a configuration of its own.
    ///
    /// Run files keep the pipeline next to the task feeding it, e.g.
    /// `{task: {...}, pipeline: {...}}`.
    pub fn nested(&self, key: &str) -> Option<PipelineConfig> {
        self.root
            .get(key)
            .and_then(Value::as_mapping)
            .map(|mapping| PipelineConfig::new(mapping.clone()))
    }
}

fn section_name(key: &Value) -> Option<String> {
    match key {
        Value::String(name) => Some(name.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Load a pipeline configuration from a YAML (`.yaml`/`.yml`) or TOML (`.toml`) file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigLoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => PipelineConfig::from_yaml_str(&content),
        Some("toml") => PipelineConfig::from_toml_str(&content),
        _ => Err(ConfigLoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
name: demo
disable: "stats, accuracy"
freeze: true
classifier:
  type: linear_classifier
  priority: 1
nll:
  type: nll_loss
  priority: 2
"#;

        let cfg = PipelineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.name(), "demo");
        assert_eq!(cfg.disable(), Some("stats, accuracy"));
        assert!(cfg.freeze_all().unwrap());
        assert_eq!(cfg.load(), None);

        let names: Vec<String> = cfg.sections().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "disable", "freeze", "classifier", "nll"]);
        assert_eq!(cfg.section("nll").unwrap().type_name().unwrap(), "nll_loss");
    }

    #[test]
    fn test_freeze_flag_must_be_bool() {
        let cfg = PipelineConfig::from_yaml_str("name: demo\nfreeze: \"yes\"\n").unwrap();
        assert!(matches!(
            cfg.freeze_all(),
            Err(ConfigurationError::InvalidParameter { ref component, ref key, .. })
                if component == "demo" && key == FREEZE_KEY
        ));

        let cfg = PipelineConfig::from_yaml_str("name: demo\n").unwrap();
        assert!(!cfg.freeze_all().unwrap());
    }

    #[test]
    fn test_default_name() {
        let cfg = PipelineConfig::from_yaml_str("a:\n  priority: 1\n").unwrap();
        assert_eq!(cfg.name(), DEFAULT_PIPELINE_NAME);
    }

    #[test]
    fn test_nested_pipeline() {
        let cfg = PipelineConfig::from_yaml_str(
            "task:\n  type: synthetic_classification\npipeline:\n  name: inner\n  nll:\n    type: nll_loss\n    priority: 1\n",
        )
        .unwrap();
        let pipeline = cfg.nested("pipeline").unwrap();
        assert_eq!(pipeline.name(), "inner");
        assert!(pipeline.section("nll").is_some());
        assert!(cfg.nested("missing").is_none());
        assert_eq!(cfg.section("task").unwrap().type_name().unwrap(), "synthetic_classification");
    }

    #[test]
    fn test_root_must_be_mapping() {
        let result = PipelineConfig::from_yaml_str("- a\n- b\n");
        assert!(matches!(result, Err(ConfigLoadError::NotAMapping)));
    }

    #[test]
    fn test_load_toml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(
            &path,
            r#"
name = "toml_pipeline"

[classifier]
type = "linear_classifier"
priority = 1.5
"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.name(), "toml_pipeline");
        let section = cfg.section("classifier").unwrap();
        assert_eq!(section.get_f64("priority", 0.0).unwrap(), 1.5);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.ini");
        std::fs::write(&path, "x").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigLoadError::UnsupportedFormat(_))
        ));
    }
}
