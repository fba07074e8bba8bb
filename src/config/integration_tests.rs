// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod integration_tests {
    use crate::config::{
        disabled_components, load_config, resolve_priorities, Priority, RuntimeContext,
    };
    use crate::errors::ConfigurationError;

    /// The demo run file keeps the task next to the pipeline sections
    #[test]
    fn test_demo_pipeline_yaml_loading() {
        let root = load_config("configs/demo-pipeline.yaml").unwrap();
        let task = root.section("task").unwrap();
        assert_eq!(task.type_name().unwrap(), "synthetic_classification");
        assert_eq!(task.get_usize("batch_size", 1).unwrap(), 16);

        let pipeline = root.nested("pipeline").unwrap();
        assert_eq!(pipeline.name(), "synthetic_linear");
        assert_eq!(pipeline.disable(), Some("debug_accuracy"));

        let names: Vec<String> = pipeline.sections().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["name", "disable", "classifier", "nll", "batch_size", "accuracy", "debug_accuracy"]
        );
    }

    /// YAML and TOML describe the same ordering
    #[test]
    fn test_toml_matches_yaml_ordering() {
        let yaml = load_config("configs/demo-pipeline.yaml").unwrap().nested("pipeline").unwrap();
        let toml = load_config("configs/demo-pipeline.toml").unwrap().nested("pipeline").unwrap();

        let (yaml_registry, yaml_errors) = resolve_priorities(&yaml, &disabled_components(&yaml, &[]));
        let (toml_registry, toml_errors) = resolve_priorities(&toml, &disabled_components(&toml, &[]));
        assert!(yaml_errors.is_empty());
        assert!(toml_errors.is_empty());

        assert_eq!(toml_registry.names(), vec!["classifier", "nll", "batch_size"]);
        assert_eq!(&yaml_registry.names()[..3], &toml_registry.names()[..]);
    }

    /// Disabled sections never reach priority resolution
    #[test]
    fn test_disable_section_and_runtime_override() {
        let pipeline = load_config("configs/demo-pipeline.yaml").unwrap().nested("pipeline").unwrap();
        let context = RuntimeContext::new().with_disabled("accuracy, batch_size");

        let disabled = disabled_components(&pipeline, &context.disable);
        assert_eq!(
            disabled.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["accuracy", "batch_size", "debug_accuracy"]
        );

        let (registry, errors) = resolve_priorities(&pipeline, &disabled);
        assert!(errors.is_empty());
        assert_eq!(registry.names(), vec!["classifier", "nll"]);
        assert_eq!(registry.priorities(), vec![Priority::new(1.0).unwrap(), Priority::new(2.0).unwrap()]);
    }

    /// A shared priority is reported once and the first section keeps the slot
    #[test]
    fn test_duplicate_priority_yaml() {
        let pipeline = load_config("configs/duplicate-priority.yaml").unwrap();
        let (registry, errors) = resolve_priorities(&pipeline, &disabled_components(&pipeline, &[]));

        assert_eq!(
            errors,
            vec![ConfigurationError::DuplicatePriority {
                section: "accuracy".to_string(),
                existing: "nll".to_string(),
                priority: 2.0,
            }]
        );
        assert_eq!(registry.names(), vec!["classifier", "nll"]);
    }

    /// Reserved sections are control entries, not components
    #[test]
    fn test_reserved_sections_are_skipped() {
        let pipeline = load_config("configs/frozen-pipeline.yaml").unwrap();
        assert!(pipeline.freeze_all().unwrap());

        let (registry, errors) = resolve_priorities(&pipeline, &disabled_components(&pipeline, &[]));
        assert!(errors.is_empty());
        assert_eq!(registry.names(), vec!["encoder", "head", "nll"]);
    }
}
