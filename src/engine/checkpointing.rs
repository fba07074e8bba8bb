// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Checkpoint save/load protocol of the Pipeline Manager.

use serde_yaml::Value;
use std::path::Path;

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::consts::LOAD_KEY;
use crate::errors::{CheckpointError, LoadError, LoadFailure};
use crate::observability::messages::checkpoint::{
    BestCheckpointMissing, CheckpointExported, CheckpointOpened, CheckpointStatusUpdated, ModelMissingInCheckpoint,
    ModelRestored, ModelsLoadFailed,
};
use crate::observability::messages::StructuredLog;
use crate::utils::{expand_home, normalize_path};

use super::manager::PipelineManager;

impl PipelineManager {
    /// Save the parameters of every model.
    ///
    /// Writes an intermediate checkpoint when the context asks for it, and the
    /// best checkpoint when `loss` improves on the best loss so far. A status
    /// change without improvement only patches the status of the existing best
    /// checkpoint. Returns whether this save produced a new best checkpoint.
    pub fn save(&mut self, directory: impl AsRef<Path>, status: &str, loss: f64) -> Result<bool, CheckpointError> {
        let store = CheckpointStore::new(expand_home(directory.as_ref()));

        let mut checkpoint = Checkpoint::new(self.name.clone(), self.context.episode, loss, status);
        let mut saved = Vec::new();
        for model in self.models() {
            model.save_to_checkpoint(&mut checkpoint)?;
            saved.push(model.name().to_string());
        }

        if self.context.save_intermediate {
            let path = store.intermediate_path(&self.name, self.context.episode);
            store.write(&path, &checkpoint)?;
            CheckpointExported {
                pipeline: &self.name,
                path: &path,
                models: &saved,
            }
            .log();
        }

        let best_path = store.best_path(&self.name);
        if loss < self.best_loss {
            store.write(&best_path, &checkpoint)?;
            CheckpointExported {
                pipeline: &self.name,
                path: &best_path,
                models: &saved,
            }
            .log();

            self.best_loss = loss;
            self.best_status = status.to_string();
            self.validation_loss_down_counter = 0;
            return Ok(true);
        }

        if self.best_status != status {
            if best_path.is_file() {
                CheckpointStore::patch_status(&best_path, status)?;
                CheckpointStatusUpdated {
                    path: &best_path,
                    status,
                }
                .log();
            } else {
                BestCheckpointMissing {
                    path: &best_path,
                    status,
                }
                .log();
            }
        }

        self.validation_loss_down_counter += 1;
        Ok(false)
    }

    /// Restore every model from a full pipeline checkpoint.
    ///
    /// Models without an entry in the record keep their parameters and are
    /// reported as warnings.
    pub fn load(&mut self, file: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = normalize_path(&file.as_ref().to_string_lossy());
        let checkpoint = CheckpointStore::read(&path).map_err(|source| LoadError::Pipeline {
            path: path.clone(),
            source,
        })?;

        let opened = CheckpointOpened {
            pipeline: &checkpoint.name,
            path: &path,
            episode: checkpoint.episode,
            loss: checkpoint.loss,
            status: &checkpoint.status,
        };
        opened.log();
        let _load = opened.span("load").entered();

        for priority in &self.models {
            let Some(model) = self
                .registry
                .component_mut(*priority)
                .and_then(|component| component.as_model_mut())
            else {
                continue;
            };

            match model.load_from_checkpoint(&checkpoint, None) {
                Ok(()) => ModelRestored {
                    model: model.name(),
                    model_type: model.type_name(),
                    source: model.name(),
                }
                .log(),
                Err(CheckpointError::MissingModel(_)) => ModelMissingInCheckpoint {
                    model: model.name(),
                    model_type: model.type_name(),
                    path: &path,
                }
                .log(),
                Err(source) => return Err(LoadError::Pipeline { path, source }),
            }
        }
        Ok(())
    }

    /// Restore the pipeline from the reserved `load` entry, if present.
    ///
    /// Returns whether a checkpoint was loaded.
    pub fn load_from_config(&mut self) -> Result<bool, LoadError> {
        let Some(file) = self.config.load().map(str::to_string) else {
            return Ok(false);
        };
        self.load(file)?;
        Ok(true)
    }

    /// Restore the models whose section carries a `load` entry.
    ///
    /// The entry is either a checkpoint path or a `{file, model}` mapping naming
    /// the record entry to import. Every request that cannot be satisfied is
    /// collected; any failure makes the whole call fail.
    pub fn load_models(&mut self) -> Result<(), LoadError> {
        let mut failures = Vec::new();

        for priority in &self.models {
            let Some(model) = self
                .registry
                .component_mut(*priority)
                .and_then(|component| component.as_model_mut())
            else {
                continue;
            };
            let Some(request) = model.config().get(LOAD_KEY).cloned() else {
                continue;
            };

            let name = model.name().to_string();
            let Some((file, source_model)) = load_request(&request) else {
                failures.push(LoadFailure::MalformedSection { model: name });
                continue;
            };

            let path = normalize_path(&file);
            if !path.is_file() {
                failures.push(LoadFailure::FileNotFound { model: name, path });
                continue;
            }

            let restored = CheckpointStore::read(&path).and_then(|checkpoint| {
                CheckpointOpened {
                    pipeline: &checkpoint.name,
                    path: &path,
                    episode: checkpoint.episode,
                    loss: checkpoint.loss,
                    status: &checkpoint.status,
                }
                .log();
                model.load_from_checkpoint(&checkpoint, source_model.as_deref())
            });

            match restored {
                Ok(()) => ModelRestored {
                    model: &name,
                    model_type: model.type_name(),
                    source: source_model.as_deref().unwrap_or(&name),
                }
                .log(),
                Err(source) => failures.push(LoadFailure::Restore {
                    model: name,
                    path,
                    source,
                }),
            }
        }

        if failures.is_empty() {
            return Ok(());
        }
        let error = LoadError::Models(failures);
        ModelsLoadFailed { error: &error }.log();
        Err(error)
    }
}

/// `(file, source model)` of a `load` entry, or `None` when malformed.
fn load_request(value: &Value) -> Option<(String, Option<String>)> {
    match value {
        Value::String(file) => Some((file.clone(), None)),
        Value::Mapping(mapping) => {
            let file = mapping.get("file")?.as_str()?;
            let model = mapping.get("model")?.as_str()?;
            Some((file.to_string(), Some(model.to_string())))
        }
        _ => None,
    }
}
