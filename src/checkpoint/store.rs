// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

use super::record::Checkpoint;
use crate::errors::CheckpointError;

const EXTENSION: &str = "ckpt";

/// File-backed checkpoint store rooted at one directory.
///
/// Assumes a single writer per directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointStore {
    directory: PathBuf,
}

impl CheckpointStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Single mutable slot holding the best checkpoint of `pipeline`.
    pub fn best_path(&self, pipeline: &str) -> PathBuf {
        self.directory.join(format!("{}_best.{}", pipeline, EXTENSION))
    }

    /// Append-only history entry for `episode`.
    pub fn intermediate_path(&self, pipeline: &str, episode: u64) -> PathBuf {
        self.directory
            .join(format!("{}_episode_{:05}.{}", pipeline, episode, EXTENSION))
    }

    pub fn write(&self, path: &Path, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.directory).map_err(|source| CheckpointError::Io {
            path: self.directory.clone(),
            source,
        })?;
        let bytes = serde_json::to_vec_pretty(checkpoint)?;
        write_file(path, &bytes)
    }

    pub fn read(path: &Path) -> Result<Checkpoint, CheckpointError> {
        let bytes = fs::read(path).map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Rewrite only `status` and `status_timestamp` of the record at `path`.
    ///
    /// The rest of the document, parameter blobs included, is written back as read.
    pub fn patch_status(path: &Path, status: &str) -> Result<(), CheckpointError> {
        let bytes = fs::read(path).map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut document: serde_json::Value = serde_json::from_slice(&bytes)?;
        if let Some(fields) = document.as_object_mut() {
            fields.insert("status".into(), serde_json::Value::from(status));
            fields.insert(
                "status_timestamp".into(),
                serde_json::to_value(Utc::now())?,
            );
        }
        let bytes = serde_json::to_vec_pretty(&document)?;
        write_file(path, &bytes)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CheckpointError> {
    fs::write(path, bytes).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::ModelState;
    use crate::streams::Tensor;

    #[test]
    fn test_file_names() {
        let store = CheckpointStore::new("/tmp/run");
        assert_eq!(store.best_path("mnist"), PathBuf::from("/tmp/run/mnist_best.ckpt"));
        assert_eq!(
            store.intermediate_path("mnist", 42),
            PathBuf::from("/tmp/run/mnist_episode_00042.ckpt")
        );
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("nested"));
        let checkpoint = Checkpoint::new("pipe", 7, 0.25, "training");

        let path = store.best_path("pipe");
        store.write(&path, &checkpoint).unwrap();
        assert_eq!(CheckpointStore::read(&path).unwrap(), checkpoint);
    }

    #[test]
    fn test_patch_status_keeps_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let mut state = ModelState::new();
        state.insert("weights", &Tensor::new(vec![0.5, -0.5], vec![1, 2]).unwrap());
        let mut checkpoint = Checkpoint::new("pipe", 1, 2.0, "training");
        checkpoint.insert_model("classifier", &state).unwrap();

        let path = store.best_path("pipe");
        store.write(&path, &checkpoint).unwrap();
        CheckpointStore::patch_status(&path, "finished").unwrap();

        let patched = CheckpointStore::read(&path).unwrap();
        assert_eq!(patched.status, "finished");
        assert_eq!(patched.loss, 2.0);
        assert_eq!(patched.episode, 1);
        assert_eq!(patched.timestamp, checkpoint.timestamp);
        assert_eq!(patched.model_state("classifier").unwrap(), state);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = CheckpointStore::read(&dir.path().join("absent.ckpt"));
        assert!(matches!(result, Err(CheckpointError::Io { .. })));
    }
}
