// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Checkpoint records and their file-backed store.

mod record;
mod store;

pub use record::{Checkpoint, ModelState, TensorRecord};
pub use store::CheckpointStore;
