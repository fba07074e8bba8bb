// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod checkpointing;
mod execution;
pub mod factory;
mod handshake;
pub mod manager;
pub mod replicated;
mod statistics;

pub use factory::{ComponentFactory, Constructor};
pub use manager::PipelineManager;
pub use replicated::{ReplicatedModel, REPLICA_COUNT_STREAM};
