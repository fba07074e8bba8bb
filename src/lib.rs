// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod checkpoint;    // checkpoint records + store
pub mod components;    // built-in components
pub mod config;        // config + registry
pub mod engine;        // pipeline manager
pub mod errors;        // error handling
pub mod observability;
pub mod statistics;    // per-batch collection and aggregation
pub mod streams;       // data streams, schemas, tensors
pub mod traits;        // component abstractions
pub mod utils;
