// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic the pipeline emits is a message struct implementing
//! `Display` and [`messages::StructuredLog`]. This keeps message text out of
//! the engine code and gives every event consistent structured fields.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::build` - priority resolution and component instantiation
//! * `messages::handshake` - schema compatibility checks
//! * `messages::execution` - device placement, modes, freezing, gradient passes
//! * `messages::checkpoint` - checkpoint export, status patching and restore
//!
//! # Usage
//!
//! ```rust
//! use pipewright::observability::messages::build::ComponentDisabled;
//! use pipewright::observability::messages::StructuredLog;
//!
//! ComponentDisabled { component: "accuracy" }.log();
//! ```

pub mod messages;
