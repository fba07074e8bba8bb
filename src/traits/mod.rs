// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod capabilities;
pub mod component;

pub use capabilities::{Capabilities, Capability};
pub use component::{Component, ComponentBase, Loss, Mode, Model, NamedParameter, Task};
