// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod paths;

pub use paths::{expand_home, normalize_path};
