// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod linear_classifier;

pub use linear_classifier::LinearClassifier;
