// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod nll_loss;

pub use nll_loss::NllLoss;
