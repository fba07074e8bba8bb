// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Handles onto the per-batch computation graph.
//!
//! The engine does not differentiate anything itself: it only decides *when*
//! gradient propagation is requested and whether the graph must be retained.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::GradientError;

/// Something gradients can be propagated from.
pub trait GradientNode: Send + Sync {
    fn backward(&self, retain_graph: bool) -> Result<(), GradientError>;
}

#[derive(Debug, Default)]
struct TapeState {
    released: bool,
    passes: Vec<bool>,
}

/// Shared computation graph of one batch.
///
/// Every backward call is recorded with its retention flag. A call without
/// retention frees the graph; any later call fails with
/// [`GradientError::GraphReleased`].
#[derive(Debug, Clone, Default)]
pub struct GraphTape {
    state: Arc<Mutex<TapeState>>,
}

impl GraphTape {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, TapeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Retention flags of every successful backward call, in call order.
    pub fn passes(&self) -> Vec<bool> {
        self.state().passes.clone()
    }

    pub fn is_released(&self) -> bool {
        self.state().released
    }
}

impl GradientNode for GraphTape {
    fn backward(&self, retain_graph: bool) -> Result<(), GradientError> {
        let mut state = self.state();
        if state.released {
            return Err(GradientError::GraphReleased);
        }
        state.passes.push(retain_graph);
        if !retain_graph {
            state.released = true;
        }
        Ok(())
    }
}

/// Scalar loss value attached to the graph it was computed on.
#[derive(Clone)]
pub struct LossValue {
    value: f64,
    node: Arc<dyn GradientNode>,
}

impl LossValue {
    pub fn new(value: f64, node: Arc<dyn GradientNode>) -> Self {
        Self { value, node }
    }

    /// Loss recorded on a batch tape.
    pub fn on_tape(value: f64, tape: &GraphTape) -> Self {
        Self::new(value, Arc::new(tape.clone()))
    }

    pub fn item(&self) -> f64 {
        self.value
    }

    pub fn backward(&self, retain_graph: bool) -> Result<(), GradientError> {
        self.node.backward(retain_graph)
    }
}

impl fmt::Debug for LossValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LossValue").field("value", &self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retained_passes_keep_graph_alive() {
        let tape = GraphTape::new();
        tape.backward(true).unwrap();
        tape.backward(true).unwrap();
        assert!(!tape.is_released());
        tape.backward(false).unwrap();
        assert!(tape.is_released());
        assert_eq!(tape.passes(), vec![true, true, false]);
    }

    #[test]
    fn test_backward_after_release_fails() {
        let tape = GraphTape::new();
        let loss = LossValue::on_tape(1.0, &tape);
        loss.backward(false).unwrap();
        assert_eq!(loss.backward(false), Err(GradientError::GraphReleased));
    }
}
