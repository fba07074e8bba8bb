// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;
use std::fmt;

/// Behavioral role a component can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Model,
    Loss,
    Task,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Model => write!(f, "Model"),
            Capability::Loss => write!(f, "Loss"),
            Capability::Task => write!(f, "Task"),
        }
    }
}

/// Capability set used to classify components instead of a type hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(BTreeSet<Capability>);

impl Capabilities {
    /// Plain component: no special role.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn of(roles: &[Capability]) -> Self {
        Self(roles.iter().copied().collect())
    }

    pub fn with(mut self, role: Capability) -> Self {
        self.0.insert(role);
        self
    }

    /// Whether the set exposes `role`.
    pub fn check(&self, role: Capability) -> bool {
        self.0.contains(&role)
    }

    pub fn is_model(&self) -> bool {
        self.check(Capability::Model)
    }

    pub fn is_loss(&self) -> bool {
        self.check(Capability::Loss)
    }

    pub fn is_task(&self) -> bool {
        self.check(Capability::Task)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roles: Vec<String> = self.0.iter().map(Capability::to_string).collect();
        if roles.is_empty() {
            write!(f, "Component")
        } else {
            write!(f, "{}", roles.join("+"))
        }
    }
}
