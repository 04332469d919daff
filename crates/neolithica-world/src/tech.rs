//! Technology gating.
//!
//! Buildings may require technologies before they can be placed. The
//! construction subsystem only ever asks one question, so the collaborator
//! is a single-method trait with a set-backed implementation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Answers whether a technology has been researched.
pub trait TechGate {
    /// Return `true` if `tech` has been researched.
    fn is_researched(&self, tech: &str) -> bool;
}

/// The set of technologies researched so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechTree {
    researched: BTreeSet<String>,
}

impl TechTree {
    /// Create a tree with nothing researched.
    pub const fn new() -> Self {
        Self {
            researched: BTreeSet::new(),
        }
    }

    /// Mark `tech` as researched. Returns `false` if it already was.
    pub fn research(&mut self, tech: impl Into<String>) -> bool {
        let tech = tech.into();
        let newly = self.researched.insert(tech.clone());
        if newly {
            info!(tech = %tech, "technology researched");
        }
        newly
    }

    /// Iterate over researched technologies in sorted order.
    pub fn researched(&self) -> impl Iterator<Item = &str> {
        self.researched.iter().map(String::as_str)
    }
}

impl TechGate for TechTree {
    fn is_researched(&self, tech: &str) -> bool {
        self.researched.contains(tech)
    }
}

impl<S: Into<String>> FromIterator<S> for TechTree {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            researched: iter.into_iter().map(Into::into).collect(),
        }
    }
}
