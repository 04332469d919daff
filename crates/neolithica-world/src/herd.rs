//! Herds of animals that hunters can slaughter for resources.

use std::fmt;

use neolithica_types::{HerdId, ResourceKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A source of animals. Each kill yields one unit of [`Herd::resource_kind`].
pub trait Herd: fmt::Debug + Send {
    /// What one slaughtered animal yields.
    fn resource_kind(&self) -> &ResourceKind;

    /// Try to kill one animal. Returns `false` if none could be taken.
    fn kill_animal(&mut self) -> bool;
}

/// A herd with a fixed, finite population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalHerd {
    /// Unique herd id.
    pub id: HerdId,
    /// Display name.
    pub name: String,
    /// Resource each animal yields.
    pub resource: ResourceKind,
    /// Animals left.
    pub population: u32,
}

impl AnimalHerd {
    /// Create a herd of `population` animals yielding `resource`.
    pub fn new(name: impl Into<String>, resource: impl Into<ResourceKind>, population: u32) -> Self {
        Self {
            id: HerdId::new(),
            name: name.into(),
            resource: resource.into(),
            population,
        }
    }
}

impl Herd for AnimalHerd {
    fn resource_kind(&self) -> &ResourceKind {
        &self.resource
    }

    fn kill_animal(&mut self) -> bool {
        match self.population.checked_sub(1) {
            Some(left) => {
                self.population = left;
                debug!(herd = %self.id, left, "animal killed");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kills_until_the_herd_is_gone() {
        let mut herd = AnimalHerd::new("Snorgles", "meat", 2);
        assert!(herd.kill_animal());
        assert!(herd.kill_animal());
        assert!(!herd.kill_animal());
        assert_eq!(herd.population, 0);
        assert_eq!(herd.resource_kind().as_str(), "meat");
    }
}
