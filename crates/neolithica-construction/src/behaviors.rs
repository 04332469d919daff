//! The building entity and the behaviors suspended while it is placed.
//!
//! A building being placed must not act as what it will become: it is not
//! selectable, exposes no target actions, and its production or storage
//! capabilities are switched off. [`SuspendedBehaviors`] records exactly
//! what was switched off so [`SuspendedBehaviors::restore`] can put the
//! building back identically.

use std::collections::BTreeSet;

use neolithica_types::{CONSTRUCT_ACTION, Capability, GhostTint};
use serde::{Deserialize, Serialize};

/// The persistent entity a construction site wraps.
///
/// The building outlives its construction site: once construction
/// finishes, only this remains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Display name.
    pub name: String,
    /// Whether the player can select the building.
    pub selectable: bool,
    /// Actions other orders may target at this building.
    pub target_actions: Vec<String>,
    /// Passive capabilities currently enabled.
    pub capabilities: BTreeSet<Capability>,
    /// Ghost tint while the building is not yet real.
    pub ghost: Option<GhostTint>,
}

impl Building {
    /// Create a functional, selectable building with no actions or
    /// capabilities.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selectable: true,
            target_actions: Vec::new(),
            capabilities: BTreeSet::new(),
            ghost: None,
        }
    }

    /// Builder-style helper to enable a capability.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Builder-style helper to add a target action.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.target_actions.push(action.into());
        self
    }

    /// Whether `capability` is currently enabled.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Whether workers may target this building with a construct order.
    pub fn accepts_construct(&self) -> bool {
        self.target_actions.iter().any(|a| a == CONSTRUCT_ACTION)
    }
}

/// Everything placement switched off, captured by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendedBehaviors {
    /// The building's selectable flag before placement.
    pub selectable: bool,
    /// The building's target actions before placement.
    pub target_actions: Vec<String>,
    /// The capabilities that were enabled and got disabled.
    pub capabilities: BTreeSet<Capability>,
}

impl SuspendedBehaviors {
    /// Disable selection, target actions, and placement-sensitive
    /// capabilities on `building`, recording what was disabled.
    pub fn suspend(building: &mut Building) -> Self {
        let capabilities: BTreeSet<Capability> = Capability::SUSPENDED_DURING_PLACEMENT
            .into_iter()
            .filter(|c| building.capabilities.remove(c))
            .collect();
        let suspended = Self {
            selectable: building.selectable,
            target_actions: core::mem::take(&mut building.target_actions),
            capabilities,
        };
        building.selectable = false;
        suspended
    }

    /// Put back exactly what [`suspend`](Self::suspend) took away.
    pub fn restore(self, building: &mut Building) {
        building.selectable = self.selectable;
        building.target_actions = self.target_actions;
        building.capabilities.extend(self.capabilities);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storehouse() -> Building {
        Building::new("Storehouse")
            .with_capability(Capability::Storage)
            .with_action("Deposit")
    }

    #[test]
    fn suspend_disables_everything() {
        let mut building = storehouse();
        let suspended = SuspendedBehaviors::suspend(&mut building);
        assert!(!building.selectable);
        assert!(building.target_actions.is_empty());
        assert!(!building.has_capability(Capability::Storage));
        assert_eq!(suspended.capabilities, BTreeSet::from([Capability::Storage]));
    }

    #[test]
    fn restore_is_identity() {
        let original = storehouse();
        let mut building = original.clone();
        let suspended = SuspendedBehaviors::suspend(&mut building);
        suspended.restore(&mut building);
        assert_eq!(building, original);
    }

    #[test]
    fn restore_only_what_was_suspended() {
        let mut building = Building::new("Hut");
        let suspended = SuspendedBehaviors::suspend(&mut building);
        suspended.restore(&mut building);
        assert!(!building.has_capability(Capability::Production));
        assert!(!building.has_capability(Capability::Storage));
    }

    #[test]
    fn construct_action_detected() {
        let building = Building::new("Hut").with_action(CONSTRUCT_ACTION);
        assert!(building.accepts_construct());
        assert!(!storehouse().accepts_construct());
    }
}
