//! The unfulfilled-requirement ledger of a construction site.
//!
//! A ledger starts as a clone of the building's requirement template and is
//! only ever decremented, by fulfilling reservations. Amounts never go
//! negative: a fulfillment larger than what is still needed is clamped.

use neolithica_types::{BuildingRequirement, ResourceKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-building list of (resource kind, amount still needed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementLedger {
    entries: Vec<BuildingRequirement>,
}

impl RequirementLedger {
    /// Clone a requirement template into a fresh working ledger.
    pub fn from_template(template: &[BuildingRequirement]) -> Self {
        Self {
            entries: template.to_vec(),
        }
    }

    /// The current entries, in template order.
    pub fn entries(&self) -> &[BuildingRequirement] {
        &self.entries
    }

    /// Amount of `kind` still needed, summed over matching entries.
    pub fn needed(&self, kind: &ResourceKind) -> Decimal {
        self.entries
            .iter()
            .filter(|e| &e.resource == kind)
            .map(|e| e.amount)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Total amount still needed across all entries.
    pub fn total(&self) -> Decimal {
        self.entries
            .iter()
            .map(|e| e.amount)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// `true` once nothing is left to deliver.
    pub fn is_satisfied(&self) -> bool {
        self.total() <= Decimal::ZERO
    }

    /// Return `true` if some entry is for `kind`.
    pub fn has_kind(&self, kind: &ResourceKind) -> bool {
        self.entries.iter().any(|e| &e.resource == kind)
    }

    /// Decrement the entries for `kind` by up to `amount`, in template order.
    ///
    /// Each entry is clamped at zero; any excess spills into the next entry
    /// of the same kind and is dropped once none remain. Returns the amount
    /// actually applied, or `None` if no entry is for `kind`.
    pub fn fulfill(&mut self, kind: &ResourceKind, amount: Decimal) -> Option<Decimal> {
        if !self.has_kind(kind) {
            return None;
        }
        let mut remaining = amount.max(Decimal::ZERO);
        let mut applied = Decimal::ZERO;
        for entry in self.entries.iter_mut().filter(|e| &e.resource == kind) {
            if remaining <= Decimal::ZERO {
                break;
            }
            let take = remaining.min(entry.amount.max(Decimal::ZERO));
            entry.amount = entry.amount.saturating_sub(take);
            remaining = remaining.saturating_sub(take);
            applied = applied.saturating_add(take);
        }
        Some(applied)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn kind(tag: &str) -> ResourceKind {
        ResourceKind::new(tag)
    }

    fn ledger() -> RequirementLedger {
        RequirementLedger::from_template(&[
            BuildingRequirement::new("wood", dec!(3)),
            BuildingRequirement::new("stone", dec!(2)),
        ])
    }

    #[test]
    fn clone_of_template_is_independent() {
        let template = vec![BuildingRequirement::new("wood", dec!(3))];
        let mut ledger = RequirementLedger::from_template(&template);
        assert_eq!(ledger.fulfill(&kind("wood"), dec!(1)), Some(dec!(1)));
        assert_eq!(template.first().map(|r| r.amount), Some(dec!(3)));
        assert_eq!(ledger.needed(&kind("wood")), dec!(2));
    }

    #[test]
    fn totals_and_satisfaction() {
        let mut ledger = ledger();
        assert_eq!(ledger.total(), dec!(5));
        assert!(!ledger.is_satisfied());
        ledger.fulfill(&kind("wood"), dec!(3));
        ledger.fulfill(&kind("stone"), dec!(2));
        assert!(ledger.is_satisfied());
    }

    #[test]
    fn fulfill_clamps_at_zero() {
        let mut ledger = ledger();
        assert_eq!(ledger.fulfill(&kind("stone"), dec!(5)), Some(dec!(2)));
        assert_eq!(ledger.needed(&kind("stone")), dec!(0));
    }

    #[test]
    fn fulfill_spills_across_duplicate_kinds() {
        let mut ledger = RequirementLedger::from_template(&[
            BuildingRequirement::new("wood", dec!(1)),
            BuildingRequirement::new("wood", dec!(2)),
        ]);
        assert_eq!(ledger.fulfill(&kind("wood"), dec!(2)), Some(dec!(2)));
        let amounts: Vec<Decimal> = ledger.entries().iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![dec!(0), dec!(1)]);
    }

    #[test]
    fn fulfill_unknown_kind() {
        let mut ledger = ledger();
        assert_eq!(ledger.fulfill(&kind("clay"), dec!(1)), None);
        assert_eq!(ledger.total(), dec!(5));
    }

    #[test]
    fn empty_template_is_satisfied() {
        assert!(RequirementLedger::from_template(&[]).is_satisfied());
    }
}
