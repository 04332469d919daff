//! The warehouse registry: system-wide resource availability.
//!
//! Construction sites never reach a global controller for stock levels.
//! Instead they are handed a [`ResourceRegistry`] and query it explicitly.
//! [`WarehouseRegistry`] is the in-memory implementation the simulation
//! uses: a set of [`Warehouse`]s whose enabled stock is pooled.
//!
//! # Enumeration order
//!
//! [`ResourceRegistry::available_resources`] returns a [`BTreeMap`], so
//! kinds are always enumerated in lexical order. Reservation allocation
//! scans kinds in exactly this order.
//!
//! # Atomic multi-kind withdrawal
//!
//! [`withdraw_all`] removes a whole bill of materials or nothing at all.
//! It checks the aggregated demand against a snapshot first and, should a
//! later withdrawal still fail, restores everything it already took.
//!
//! # Returning stock
//!
//! Every withdrawal yields a [`Withdrawal`] recording which warehouse
//! supplied how much. [`ResourceRegistry::restore`] puts the load back
//! where it came from, so undoing a withdrawal leaves each warehouse
//! exactly as it was. [`ResourceRegistry::deposit`] is for new stock.

use std::collections::BTreeMap;

use neolithica_types::{BuildingRequirement, ResourceKind, WarehouseId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::WorldError;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Read and withdraw access to the simulation's pooled resource stock.
pub trait ResourceRegistry {
    /// Snapshot of every kind with a positive available amount, in the
    /// registry's natural enumeration order.
    fn available_resources(&self) -> BTreeMap<ResourceKind, Decimal>;

    /// Amount of `kind` currently available (zero if none).
    fn available_amount(&self, kind: &ResourceKind) -> Decimal;

    /// Withdraw exactly `amount` of `kind`, or nothing.
    ///
    /// The returned [`Withdrawal`] records where the stock came from.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InsufficientResource`] if less than `amount`
    /// is available, or [`WorldError::NonPositiveAmount`] for a zero or
    /// negative request.
    fn withdraw(
        &mut self,
        kind: &ResourceKind,
        amount: Decimal,
    ) -> Result<Withdrawal, WorldError>;

    /// Add `amount` of new `kind` stock.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoWarehouse`] if nothing can hold the deposit.
    fn deposit(&mut self, kind: &ResourceKind, amount: Decimal) -> Result<(), WorldError>;

    /// Undo `withdrawal`, returning each part to the warehouse it came from.
    ///
    /// A part whose warehouse is gone or disabled is deposited as new stock.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoWarehouse`] if such a part has nowhere to go.
    fn restore(&mut self, withdrawal: &Withdrawal) -> Result<(), WorldError>;
}

/// A completed withdrawal: the kind taken and the amount per warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Kind withdrawn.
    pub kind: ResourceKind,
    /// Amount taken from each warehouse, in the order they were drained.
    pub parts: Vec<(WarehouseId, Decimal)>,
}

impl Withdrawal {
    /// Total amount taken.
    pub fn total(&self) -> Decimal {
        self.parts
            .iter()
            .map(|&(_, amount)| amount)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

// ---------------------------------------------------------------------------
// Warehouses
// ---------------------------------------------------------------------------

/// A single stockpile contributing to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    /// Unique warehouse id.
    pub id: WarehouseId,
    /// Display name (usually the building it belongs to).
    pub name: String,
    /// Stock held, per resource kind.
    pub stock: BTreeMap<ResourceKind, Decimal>,
    /// Disabled warehouses neither supply nor accept resources.
    pub enabled: bool,
}

impl Warehouse {
    /// Create an empty, enabled warehouse.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: WarehouseId::new(),
            name: name.into(),
            stock: BTreeMap::new(),
            enabled: true,
        }
    }

    /// Builder-style helper to seed stock.
    #[must_use]
    pub fn with_stock(mut self, kind: impl Into<ResourceKind>, amount: Decimal) -> Self {
        self.stock.insert(kind.into(), amount);
        self
    }

    /// Amount of `kind` held by this warehouse.
    pub fn amount(&self, kind: &ResourceKind) -> Decimal {
        self.stock.get(kind).copied().unwrap_or(Decimal::ZERO)
    }
}

/// The in-memory [`ResourceRegistry`]: all enabled warehouses pooled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseRegistry {
    warehouses: BTreeMap<WarehouseId, Warehouse>,
}

impl WarehouseRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            warehouses: BTreeMap::new(),
        }
    }

    /// Register a warehouse and return its id.
    pub fn add_warehouse(&mut self, warehouse: Warehouse) -> WarehouseId {
        let id = warehouse.id;
        debug!(warehouse = %id, name = %warehouse.name, "warehouse registered");
        self.warehouses.insert(id, warehouse);
        id
    }

    /// Look up a warehouse.
    pub fn warehouse(&self, id: WarehouseId) -> Option<&Warehouse> {
        self.warehouses.get(&id)
    }

    /// Enable or disable a warehouse.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::WarehouseNotFound`] for an unknown id.
    pub fn set_enabled(&mut self, id: WarehouseId, enabled: bool) -> Result<(), WorldError> {
        let warehouse = self
            .warehouses
            .get_mut(&id)
            .ok_or(WorldError::WarehouseNotFound(id))?;
        warehouse.enabled = enabled;
        Ok(())
    }

    /// Number of registered warehouses, enabled or not.
    pub fn len(&self) -> usize {
        self.warehouses.len()
    }

    /// Return whether no warehouse is registered.
    pub fn is_empty(&self) -> bool {
        self.warehouses.is_empty()
    }

    fn enabled(&self) -> impl Iterator<Item = &Warehouse> {
        self.warehouses.values().filter(|w| w.enabled)
    }
}

impl ResourceRegistry for WarehouseRegistry {
    fn available_resources(&self) -> BTreeMap<ResourceKind, Decimal> {
        let mut totals: BTreeMap<ResourceKind, Decimal> = BTreeMap::new();
        for warehouse in self.enabled() {
            for (kind, &amount) in &warehouse.stock {
                let entry = totals.entry(kind.clone()).or_insert(Decimal::ZERO);
                *entry = entry.saturating_add(amount);
            }
        }
        totals.retain(|_, amount| *amount > Decimal::ZERO);
        totals
    }

    fn available_amount(&self, kind: &ResourceKind) -> Decimal {
        self.enabled()
            .map(|w| w.amount(kind))
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    fn withdraw(
        &mut self,
        kind: &ResourceKind,
        amount: Decimal,
    ) -> Result<Withdrawal, WorldError> {
        if amount <= Decimal::ZERO {
            return Err(WorldError::NonPositiveAmount { amount });
        }
        let available = self.available_amount(kind);
        if available < amount {
            return Err(WorldError::InsufficientResource {
                kind: kind.clone(),
                requested: amount,
                available,
            });
        }

        let mut parts = Vec::new();
        let mut remaining = amount;
        for warehouse in self.warehouses.values_mut().filter(|w| w.enabled) {
            if remaining <= Decimal::ZERO {
                break;
            }
            let Some(held) = warehouse.stock.get_mut(kind) else {
                continue;
            };
            let taken = remaining.min(*held);
            *held = held.checked_sub(taken).ok_or(WorldError::ArithmeticOverflow)?;
            remaining = remaining
                .checked_sub(taken)
                .ok_or(WorldError::ArithmeticOverflow)?;
            if *held <= Decimal::ZERO {
                warehouse.stock.remove(kind);
            }
            if taken > Decimal::ZERO {
                parts.push((warehouse.id, taken));
            }
        }

        debug!(kind = %kind, amount = %amount, warehouses = parts.len(), "withdrew from warehouses");
        Ok(Withdrawal {
            kind: kind.clone(),
            parts,
        })
    }

    fn deposit(&mut self, kind: &ResourceKind, amount: Decimal) -> Result<(), WorldError> {
        if amount <= Decimal::ZERO {
            return Err(WorldError::NonPositiveAmount { amount });
        }
        let warehouse = self
            .warehouses
            .values_mut()
            .find(|w| w.enabled)
            .ok_or_else(|| WorldError::NoWarehouse { kind: kind.clone() })?;
        let held = warehouse.stock.entry(kind.clone()).or_insert(Decimal::ZERO);
        *held = held.checked_add(amount).ok_or(WorldError::ArithmeticOverflow)?;
        debug!(kind = %kind, amount = %amount, warehouse = %warehouse.id, "deposited");
        Ok(())
    }

    fn restore(&mut self, withdrawal: &Withdrawal) -> Result<(), WorldError> {
        let kind = &withdrawal.kind;
        for &(id, amount) in &withdrawal.parts {
            match self.warehouses.get_mut(&id).filter(|w| w.enabled) {
                Some(warehouse) => {
                    let held = warehouse.stock.entry(kind.clone()).or_insert(Decimal::ZERO);
                    *held = held.checked_add(amount).ok_or(WorldError::ArithmeticOverflow)?;
                    debug!(kind = %kind, amount = %amount, warehouse = %id, "restored");
                }
                None => {
                    warn!(kind = %kind, amount = %amount, warehouse = %id, "source warehouse unavailable, depositing elsewhere");
                    self.deposit(kind, amount)?;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Atomic bill-of-materials withdrawal
// ---------------------------------------------------------------------------

/// Withdraw every requirement's full amount, or nothing.
///
/// Zero-amount requirements are skipped. Demand for a kind listed more than
/// once is aggregated before checking availability.
///
/// # Errors
///
/// Returns [`WorldError::InsufficientResource`] naming the first kind that
/// could not be covered. The registry's amounts are unchanged on error.
pub fn withdraw_all(
    registry: &mut dyn ResourceRegistry,
    requirements: &[BuildingRequirement],
) -> Result<(), WorldError> {
    let mut demand: BTreeMap<&ResourceKind, Decimal> = BTreeMap::new();
    for req in requirements.iter().filter(|r| r.amount > Decimal::ZERO) {
        let entry = demand.entry(&req.resource).or_insert(Decimal::ZERO);
        *entry = entry
            .checked_add(req.amount)
            .ok_or(WorldError::ArithmeticOverflow)?;
    }

    for (&kind, &requested) in &demand {
        let available = registry.available_amount(kind);
        if available < requested {
            warn!(kind = %kind, requested = %requested, available = %available, "bill of materials short");
            return Err(WorldError::InsufficientResource {
                kind: kind.clone(),
                requested,
                available,
            });
        }
    }

    let mut taken: Vec<Withdrawal> = Vec::with_capacity(requirements.len());
    for req in requirements.iter().filter(|r| r.amount > Decimal::ZERO) {
        match registry.withdraw(&req.resource, req.amount) {
            Ok(withdrawal) => taken.push(withdrawal),
            Err(err) => {
                roll_back(registry, &taken);
                return Err(err);
            }
        }
    }
    Ok(())
}

/// Restore partial withdrawals in reverse order.
fn roll_back(registry: &mut dyn ResourceRegistry, taken: &[Withdrawal]) {
    for withdrawal in taken.iter().rev() {
        if let Err(err) = registry.restore(withdrawal) {
            error!(kind = %withdrawal.kind, amount = %withdrawal.total(), error = %err, "rollback failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn kind(tag: &str) -> ResourceKind {
        ResourceKind::new(tag)
    }

    fn registry_with(stock: &[(&str, Decimal)]) -> WarehouseRegistry {
        let mut warehouse = Warehouse::new("Storehouse");
        for &(tag, amount) in stock {
            warehouse = warehouse.with_stock(tag, amount);
        }
        let mut registry = WarehouseRegistry::new();
        registry.add_warehouse(warehouse);
        registry
    }

    #[test]
    fn available_resources_sorted_and_positive_only() {
        let registry = registry_with(&[("wood", dec!(5)), ("clay", dec!(0)), ("fish", dec!(2))]);
        let kinds: Vec<String> = registry
            .available_resources()
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(kinds, vec!["fish".to_owned(), "wood".to_owned()]);
    }

    #[test]
    fn availability_pools_enabled_warehouses() {
        let mut registry = registry_with(&[("wood", dec!(5))]);
        let second = registry.add_warehouse(Warehouse::new("Pit").with_stock("wood", dec!(3)));
        assert_eq!(registry.available_amount(&kind("wood")), dec!(8));

        assert!(registry.set_enabled(second, false).is_ok());
        assert_eq!(registry.available_amount(&kind("wood")), dec!(5));
    }

    #[test]
    fn withdraw_spans_warehouses() {
        let mut registry = registry_with(&[("stone", dec!(2))]);
        registry.add_warehouse(Warehouse::new("Pit").with_stock("stone", dec!(2)));
        assert!(registry.withdraw(&kind("stone"), dec!(3)).is_ok());
        assert_eq!(registry.available_amount(&kind("stone")), dec!(1));
    }

    #[test]
    fn withdraw_insufficient_changes_nothing() {
        let mut registry = registry_with(&[("stone", dec!(2))]);
        let result = registry.withdraw(&kind("stone"), dec!(3));
        assert_eq!(
            result,
            Err(WorldError::InsufficientResource {
                kind: kind("stone"),
                requested: dec!(3),
                available: dec!(2),
            })
        );
        assert_eq!(registry.available_amount(&kind("stone")), dec!(2));
    }

    #[test]
    fn withdraw_rejects_non_positive() {
        let mut registry = registry_with(&[("stone", dec!(2))]);
        assert!(registry.withdraw(&kind("stone"), dec!(0)).is_err());
    }

    #[test]
    fn deposit_requires_enabled_warehouse() {
        let mut registry = WarehouseRegistry::new();
        let result = registry.deposit(&kind("fish"), dec!(1));
        assert_eq!(result, Err(WorldError::NoWarehouse { kind: kind("fish") }));

        registry.add_warehouse(Warehouse::new("Hut"));
        assert!(registry.deposit(&kind("fish"), dec!(1)).is_ok());
        assert_eq!(registry.available_amount(&kind("fish")), dec!(1));
    }

    #[test]
    fn withdraw_all_takes_everything() {
        let mut registry = registry_with(&[("wood", dec!(5)), ("stone", dec!(4))]);
        let bill = vec![
            BuildingRequirement::new("wood", dec!(3)),
            BuildingRequirement::new("stone", dec!(4)),
        ];
        assert!(withdraw_all(&mut registry, &bill).is_ok());
        assert_eq!(registry.available_amount(&kind("wood")), dec!(2));
        assert_eq!(registry.available_amount(&kind("stone")), dec!(0));
    }

    #[test]
    fn withdraw_all_shortfall_leaves_registry_untouched() {
        let mut registry = registry_with(&[("wood", dec!(5)), ("stone", dec!(1))]);
        let before = registry.available_resources();
        let bill = vec![
            BuildingRequirement::new("wood", dec!(3)),
            BuildingRequirement::new("stone", dec!(4)),
        ];
        let result = withdraw_all(&mut registry, &bill);
        assert!(matches!(
            result,
            Err(WorldError::InsufficientResource { ref kind, .. }) if kind.as_str() == "stone"
        ));
        assert_eq!(registry.available_resources(), before);
    }

    #[test]
    fn withdraw_all_aggregates_repeated_kinds() {
        let mut registry = registry_with(&[("wood", dec!(5))]);
        let bill = vec![
            BuildingRequirement::new("wood", dec!(3)),
            BuildingRequirement::new("wood", dec!(3)),
        ];
        assert!(withdraw_all(&mut registry, &bill).is_err());
        assert_eq!(registry.available_amount(&kind("wood")), dec!(5));
    }

    /// A registry whose second withdrawal always fails, to exercise rollback.
    struct FlakyRegistry {
        inner: WarehouseRegistry,
        withdrawals: u32,
    }

    impl ResourceRegistry for FlakyRegistry {
        fn available_resources(&self) -> BTreeMap<ResourceKind, Decimal> {
            self.inner.available_resources()
        }

        fn available_amount(&self, kind: &ResourceKind) -> Decimal {
            self.inner.available_amount(kind)
        }

        fn withdraw(
            &mut self,
            kind: &ResourceKind,
            amount: Decimal,
        ) -> Result<Withdrawal, WorldError> {
            self.withdrawals = self.withdrawals.saturating_add(1);
            if self.withdrawals >= 2 {
                return Err(WorldError::InsufficientResource {
                    kind: kind.clone(),
                    requested: amount,
                    available: Decimal::ZERO,
                });
            }
            self.inner.withdraw(kind, amount)
        }

        fn deposit(&mut self, kind: &ResourceKind, amount: Decimal) -> Result<(), WorldError> {
            self.inner.deposit(kind, amount)
        }

        fn restore(&mut self, withdrawal: &Withdrawal) -> Result<(), WorldError> {
            self.inner.restore(withdrawal)
        }
    }

    #[test]
    fn withdraw_all_rolls_back_partial_withdrawal() {
        let mut registry = FlakyRegistry {
            inner: registry_with(&[("wood", dec!(5)), ("stone", dec!(5))]),
            withdrawals: 0,
        };
        let bill = vec![
            BuildingRequirement::new("wood", dec!(3)),
            BuildingRequirement::new("stone", dec!(2)),
        ];
        assert!(withdraw_all(&mut registry, &bill).is_err());
        assert_eq!(registry.available_amount(&kind("wood")), dec!(5));
        assert_eq!(registry.available_amount(&kind("stone")), dec!(5));
    }

    #[test]
    fn withdrawal_records_each_warehouse() {
        let mut registry = WarehouseRegistry::new();
        let hut = registry.add_warehouse(Warehouse::new("Hut").with_stock("wood", dec!(1)));
        let pit = registry.add_warehouse(Warehouse::new("Pit").with_stock("wood", dec!(4)));

        let withdrawal = registry.withdraw(&kind("wood"), dec!(5)).unwrap();
        assert_eq!(withdrawal.parts.len(), 2);
        assert!(withdrawal.parts.contains(&(hut, dec!(1))));
        assert!(withdrawal.parts.contains(&(pit, dec!(4))));
        assert_eq!(withdrawal.total(), dec!(5));
    }

    #[test]
    fn restore_returns_stock_to_its_source() {
        let mut registry = WarehouseRegistry::new();
        let hut = registry.add_warehouse(Warehouse::new("Hut").with_stock("wood", dec!(1)));
        let pit = registry.add_warehouse(Warehouse::new("Pit").with_stock("wood", dec!(4)));

        let withdrawal = registry.withdraw(&kind("wood"), dec!(5)).unwrap();
        assert_eq!(registry.available_amount(&kind("wood")), dec!(0));
        registry.restore(&withdrawal).unwrap();
        assert_eq!(registry.warehouse(hut).unwrap().amount(&kind("wood")), dec!(1));
        assert_eq!(registry.warehouse(pit).unwrap().amount(&kind("wood")), dec!(4));
    }

    #[test]
    fn restore_falls_back_when_source_is_disabled() {
        let mut registry = WarehouseRegistry::new();
        let hut = registry.add_warehouse(Warehouse::new("Hut"));
        let pit = registry.add_warehouse(Warehouse::new("Pit").with_stock("wood", dec!(2)));

        let withdrawal = registry.withdraw(&kind("wood"), dec!(2)).unwrap();
        registry.set_enabled(pit, false).unwrap();
        registry.restore(&withdrawal).unwrap();
        assert_eq!(registry.warehouse(hut).unwrap().amount(&kind("wood")), dec!(2));
        assert_eq!(registry.warehouse(pit).unwrap().amount(&kind("wood")), dec!(0));
    }

    #[test]
    fn withdraw_all_rollback_keeps_the_split() {
        let mut inner = WarehouseRegistry::new();
        let hut = inner.add_warehouse(
            Warehouse::new("Hut")
                .with_stock("wood", dec!(1))
                .with_stock("stone", dec!(5)),
        );
        let pit = inner.add_warehouse(Warehouse::new("Pit").with_stock("wood", dec!(4)));
        let mut registry = FlakyRegistry {
            inner,
            withdrawals: 0,
        };
        let bill = vec![
            BuildingRequirement::new("wood", dec!(5)),
            BuildingRequirement::new("stone", dec!(2)),
        ];
        assert!(withdraw_all(&mut registry, &bill).is_err());
        let wood = kind("wood");
        assert_eq!(registry.inner.warehouse(hut).unwrap().amount(&wood), dec!(1));
        assert_eq!(registry.inner.warehouse(pit).unwrap().amount(&wood), dec!(4));
    }
}
