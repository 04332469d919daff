//! Construction sites: eligibility, placement, reservation, and completion.
//!
//! A [`ConstructionSite`] wraps a [`Building`] from the moment it is placed
//! until it is finished. While construction is in progress the site owns a
//! construction facet holding:
//!
//! - the unfulfilled [`RequirementLedger`],
//! - the [`ReservationSet`] of claims workers hold against it,
//! - the [`SuspendedBehaviors`] captured at placement.
//!
//! No other component writes any of these; every mutation goes through a
//! site method. Finishing drops the facet and leaves only the building.
//!
//! # Outstanding need
//!
//! [`needed_resource`](ConstructionSite::needed_resource) is derived on
//! demand as `ledger[kind] - sum(active reservations for kind)`. Because
//! each allocation recomputes it before minting, workers allocating one
//! after another within a tick can never over-claim a requirement.
//!
//! # Collaborators
//!
//! Tech, stats, terrain and the warehouse registry are passed in to the
//! operations that need them. The site never reaches for global state.

use std::collections::BTreeSet;

use neolithica_types::{
    BuildingRequirement, CONSTRUCT_ACTION, GhostTint, Position, ReservationId, ResourceKind,
    SiteId, SiteState, StatRequirement, WorkerId,
};
use neolithica_world::{Ground, ResourceRegistry, StatSource, TechGate, withdraw_all};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::behaviors::{Building, SuspendedBehaviors};
use crate::error::ConstructionError;
use crate::ledger::RequirementLedger;
use crate::reservation::{Reservation, ReservationSet, ReservationTicket};

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// The immutable construction template of a building definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionPlan {
    /// Technologies that must be researched before placement.
    #[serde(default)]
    pub tech_requirements: BTreeSet<String>,
    /// Stats that must reach their thresholds before placement.
    #[serde(default)]
    pub stat_requirements: Vec<StatRequirement>,
    /// Resources that must be delivered (or withdrawn, for instabuild).
    #[serde(default)]
    pub resource_requirements: Vec<BuildingRequirement>,
    /// Complete immediately by withdrawing everything at once.
    #[serde(default)]
    pub instabuild: bool,
    /// Amount each reservation claims.
    #[serde(default = "default_reservation_unit")]
    pub reservation_unit: Decimal,
}

impl Default for ConstructionPlan {
    fn default() -> Self {
        Self {
            tech_requirements: BTreeSet::new(),
            stat_requirements: Vec::new(),
            resource_requirements: Vec::new(),
            instabuild: false,
            reservation_unit: default_reservation_unit(),
        }
    }
}

impl ConstructionPlan {
    /// `true` iff every required technology is researched and every stat
    /// requirement's current value meets its threshold.
    pub fn is_eligible(&self, tech: &dyn TechGate, stats: &dyn StatSource) -> bool {
        self.tech_requirements.iter().all(|t| tech.is_researched(t))
            && self
                .stat_requirements
                .iter()
                .all(|r| stats.current_value(&r.stat) >= r.threshold)
    }
}

const fn default_reservation_unit() -> Decimal {
    Decimal::ONE
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of a successful [`ConstructionSite::fill_reservation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillOutcome {
    /// Amount actually taken off the ledger (clamped to what was needed).
    pub applied: Decimal,
    /// Whether this fulfillment completed the building.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// Site
// ---------------------------------------------------------------------------

/// Construction-only state, dropped on finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ConstructionFacet {
    unfulfilled: RequirementLedger,
    reservations: ReservationSet,
    suspended: Option<SuspendedBehaviors>,
}

/// A placed building and everything needed to finish constructing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionSite {
    id: SiteId,
    position: Position,
    plan: ConstructionPlan,
    building: Building,
    state: SiteState,
    facet: Option<ConstructionFacet>,
}

impl ConstructionSite {
    /// Create a site in [`SiteState::Planning`] for `building` at
    /// `position`, cloning the plan's requirements into a fresh ledger.
    pub fn new(building: Building, plan: ConstructionPlan, position: Position) -> Self {
        let facet = ConstructionFacet {
            unfulfilled: RequirementLedger::from_template(&plan.resource_requirements),
            reservations: ReservationSet::new(),
            suspended: None,
        };
        Self {
            id: SiteId::new(),
            position,
            plan,
            building,
            state: SiteState::Planning,
            facet: Some(facet),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The site id.
    pub const fn id(&self) -> SiteId {
        self.id
    }

    /// Where the building stands.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// The construction template.
    pub const fn plan(&self) -> &ConstructionPlan {
        &self.plan
    }

    /// The building, in whatever condition it currently is.
    pub const fn building(&self) -> &Building {
        &self.building
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> SiteState {
        self.state
    }

    /// `true` once construction completed.
    pub const fn is_finished(&self) -> bool {
        matches!(self.state, SiteState::Finished)
    }

    /// The unfulfilled ledger entries; empty once finished.
    pub fn unfulfilled(&self) -> &[BuildingRequirement] {
        self.facet
            .as_ref()
            .map(|f| f.unfulfilled.entries())
            .unwrap_or_default()
    }

    /// Total amount still to be delivered (ignoring reservations).
    pub fn outstanding_total(&self) -> Decimal {
        self.facet
            .as_ref()
            .map_or(Decimal::ZERO, |f| f.unfulfilled.total())
    }

    /// Every reservation not yet pruned, in issue order.
    pub fn reservations(&self) -> impl Iterator<Item = &Reservation> {
        self.facet.iter().flat_map(|f| f.reservations.iter())
    }

    /// Active reservations only.
    pub fn active_reservations(&self) -> impl Iterator<Item = &Reservation> {
        self.facet.iter().flat_map(|f| f.reservations.active())
    }

    /// Look up a reservation by id, whatever its state.
    pub fn reservation(&self, id: ReservationId) -> Option<&Reservation> {
        self.facet.as_ref().and_then(|f| f.reservations.get(id))
    }

    // -----------------------------------------------------------------------
    // Checks
    // -----------------------------------------------------------------------

    /// `true` iff every required technology is researched and every stat
    /// requirement's current value meets its threshold. Side-effect free,
    /// so it is safe to call every tick.
    pub fn is_eligible_to_build(&self, tech: &dyn TechGate, stats: &dyn StatSource) -> bool {
        self.plan.is_eligible(tech, stats)
    }

    /// Pre-flight placement check at `position`. Reserves nothing.
    ///
    /// False if `position` is not above water. For instabuild plans, also
    /// false unless the registry currently holds every requirement in full.
    pub fn is_buildable(
        &self,
        position: &Position,
        ground: &Ground,
        registry: &dyn ResourceRegistry,
    ) -> bool {
        if !ground.is_above_water(position) {
            return false;
        }
        if !self.plan.instabuild {
            return true;
        }
        let available = registry.available_resources();
        self.plan.resource_requirements.iter().all(|r| {
            available
                .get(&r.resource)
                .is_some_and(|&have| have >= r.amount)
        })
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Begin placement: `Planning -> Ghosted`.
    ///
    /// The building stops being selectable, loses its target actions, and
    /// has its production and storage capabilities disabled until finish.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::InvalidTransition`] unless the site is
    /// in [`SiteState::Planning`].
    pub fn start_placement(&mut self) -> Result<(), ConstructionError> {
        self.expect_state(SiteState::Planning, "start placement")?;
        let suspended = SuspendedBehaviors::suspend(&mut self.building);
        debug!(
            site = %self.id,
            suspended = ?suspended.capabilities,
            "behaviors suspended for placement"
        );
        if let Some(facet) = self.facet.as_mut() {
            facet.suspended = Some(suspended);
        }
        self.building.ghost = Some(GhostTint::Bad);
        self.state = SiteState::Ghosted;
        info!(site = %self.id, building = %self.building.name, "placement started");
        Ok(())
    }

    /// Move the ghost to `position` and tint it by whether it could be
    /// built there. Returns the buildability result.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::InvalidTransition`] unless the site is
    /// [`SiteState::Ghosted`].
    pub fn preview_placement(
        &mut self,
        position: Position,
        ground: &Ground,
        registry: &dyn ResourceRegistry,
    ) -> Result<bool, ConstructionError> {
        self.expect_state(SiteState::Ghosted, "preview placement")?;
        let buildable = self.is_buildable(&position, ground, registry);
        self.position = position;
        self.building.ghost = Some(if buildable {
            GhostTint::Good
        } else {
            GhostTint::Bad
        });
        Ok(buildable)
    }

    /// Confirm placement and start building.
    ///
    /// For instabuild plans the whole bill of materials is withdrawn at
    /// once and the site finishes immediately (`Ghosted -> Finished`).
    /// Otherwise the site enters [`SiteState::UnderConstruction`] and
    /// exposes the construct action; a site with nothing to deliver
    /// finishes straight away.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::InvalidTransition`] unless the site is
    /// [`SiteState::Ghosted`], or [`ConstructionError::CouldNotStart`] if
    /// the instabuild withdrawal fell short. Nothing is withdrawn and the
    /// site stays ghosted in that case.
    pub fn start_construction(
        &mut self,
        registry: &mut dyn ResourceRegistry,
    ) -> Result<(), ConstructionError> {
        self.expect_state(SiteState::Ghosted, "start construction")?;

        if self.plan.instabuild {
            withdraw_all(registry, &self.plan.resource_requirements).map_err(|source| {
                warn!(site = %self.id, error = %source, "instabuild withdrawal failed");
                ConstructionError::CouldNotStart {
                    site: self.id,
                    source,
                }
            })?;
            info!(site = %self.id, "instabuild materials withdrawn");
            self.finish();
            return Ok(());
        }

        self.building.target_actions = vec![CONSTRUCT_ACTION.to_owned()];
        self.building.ghost = Some(GhostTint::Building);
        self.state = SiteState::UnderConstruction;
        info!(
            site = %self.id,
            outstanding = %self.outstanding_total(),
            "construction started"
        );

        if self.facet.as_ref().is_some_and(|f| f.unfulfilled.is_satisfied()) {
            self.finish();
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reservations
    // -----------------------------------------------------------------------

    /// Whether [`try_reserve`](Self::try_reserve) would issue a reservation
    /// right now: the site is under construction and some kind the registry
    /// holds is still needed.
    pub fn has_reservable_need(&self, registry: &dyn ResourceRegistry) -> bool {
        self.state == SiteState::UnderConstruction
            && registry
                .available_resources()
                .keys()
                .any(|kind| self.needed_resource(kind) > Decimal::ZERO)
    }

    /// Outstanding need for `kind`: ledger amount minus active claims.
    pub fn needed_resource(&self, kind: &ResourceKind) -> Decimal {
        self.facet.as_ref().map_or(Decimal::ZERO, |f| {
            f.unfulfilled
                .needed(kind)
                .saturating_sub(f.reservations.active_amount(kind))
        })
    }

    /// Allocate a reservation for `worker`.
    ///
    /// Scans the registry's available kinds in enumeration order and
    /// reserves `min(unit, need)` of the first kind still needed. Returns
    /// `None` when nothing is needed, everything needed is already claimed,
    /// or the site is not under construction.
    pub fn try_reserve(
        &mut self,
        worker: WorkerId,
        registry: &dyn ResourceRegistry,
    ) -> Option<ReservationTicket> {
        if self.state != SiteState::UnderConstruction {
            return None;
        }

        let unit = self.plan.reservation_unit;
        let (kind, amount) = registry.available_resources().into_keys().find_map(|kind| {
            let needed = self.needed_resource(&kind);
            debug!(site = %self.id, kind = %kind, needed = %needed, "checking need");
            (needed > Decimal::ZERO).then(|| {
                let amount = unit.min(needed);
                (kind, amount)
            })
        })?;

        let facet = self.facet.as_mut()?;
        let reservation = Reservation::new(self.id, kind, amount, worker);
        let ticket = reservation.ticket();
        facet.reservations.push(reservation);
        info!(
            site = %self.id,
            reservation = %ticket.reservation,
            worker = %worker,
            kind = %ticket.resource,
            amount = %ticket.amount,
            "reservation issued"
        );
        Some(ticket)
    }

    /// Consume a delivered reservation.
    ///
    /// Decrements the matching ledger entry by the reservation amount
    /// (clamped so it never goes negative) and marks the reservation
    /// released. The reservation stays in the set until housekeeping.
    /// Finishes the site once the ledger is empty.
    ///
    /// # Errors
    ///
    /// - [`ConstructionError::ReservationNotOwned`] if the id is not in
    ///   this site's set (including after the site finished).
    /// - [`ConstructionError::StaleReservation`] if it was already
    ///   released or cancelled.
    /// - [`ConstructionError::NoSuchRequirement`] if the ledger has no
    ///   entry for the reservation's kind.
    pub fn fill_reservation(
        &mut self,
        id: ReservationId,
    ) -> Result<FillOutcome, ConstructionError> {
        let site = self.id;
        let facet = self
            .facet
            .as_mut()
            .ok_or(ConstructionError::ReservationNotOwned {
                site,
                reservation: id,
            })?;
        let reservation = facet
            .reservations
            .get_mut(id)
            .ok_or(ConstructionError::ReservationNotOwned {
                site,
                reservation: id,
            })?;
        if !reservation.is_active() {
            return Err(ConstructionError::StaleReservation {
                reservation: id,
                state: reservation.state(),
            });
        }

        let applied = facet
            .unfulfilled
            .fulfill(&reservation.resource, reservation.amount)
            .ok_or_else(|| ConstructionError::NoSuchRequirement {
                site,
                kind: reservation.resource.clone(),
            })?;
        reservation.release();
        info!(
            site = %site,
            reservation = %id,
            kind = %reservation.resource,
            applied = %applied,
            remaining = %facet.unfulfilled.total(),
            "reservation fulfilled"
        );

        let finished = facet.unfulfilled.is_satisfied() && self.finish();
        Ok(FillOutcome { applied, finished })
    }

    /// Abandon a reservation on behalf of its worker.
    ///
    /// Never touches the ledger. Safe to call on unknown, released, or
    /// cancelled reservations; returns whether anything changed.
    pub fn cancel_reservation(&mut self, id: ReservationId) -> bool {
        let cancelled = self
            .facet
            .as_mut()
            .and_then(|f| f.reservations.get_mut(id))
            .is_some_and(Reservation::cancel);
        if cancelled {
            info!(site = %self.id, reservation = %id, "reservation cancelled");
        }
        cancelled
    }

    // -----------------------------------------------------------------------
    // Completion and housekeeping
    // -----------------------------------------------------------------------

    /// Complete construction.
    ///
    /// Restores selectability, target actions, and suspended capabilities,
    /// clears the ghost, moves to [`SiteState::Finished`], and drops the
    /// construction facet. Returns `false` (and does nothing) unless the
    /// site is ghosted or under construction, so a second call is a no-op.
    pub fn finish(&mut self) -> bool {
        if !matches!(
            self.state,
            SiteState::Ghosted | SiteState::UnderConstruction
        ) {
            return false;
        }
        if let Some(mut facet) = self.facet.take() {
            let abandoned = facet.reservations.cancel_all();
            if abandoned > 0 {
                warn!(site = %self.id, abandoned, "finished with claims still active");
            }
            match facet.suspended {
                Some(suspended) => suspended.restore(&mut self.building),
                None => {
                    self.building.target_actions.retain(|a| a != CONSTRUCT_ACTION);
                    self.building.selectable = true;
                }
            }
        }
        self.building.ghost = None;
        self.state = SiteState::Finished;
        info!(site = %self.id, building = %self.building.name, "construction finished");
        true
    }

    /// Prune released and cancelled reservations. Run once per tick.
    /// Returns how many were removed.
    pub fn housekeep(&mut self) -> usize {
        let pruned = self.facet.as_mut().map_or(0, |f| f.reservations.prune());
        if pruned > 0 {
            debug!(site = %self.id, pruned, "reservations pruned");
        }
        pruned
    }

    fn expect_state(
        &self,
        expected: SiteState,
        operation: &'static str,
    ) -> Result<(), ConstructionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ConstructionError::InvalidTransition {
                site: self.id,
                from: self.state,
                operation,
            })
        }
    }
}
