//! Construction reservation subsystem for the Neolithica simulation.
//!
//! A building moves through `Planning -> Ghosted -> UnderConstruction ->
//! Finished`. While it is under construction, workers claim units of the
//! resources it still needs, carry them over, and hand them in. The site
//! is the only writer of its requirement ledger and its reservation set.
//!
//! # Modules
//!
//! - [`behaviors`] -- The [`Building`] entity and what placement suspends.
//! - [`error`] -- [`ConstructionError`] and its failure classes.
//! - [`ledger`] -- The decrement-only [`RequirementLedger`].
//! - [`reservation`] -- [`Reservation`], [`ReservationTicket`], and the
//!   per-site [`ReservationSet`].
//! - [`site`] -- [`ConstructionSite`], the state machine tying it together.

pub mod behaviors;
pub mod error;
pub mod ledger;
pub mod reservation;
pub mod site;

// Re-export primary types at crate root.
pub use behaviors::{Building, SuspendedBehaviors};
pub use error::ConstructionError;
pub use ledger::RequirementLedger;
pub use reservation::{Reservation, ReservationSet, ReservationTicket};
pub use site::{ConstructionPlan, ConstructionSite, FillOutcome};
