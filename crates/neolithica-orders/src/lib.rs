//! Worker orders for the Neolithica simulation.
//!
//! Every worker runs at most one [`Order`] at a time. The driver steps it
//! once per tick through an [`OrderContext`] until its status is finished,
//! or abandons it when the worker is removed.
//!
//! # Modules
//!
//! - [`catch_fish`] -- [`CatchFishOrder`], time-based fish production.
//! - [`delivery`] -- [`DeliveryOrder`], the reserve/collect/carry/fill cycle.
//! - [`error`] -- [`OrderError`].
//! - [`meditate`] -- [`MeditateOrder`], spirit accumulation.
//! - [`order`] -- The [`Order`] trait and [`OrderContext`].
//! - [`slaughter`] -- [`SlaughterOrder`], hunting animals from a herd.

pub mod catch_fish;
pub mod delivery;
pub mod error;
pub mod meditate;
pub mod order;
pub mod slaughter;

pub use catch_fish::CatchFishOrder;
pub use delivery::DeliveryOrder;
pub use error::OrderError;
pub use meditate::MeditateOrder;
pub use order::{Order, OrderContext};
pub use slaughter::SlaughterOrder;
