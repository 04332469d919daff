//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity the construction subsystem tracks has a strongly-typed ID so
//! a reservation id can never be passed where a site id is expected. All IDs
//! use UUID v7 (time-ordered).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Stable identity of a worker agent; owns reservations it requested.
    WorkerId
}

define_id! {
    /// Unique identifier for a construction site (one placed building).
    SiteId
}

define_id! {
    /// Unique identifier for a reservation held against a construction site.
    ReservationId
}

define_id! {
    /// Unique identifier for a warehouse in the resource registry.
    WarehouseId
}

define_id! {
    /// Unique identifier for a herd of huntable animals.
    HerdId
}
