//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Pets, dropped items and pending purchase requests each get their own
//! strongly-typed ID so they cannot be mixed up at compile time. Locally
//! generated IDs use UUID v7 (time-ordered); IDs assigned by the remote
//! authority are accepted as-is through the `From<Uuid>` impls.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
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
    /// Unique identifier for a pet. Stable for the pet's lifetime and
    /// assignable by the remote authority.
    AgentId
}

define_id! {
    /// Unique identifier for a dropped resource item (food, waste, toy).
    ItemId
}

define_id! {
    /// Correlates an outbound purchase intent with its confirmation.
    RequestId
}
