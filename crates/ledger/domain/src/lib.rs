//! Domain types for the block accounting ledger.
//!
//! This crate provides the models shared by the store, the engine and the server: ledger
//! transactions and their lifecycle, multisig wallets with their owner confirmations, payroll
//! contracts, and the polymorphic organization participant (registered user or employee).

pub mod multisig;
pub mod participant;
pub mod tx;

#[cfg(feature = "serde")]
mod with_serde;

use core::fmt;

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Timestamp metadata for tracking entity creation and modification times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamps {
    /// The timestamp when the entity was created.
    created_at: DateTime<Utc>,
    /// The timestamp when the entity was last updated.
    updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Timestamps for an entity created at `at`.
    pub fn created(at: DateTime<Utc>) -> Self {
        Self { created_at: at, updated_at: at }
    }

    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the update timestamp forward to `at`.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new time-sortable (UUIDv7) identifier.
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from($name(uuid): $name) -> Self {
                uuid
            }
        }

        impl From<&$name> for Uuid {
            fn from($name(uuid): &$name) -> Self {
                *uuid
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Identifier of an organization.
    OrganizationId
}

uuid_id! {
    /// Identifier of an organization participant.
    ///
    /// For user participants this is the id of the global user entity, for employees the id
    /// of the employee record.
    ParticipantId
}

uuid_id! {
    /// Identifier of a ledger transaction.
    TransactionId
}

uuid_id! {
    /// Identifier of a multisig wallet.
    MultisigId
}

uuid_id! {
    /// Identifier of a payroll contract.
    PayrollId
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn v7_ids_sort_by_creation_order() {
        let first = TransactionId::new_v7();
        let second = TransactionId::new_v7();

        assert!(first < second);
    }

    #[test]
    fn touch_only_moves_update_timestamp() {
        let created = Utc::now();
        let mut timestamps = Timestamps::created(created);

        timestamps.touch(created + Duration::seconds(5));

        assert_eq!(timestamps.created_at(), created);
        assert_eq!(timestamps.updated_at(), created + Duration::seconds(5));
    }
}
