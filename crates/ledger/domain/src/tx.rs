//! Ledger transaction domain models and lifecycle state.

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use rust_decimal::Decimal;
use strum::{Display, EnumString, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{OrganizationId, ParticipantId, Timestamps, TransactionId};

#[cfg(feature = "serde")]
use crate::with_serde;

/// The lifecycle state of a transaction, derived from its terminal timestamps.
///
/// `Pending` is the initial state. Confirmed and cancelled transactions may be moved to the
/// opposite state at any time; `Committed` is only ever set by the settlement process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum TransactionStatus {
    /// No terminal timestamp is set.
    Pending,
    /// Confirmed by an organization admin.
    Confirmed,
    /// Cancelled by an organization admin.
    Cancelled,
    /// Settled on-chain.
    Committed,
}

/// A transaction as submitted by a caller, before the ledger assigns ownership and timestamps.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct TransactionDraft {
    /// Caller supplied id. A new UUIDv7 is generated when absent.
    id: Option<TransactionId>,

    #[builder(default)]
    description: String,

    amount: Decimal,

    /// Raw destination address bytes.
    to_addr: Vec<u8>,

    #[builder(default)]
    max_fee_allowed: Decimal,

    deadline: Option<DateTime<Utc>>,
}

/// A ledger transaction recorded by an organization.
#[derive(Debug, Clone, PartialEq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transaction {
    /// The unique, time-sortable identifier.
    id: TransactionId,

    /// Free-form description of the payment.
    #[builder(default)]
    description: String,

    /// The owning organization.
    organization_id: OrganizationId,

    /// The participant who created the transaction.
    created_by: ParticipantId,

    /// Amount to transfer.
    amount: Decimal,

    /// Destination address bytes.
    #[cfg_attr(feature = "serde", serde(with = "with_serde::hex_bytes"))]
    to_addr: Vec<u8>,

    /// Maximum network fee the organization accepts for this transfer.
    #[builder(default)]
    max_fee_allowed: Decimal,

    /// Optional expiry of the transaction.
    deadline: Option<DateTime<Utc>>,

    /// Creation and update times.
    timestamps: Timestamps,

    /// Set while the transaction is confirmed.
    confirmed_at: Option<DateTime<Utc>>,

    /// Set while the transaction is cancelled.
    cancelled_at: Option<DateTime<Utc>>,

    /// Set by the settlement process once the transfer is on-chain.
    committed_at: Option<DateTime<Utc>>,
}

impl TransactionDraft {
    /// Turns the draft into a pending transaction owned by `created_by`.
    pub fn into_transaction(
        self,
        organization_id: OrganizationId,
        created_by: ParticipantId,
        now: DateTime<Utc>,
    ) -> Transaction {
        Transaction {
            id: self.id.unwrap_or_else(TransactionId::new_v7),
            description: self.description,
            organization_id,
            created_by,
            amount: self.amount,
            to_addr: self.to_addr,
            max_fee_allowed: self.max_fee_allowed,
            deadline: self.deadline,
            timestamps: Timestamps::created(now),
            confirmed_at: None,
            cancelled_at: None,
            committed_at: None,
        }
    }
}

impl Transaction {
    /// Returns the transaction id.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the owning organization id.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the id of the participant who created the transaction.
    pub fn created_by(&self) -> ParticipantId {
        self.created_by
    }

    /// Returns the amount to transfer.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the destination address bytes.
    pub fn to_addr(&self) -> &[u8] {
        &self.to_addr
    }

    /// Returns the maximum accepted network fee.
    pub fn max_fee_allowed(&self) -> Decimal {
        self.max_fee_allowed
    }

    /// Returns the deadline, if any.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns the creation and update timestamps.
    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    /// Returns when the transaction was confirmed.
    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    /// Returns when the transaction was cancelled.
    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    /// Returns when the transaction was committed on-chain.
    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.committed_at
    }

    /// Derives the lifecycle state from the terminal timestamps.
    pub fn status(&self) -> TransactionStatus {
        if self.committed_at.is_some() {
            TransactionStatus::Committed
        } else if self.confirmed_at.is_some() {
            TransactionStatus::Confirmed
        } else if self.cancelled_at.is_some() {
            TransactionStatus::Cancelled
        } else {
            TransactionStatus::Pending
        }
    }

    /// Whether no terminal timestamp is set.
    pub fn is_pending(&self) -> bool {
        self.status() == TransactionStatus::Pending
    }

    /// Whether the deadline has passed at `now`. Transactions without a deadline never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }

    /// Confirms the transaction, clearing any cancellation.
    pub fn confirm(&mut self, at: DateTime<Utc>) {
        self.confirmed_at = Some(at);
        self.cancelled_at = None;
        self.timestamps.touch(at);
    }

    /// Cancels the transaction, clearing any confirmation.
    pub fn cancel(&mut self, at: DateTime<Utc>) {
        self.cancelled_at = Some(at);
        self.confirmed_at = None;
        self.timestamps.touch(at);
    }
}
