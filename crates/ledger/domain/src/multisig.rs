//! Multisig wallet, owner confirmation and payroll contract models.

use core::num::NonZeroU32;

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{MultisigId, OrganizationId, ParticipantId, PayrollId, Timestamps};

#[cfg(feature = "serde")]
use crate::with_serde;

/// A multisig wallet operated by an organization.
///
/// A multisig is only recorded once its on-chain deployment succeeded, so in practice the
/// address is populated. The type still tolerates an empty address because older rows and
/// payroll preconditions have to be checked explicitly (see [`Multisig::has_address`]).
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Multisig {
    /// The unique identifier.
    id: MultisigId,

    /// The owning organization.
    organization_id: OrganizationId,

    /// Human readable title.
    title: String,

    /// On-chain address, empty until deployment succeeds.
    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(with = "with_serde::hex_bytes"))]
    address: Vec<u8>,

    /// Owner participant ids, in the order they were submitted to the chain.
    owners: Vec<ParticipantId>,

    /// Number of distinct owner confirmations needed for quorum.
    confirmations_required: NonZeroU32,

    /// Creation and update times.
    timestamps: Timestamps,
}

impl Multisig {
    /// Returns the multisig id.
    pub fn id(&self) -> MultisigId {
        self.id
    }

    /// Returns the owning organization id.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the on-chain address bytes.
    pub fn address(&self) -> &[u8] {
        &self.address
    }

    /// Whether the multisig has a deployed on-chain address.
    pub fn has_address(&self) -> bool {
        !self.address.is_empty()
    }

    /// Returns the ordered owner ids.
    pub fn owners(&self) -> &[ParticipantId] {
        &self.owners
    }

    /// Whether `participant_id` is one of the owners.
    pub fn is_owned_by(&self, participant_id: ParticipantId) -> bool {
        self.owners.contains(&participant_id)
    }

    /// Returns the quorum size.
    pub fn confirmations_required(&self) -> NonZeroU32 {
        self.confirmations_required
    }

    /// Returns the creation and update timestamps.
    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

/// A single owner's confirmation of a multisig.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultisigConfirmation {
    multisig_id: MultisigId,
    organization_id: OrganizationId,
    owner_id: ParticipantId,
    timestamps: Timestamps,
}

impl MultisigConfirmation {
    /// Returns the confirmed multisig id.
    pub fn multisig_id(&self) -> MultisigId {
        self.multisig_id
    }

    /// Returns the organization id.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the confirming owner.
    pub fn owner_id(&self) -> ParticipantId {
        self.owner_id
    }

    /// Returns the confirmation timestamps.
    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    /// When the confirmation was recorded.
    pub fn confirmed_at(&self) -> DateTime<Utc> {
        self.timestamps.created_at()
    }
}

/// A payroll contract deployed under a multisig.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Payroll {
    id: PayrollId,

    title: String,

    #[cfg_attr(feature = "serde", serde(with = "with_serde::hex_bytes"))]
    address: Vec<u8>,

    organization_id: OrganizationId,

    /// The multisig authorized to operate the contract.
    multisig_id: MultisigId,

    timestamps: Timestamps,
}

impl Payroll {
    /// Returns the payroll id.
    pub fn id(&self) -> PayrollId {
        self.id
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the contract address bytes.
    pub fn address(&self) -> &[u8] {
        &self.address
    }

    /// Returns the owning organization id.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the owning multisig id.
    pub fn multisig_id(&self) -> MultisigId {
        self.multisig_id
    }

    /// Returns the creation and update timestamps.
    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

/// How many owners confirmed a multisig compared to its quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuorumStatus {
    required: NonZeroU32,
    confirmed: u32,
}

impl QuorumStatus {
    /// Returns the number of confirmations needed.
    pub fn required(&self) -> NonZeroU32 {
        self.required
    }

    /// Returns the number of distinct owners who confirmed.
    pub fn confirmed(&self) -> u32 {
        self.confirmed
    }

    /// Whether enough owners confirmed.
    pub fn reached(&self) -> bool {
        self.confirmed >= self.required.get()
    }
}
