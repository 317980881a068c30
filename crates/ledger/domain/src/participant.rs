//! Organization participants: registered users and employees.
//!
//! A participant is an organization-scoped identity. It is either a registered [`User`] with
//! organization role flags ([`OrganizationUser`]) or an [`Employee`] record that never logs
//! in. Both shapes are exposed through [`OrganizationParticipant`].

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use strum::{Display, EnumString, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{OrganizationId, ParticipantId, Timestamps};

#[cfg(feature = "serde")]
use crate::with_serde;

/// A registered user of the platform.
///
/// The seed and mnemonic are credentials forwarded to the chain-execution service and are
/// never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct User {
    id: ParticipantId,

    name: String,

    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(skip))]
    seed: Vec<u8>,

    #[builder(default)]
    #[cfg_attr(feature = "serde", serde(with = "with_serde::hex_bytes"))]
    public_key: Vec<u8>,

    #[cfg_attr(feature = "serde", serde(skip))]
    mnemonic: Option<String>,

    activated_at: Option<DateTime<Utc>>,

    timestamps: Timestamps,
}

impl User {
    /// Returns the global user id, which is also the participant id of the user in every
    /// organization.
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the seed forwarded to the chain service as the caller credential.
    pub fn seed(&self) -> &[u8] {
        &self.seed
    }

    /// Returns the public key bytes. Empty when the key was never derived.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Returns the recovery mnemonic, if stored.
    pub fn mnemonic(&self) -> Option<&str> {
        self.mnemonic.as_deref()
    }

    /// Returns the activation time.
    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        self.activated_at
    }

    /// Whether the account has been activated.
    pub fn is_activated(&self) -> bool {
        self.activated_at.is_some()
    }

    /// Returns the creation and update timestamps.
    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

/// An employee record of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Employee {
    id: ParticipantId,

    name: String,

    /// The registered user behind this employee, if any.
    user_id: Option<ParticipantId>,

    organization_id: OrganizationId,

    #[cfg_attr(feature = "serde", serde(with = "with_serde::hex_bytes"))]
    wallet_address: Vec<u8>,

    #[builder(default)]
    position: String,

    timestamps: Timestamps,

    deleted_at: Option<DateTime<Utc>>,
}

impl Employee {
    /// Returns the employee id.
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the linked user id.
    pub fn user_id(&self) -> Option<ParticipantId> {
        self.user_id
    }

    /// Returns the organization id.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the wallet address salaries are paid to.
    pub fn wallet_address(&self) -> &[u8] {
        &self.wallet_address
    }

    /// Returns the position within the organization.
    pub fn position(&self) -> &str {
        &self.position
    }

    /// Returns the creation and update timestamps.
    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    /// Returns the soft-deletion time.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

/// A registered user together with their role inside one organization.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrganizationUser {
    user: User,

    organization_id: OrganizationId,

    #[builder(default)]
    position: String,

    #[builder(default)]
    is_admin: bool,

    #[builder(default)]
    is_owner: bool,

    /// When the user was added to the organization, and the last role update.
    timestamps: Timestamps,

    deleted_at: Option<DateTime<Utc>>,

    /// The employee record of this user in the same organization, if one exists.
    employee: Option<Employee>,
}

impl OrganizationUser {
    /// Returns the wrapped global user.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Returns the organization id.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the position within the organization.
    pub fn position(&self) -> &str {
        &self.position
    }

    /// Returns the linked employee record.
    pub fn employee(&self) -> Option<&Employee> {
        self.employee.as_ref()
    }
}

/// The variant of an [`OrganizationParticipant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum ParticipantKind {
    /// A registered user.
    User,
    /// An employee without login.
    Employee,
}

/// An organization-scoped identity.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum OrganizationParticipant {
    /// A registered user with organization role flags.
    User(OrganizationUser),
    /// An employee record.
    Employee(Employee),
}

impl OrganizationParticipant {
    /// Returns the participant id.
    pub fn id(&self) -> ParticipantId {
        match self {
            Self::User(org_user) => org_user.user.id,
            Self::Employee(employee) => employee.id,
        }
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        match self {
            Self::User(org_user) => &org_user.user.name,
            Self::Employee(employee) => &employee.name,
        }
    }

    /// Returns the organization id.
    pub fn organization_id(&self) -> OrganizationId {
        match self {
            Self::User(org_user) => org_user.organization_id,
            Self::Employee(employee) => employee.organization_id,
        }
    }

    /// Returns the variant.
    pub fn kind(&self) -> ParticipantKind {
        match self {
            Self::User(_) => ParticipantKind::User,
            Self::Employee(_) => ParticipantKind::Employee,
        }
    }

    /// Whether the participant is an organization admin. Employees never are.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::User(org_user) if org_user.is_admin)
    }

    /// Whether the participant is an organization owner. Employees never are.
    pub fn is_owner(&self) -> bool {
        matches!(self, Self::User(org_user) if org_user.is_owner)
    }

    /// Whether the participant is not soft-deleted and, for users, activated.
    pub fn is_active(&self) -> bool {
        match self {
            Self::User(org_user) => org_user.deleted_at.is_none() && org_user.user.is_activated(),
            Self::Employee(employee) => employee.deleted_at.is_none(),
        }
    }

    /// Returns the creation time within the organization.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.timestamps().created_at()
    }

    /// Returns the last update time.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.timestamps().updated_at()
    }

    /// Returns the soft-deletion time.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::User(org_user) => org_user.deleted_at,
            Self::Employee(employee) => employee.deleted_at,
        }
    }

    /// Returns the user variant.
    pub fn as_user(&self) -> Option<&OrganizationUser> {
        match self {
            Self::User(org_user) => Some(org_user),
            Self::Employee(_) => None,
        }
    }

    /// Returns the employee variant.
    pub fn as_employee(&self) -> Option<&Employee> {
        match self {
            Self::User(_) => None,
            Self::Employee(employee) => Some(employee),
        }
    }

    /// Returns the user's public key. `None` for employees and for users without a key.
    pub fn public_key(&self) -> Option<&[u8]> {
        self.as_user()
            .map(|org_user| org_user.user.public_key())
            .filter(|key| !key.is_empty())
    }

    /// Returns the employee's wallet address. A user participant exposes the wallet of
    /// their linked employee record, if any.
    pub fn wallet_address(&self) -> Option<&[u8]> {
        match self {
            Self::User(org_user) => org_user.employee.as_ref().map(Employee::wallet_address),
            Self::Employee(employee) => Some(employee.wallet_address()),
        }
    }

    fn timestamps(&self) -> &Timestamps {
        match self {
            Self::User(org_user) => &org_user.timestamps,
            Self::Employee(employee) => &employee.timestamps,
        }
    }
}

impl From<OrganizationUser> for OrganizationParticipant {
    fn from(org_user: OrganizationUser) -> Self {
        Self::User(org_user)
    }
}

impl From<Employee> for OrganizationParticipant {
    fn from(employee: Employee) -> Self {
        Self::Employee(employee)
    }
}
