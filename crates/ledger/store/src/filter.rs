//! Query filters shared by every [`LedgerStore`](crate::LedgerStore) and
//! [`ParticipantStore`](crate::ParticipantStore) implementation.
//!
//! All filters are scoped to one organization. Every other criterion narrows the result
//! further; unset criteria match everything.

use block_accounting_domain::{
    MultisigId, OrganizationId, ParticipantId, PayrollId, TransactionId,
    multisig::{Multisig, Payroll},
    participant::OrganizationParticipant,
    tx::Transaction,
};
use bon::Builder;
use chrono::{DateTime, Utc};

/// Selects transactions of one organization.
///
/// Status flags combine conjunctively. `pending` requires all terminal timestamps to be
/// unset, `expired` requires a deadline at or before the query time.
#[derive(Debug, Clone, Builder)]
pub struct TransactionFilter {
    organization_id: OrganizationId,

    #[builder(default)]
    ids: Vec<TransactionId>,

    created_by: Option<ParticipantId>,

    to_addr: Option<Vec<u8>>,

    #[builder(default)]
    pending: bool,

    #[builder(default)]
    confirmed: bool,

    #[builder(default)]
    cancelled: bool,

    #[builder(default)]
    committed: bool,

    #[builder(default)]
    expired: bool,

    /// Only transactions with an id strictly greater than this one.
    after: Option<TransactionId>,

    /// Maximum number of rows to return. Unlimited when absent.
    limit: Option<u32>,
}

impl TransactionFilter {
    /// Returns the organization scope.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the id set, empty when not filtering on ids.
    pub fn ids(&self) -> &[TransactionId] {
        &self.ids
    }

    /// Returns the creator filter.
    pub fn created_by(&self) -> Option<ParticipantId> {
        self.created_by
    }

    /// Returns the destination address filter.
    pub fn to_addr(&self) -> Option<&[u8]> {
        self.to_addr.as_deref()
    }

    /// Whether only pending transactions are selected.
    pub fn pending(&self) -> bool {
        self.pending
    }

    /// Whether only confirmed transactions are selected.
    pub fn confirmed(&self) -> bool {
        self.confirmed
    }

    /// Whether only cancelled transactions are selected.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// Whether only committed transactions are selected.
    pub fn committed(&self) -> bool {
        self.committed
    }

    /// Whether only expired transactions are selected.
    pub fn expired(&self) -> bool {
        self.expired
    }

    /// Returns the exclusive lower id bound.
    pub fn after(&self) -> Option<TransactionId> {
        self.after
    }

    /// Returns the row limit.
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Whether `tx` satisfies every criterion except the limit, evaluated at `now`.
    pub fn matches(&self, tx: &Transaction, now: DateTime<Utc>) -> bool {
        tx.organization_id() == self.organization_id
            && (self.ids.is_empty() || self.ids.contains(&tx.id()))
            && self.created_by.is_none_or(|created_by| tx.created_by() == created_by)
            && self.to_addr().is_none_or(|to_addr| tx.to_addr() == to_addr)
            && (!self.pending || tx.is_pending())
            && (!self.confirmed || tx.confirmed_at().is_some())
            && (!self.cancelled || tx.cancelled_at().is_some())
            && (!self.committed || tx.committed_at().is_some())
            && (!self.expired || tx.is_expired_at(now))
            && self.after.is_none_or(|after| tx.id() > after)
    }
}

/// Selects multisigs of one organization.
#[derive(Debug, Clone, Builder)]
pub struct MultisigFilter {
    organization_id: OrganizationId,

    #[builder(default)]
    ids: Vec<MultisigId>,
}

impl MultisigFilter {
    /// Returns the organization scope.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the id set, empty when not filtering on ids.
    pub fn ids(&self) -> &[MultisigId] {
        &self.ids
    }

    /// Whether `multisig` satisfies the filter.
    pub fn matches(&self, multisig: &Multisig) -> bool {
        multisig.organization_id() == self.organization_id
            && (self.ids.is_empty() || self.ids.contains(&multisig.id()))
    }
}

/// Selects payroll contracts of one organization.
#[derive(Debug, Clone, Builder)]
pub struct PayrollFilter {
    organization_id: OrganizationId,

    #[builder(default)]
    ids: Vec<PayrollId>,

    multisig_id: Option<MultisigId>,
}

impl PayrollFilter {
    /// Returns the organization scope.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the id set, empty when not filtering on ids.
    pub fn ids(&self) -> &[PayrollId] {
        &self.ids
    }

    /// Returns the owning multisig filter.
    pub fn multisig_id(&self) -> Option<MultisigId> {
        self.multisig_id
    }

    /// Whether `payroll` satisfies the filter.
    pub fn matches(&self, payroll: &Payroll) -> bool {
        payroll.organization_id() == self.organization_id
            && (self.ids.is_empty() || self.ids.contains(&payroll.id()))
            && self.multisig_id.is_none_or(|multisig_id| payroll.multisig_id() == multisig_id)
    }
}

/// Selects participants of one organization.
///
/// Looking up by public keys only ever matches user participants, since employees carry no
/// key.
#[derive(Debug, Clone, Builder)]
pub struct ParticipantFilter {
    organization_id: OrganizationId,

    #[builder(default)]
    ids: Vec<ParticipantId>,

    #[builder(default)]
    public_keys: Vec<Vec<u8>>,

    #[builder(default)]
    users_only: bool,

    #[builder(default)]
    employees_only: bool,

    #[builder(default)]
    active_only: bool,

    #[builder(default)]
    owner_only: bool,
}

impl ParticipantFilter {
    /// Returns the organization scope.
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the id set, empty when not filtering on ids.
    pub fn ids(&self) -> &[ParticipantId] {
        &self.ids
    }

    /// Returns the public key set, empty when not filtering on keys.
    pub fn public_keys(&self) -> &[Vec<u8>] {
        &self.public_keys
    }

    /// Whether employees are excluded.
    pub fn users_only(&self) -> bool {
        self.users_only
    }

    /// Whether user participants are excluded.
    pub fn employees_only(&self) -> bool {
        self.employees_only
    }

    /// Whether soft-deleted and non-activated participants are excluded.
    pub fn active_only(&self) -> bool {
        self.active_only
    }

    /// Whether only organization owners are selected.
    pub fn owner_only(&self) -> bool {
        self.owner_only
    }

    /// Whether the filter can select user participants at all.
    pub fn includes_users(&self) -> bool {
        !self.employees_only
    }

    /// Whether the filter can select employee participants at all.
    pub fn includes_employees(&self) -> bool {
        !self.users_only && !self.owner_only && self.public_keys.is_empty()
    }

    /// Whether `participant` satisfies the filter.
    pub fn matches(&self, participant: &OrganizationParticipant) -> bool {
        let kind_matches = match participant {
            OrganizationParticipant::User(_) => self.includes_users(),
            OrganizationParticipant::Employee(_) => self.includes_employees(),
        };

        kind_matches
            && participant.organization_id() == self.organization_id
            && (self.ids.is_empty() || self.ids.contains(&participant.id()))
            && (self.public_keys.is_empty()
                || participant
                    .public_key()
                    .is_some_and(|key| self.public_keys.iter().any(|pk| pk == key)))
            && (!self.active_only || participant.is_active())
            && (!self.owner_only || participant.is_owner())
    }
}

#[cfg(test)]
mod tests {
    use block_accounting_domain::{
        Timestamps,
        participant::{Employee, OrganizationUser, User},
        tx::TransactionDraft,
    };
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use super::*;

    fn tx(org: OrganizationId, deadline: Option<DateTime<Utc>>) -> Transaction {
        TransactionDraft::builder()
            .amount(dec!(1))
            .to_addr(vec![0xab])
            .maybe_deadline(deadline)
            .build()
            .into_transaction(org, ParticipantId::new_v7(), Utc::now())
    }

    #[test]
    fn transaction_status_flags_are_conjunctive() {
        let org = OrganizationId::new_v7();
        let now = Utc::now();
        let mut confirmed = tx(org, Some(now - Duration::minutes(1)));
        confirmed.confirm(now);

        let confirmed_filter =
            TransactionFilter::builder().organization_id(org).confirmed(true).build();
        let expired_confirmed = TransactionFilter::builder()
            .organization_id(org)
            .confirmed(true)
            .expired(true)
            .build();
        let pending = TransactionFilter::builder().organization_id(org).pending(true).build();

        assert!(confirmed_filter.matches(&confirmed, now));
        assert!(expired_confirmed.matches(&confirmed, now));
        assert!(!pending.matches(&confirmed, now));
        assert!(pending.matches(&tx(org, None), now));
    }

    #[test]
    fn transaction_filter_is_scoped_to_organization_and_cursor() {
        let org = OrganizationId::new_v7();
        let first = tx(org, None);
        let second = tx(org, None);
        let now = Utc::now();

        let after_first =
            TransactionFilter::builder().organization_id(org).after(first.id()).build();
        let other_org =
            TransactionFilter::builder().organization_id(OrganizationId::new_v7()).build();

        assert!(!after_first.matches(&first, now));
        assert!(after_first.matches(&second, now));
        assert!(!other_org.matches(&first, now));
    }

    #[test]
    fn public_key_lookup_never_selects_employees() {
        let org = OrganizationId::new_v7();
        let now = Utc::now();

        let user: OrganizationParticipant = OrganizationUser::builder()
            .user(
                User::builder()
                    .id(ParticipantId::new_v7())
                    .name("u".into())
                    .public_key(vec![0x01])
                    .activated_at(now)
                    .timestamps(Timestamps::created(now))
                    .build(),
            )
            .organization_id(org)
            .timestamps(Timestamps::created(now))
            .build()
            .into();

        let employee: OrganizationParticipant = Employee::builder()
            .id(ParticipantId::new_v7())
            .name("e".into())
            .organization_id(org)
            .wallet_address(vec![0x02])
            .timestamps(Timestamps::created(now))
            .build()
            .into();

        let by_key =
            ParticipantFilter::builder().organization_id(org).public_keys(vec![vec![0x01]]).build();

        assert!(by_key.matches(&user));
        assert!(!by_key.matches(&employee));

        let employees_only =
            ParticipantFilter::builder().organization_id(org).employees_only(true).build();

        assert!(!employees_only.matches(&user));
        assert!(employees_only.matches(&employee));
    }
}
