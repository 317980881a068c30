//! Owner confirmations of multisig wallets.
//!
//! Each owner holds at most one live confirmation per multisig. Confirming again replaces the
//! earlier confirmation, so repeated confirmations never inflate the count.

use std::sync::Arc;

use block_accounting_domain::{
    MultisigId, OrganizationId, Timestamps,
    multisig::{Multisig, MultisigConfirmation, QuorumStatus},
    participant::User,
};
use block_accounting_store::LedgerStore;
use chrono::{DateTime, Utc};

use crate::{
    directory::{ParticipantDirectory, Role},
    error::{EngineError, Result},
    find_multisig,
};

/// Records owner confirmations and derives quorum.
#[derive(Clone)]
pub struct QuorumTracker {
    store: Arc<dyn LedgerStore>,
    directory: ParticipantDirectory,
}

impl QuorumTracker {
    pub fn new(store: Arc<dyn LedgerStore>, directory: ParticipantDirectory) -> Self {
        Self { store, directory }
    }

    /// Records the confirmation of `caller` at `at`, superseding an earlier one, and returns
    /// the resulting quorum.
    ///
    /// The caller must be an active user participant listed among the multisig's owners.
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id, %multisig_id))]
    pub async fn confirm(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        multisig_id: MultisigId,
        at: DateTime<Utc>,
    ) -> Result<QuorumStatus> {
        let participant = self.directory.authorize(caller, organization_id, Role::Member).await?;

        let multisig = find_multisig(self.store.as_ref(), organization_id, multisig_id).await?;

        if !multisig.is_owned_by(participant.id()) {
            return Err(EngineError::unauthorized("caller is not an owner of the multisig"));
        }

        let confirmation = MultisigConfirmation::builder()
            .multisig_id(multisig_id)
            .organization_id(organization_id)
            .owner_id(participant.id())
            .timestamps(Timestamps::created(at))
            .build();

        self.store.confirm_multisig(&confirmation).await?;

        let status = self.status_of(&multisig).await?;

        tracing::info!(
            confirmed = status.confirmed(),
            required = status.required().get(),
            "multisig confirmation recorded"
        );

        Ok(status)
    }

    /// Returns how many owners confirmed the multisig against how many are required.
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id, %multisig_id))]
    pub async fn quorum(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        multisig_id: MultisigId,
    ) -> Result<QuorumStatus> {
        self.directory.authorize(caller, organization_id, Role::Member).await?;

        let multisig = find_multisig(self.store.as_ref(), organization_id, multisig_id).await?;

        self.status_of(&multisig).await
    }

    async fn status_of(&self, multisig: &Multisig) -> Result<QuorumStatus> {
        let confirmations = self
            .store
            .list_multisig_confirmations(multisig.id(), multisig.organization_id())
            .await?;

        // confirmations of owners that were since removed do not count
        let confirmed = confirmations.iter().filter(|c| multisig.is_owned_by(c.owner_id())).count();

        let status = QuorumStatus::builder()
            .required(multisig.confirmations_required())
            .confirmed(u32::try_from(confirmed).unwrap_or(u32::MAX))
            .build();

        Ok(status)
    }
}
