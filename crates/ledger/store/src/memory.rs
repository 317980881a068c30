use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use block_accounting_domain::{
    MultisigId, OrganizationId, ParticipantId, PayrollId, TransactionId,
    multisig::{Multisig, MultisigConfirmation, Payroll},
    participant::OrganizationParticipant,
    tx::Transaction,
};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    LedgerStore, MultisigFilter, ParticipantFilter, ParticipantStore, PayrollFilter,
    TransactionFilter,
    error::{Result, StoreError},
};

/// A thread-safe, process-local store.
///
/// All state lives behind one `Arc<RwLock<_>>`, so clones share the same data and every
/// write, including the delete-then-insert of a multisig confirmation, is serialized.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

#[derive(Debug, Default)]
struct State {
    transactions: BTreeMap<TransactionId, Transaction>,
    multisigs: BTreeMap<MultisigId, Multisig>,
    confirmations: HashMap<(MultisigId, ParticipantId), MultisigConfirmation>,
    payrolls: BTreeMap<PayrollId, Payroll>,
    participants: BTreeMap<(OrganizationId, ParticipantId), OrganizationParticipant>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn update_transaction<F>(
        &self,
        tx_id: TransactionId,
        organization_id: OrganizationId,
        update: F,
    ) -> Result<bool>
    where
        F: FnOnce(&mut Transaction),
    {
        let mut state = self.state.write().await;

        match state.transactions.get_mut(&tx_id) {
            Some(tx) if tx.organization_id() == organization_id => {
                update(tx);
                Ok(true)
            },
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn get_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let now = Utc::now();
        let state = self.state.read().await;

        let limit = filter.limit().map_or(usize::MAX, |limit| limit as usize);

        Ok(state
            .transactions
            .values()
            .filter(|tx| filter.matches(tx, now))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_transaction(&self, tx: &Transaction) -> Result<()> {
        let mut state = self.state.write().await;

        if state.transactions.contains_key(&tx.id()) {
            return Err(StoreError::other(format!("duplicate transaction id {}", tx.id())));
        }

        state.transactions.insert(tx.id(), tx.clone());
        Ok(())
    }

    async fn confirm_transaction(
        &self,
        tx_id: TransactionId,
        organization_id: OrganizationId,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        self.update_transaction(tx_id, organization_id, |tx| tx.confirm(at)).await
    }

    async fn cancel_transaction(
        &self,
        tx_id: TransactionId,
        organization_id: OrganizationId,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        self.update_transaction(tx_id, organization_id, |tx| tx.cancel(at)).await
    }

    async fn add_multisig(&self, multisig: &Multisig) -> Result<()> {
        let mut state = self.state.write().await;
        state.multisigs.insert(multisig.id(), multisig.clone());
        Ok(())
    }

    async fn list_multisigs(&self, filter: &MultisigFilter) -> Result<Vec<Multisig>> {
        let state = self.state.read().await;

        Ok(state.multisigs.values().filter(|m| filter.matches(m)).cloned().collect())
    }

    async fn confirm_multisig(&self, confirmation: &MultisigConfirmation) -> Result<()> {
        let mut state = self.state.write().await;

        if !state.multisigs.contains_key(&confirmation.multisig_id()) {
            return Err(StoreError::not_found(format!(
                "multisig {} not found",
                confirmation.multisig_id()
            )));
        }

        let key = (confirmation.multisig_id(), confirmation.owner_id());
        state.confirmations.remove(&key);
        state.confirmations.insert(key, confirmation.clone());
        Ok(())
    }

    async fn list_multisig_confirmations(
        &self,
        multisig_id: MultisigId,
        organization_id: OrganizationId,
    ) -> Result<Vec<MultisigConfirmation>> {
        let state = self.state.read().await;

        let mut confirmations: Vec<_> = state
            .confirmations
            .values()
            .filter(|c| c.multisig_id() == multisig_id && c.organization_id() == organization_id)
            .cloned()
            .collect();

        confirmations.sort_by_key(MultisigConfirmation::owner_id);
        Ok(confirmations)
    }

    async fn add_payroll(&self, payroll: &Payroll) -> Result<()> {
        let mut state = self.state.write().await;

        if !state.multisigs.contains_key(&payroll.multisig_id()) {
            return Err(StoreError::not_found(format!(
                "multisig {} not found",
                payroll.multisig_id()
            )));
        }

        state.payrolls.insert(payroll.id(), payroll.clone());
        Ok(())
    }

    async fn list_payrolls(&self, filter: &PayrollFilter) -> Result<Vec<Payroll>> {
        let state = self.state.read().await;

        Ok(state.payrolls.values().filter(|p| filter.matches(p)).cloned().collect())
    }
}

#[async_trait]
impl ParticipantStore for InMemoryStore {
    async fn participants(
        &self,
        filter: &ParticipantFilter,
    ) -> Result<Vec<OrganizationParticipant>> {
        let state = self.state.read().await;

        let (mut users, employees): (Vec<_>, Vec<_>) = state
            .participants
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .partition(|p| p.as_user().is_some());

        users.extend(employees);
        Ok(users)
    }

    async fn add_participant(&self, participant: &OrganizationParticipant) -> Result<()> {
        let mut state = self.state.write().await;

        state
            .participants
            .insert((participant.organization_id(), participant.id()), participant.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use core::num::NonZeroU32;

    use block_accounting_domain::{Timestamps, tx::TransactionDraft};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use super::*;

    fn tx(org: OrganizationId) -> Transaction {
        TransactionDraft::builder()
            .amount(dec!(2.5))
            .to_addr(vec![0x01])
            .build()
            .into_transaction(org, ParticipantId::new_v7(), Utc::now())
    }

    fn multisig(org: OrganizationId) -> Multisig {
        Multisig::builder()
            .id(MultisigId::new_v7())
            .organization_id(org)
            .title("ops".into())
            .address(vec![0xaa])
            .owners(vec![ParticipantId::new_v7()])
            .confirmations_required(NonZeroU32::MIN)
            .timestamps(Timestamps::created(Utc::now()))
            .build()
    }

    #[tokio::test]
    async fn transactions_are_returned_in_id_order_up_to_limit() {
        let store = InMemoryStore::new();
        let org = OrganizationId::new_v7();

        let txs: Vec<_> = (0..5).map(|_| tx(org)).collect();
        for tx in txs.iter().rev() {
            store.create_transaction(tx).await.unwrap();
        }

        let filter = TransactionFilter::builder().organization_id(org).limit(3).build();
        let page = store.get_transactions(&filter).await.unwrap();

        let ids: Vec<_> = page.iter().map(Transaction::id).collect();
        let expected: Vec<_> = txs.iter().take(3).map(Transaction::id).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn confirm_of_foreign_transaction_reports_missing() {
        let store = InMemoryStore::new();
        let tx = tx(OrganizationId::new_v7());
        store.create_transaction(&tx).await.unwrap();

        let updated = store
            .confirm_transaction(tx.id(), OrganizationId::new_v7(), Utc::now())
            .await
            .unwrap();

        assert!(!updated);
    }

    #[tokio::test]
    async fn reconfirmation_replaces_previous_row() {
        let store = InMemoryStore::new();
        let org = OrganizationId::new_v7();
        let multisig = multisig(org);
        let owner = multisig.owners()[0];
        store.add_multisig(&multisig).await.unwrap();

        let first = Utc::now();
        let second = first + Duration::seconds(10);

        for at in [first, second] {
            let confirmation = MultisigConfirmation::builder()
                .multisig_id(multisig.id())
                .organization_id(org)
                .owner_id(owner)
                .timestamps(Timestamps::created(at))
                .build();

            store.confirm_multisig(&confirmation).await.unwrap();
        }

        let confirmations = store.list_multisig_confirmations(multisig.id(), org).await.unwrap();

        assert_eq!(confirmations.len(), 1);
        assert_eq!(confirmations[0].confirmed_at(), second);
    }

    #[tokio::test]
    async fn payroll_requires_existing_multisig() {
        let store = InMemoryStore::new();
        let org = OrganizationId::new_v7();

        let payroll = Payroll::builder()
            .id(PayrollId::new_v7())
            .title("salaries".into())
            .address(vec![0xbb])
            .organization_id(org)
            .multisig_id(MultisigId::new_v7())
            .timestamps(Timestamps::created(Utc::now()))
            .build();

        assert!(matches!(store.add_payroll(&payroll).await, Err(StoreError::NotFound(_))));
    }
}
