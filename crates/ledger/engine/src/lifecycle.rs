//! Transaction lifecycle: creation, listing, confirmation and cancellation.
//!
//! A transaction starts `Pending`. An organization admin may confirm or cancel it, and either
//! state may be flipped to the other later on; confirming clears the cancellation and vice
//! versa. `Committed` is only set by the settlement process.

use std::sync::Arc;

use block_accounting_domain::{OrganizationId, TransactionId, participant::User, tx::Transaction};
use block_accounting_store::{LedgerStore, TransactionFilter};
use chrono::Utc;

use crate::{
    cursor::Cursor,
    directory::{ParticipantDirectory, Role},
    error::{EngineError, Result},
    types::{
        request::{
            CreateTransactionRequest, ListTransactionsRequest, ListTransactionsRequestDissolved,
        },
        response::ListTransactionsResponse,
    },
};

/// Largest page returned by [`TransactionLifecycle::list`].
pub const MAX_PAGE_SIZE: u32 = 50;

/// Drives transactions through their states on behalf of organization participants.
#[derive(Clone)]
pub struct TransactionLifecycle {
    store: Arc<dyn LedgerStore>,
    directory: ParticipantDirectory,
}

impl TransactionLifecycle {
    pub fn new(store: Arc<dyn LedgerStore>, directory: ParticipantDirectory) -> Self {
        Self { store, directory }
    }

    /// Records a new pending transaction created by `caller`.
    ///
    /// The caller must be an active user participant of the organization.
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id))]
    pub async fn create(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        request: CreateTransactionRequest,
    ) -> Result<Transaction> {
        let participant = self.directory.authorize(caller, organization_id, Role::Member).await?;

        let tx = request.into_draft().into_transaction(
            organization_id,
            participant.id(),
            Utc::now(),
        );

        self.store.create_transaction(&tx).await?;

        tracing::debug!(tx_id = %tx.id(), "transaction created");

        Ok(tx)
    }

    /// Returns one page of the organization's transactions, ordered by id.
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id))]
    pub async fn list(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        request: ListTransactionsRequest,
    ) -> Result<ListTransactionsResponse> {
        self.directory.authorize(caller, organization_id, Role::Member).await?;

        let ListTransactionsRequestDissolved {
            ids,
            created_by,
            to_addr,
            pending,
            confirmed,
            cancelled,
            committed,
            expired,
            cursor,
            limit,
        } = request.dissolve();

        let after = cursor.as_deref().map(Cursor::decode).transpose()?.map(|c| c.transaction_id());
        let limit = page_size(limit);

        // one extra row tells whether another page follows
        let filter = TransactionFilter::builder()
            .organization_id(organization_id)
            .ids(ids)
            .maybe_created_by(created_by)
            .maybe_to_addr(to_addr)
            .pending(pending)
            .confirmed(confirmed)
            .cancelled(cancelled)
            .committed(committed)
            .expired(expired)
            .maybe_after(after)
            .limit(limit + 1)
            .build();

        let mut txs = self.store.get_transactions(&filter).await?;

        let next_cursor = if txs.len() > limit as usize {
            txs.truncate(limit as usize);
            txs.last().map(|tx| Cursor::new(tx.id()).encode()).transpose()?
        } else {
            None
        };

        Ok(ListTransactionsResponse::builder().txs(txs).maybe_next_cursor(next_cursor).build())
    }

    /// Confirms a transaction, clearing any cancellation.
    ///
    /// The caller must be an active admin of the organization.
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id, %tx_id))]
    pub async fn confirm(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        tx_id: TransactionId,
    ) -> Result<Transaction> {
        self.directory.authorize(caller, organization_id, Role::Admin).await?;

        let updated = self.store.confirm_transaction(tx_id, organization_id, Utc::now()).await?;
        if !updated {
            return Err(EngineError::not_found(format!("transaction {tx_id} not found")));
        }

        self.reload(tx_id, organization_id).await
    }

    /// Cancels a transaction, clearing any confirmation.
    ///
    /// The caller must be an active admin of the organization.
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id, %tx_id))]
    pub async fn cancel(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        tx_id: TransactionId,
    ) -> Result<Transaction> {
        self.directory.authorize(caller, organization_id, Role::Admin).await?;

        let updated = self.store.cancel_transaction(tx_id, organization_id, Utc::now()).await?;
        if !updated {
            return Err(EngineError::not_found(format!("transaction {tx_id} not found")));
        }

        self.reload(tx_id, organization_id).await
    }

    async fn reload(
        &self,
        tx_id: TransactionId,
        organization_id: OrganizationId,
    ) -> Result<Transaction> {
        let filter = TransactionFilter::builder()
            .organization_id(organization_id)
            .ids(vec![tx_id])
            .limit(1)
            .build();

        self.store
            .get_transactions(&filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::not_found(format!("transaction {tx_id} not found")))
    }
}

fn page_size(requested: Option<u32>) -> u32 {
    match requested {
        Some(limit @ 1..=MAX_PAGE_SIZE) => limit,
        _ => MAX_PAGE_SIZE,
    }
}
