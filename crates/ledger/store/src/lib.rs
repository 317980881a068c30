//! Persistence layer for the block accounting ledger.
//!
//! The store persists transactions, multisig wallets with their owner confirmations, payroll
//! contracts, and the participants of each organization. The engine only talks to the
//! [`LedgerStore`] and [`ParticipantStore`] traits, which are implemented by:
//!
//! - [`PgStore`], backed by PostgreSQL through [diesel](https://diesel.rs) with async
//!   connections pooled by deadpool. SQL migrations live in this crate's `migrations/`.
//! - [`InMemoryStore`], a process-local store used by tests and local runs.
//!
//! # Usage
//!
//! ```ignore
//! let pool = establish_pool(database_url, max_connections).await?;
//! let store = PgStore::new(pool);
//!
//! let filter = TransactionFilter::builder().organization_id(org_id).pending(true).build();
//! let txs = store.get_transactions(&filter).await?;
//! ```

mod error;
mod filter;
mod memory;
mod persistence;
mod pg;

pub use self::{
    error::{Result, StoreError},
    filter::{MultisigFilter, ParticipantFilter, PayrollFilter, TransactionFilter},
    memory::InMemoryStore,
    persistence::pool::{DbConn, DbPool, PoolError, establish_pool},
    pg::PgStore,
};

use async_trait::async_trait;
use block_accounting_domain::{
    MultisigId, OrganizationId, TransactionId,
    multisig::{Multisig, MultisigConfirmation, Payroll},
    participant::OrganizationParticipant,
    tx::Transaction,
};
use chrono::{DateTime, Utc};

/// Persistence of transactions, multisigs and payrolls.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// Returns the transactions matching `filter`, ordered by id ascending.
    async fn get_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    /// Persists a new transaction.
    async fn create_transaction(&self, tx: &Transaction) -> Result<()>;

    /// Sets `confirmed_at` and clears `cancelled_at`.
    ///
    /// Returns `false` when no transaction with this id exists in the organization.
    async fn confirm_transaction(
        &self,
        tx_id: TransactionId,
        organization_id: OrganizationId,
        at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Sets `cancelled_at` and clears `confirmed_at`.
    ///
    /// Returns `false` when no transaction with this id exists in the organization.
    async fn cancel_transaction(
        &self,
        tx_id: TransactionId,
        organization_id: OrganizationId,
        at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Persists a deployed multisig together with its ordered owners.
    async fn add_multisig(&self, multisig: &Multisig) -> Result<()>;

    /// Returns the multisigs matching `filter`.
    async fn list_multisigs(&self, filter: &MultisigFilter) -> Result<Vec<Multisig>>;

    /// Records an owner confirmation, replacing any earlier confirmation of the same owner.
    ///
    /// The removal of the earlier row and the insertion happen atomically.
    async fn confirm_multisig(&self, confirmation: &MultisigConfirmation) -> Result<()>;

    /// Returns the live confirmations of a multisig.
    async fn list_multisig_confirmations(
        &self,
        multisig_id: MultisigId,
        organization_id: OrganizationId,
    ) -> Result<Vec<MultisigConfirmation>>;

    /// Persists a deployed payroll contract.
    async fn add_payroll(&self, payroll: &Payroll) -> Result<()>;

    /// Returns the payroll contracts matching `filter`.
    async fn list_payrolls(&self, filter: &PayrollFilter) -> Result<Vec<Payroll>>;
}

/// Lookup and registration of organization participants.
#[async_trait]
pub trait ParticipantStore: Send + Sync + 'static {
    /// Returns the participants matching `filter`. User participants come first.
    async fn participants(
        &self,
        filter: &ParticipantFilter,
    ) -> Result<Vec<OrganizationParticipant>>;

    /// Registers a participant in its organization.
    ///
    /// For a user participant the global user is created when missing, and a linked employee
    /// record is stored alongside.
    async fn add_participant(&self, participant: &OrganizationParticipant) -> Result<()>;
}
