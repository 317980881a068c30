//! Transaction and multisig lifecycle engine of the block accounting ledger.
//!
//! The engine groups four components sharing one participant directory:
//!
//! - [`TransactionLifecycle`] creates, lists, confirms and cancels transactions.
//! - [`DeploymentOrchestrator`] queues multisig and payroll deployments and salary updates for
//!   the deployment runtime, and lists their results.
//! - [`QuorumTracker`] records owner confirmations of multisigs.
//! - [`ParticipantDirectory`] resolves organization participants and authorizes callers.
//!
//! Every operation receives the calling [`User`] and the organization id explicitly.
//!
//! [`User`]: block_accounting_domain::participant::User

#![allow(missing_docs)]

mod cursor;
mod deployment_runtime;
mod directory;
mod error;
mod jobs;
mod lifecycle;
mod orchestrator;
mod quorum;
mod types;

pub use self::{
    cursor::Cursor,
    deployment_runtime::{DeploymentRuntimeConfig, DeploymentRuntimeError, TaskLimits},
    directory::{ParticipantDirectory, Role},
    error::{EngineError, Result},
    jobs::{JobId, JobKind, JobRegistry, JobState, JobStatus},
    lifecycle::{MAX_PAGE_SIZE, TransactionLifecycle},
    orchestrator::{DeploymentOrchestrator, Started, Stopped},
    quorum::QuorumTracker,
    types::{request, response},
};

use std::sync::Arc;

use block_accounting_chain_client::ChainClient;
use block_accounting_domain::{MultisigId, OrganizationId, multisig::Multisig};
use block_accounting_store::{LedgerStore, MultisigFilter, ParticipantStore};

pub struct LedgerEngine<R> {
    directory: ParticipantDirectory,
    transactions: TransactionLifecycle,
    quorum: QuorumTracker,
    deployments: DeploymentOrchestrator<R>,
}

impl<R> LedgerEngine<R> {
    pub fn directory(&self) -> &ParticipantDirectory {
        &self.directory
    }

    pub fn transactions(&self) -> &TransactionLifecycle {
        &self.transactions
    }

    pub fn quorum(&self) -> &QuorumTracker {
        &self.quorum
    }

    pub fn deployments(&self) -> &DeploymentOrchestrator<R> {
        &self.deployments
    }
}

impl LedgerEngine<Stopped> {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        participants: Arc<dyn ParticipantStore>,
        chain: Arc<dyn ChainClient>,
    ) -> Self {
        let directory = ParticipantDirectory::new(participants);

        Self {
            transactions: TransactionLifecycle::new(store.clone(), directory.clone()),
            quorum: QuorumTracker::new(store.clone(), directory.clone()),
            deployments: DeploymentOrchestrator::new(store, chain, directory.clone()),
            directory,
        }
    }

    /// Starts the deployment workers on the current tokio runtime.
    pub fn start_deployment_runtime(
        self,
        config: DeploymentRuntimeConfig,
    ) -> LedgerEngine<Started> {
        LedgerEngine {
            directory: self.directory,
            transactions: self.transactions,
            quorum: self.quorum,
            deployments: self.deployments.start_deployment_runtime(config),
        }
    }
}

impl LedgerEngine<Started> {
    /// Stops accepting jobs and waits until the queued ones are processed.
    pub async fn stop_deployment_runtime(self) -> Result<LedgerEngine<Stopped>> {
        let engine = LedgerEngine {
            directory: self.directory,
            transactions: self.transactions,
            quorum: self.quorum,
            deployments: self.deployments.stop_deployment_runtime().await?,
        };

        Ok(engine)
    }
}

async fn find_multisig(
    store: &dyn LedgerStore,
    organization_id: OrganizationId,
    multisig_id: MultisigId,
) -> Result<Multisig> {
    let filter =
        MultisigFilter::builder().organization_id(organization_id).ids(vec![multisig_id]).build();

    store
        .list_multisigs(&filter)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::not_found(format!("multisig {multisig_id} not found")))
}
