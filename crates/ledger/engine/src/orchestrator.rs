//! Asynchronous provisioning of multisig wallets and payroll contracts.
//!
//! Requests are validated and authorized on the request path. The chain calls run later on
//! the deployment runtime; the caller only receives a [`DeploymentTicket`] to poll.

use core::num::NonZeroU32;

use std::sync::Arc;

use block_accounting_chain_client::{ChainClient, SetSalaryCall};
use block_accounting_domain::{
    OrganizationId,
    multisig::{Multisig, Payroll},
    participant::{OrganizationParticipant, User},
};
use block_accounting_store::{
    LedgerStore, MultisigFilter, ParticipantFilter, PayrollFilter,
};
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
    time::Instant,
};

use crate::{
    deployment_runtime::{
        self, DeploymentRuntimeConfig, WorkerContext,
        msg::{DeployMultisig, DeployPayroll, DeploymentMsg, SetSalary},
    },
    directory::{ParticipantDirectory, Role},
    error::{EngineError, Result},
    find_multisig,
    jobs::{JobId, JobKind, JobRegistry, JobStatus},
    types::{
        request::{
            ListMultisigsRequest, ListMultisigsRequestDissolved, ListPayrollsRequest,
            ListPayrollsRequestDissolved, NewMultisigRequest, NewMultisigRequestDissolved,
            PayrollDeployRequest, PayrollDeployRequestDissolved, SetSalaryRequest,
            SetSalaryRequestDissolved,
        },
        response::DeploymentTicket,
    },
};

pub struct DeploymentOrchestrator<R> {
    store: Arc<dyn LedgerStore>,
    chain: Arc<dyn ChainClient>,
    directory: ParticipantDirectory,
    jobs: JobRegistry,
    runtime: R,
}

/// The deployment runtime is not running; no job can be queued.
pub struct Stopped;

/// The deployment runtime is running.
pub struct Started {
    sender: mpsc::Sender<DeploymentMsg>,
    workers: Vec<JoinHandle<()>>,
}

impl<R> DeploymentOrchestrator<R> {
    /// Returns the registry of queued, running and finished jobs.
    pub fn jobs(&self) -> &JobRegistry {
        &self.jobs
    }

    /// Resolves the public key derived from the caller's credentials.
    ///
    /// Runs on the request path, so chain errors reach the caller.
    #[tracing::instrument(skip_all, fields(caller = %caller.id()))]
    pub async fn pub_key(&self, caller: &User) -> Result<Vec<u8>> {
        let seed_phrase = caller.mnemonic().unwrap_or_default();

        self.chain.address_from_seed(caller.seed(), seed_phrase).await.map_err(From::from)
    }

    /// Lists the multisigs of the organization. Multisigs appear once deployed.
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id))]
    pub async fn list_multisigs(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        request: ListMultisigsRequest,
    ) -> Result<Vec<Multisig>> {
        self.directory.authorize(caller, organization_id, Role::Member).await?;

        let ListMultisigsRequestDissolved { ids } = request.dissolve();

        let filter = MultisigFilter::builder().organization_id(organization_id).ids(ids).build();

        self.store.list_multisigs(&filter).await.map_err(From::from)
    }

    /// Lists the payroll contracts of the organization.
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id))]
    pub async fn list_payrolls(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        request: ListPayrollsRequest,
    ) -> Result<Vec<Payroll>> {
        self.directory.authorize(caller, organization_id, Role::Member).await?;

        let ListPayrollsRequestDissolved { ids, multisig_id } = request.dissolve();

        let filter = PayrollFilter::builder()
            .organization_id(organization_id)
            .ids(ids)
            .maybe_multisig_id(multisig_id)
            .build();

        self.store.list_payrolls(&filter).await.map_err(From::from)
    }

    /// Returns the status of a job queued for the organization.
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id, %job_id))]
    pub async fn job_status(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        job_id: JobId,
    ) -> Result<JobStatus> {
        self.directory.authorize(caller, organization_id, Role::Member).await?;

        self.jobs
            .get(job_id)
            .await
            .filter(|status| status.organization_id() == organization_id)
            .ok_or_else(|| EngineError::not_found(format!("job {job_id} not found")))
    }
}

impl DeploymentOrchestrator<Stopped> {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        chain: Arc<dyn ChainClient>,
        directory: ParticipantDirectory,
    ) -> Self {
        Self {
            store,
            chain,
            directory,
            jobs: JobRegistry::default(),
            runtime: Stopped,
        }
    }

    /// Spawns the worker pool on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// If called outside of a tokio runtime.
    pub fn start_deployment_runtime(
        self,
        config: DeploymentRuntimeConfig,
    ) -> DeploymentOrchestrator<Started> {
        let (sender, receiver) = mpsc::channel(config.queue_capacity().get());

        let ctx = WorkerContext {
            store: self.store.clone(),
            chain: self.chain.clone(),
            jobs: self.jobs.clone(),
            config,
        };

        let workers = deployment_runtime::spawn_workers(receiver, Arc::new(ctx));

        DeploymentOrchestrator {
            store: self.store,
            chain: self.chain,
            directory: self.directory,
            jobs: self.jobs,
            runtime: Started { sender, workers },
        }
    }
}

impl DeploymentOrchestrator<Started> {
    /// Queues the deployment of a new multisig wallet.
    ///
    /// Every owner key must resolve to an active user participant of the organization, which
    /// is checked before anything is queued. Zero required confirmations are raised to one.
    /// Chain or store failures of the deployment itself are only visible through the job.
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id))]
    pub async fn new_multisig(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        request: NewMultisigRequest,
    ) -> Result<DeploymentTicket> {
        self.directory.authorize(caller, organization_id, Role::AdminOrOwner).await?;

        let NewMultisigRequestDissolved { title, owners, confirmations } = request.dissolve();

        let filter = ParticipantFilter::builder()
            .organization_id(organization_id)
            .public_keys(owners.clone())
            .users_only(true)
            .active_only(true)
            .build();

        let participants = match self.directory.find(&filter).await {
            Ok(participants) => participants,
            Err(EngineError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let owner_ids = owners
            .iter()
            .enumerate()
            .map(|(index, key)| {
                participants
                    .iter()
                    .find(|p| p.public_key() == Some(key.as_slice()))
                    .map(OrganizationParticipant::id)
                    .ok_or_else(|| {
                        EngineError::invalid_owner_set(format!(
                            "owner #{index} is not an active user participant with that public key"
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let confirmations = NonZeroU32::new(confirmations).unwrap_or(NonZeroU32::MIN);
        let seed = caller.seed().to_vec();

        self.enqueue(JobKind::MultisigDeployment, organization_id, |job_id, submitted_at| {
            let msg = DeployMultisig::builder()
                .job_id(job_id)
                .submitted_at(submitted_at)
                .organization_id(organization_id)
                .seed(seed)
                .title(title)
                .owner_ids(owner_ids)
                .owner_keys(owners)
                .confirmations(confirmations)
                .build();

            DeploymentMsg::DeployMultisig(msg)
        })
        .await
    }

    /// Queues the deployment of a payroll contract controlled by an existing multisig.
    ///
    /// The caller must be the named first admin and the multisig must already carry an
    /// on-chain address.
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id))]
    pub async fn payroll_deploy(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        request: PayrollDeployRequest,
    ) -> Result<DeploymentTicket> {
        let PayrollDeployRequestDissolved { multisig_id, first_admin, title } = request.dissolve();

        if caller.id() != first_admin {
            return Err(EngineError::unauthorized("caller is not the first admin"));
        }

        self.directory.authorize(caller, organization_id, Role::AdminOrOwner).await?;

        let multisig = find_multisig(self.store.as_ref(), organization_id, multisig_id).await?;

        if !multisig.has_address() {
            return Err(EngineError::empty_address(format!(
                "multisig {multisig_id} is not deployed yet"
            )));
        }

        let seed = caller.seed().to_vec();
        let multisig_address = multisig.address().to_vec();

        self.enqueue(JobKind::PayrollDeployment, organization_id, |job_id, submitted_at| {
            let msg = DeployPayroll::builder()
                .job_id(job_id)
                .submitted_at(submitted_at)
                .organization_id(organization_id)
                .seed(seed)
                .title(title)
                .multisig_id(multisig_id)
                .multisig_address(multisig_address)
                .build();

            DeploymentMsg::DeployPayroll(msg)
        })
        .await
    }

    /// Queues a set-salary call for an employee of the organization.
    ///
    /// The outcome is logged and recorded on the job only.
    #[tracing::instrument(skip_all, fields(caller = %caller.id(), %organization_id))]
    pub async fn set_salary(
        &self,
        caller: &User,
        organization_id: OrganizationId,
        request: SetSalaryRequest,
    ) -> Result<DeploymentTicket> {
        self.directory.authorize(caller, organization_id, Role::AdminOrOwner).await?;

        let SetSalaryRequestDissolved { payroll_id, employee_id, salary } = request.dissolve();

        let payroll = self
            .store
            .list_payrolls(
                &PayrollFilter::builder()
                    .organization_id(organization_id)
                    .ids(vec![payroll_id])
                    .build(),
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::not_found(format!("payroll {payroll_id} not found")))?;

        let multisig =
            find_multisig(self.store.as_ref(), organization_id, payroll.multisig_id()).await?;

        let employee = self
            .directory
            .find(
                &ParticipantFilter::builder()
                    .organization_id(organization_id)
                    .ids(vec![employee_id])
                    .employees_only(true)
                    .active_only(true)
                    .build(),
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::not_found(format!("employee {employee_id} not found")))?;

        let employee_address = employee
            .wallet_address()
            .filter(|address| !address.is_empty())
            .ok_or_else(|| {
                EngineError::empty_address(format!("employee {employee_id} has no wallet address"))
            })?;

        let call = SetSalaryCall::builder()
            .multisig_address(multisig.address().to_vec())
            .contract_address(payroll.address().to_vec())
            .employee_address(employee_address.to_vec())
            .salary(salary)
            .build();

        let seed = caller.seed().to_vec();

        self.enqueue(JobKind::SetSalary, organization_id, |job_id, submitted_at| {
            let msg = SetSalary::builder()
                .job_id(job_id)
                .submitted_at(submitted_at)
                .organization_id(organization_id)
                .seed(seed)
                .payroll_id(payroll_id)
                .call(call)
                .build();

            DeploymentMsg::SetSalary(msg)
        })
        .await
    }

    /// Closes the queue and waits for the workers to drain it.
    pub async fn stop_deployment_runtime(self) -> Result<DeploymentOrchestrator<Stopped>> {
        let Started { sender, workers } = self.runtime;
        drop(sender);

        for worker in workers {
            worker
                .await
                .map_err(|e| EngineError::other(format!("deployment worker misbehavior: {e}")))?;
        }

        let orchestrator = DeploymentOrchestrator {
            store: self.store,
            chain: self.chain,
            directory: self.directory,
            jobs: self.jobs,
            runtime: Stopped,
        };

        Ok(orchestrator)
    }

    async fn enqueue<F>(
        &self,
        kind: JobKind,
        organization_id: OrganizationId,
        make_msg: F,
    ) -> Result<DeploymentTicket>
    where
        F: FnOnce(JobId, Instant) -> DeploymentMsg,
    {
        let job_id = self.jobs.register(kind, organization_id).await;

        match self.runtime.sender.try_send(make_msg(job_id, Instant::now())) {
            Ok(()) => {
                tracing::info!(%job_id, %kind, "job queued");
                Ok(DeploymentTicket::builder().job_id(job_id).build())
            },
            Err(TrySendError::Full(_)) => {
                self.jobs.discard(job_id).await;
                tracing::warn!(%kind, "deployment queue is full");
                Err(EngineError::QueueFull)
            },
            Err(TrySendError::Closed(_)) => {
                self.jobs.discard(job_id).await;
                Err(EngineError::mpsc_sender("deployment runtime is stopped"))
            },
        }
    }
}
