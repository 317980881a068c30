//! Runtime executing detached chain jobs.
//!
//! Deployment and set-salary requests return as soon as their job is queued. A fixed pool of
//! worker tasks drains the queue, calls the chain service and persists the outcome. Jobs
//! never inherit the cancellation of the request that queued them.
//!
//! ## Architecture
//!
//! ```text
//!  Request path                         Worker pool (N tasks)
//! ┌──────────────────────────┐         ┌──────────────────────────────────┐
//! │ DeploymentOrchestrator   │         │ worker                           │
//! │                          │         │                                  │
//! │ mpsc::Sender (bounded) ──┼─────────┼─> Arc<Mutex<mpsc::Receiver>>     │
//! │                          │         │                                  │
//! │ JobRegistry::get <───────┼─────────┼── JobRegistry::finish            │
//! └──────────────────────────┘         └──────────────────────────────────┘
//! ```
//!
//! 1. The orchestrator registers a job and `try_send`s a [`DeploymentMsg`]. A full queue is
//!    reported to the caller instead of spawning more work.
//! 2. A worker takes the message, marks the job running and races it against its timeout
//!    and stall threshold. Both count from the moment the request queued the job, so time
//!    spent waiting for a worker is included.
//! 3. Crossing the stall threshold only logs a warning and flags the job. Crossing the
//!    timeout abandons the job. A job whose deadline passed in the queue never reaches the
//!    chain service.
//! 4. Failures are logged and recorded in the [`JobRegistry`]; nothing is retried.
//! 5. Finished jobs are forgotten once they are older than the retention window.
//!
//! Closing the queue stops the workers once every queued message has been processed.
//!
//! [`JobRegistry`]: crate::jobs::JobRegistry

pub mod msg;

mod error;

pub use self::error::DeploymentRuntimeError;

use core::{future::Future, num::NonZeroUsize, time::Duration};

use std::sync::Arc;

use block_accounting_chain_client::ChainClient;
use block_accounting_domain::{
    MultisigId, PayrollId, Timestamps,
    multisig::{Multisig, Payroll},
};
use block_accounting_store::LedgerStore;
use bon::Builder;
use chrono::Utc;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
    time::{self, Instant},
};

use self::{
    error::Result,
    msg::{
        DeployMultisig, DeployMultisigDissolved, DeployPayroll, DeployPayrollDissolved,
        DeploymentMsg, SetSalary, SetSalaryDissolved,
    },
};
use crate::jobs::{JobId, JobKind, JobRegistry, JobState};

/// Deadline and stall threshold of one kind of job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct TaskLimits {
    /// The job is abandoned after this long.
    timeout: Duration,

    /// A warning is logged when the job is still running after this long.
    stall_after: Duration,
}

impl TaskLimits {
    /// Limits of a multisig deployment.
    pub const MULTISIG: Self = Self {
        timeout: Duration::from_secs(15 * 60),
        stall_after: Duration::from_secs(60),
    };

    /// Limits of a payroll contract deployment.
    pub const PAYROLL: Self = Self {
        timeout: Duration::from_secs(20 * 60),
        stall_after: Duration::from_secs(2 * 60),
    };

    /// Limits of a set-salary call.
    pub const SET_SALARY: Self = Self {
        timeout: Duration::from_secs(5 * 60),
        stall_after: Duration::from_secs(60),
    };

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn stall_after(&self) -> Duration {
        self.stall_after
    }
}

/// Configuration of the deployment runtime.
#[derive(Debug, Clone, Builder)]
pub struct DeploymentRuntimeConfig {
    /// Number of worker tasks.
    #[builder(default = DeploymentRuntimeConfig::DEFAULT_WORKERS)]
    workers: NonZeroUsize,

    /// Number of jobs that may wait for a worker before requests are turned away.
    #[builder(default = DeploymentRuntimeConfig::DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: NonZeroUsize,

    /// How long a finished job stays visible in the registry.
    #[builder(default = DeploymentRuntimeConfig::DEFAULT_JOB_RETENTION)]
    job_retention: Duration,

    #[builder(default = TaskLimits::MULTISIG)]
    multisig: TaskLimits,

    #[builder(default = TaskLimits::PAYROLL)]
    payroll: TaskLimits,

    #[builder(default = TaskLimits::SET_SALARY)]
    set_salary: TaskLimits,
}

impl Default for DeploymentRuntimeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DeploymentRuntimeConfig {
    const DEFAULT_WORKERS: NonZeroUsize = NonZeroUsize::new(4).unwrap();
    const DEFAULT_QUEUE_CAPACITY: NonZeroUsize = NonZeroUsize::new(64).unwrap();
    const DEFAULT_JOB_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

    pub fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    pub fn queue_capacity(&self) -> NonZeroUsize {
        self.queue_capacity
    }

    pub fn job_retention(&self) -> Duration {
        self.job_retention
    }

    /// Returns the limits applied to jobs of `kind`.
    pub fn limits(&self, kind: JobKind) -> TaskLimits {
        match kind {
            JobKind::MultisigDeployment => self.multisig,
            JobKind::PayrollDeployment => self.payroll,
            JobKind::SetSalary => self.set_salary,
        }
    }
}

/// Everything a worker needs to run a job.
pub(crate) struct WorkerContext {
    pub(crate) store: Arc<dyn LedgerStore>,
    pub(crate) chain: Arc<dyn ChainClient>,
    pub(crate) jobs: JobRegistry,
    pub(crate) config: DeploymentRuntimeConfig,
}

/// Spawns the worker pool on the current tokio runtime.
///
/// Workers exit once `receiver` is closed and drained.
#[tracing::instrument(skip_all, fields(workers = ctx.config.workers().get()))]
pub(crate) fn spawn_workers(
    receiver: mpsc::Receiver<DeploymentMsg>,
    ctx: Arc<WorkerContext>,
) -> Vec<JoinHandle<()>> {
    let receiver = Arc::new(Mutex::new(receiver));

    (0..ctx.config.workers().get())
        .map(|worker| tokio::spawn(run_worker(worker, receiver.clone(), ctx.clone())))
        .collect()
}

#[tracing::instrument(skip_all, fields(worker = worker))]
async fn run_worker(
    worker: usize,
    receiver: Arc<Mutex<mpsc::Receiver<DeploymentMsg>>>,
    ctx: Arc<WorkerContext>,
) {
    loop {
        let msg = receiver.lock().await.recv().await;

        let Some(msg) = msg else {
            break;
        };

        process(&ctx, msg).await;
    }

    tracing::info!(worker, "deployment queue closed, stopping worker");
}

async fn process(ctx: &WorkerContext, msg: DeploymentMsg) {
    let job_id = msg.job_id();
    let kind = msg.kind();
    let submitted_at = msg.submitted_at();
    let limits = ctx.config.limits(kind);

    if Instant::now() >= submitted_at + limits.timeout() {
        tracing::error!(%job_id, %kind, timeout = ?limits.timeout(), "job expired in the queue");
        ctx.jobs.mark_stalled(job_id).await;
        ctx.jobs.finish(job_id, JobState::TimedOut).await;
        ctx.jobs.evict_finished(ctx.config.job_retention()).await;
        return;
    }

    ctx.jobs.mark_running(job_id).await;

    let job = async {
        match msg {
            DeploymentMsg::DeployMultisig(msg) => handle_deploy_multisig(ctx, msg).await,
            DeploymentMsg::DeployPayroll(msg) => handle_deploy_payroll(ctx, msg).await,
            DeploymentMsg::SetSalary(msg) => handle_set_salary(ctx, msg).await,
        }
    };

    let state = watch(ctx, job_id, kind, submitted_at, job).await;

    ctx.jobs.finish(job_id, state).await;
    ctx.jobs.evict_finished(ctx.config.job_retention()).await;
}

/// Runs `job` under the limits of its kind and turns the outcome into a final job state.
///
/// The deadline and the stall threshold are measured from `submitted_at`.
async fn watch<F>(
    ctx: &WorkerContext,
    job_id: JobId,
    kind: JobKind,
    submitted_at: Instant,
    job: F,
) -> JobState
where
    F: Future<Output = Result<()>>,
{
    let limits = ctx.config.limits(kind);

    let job = time::timeout_at(submitted_at + limits.timeout(), job);
    tokio::pin!(job);

    let stall = time::sleep_until(submitted_at + limits.stall_after());
    tokio::pin!(stall);

    let mut stalled = false;

    let outcome = loop {
        tokio::select! {
            biased;

            () = &mut stall, if !stalled => {
                stalled = true;
                tracing::warn!(
                    %job_id,
                    %kind,
                    stall_after = ?limits.stall_after(),
                    "job is still running"
                );
                ctx.jobs.mark_stalled(job_id).await;
            },
            outcome = &mut job => break outcome,
        }
    };

    match outcome {
        Ok(Ok(())) => {
            tracing::info!(%job_id, %kind, "job succeeded");
            JobState::Succeeded
        },
        Ok(Err(e)) => {
            tracing::error!(%job_id, %kind, "job failed: {e}");
            JobState::Failed { reason: e.to_string() }
        },
        Err(_) => {
            tracing::error!(%job_id, %kind, timeout = ?limits.timeout(), "job timed out");
            JobState::TimedOut
        },
    }
}

#[tracing::instrument(skip_all, fields(job_id = %msg.job_id()))]
async fn handle_deploy_multisig(ctx: &WorkerContext, msg: DeployMultisig) -> Result<()> {
    let DeployMultisigDissolved {
        organization_id,
        seed,
        title,
        owner_ids,
        owner_keys,
        confirmations,
        ..
    } = msg.dissolve();

    let address = ctx.chain.deploy_multisig(&seed, &owner_keys, confirmations.get()).await?;

    let multisig = Multisig::builder()
        .id(MultisigId::new_v7())
        .organization_id(organization_id)
        .title(title)
        .address(address)
        .owners(owner_ids)
        .confirmations_required(confirmations)
        .timestamps(Timestamps::created(Utc::now()))
        .build();

    ctx.store.add_multisig(&multisig).await?;

    tracing::info!(multisig_id = %multisig.id(), %organization_id, "multisig deployed");

    Ok(())
}

#[tracing::instrument(skip_all, fields(job_id = %msg.job_id()))]
async fn handle_deploy_payroll(ctx: &WorkerContext, msg: DeployPayroll) -> Result<()> {
    let DeployPayrollDissolved {
        organization_id,
        seed,
        title,
        multisig_id,
        multisig_address,
        ..
    } = msg.dissolve();

    let address = ctx.chain.deploy_payroll_contract(&seed, &multisig_address).await?;

    let payroll = Payroll::builder()
        .id(PayrollId::new_v7())
        .title(title)
        .address(address)
        .organization_id(organization_id)
        .multisig_id(multisig_id)
        .timestamps(Timestamps::created(Utc::now()))
        .build();

    ctx.store.add_payroll(&payroll).await?;

    tracing::info!(payroll_id = %payroll.id(), %multisig_id, "payroll contract deployed");

    Ok(())
}

#[tracing::instrument(skip_all, fields(job_id = %msg.job_id()))]
async fn handle_set_salary(ctx: &WorkerContext, msg: SetSalary) -> Result<()> {
    let SetSalaryDissolved { organization_id, seed, payroll_id, call, .. } = msg.dissolve();

    ctx.chain.set_salary(&seed, &call).await?;

    tracing::info!(%organization_id, %payroll_id, salary = call.salary(), "salary set");

    Ok(())
}
