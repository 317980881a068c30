//! Process-local bookkeeping of background jobs.
//!
//! Every deployment or set-salary request is registered here before it is queued. Workers
//! move the job through `Queued -> Running -> {Succeeded, Failed, TimedOut}` and the stall
//! watchdog raises the `stalled` flag. Callers poll the registry to learn the outcome.
//! Finished jobs are evicted once they outlive the retention window of the runtime.

use core::{fmt, time::Duration};

use std::{collections::HashMap, sync::Arc};

use block_accounting_domain::OrganizationId;
use chrono::{DateTime, Utc};
use strum::{Display, IntoStaticStr};
use tokio::{sync::RwLock, time::Instant};
use uuid::Uuid;

/// Identifier of a background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a new time-sortable id.
    pub fn new_v7() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the inner uuid.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for JobId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What a job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum JobKind {
    MultisigDeployment,
    PayrollDeployment,
    SetSalary,
}

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum JobState {
    /// Accepted and waiting for a worker.
    Queued,
    /// Picked up by a worker.
    Running,
    /// Finished and, for deployments, persisted.
    Succeeded,
    /// Finished with an error. Nothing was persisted.
    Failed {
        /// Human readable failure cause.
        reason: String,
    },
    /// Did not finish before its deadline.
    TimedOut,
}

impl JobState {
    /// Whether the job will not change state anymore.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. } | Self::TimedOut)
    }
}

/// Snapshot of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    job_id: JobId,
    kind: JobKind,
    organization_id: OrganizationId,
    state: JobState,
    stalled: bool,
    submitted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    finished_at: Option<Instant>,
}

impl JobStatus {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Whether the job ran past its stall threshold.
    pub fn stalled(&self) -> bool {
        self.stalled
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Shared registry of job statuses. Clones share the same jobs.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, JobStatus>>>,
}

impl JobRegistry {
    /// Registers a new queued job and returns its id.
    pub async fn register(&self, kind: JobKind, organization_id: OrganizationId) -> JobId {
        let job_id = JobId::new_v7();
        let now = Utc::now();

        let status = JobStatus {
            job_id,
            kind,
            organization_id,
            state: JobState::Queued,
            stalled: false,
            submitted_at: now,
            updated_at: now,
            finished_at: None,
        };

        self.jobs.write().await.insert(job_id, status);
        job_id
    }

    /// Returns the status of a job.
    pub async fn get(&self, job_id: JobId) -> Option<JobStatus> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    /// Forgets a job that never made it into the queue.
    pub(crate) async fn discard(&self, job_id: JobId) {
        self.jobs.write().await.remove(&job_id);
    }

    pub(crate) async fn mark_running(&self, job_id: JobId) {
        self.update(job_id, |status| status.state = JobState::Running).await;
    }

    pub(crate) async fn mark_stalled(&self, job_id: JobId) {
        self.update(job_id, |status| status.stalled = true).await;
    }

    pub(crate) async fn finish(&self, job_id: JobId, state: JobState) {
        self.update(job_id, |status| {
            status.state = state;
            status.finished_at = Some(Instant::now());
        })
        .await;
    }

    /// Forgets the jobs that finished more than `retention` ago.
    pub(crate) async fn evict_finished(&self, retention: Duration) {
        let now = Instant::now();
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();

        jobs.retain(|_, status| {
            status.finished_at.is_none_or(|finished_at| now.duration_since(finished_at) < retention)
        });

        let evicted = before - jobs.len();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted finished jobs");
        }
    }

    async fn update<F>(&self, job_id: JobId, update: F)
    where
        F: FnOnce(&mut JobStatus),
    {
        match self.jobs.write().await.get_mut(&job_id) {
            Some(status) => {
                update(status);
                status.updated_at = Utc::now();
            },
            None => tracing::warn!(%job_id, "update of unknown job"),
        }
    }
}
