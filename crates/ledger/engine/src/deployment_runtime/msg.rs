use core::num::NonZeroU32;

use block_accounting_chain_client::SetSalaryCall;
use block_accounting_domain::{MultisigId, OrganizationId, ParticipantId, PayrollId};
use bon::Builder;
use dissolve_derive::Dissolve;
use tokio::time::Instant;

use crate::jobs::{JobId, JobKind};

/// Work item consumed by the deployment workers.
///
/// Messages only own request-independent values, so a job outlives the request that queued it.
#[derive(Debug)]
pub enum DeploymentMsg {
    DeployMultisig(DeployMultisig),
    DeployPayroll(DeployPayroll),
    SetSalary(SetSalary),
}

impl DeploymentMsg {
    pub fn job_id(&self) -> JobId {
        match self {
            Self::DeployMultisig(msg) => msg.job_id(),
            Self::DeployPayroll(msg) => msg.job_id(),
            Self::SetSalary(msg) => msg.job_id(),
        }
    }

    /// When the request queued the job. Deadlines and stall thresholds count from here.
    pub fn submitted_at(&self) -> Instant {
        match self {
            Self::DeployMultisig(msg) => msg.submitted_at,
            Self::DeployPayroll(msg) => msg.submitted_at,
            Self::SetSalary(msg) => msg.submitted_at,
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Self::DeployMultisig(_) => JobKind::MultisigDeployment,
            Self::DeployPayroll(_) => JobKind::PayrollDeployment,
            Self::SetSalary(_) => JobKind::SetSalary,
        }
    }
}

#[derive(Debug, Builder, Dissolve)]
pub struct DeployMultisig {
    job_id: JobId,
    submitted_at: Instant,
    organization_id: OrganizationId,
    seed: Vec<u8>,
    title: String,
    owner_ids: Vec<ParticipantId>,
    owner_keys: Vec<Vec<u8>>,
    confirmations: NonZeroU32,
}

#[derive(Debug, Builder, Dissolve)]
pub struct DeployPayroll {
    job_id: JobId,
    submitted_at: Instant,
    organization_id: OrganizationId,
    seed: Vec<u8>,
    title: String,
    multisig_id: MultisigId,
    multisig_address: Vec<u8>,
}

#[derive(Debug, Builder, Dissolve)]
pub struct SetSalary {
    job_id: JobId,
    submitted_at: Instant,
    organization_id: OrganizationId,
    seed: Vec<u8>,
    payroll_id: PayrollId,
    call: SetSalaryCall,
}

impl DeployMultisig {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }
}

impl DeployPayroll {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }
}

impl SetSalary {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }
}
