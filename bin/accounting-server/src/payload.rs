pub mod request;
pub mod response;

use core::num::NonZeroU32;

use block_accounting_domain::{
    multisig::{Multisig, Payroll},
    tx::{Transaction, TransactionDissolved, TransactionStatus},
};
use block_accounting_engine::{JobKind, JobState, JobStatus};
use bon::Builder;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_with::DisplayFromStr;
use uuid::Uuid;

#[serde_with::serde_as]
#[derive(Debug, Builder, Serialize)]
pub struct TransactionPayload {
    id: Uuid,
    description: String,
    organization_id: Uuid,
    created_by: Uuid,
    amount: Decimal,
    to: String,
    max_fee_allowed: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    deadline: Option<DateTime<Utc>>,

    #[serde_as(as = "DisplayFromStr")]
    status: TransactionStatus,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    confirmed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    cancelled_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    committed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Builder, Serialize)]
pub struct MultisigPayload {
    id: Uuid,
    title: String,
    address: String,
    owners: Vec<Uuid>,
    confirmations_required: NonZeroU32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Builder, Serialize)]
pub struct PayrollPayload {
    id: Uuid,
    title: String,
    address: String,
    multisig_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[serde_with::serde_as]
#[derive(Debug, Builder, Serialize)]
pub struct JobPayload {
    job_id: Uuid,

    #[serde_as(as = "DisplayFromStr")]
    kind: JobKind,

    state: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,

    stalled: bool,
    submitted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub fn encode_address(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

impl From<Transaction> for TransactionPayload {
    fn from(tx: Transaction) -> Self {
        let status = tx.status();

        let TransactionDissolved {
            id,
            description,
            organization_id,
            created_by,
            amount,
            to_addr,
            max_fee_allowed,
            deadline,
            timestamps,
            confirmed_at,
            cancelled_at,
            committed_at,
        } = tx.dissolve();

        Self::builder()
            .id(id.into())
            .description(description)
            .organization_id(organization_id.into())
            .created_by(created_by.into())
            .amount(amount)
            .to(encode_address(&to_addr))
            .max_fee_allowed(max_fee_allowed)
            .maybe_deadline(deadline)
            .status(status)
            .created_at(timestamps.created_at())
            .updated_at(timestamps.updated_at())
            .maybe_confirmed_at(confirmed_at)
            .maybe_cancelled_at(cancelled_at)
            .maybe_committed_at(committed_at)
            .build()
    }
}

impl From<Multisig> for MultisigPayload {
    fn from(multisig: Multisig) -> Self {
        Self::builder()
            .id(multisig.id().into())
            .title(multisig.title().to_owned())
            .address(encode_address(multisig.address()))
            .owners(multisig.owners().iter().map(From::from).collect())
            .confirmations_required(multisig.confirmations_required())
            .created_at(multisig.timestamps().created_at())
            .updated_at(multisig.timestamps().updated_at())
            .build()
    }
}

impl From<Payroll> for PayrollPayload {
    fn from(payroll: Payroll) -> Self {
        Self::builder()
            .id(payroll.id().into())
            .title(payroll.title().to_owned())
            .address(encode_address(payroll.address()))
            .multisig_id(payroll.multisig_id().into())
            .created_at(payroll.timestamps().created_at())
            .updated_at(payroll.timestamps().updated_at())
            .build()
    }
}

impl From<JobStatus> for JobPayload {
    fn from(status: JobStatus) -> Self {
        let reason = match status.state() {
            JobState::Failed { reason } => Some(reason.clone()),
            _ => None,
        };

        Self::builder()
            .job_id(status.job_id().as_uuid())
            .kind(status.kind())
            .state(status.state().into())
            .maybe_reason(reason)
            .stalled(status.stalled())
            .submitted_at(status.submitted_at())
            .updated_at(status.updated_at())
            .build()
    }
}
