use block_accounting_domain::multisig::QuorumStatus;
use bon::Builder;
use serde::Serialize;
use uuid::Uuid;

use crate::payload::{MultisigPayload, PayrollPayload, TransactionPayload};

#[derive(Debug, Builder, Serialize)]
pub struct TransactionResponsePayload {
    transaction: TransactionPayload,
}

#[derive(Debug, Builder, Serialize)]
pub struct ListTransactionsResponsePayload {
    items: Vec<TransactionPayload>,
    pagination: PaginationPayload,
}

#[derive(Debug, Builder, Serialize)]
pub struct PaginationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

#[derive(Debug, Builder, Serialize)]
pub struct DeploymentTicketResponsePayload {
    job_id: Uuid,
}

#[derive(Debug, Builder, Serialize)]
pub struct ListMultisigsResponsePayload {
    multisigs: Vec<MultisigPayload>,
}

#[derive(Debug, Builder, Serialize)]
pub struct QuorumResponsePayload {
    multisig_id: Uuid,
    quorum: QuorumStatus,
    reached: bool,
}

#[derive(Debug, Builder, Serialize)]
pub struct ListPayrollsResponsePayload {
    payrolls: Vec<PayrollPayload>,
}

#[derive(Debug, Builder, Serialize)]
pub struct PubKeyResponsePayload {
    public_key: String,
}
