use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Dissolve, Deserialize)]
pub struct CreateTransactionRequestPayload {
    id: Option<Uuid>,

    #[serde(default)]
    description: String,

    amount: Decimal,
    to: String,

    #[serde(default)]
    max_fee_allowed: Decimal,

    deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Dissolve, Deserialize)]
#[serde(default)]
pub struct ListTransactionsRequestPayload {
    ids: Vec<Uuid>,
    created_by: Option<Uuid>,
    to: Option<String>,
    pending: bool,
    confirmed: bool,
    cancelled: bool,
    committed: bool,
    expired: bool,
    cursor: Option<String>,
    limit: Option<u32>,
}

#[derive(Debug, Default, Dissolve, Deserialize)]
#[serde(default)]
pub struct UpdateTransactionStatusRequestPayload {
    confirm: bool,
    cancel: bool,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct NewMultisigRequestPayload {
    title: String,
    owners: Vec<MultisigOwnerPayload>,
    confirmations: u32,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct MultisigOwnerPayload {
    public_key: String,
}

#[derive(Debug, Default, Dissolve, Deserialize)]
#[serde(default)]
pub struct ListMultisigsRequestPayload {
    ids: Vec<Uuid>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct PayrollDeployRequestPayload {
    multisig_id: Uuid,
    first_admin: Uuid,
    title: String,
}

#[derive(Debug, Default, Dissolve, Deserialize)]
#[serde(default)]
pub struct ListPayrollsRequestPayload {
    ids: Vec<Uuid>,
    multisig_id: Option<Uuid>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct SetSalaryRequestPayload {
    payroll_id: Uuid,
    employee_id: Uuid,
    salary: u64,
}
