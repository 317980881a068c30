use chrono::{DateTime, Utc};
use diesel::prelude::Queryable;
use dissolve_derive::Dissolve;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Dissolve, Queryable)]
pub struct TransactionRecord {
    id: Uuid,
    description: String,
    organization_id: Uuid,
    created_by: Uuid,
    amount: Decimal,
    to_addr: Vec<u8>,
    max_fee_allowed: Decimal,
    deadline: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    committed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Dissolve, Queryable)]
pub struct MultisigRecord {
    id: Uuid,
    organization_id: Uuid,
    title: String,
    address: Vec<u8>,
    confirmations_required: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MultisigRecord {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Dissolve, Queryable)]
pub struct MultisigOwnerRecord {
    multisig_id: Uuid,
    owner_id: Uuid,
    owner_index: i32,
}

#[derive(Debug, Dissolve, Queryable)]
pub struct MultisigConfirmationRecord {
    multisig_id: Uuid,
    owner_id: Uuid,
    organization_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Dissolve, Queryable)]
pub struct PayrollRecord {
    id: Uuid,
    title: String,
    address: Vec<u8>,
    organization_id: Uuid,
    multisig_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Dissolve, Queryable)]
pub struct OrganizationUserRecord {
    organization_id: Uuid,
    user_id: Uuid,
    position: String,
    is_admin: bool,
    is_owner: bool,
    added_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Dissolve, Queryable)]
pub struct UserRecord {
    id: Uuid,
    name: String,
    seed: Vec<u8>,
    public_key: Vec<u8>,
    mnemonic: Option<String>,
    activated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Dissolve, Queryable)]
pub struct EmployeeRecord {
    id: Uuid,
    name: String,
    user_id: Option<Uuid>,
    organization_id: Uuid,
    wallet_address: Vec<u8>,
    position: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}
