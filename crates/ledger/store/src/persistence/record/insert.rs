use bon::Builder;
use chrono::{DateTime, Utc};
use diesel::prelude::Insertable;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::persistence::schema;

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::transactions)]
pub struct NewTransactionRecord<'a> {
    id: Uuid,
    description: &'a str,
    organization_id: Uuid,
    created_by: Uuid,
    amount: Decimal,
    to_addr: &'a [u8],
    max_fee_allowed: Decimal,
    deadline: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::multisigs)]
pub struct NewMultisigRecord<'a> {
    id: Uuid,
    organization_id: Uuid,
    title: &'a str,
    address: &'a [u8],
    confirmations_required: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::multisig_owners)]
pub struct NewMultisigOwnerRecord {
    multisig_id: Uuid,
    owner_id: Uuid,
    owner_index: i32,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::multisig_confirmations)]
pub struct NewMultisigConfirmationRecord {
    multisig_id: Uuid,
    owner_id: Uuid,
    organization_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::payrolls)]
pub struct NewPayrollRecord<'a> {
    id: Uuid,
    title: &'a str,
    address: &'a [u8],
    organization_id: Uuid,
    multisig_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::users)]
pub struct NewUserRecord<'a> {
    id: Uuid,
    name: &'a str,
    seed: &'a [u8],
    public_key: &'a [u8],
    mnemonic: Option<&'a str>,
    activated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::organization_users)]
pub struct NewOrganizationUserRecord<'a> {
    organization_id: Uuid,
    user_id: Uuid,
    position: &'a str,
    is_admin: bool,
    is_owner: bool,
    added_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::employees)]
pub struct NewEmployeeRecord<'a> {
    id: Uuid,
    name: &'a str,
    user_id: Option<Uuid>,
    organization_id: Uuid,
    wallet_address: &'a [u8],
    position: &'a str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}
