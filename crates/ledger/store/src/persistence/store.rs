use chrono::{DateTime, Utc};
use diesel::{BoolExpressionMethods, ExpressionMethods, OptionalExtension, QueryDsl, dsl};
use diesel_async::RunQueryDsl;
use futures::TryStreamExt;
use uuid::Uuid;

use crate::{ParticipantFilter, TransactionFilter, error::Result};

use super::{
    pool::DbConn,
    record::{
        insert::{
            NewEmployeeRecord, NewMultisigConfirmationRecord, NewMultisigOwnerRecord,
            NewMultisigRecord, NewOrganizationUserRecord, NewPayrollRecord, NewTransactionRecord,
            NewUserRecord,
        },
        select::{
            EmployeeRecord, MultisigConfirmationRecord, MultisigOwnerRecord, MultisigRecord,
            OrganizationUserRecord, PayrollRecord, TransactionRecord, UserRecord,
        },
    },
    schema,
};

pub async fn fetch_transactions(
    conn: &mut DbConn,
    filter: &TransactionFilter,
) -> Result<Vec<TransactionRecord>> {
    let mut query = schema::transactions::table
        .filter(schema::transactions::organization_id.eq(Uuid::from(filter.organization_id())))
        .into_boxed();

    if !filter.ids().is_empty() {
        let ids: Vec<Uuid> = filter.ids().iter().map(Uuid::from).collect();
        query = query.filter(schema::transactions::id.eq_any(ids));
    }

    if let Some(created_by) = filter.created_by() {
        query = query.filter(schema::transactions::created_by.eq(Uuid::from(created_by)));
    }

    if let Some(to_addr) = filter.to_addr() {
        query = query.filter(schema::transactions::to_addr.eq(to_addr.to_vec()));
    }

    if filter.pending() {
        query = query.filter(
            schema::transactions::confirmed_at
                .is_null()
                .and(schema::transactions::cancelled_at.is_null())
                .and(schema::transactions::committed_at.is_null()),
        );
    }

    if filter.confirmed() {
        query = query.filter(schema::transactions::confirmed_at.is_not_null());
    }

    if filter.cancelled() {
        query = query.filter(schema::transactions::cancelled_at.is_not_null());
    }

    if filter.committed() {
        query = query.filter(schema::transactions::committed_at.is_not_null());
    }

    if filter.expired() {
        query = query.filter(schema::transactions::deadline.le(Utc::now()));
    }

    if let Some(after) = filter.after() {
        query = query.filter(schema::transactions::id.gt(Uuid::from(after)));
    }

    if let Some(limit) = filter.limit() {
        query = query.limit(i64::from(limit));
    }

    query
        .order_by(schema::transactions::id.asc())
        .load_stream::<TransactionRecord>(conn)
        .await?
        .map_err(From::from)
        .try_collect()
        .await
}

pub async fn save_new_transaction(
    conn: &mut DbConn,
    new_tx: NewTransactionRecord<'_>,
) -> Result<()> {
    diesel::insert_into(schema::transactions::table).values(new_tx).execute(conn).await?;

    Ok(())
}

pub async fn update_confirmed_at(
    conn: &mut DbConn,
    tx_id: Uuid,
    organization_id: Uuid,
    at: DateTime<Utc>,
) -> Result<bool> {
    let affected = diesel::update(
        schema::transactions::table
            .filter(schema::transactions::id.eq(tx_id))
            .filter(schema::transactions::organization_id.eq(organization_id)),
    )
    .set((
        schema::transactions::confirmed_at.eq(Some(at)),
        schema::transactions::cancelled_at.eq(None::<DateTime<Utc>>),
        schema::transactions::updated_at.eq(at),
    ))
    .execute(conn)
    .await?;

    Ok(affected == 1)
}

pub async fn update_cancelled_at(
    conn: &mut DbConn,
    tx_id: Uuid,
    organization_id: Uuid,
    at: DateTime<Utc>,
) -> Result<bool> {
    let affected = diesel::update(
        schema::transactions::table
            .filter(schema::transactions::id.eq(tx_id))
            .filter(schema::transactions::organization_id.eq(organization_id)),
    )
    .set((
        schema::transactions::cancelled_at.eq(Some(at)),
        schema::transactions::confirmed_at.eq(None::<DateTime<Utc>>),
        schema::transactions::updated_at.eq(at),
    ))
    .execute(conn)
    .await?;

    Ok(affected == 1)
}

pub async fn save_new_multisig(
    conn: &mut DbConn,
    new_multisig: NewMultisigRecord<'_>,
) -> Result<()> {
    diesel::insert_into(schema::multisigs::table).values(new_multisig).execute(conn).await?;

    Ok(())
}

pub async fn save_new_multisig_owners(
    conn: &mut DbConn,
    new_owners: Vec<NewMultisigOwnerRecord>,
) -> Result<()> {
    diesel::insert_into(schema::multisig_owners::table).values(new_owners).execute(conn).await?;

    Ok(())
}

pub async fn fetch_multisigs(
    conn: &mut DbConn,
    organization_id: Uuid,
    ids: &[Uuid],
) -> Result<Vec<MultisigRecord>> {
    let mut query = schema::multisigs::table
        .filter(schema::multisigs::organization_id.eq(organization_id))
        .into_boxed();

    if !ids.is_empty() {
        query = query.filter(schema::multisigs::id.eq_any(ids.to_vec()));
    }

    query.order_by(schema::multisigs::id.asc()).load(conn).await.map_err(From::from)
}

pub async fn fetch_multisig_owners(
    conn: &mut DbConn,
    multisig_ids: &[Uuid],
) -> Result<Vec<MultisigOwnerRecord>> {
    schema::multisig_owners::table
        .filter(schema::multisig_owners::multisig_id.eq_any(multisig_ids.to_vec()))
        .order_by((
            schema::multisig_owners::multisig_id.asc(),
            schema::multisig_owners::owner_index.asc(),
        ))
        .load(conn)
        .await
        .map_err(From::from)
}

pub async fn multisig_exists(conn: &mut DbConn, multisig_id: Uuid) -> Result<bool> {
    diesel::select(dsl::exists(
        schema::multisigs::table.filter(schema::multisigs::id.eq(multisig_id)),
    ))
    .get_result(conn)
    .await
    .map_err(From::from)
}

pub async fn delete_multisig_confirmation(
    conn: &mut DbConn,
    multisig_id: Uuid,
    owner_id: Uuid,
) -> Result<()> {
    diesel::delete(
        schema::multisig_confirmations::table
            .filter(schema::multisig_confirmations::multisig_id.eq(multisig_id))
            .filter(schema::multisig_confirmations::owner_id.eq(owner_id)),
    )
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn save_new_multisig_confirmation(
    conn: &mut DbConn,
    new_confirmation: NewMultisigConfirmationRecord,
) -> Result<()> {
    diesel::insert_into(schema::multisig_confirmations::table)
        .values(new_confirmation)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn fetch_multisig_confirmations(
    conn: &mut DbConn,
    multisig_id: Uuid,
    organization_id: Uuid,
) -> Result<Vec<MultisigConfirmationRecord>> {
    schema::multisig_confirmations::table
        .filter(schema::multisig_confirmations::multisig_id.eq(multisig_id))
        .filter(schema::multisig_confirmations::organization_id.eq(organization_id))
        .order_by(schema::multisig_confirmations::owner_id.asc())
        .load(conn)
        .await
        .map_err(From::from)
}

pub async fn save_new_payroll(conn: &mut DbConn, new_payroll: NewPayrollRecord<'_>) -> Result<()> {
    diesel::insert_into(schema::payrolls::table).values(new_payroll).execute(conn).await?;

    Ok(())
}

pub async fn fetch_payrolls(
    conn: &mut DbConn,
    organization_id: Uuid,
    ids: &[Uuid],
    multisig_id: Option<Uuid>,
) -> Result<Vec<PayrollRecord>> {
    let mut query = schema::payrolls::table
        .filter(schema::payrolls::organization_id.eq(organization_id))
        .into_boxed();

    if !ids.is_empty() {
        query = query.filter(schema::payrolls::id.eq_any(ids.to_vec()));
    }

    if let Some(multisig_id) = multisig_id {
        query = query.filter(schema::payrolls::multisig_id.eq(multisig_id));
    }

    query.order_by(schema::payrolls::id.asc()).load(conn).await.map_err(From::from)
}

pub async fn fetch_organization_users(
    conn: &mut DbConn,
    filter: &ParticipantFilter,
) -> Result<Vec<(OrganizationUserRecord, UserRecord)>> {
    let mut query = schema::organization_users::table
        .inner_join(schema::users::table)
        .filter(
            schema::organization_users::organization_id.eq(Uuid::from(filter.organization_id())),
        )
        .select((schema::organization_users::all_columns, schema::users::all_columns))
        .into_boxed();

    if !filter.ids().is_empty() {
        let ids: Vec<Uuid> = filter.ids().iter().map(Uuid::from).collect();
        query = query.filter(schema::users::id.eq_any(ids));
    }

    if !filter.public_keys().is_empty() {
        query = query.filter(schema::users::public_key.eq_any(filter.public_keys().to_vec()));
    }

    if filter.active_only() {
        query = query.filter(
            schema::organization_users::deleted_at
                .is_null()
                .and(schema::users::activated_at.is_not_null()),
        );
    }

    if filter.owner_only() {
        query = query.filter(schema::organization_users::is_owner.eq(true));
    }

    query.order_by(schema::users::id.asc()).load(conn).await.map_err(From::from)
}

/// Loads employee records of an organization.
///
/// With `linked_users` set, loads the records linked to those users. Otherwise loads the
/// standalone employees (no linked user) narrowed by `ids` and `active_only`.
pub async fn fetch_employees(
    conn: &mut DbConn,
    organization_id: Uuid,
    ids: &[Uuid],
    linked_users: Option<&[Uuid]>,
    active_only: bool,
) -> Result<Vec<EmployeeRecord>> {
    let mut query = schema::employees::table
        .filter(schema::employees::organization_id.eq(organization_id))
        .into_boxed();

    query = match linked_users {
        Some(user_ids) => {
            let user_ids: Vec<Option<Uuid>> = user_ids.iter().copied().map(Some).collect();
            query.filter(schema::employees::user_id.eq_any(user_ids))
        },
        None => query.filter(schema::employees::user_id.is_null()),
    };

    if !ids.is_empty() {
        query = query.filter(schema::employees::id.eq_any(ids.to_vec()));
    }

    if active_only {
        query = query.filter(schema::employees::deleted_at.is_null());
    }

    query.order_by(schema::employees::id.asc()).load(conn).await.map_err(From::from)
}

pub async fn fetch_user(conn: &mut DbConn, user_id: Uuid) -> Result<Option<UserRecord>> {
    schema::users::table
        .filter(schema::users::id.eq(user_id))
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

pub async fn save_new_user(conn: &mut DbConn, new_user: NewUserRecord<'_>) -> Result<()> {
    diesel::insert_into(schema::users::table).values(new_user).execute(conn).await?;

    Ok(())
}

pub async fn save_new_organization_user(
    conn: &mut DbConn,
    new_org_user: NewOrganizationUserRecord<'_>,
) -> Result<()> {
    diesel::insert_into(schema::organization_users::table)
        .values(new_org_user)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn save_new_employee(
    conn: &mut DbConn,
    new_employee: NewEmployeeRecord<'_>,
) -> Result<()> {
    diesel::insert_into(schema::employees::table).values(new_employee).execute(conn).await?;

    Ok(())
}
