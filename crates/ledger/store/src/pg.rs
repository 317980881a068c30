use core::num::NonZeroU32;

use std::collections::HashMap;

use async_trait::async_trait;
use block_accounting_domain::{
    MultisigId, OrganizationId, ParticipantId, Timestamps, TransactionId,
    multisig::{Multisig, MultisigConfirmation, Payroll},
    participant::{Employee, OrganizationParticipant, OrganizationUser, User},
    tx::Transaction,
};
use chrono::{DateTime, Utc};
use diesel_async::AsyncConnection;
use uuid::Uuid;

use crate::{
    LedgerStore, MultisigFilter, ParticipantFilter, ParticipantStore, PayrollFilter,
    TransactionFilter,
    error::{Result, StoreError},
    persistence::{
        pool::{DbConn, DbPool},
        record::{
            insert::{
                NewEmployeeRecord, NewMultisigConfirmationRecord, NewMultisigOwnerRecord,
                NewMultisigRecord, NewOrganizationUserRecord, NewPayrollRecord,
                NewTransactionRecord, NewUserRecord,
            },
            select::{
                EmployeeRecord, EmployeeRecordDissolved, MultisigConfirmationRecord,
                MultisigConfirmationRecordDissolved, MultisigRecord, MultisigRecordDissolved,
                OrganizationUserRecord, OrganizationUserRecordDissolved, PayrollRecord,
                PayrollRecordDissolved, TransactionRecord, TransactionRecordDissolved, UserRecord,
                UserRecordDissolved,
            },
        },
        store,
    },
};

/// The PostgreSQL backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    /// Creates a new `PgStore` over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        PgStore { pool }
    }

    async fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().await.map_err(|e| StoreError::Pool(e.to_string().into()))
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    #[tracing::instrument(skip_all, fields(organization_id = %filter.organization_id()))]
    async fn get_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        store::fetch_transactions(&mut self.get_conn().await?, filter)
            .await?
            .into_iter()
            .map(make_transaction)
            .collect()
    }

    #[tracing::instrument(skip_all, fields(tx_id = %tx.id()))]
    async fn create_transaction(&self, tx: &Transaction) -> Result<()> {
        let new_tx = NewTransactionRecord::builder()
            .id(tx.id().into())
            .description(tx.description())
            .organization_id(tx.organization_id().into())
            .created_by(tx.created_by().into())
            .amount(tx.amount())
            .to_addr(tx.to_addr())
            .max_fee_allowed(tx.max_fee_allowed())
            .maybe_deadline(tx.deadline())
            .created_at(tx.timestamps().created_at())
            .updated_at(tx.timestamps().updated_at())
            .build();

        store::save_new_transaction(&mut self.get_conn().await?, new_tx).await
    }

    #[tracing::instrument(skip_all, fields(%tx_id, %organization_id))]
    async fn confirm_transaction(
        &self,
        tx_id: TransactionId,
        organization_id: OrganizationId,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        store::update_confirmed_at(
            &mut self.get_conn().await?,
            tx_id.into(),
            organization_id.into(),
            at,
        )
        .await
    }

    #[tracing::instrument(skip_all, fields(%tx_id, %organization_id))]
    async fn cancel_transaction(
        &self,
        tx_id: TransactionId,
        organization_id: OrganizationId,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        store::update_cancelled_at(
            &mut self.get_conn().await?,
            tx_id.into(),
            organization_id.into(),
            at,
        )
        .await
    }

    #[tracing::instrument(
        skip_all,
        fields(multisig_id = %multisig.id(), owner_count = multisig.owners().len()),
    )]
    async fn add_multisig(&self, multisig: &Multisig) -> Result<()> {
        self.get_conn()
            .await?
            .transaction(|conn| Box::pin(save_multisig_with_owners(conn, multisig)))
            .await
    }

    #[tracing::instrument(skip_all, fields(organization_id = %filter.organization_id()))]
    async fn list_multisigs(&self, filter: &MultisigFilter) -> Result<Vec<Multisig>> {
        let conn = &mut self.get_conn().await?;

        let ids: Vec<Uuid> = filter.ids().iter().map(Uuid::from).collect();
        let records = store::fetch_multisigs(conn, filter.organization_id().into(), &ids).await?;

        let multisig_ids: Vec<Uuid> = records.iter().map(MultisigRecord::id).collect();

        let mut owners: HashMap<Uuid, Vec<ParticipantId>> = HashMap::new();
        for owner in store::fetch_multisig_owners(conn, &multisig_ids).await? {
            let owner = owner.dissolve();
            owners.entry(owner.multisig_id).or_default().push(owner.owner_id.into());
        }

        records
            .into_iter()
            .map(|record| {
                let multisig_owners = owners.remove(&record.id()).unwrap_or_default();
                make_multisig(record, multisig_owners)
            })
            .collect()
    }

    #[tracing::instrument(
        skip_all,
        fields(multisig_id = %confirmation.multisig_id(), owner_id = %confirmation.owner_id()),
    )]
    async fn confirm_multisig(&self, confirmation: &MultisigConfirmation) -> Result<()> {
        self.get_conn()
            .await?
            .transaction(|conn| Box::pin(replace_multisig_confirmation(conn, confirmation)))
            .await
    }

    #[tracing::instrument(skip_all, fields(%multisig_id, %organization_id))]
    async fn list_multisig_confirmations(
        &self,
        multisig_id: MultisigId,
        organization_id: OrganizationId,
    ) -> Result<Vec<MultisigConfirmation>> {
        store::fetch_multisig_confirmations(
            &mut self.get_conn().await?,
            multisig_id.into(),
            organization_id.into(),
        )
        .await
        .map(|records| records.into_iter().map(make_multisig_confirmation).collect())
    }

    #[tracing::instrument(
        skip_all,
        fields(payroll_id = %payroll.id(), multisig_id = %payroll.multisig_id()),
    )]
    async fn add_payroll(&self, payroll: &Payroll) -> Result<()> {
        let new_payroll = NewPayrollRecord::builder()
            .id(payroll.id().into())
            .title(payroll.title())
            .address(payroll.address())
            .organization_id(payroll.organization_id().into())
            .multisig_id(payroll.multisig_id().into())
            .created_at(payroll.timestamps().created_at())
            .updated_at(payroll.timestamps().updated_at())
            .build();

        store::save_new_payroll(&mut self.get_conn().await?, new_payroll).await
    }

    #[tracing::instrument(skip_all, fields(organization_id = %filter.organization_id()))]
    async fn list_payrolls(&self, filter: &PayrollFilter) -> Result<Vec<Payroll>> {
        let ids: Vec<Uuid> = filter.ids().iter().map(Uuid::from).collect();

        store::fetch_payrolls(
            &mut self.get_conn().await?,
            filter.organization_id().into(),
            &ids,
            filter.multisig_id().map(Uuid::from),
        )
        .await
        .map(|records| records.into_iter().map(make_payroll).collect())
    }
}

#[async_trait]
impl ParticipantStore for PgStore {
    #[tracing::instrument(skip_all, fields(organization_id = %filter.organization_id()))]
    async fn participants(
        &self,
        filter: &ParticipantFilter,
    ) -> Result<Vec<OrganizationParticipant>> {
        let conn = &mut self.get_conn().await?;
        let organization_id = Uuid::from(filter.organization_id());

        let mut participants = Vec::new();

        if filter.includes_users() {
            let rows = store::fetch_organization_users(conn, filter).await?;

            let user_ids: Vec<Uuid> = rows.iter().map(|(_, user)| user.id()).collect();

            let mut linked: HashMap<Uuid, Employee> = HashMap::new();
            for record in
                store::fetch_employees(conn, organization_id, &[], Some(&user_ids), false).await?
            {
                let employee = make_employee(record);
                if let Some(user_id) = employee.user_id() {
                    linked.insert(user_id.into(), employee);
                }
            }

            for (org_user, user) in rows {
                let employee = linked.remove(&user.id());
                participants.push(make_organization_user(org_user, user, employee).into());
            }
        }

        if filter.includes_employees() {
            let ids: Vec<Uuid> = filter.ids().iter().map(Uuid::from).collect();

            let records =
                store::fetch_employees(conn, organization_id, &ids, None, filter.active_only())
                    .await?;

            participants.extend(records.into_iter().map(make_employee).map(From::from));
        }

        Ok(participants)
    }

    #[tracing::instrument(
        skip_all,
        fields(participant_id = %participant.id(), kind = %participant.kind()),
    )]
    async fn add_participant(&self, participant: &OrganizationParticipant) -> Result<()> {
        self.get_conn()
            .await?
            .transaction(|conn| Box::pin(save_participant(conn, participant)))
            .await
    }
}

async fn save_multisig_with_owners(conn: &mut DbConn, multisig: &Multisig) -> Result<()> {
    let confirmations_required = i32::try_from(multisig.confirmations_required().get())
        .map_err(|_| StoreError::invalid_value("confirmations required exceeds i32"))?;

    let new_multisig = NewMultisigRecord::builder()
        .id(multisig.id().into())
        .organization_id(multisig.organization_id().into())
        .title(multisig.title())
        .address(multisig.address())
        .confirmations_required(confirmations_required)
        .created_at(multisig.timestamps().created_at())
        .updated_at(multisig.timestamps().updated_at())
        .build();

    store::save_new_multisig(conn, new_multisig).await?;

    let new_owners = multisig
        .owners()
        .iter()
        .enumerate()
        .map(|(idx, owner_id)| {
            let owner_index = i32::try_from(idx)
                .map_err(|_| StoreError::invalid_value("too many multisig owners"))?;

            Ok(NewMultisigOwnerRecord::builder()
                .multisig_id(multisig.id().into())
                .owner_id(owner_id.into())
                .owner_index(owner_index)
                .build())
        })
        .collect::<Result<Vec<_>>>()?;

    if !new_owners.is_empty() {
        store::save_new_multisig_owners(conn, new_owners).await?;
    }

    Ok(())
}

async fn replace_multisig_confirmation(
    conn: &mut DbConn,
    confirmation: &MultisigConfirmation,
) -> Result<()> {
    let multisig_id = Uuid::from(confirmation.multisig_id());
    let owner_id = Uuid::from(confirmation.owner_id());

    if !store::multisig_exists(conn, multisig_id).await? {
        return Err(StoreError::not_found(format!("multisig {multisig_id} not found")));
    }

    store::delete_multisig_confirmation(conn, multisig_id, owner_id).await?;

    let new_confirmation = NewMultisigConfirmationRecord::builder()
        .multisig_id(multisig_id)
        .owner_id(owner_id)
        .organization_id(confirmation.organization_id().into())
        .created_at(confirmation.timestamps().created_at())
        .updated_at(confirmation.timestamps().updated_at())
        .build();

    store::save_new_multisig_confirmation(conn, new_confirmation).await
}

async fn save_participant(conn: &mut DbConn, participant: &OrganizationParticipant) -> Result<()> {
    match participant {
        OrganizationParticipant::User(org_user) => {
            let user = org_user.user();

            if store::fetch_user(conn, user.id().into()).await?.is_none() {
                let new_user = NewUserRecord::builder()
                    .id(user.id().into())
                    .name(user.name())
                    .seed(user.seed())
                    .public_key(user.public_key())
                    .maybe_mnemonic(user.mnemonic())
                    .maybe_activated_at(user.activated_at())
                    .created_at(user.timestamps().created_at())
                    .updated_at(user.timestamps().updated_at())
                    .build();

                store::save_new_user(conn, new_user).await?;
            }

            let new_org_user = NewOrganizationUserRecord::builder()
                .organization_id(org_user.organization_id().into())
                .user_id(user.id().into())
                .position(org_user.position())
                .is_admin(participant.is_admin())
                .is_owner(participant.is_owner())
                .added_at(participant.created_at())
                .updated_at(participant.updated_at())
                .maybe_deleted_at(participant.deleted_at())
                .build();

            store::save_new_organization_user(conn, new_org_user).await?;

            if let Some(employee) = org_user.employee() {
                save_employee(conn, employee).await?;
            }

            Ok(())
        },
        OrganizationParticipant::Employee(employee) => save_employee(conn, employee).await,
    }
}

async fn save_employee(conn: &mut DbConn, employee: &Employee) -> Result<()> {
    let new_employee = NewEmployeeRecord::builder()
        .id(employee.id().into())
        .name(employee.name())
        .maybe_user_id(employee.user_id().map(Uuid::from))
        .organization_id(employee.organization_id().into())
        .wallet_address(employee.wallet_address())
        .position(employee.position())
        .created_at(employee.timestamps().created_at())
        .updated_at(employee.timestamps().updated_at())
        .maybe_deleted_at(employee.deleted_at())
        .build();

    store::save_new_employee(conn, new_employee).await
}

fn make_transaction(record: TransactionRecord) -> Result<Transaction> {
    let TransactionRecordDissolved {
        id,
        description,
        organization_id,
        created_by,
        amount,
        to_addr,
        max_fee_allowed,
        deadline,
        created_at,
        updated_at,
        confirmed_at,
        cancelled_at,
        committed_at,
    } = record.dissolve();

    if confirmed_at.is_some() && cancelled_at.is_some() {
        return Err(StoreError::invalid_value(format!(
            "transaction {id} is both confirmed and cancelled"
        )));
    }

    let timestamps = Timestamps::builder().created_at(created_at).updated_at(updated_at).build();

    Ok(Transaction::builder()
        .id(id.into())
        .description(description)
        .organization_id(organization_id.into())
        .created_by(created_by.into())
        .amount(amount)
        .to_addr(to_addr)
        .max_fee_allowed(max_fee_allowed)
        .maybe_deadline(deadline)
        .timestamps(timestamps)
        .maybe_confirmed_at(confirmed_at)
        .maybe_cancelled_at(cancelled_at)
        .maybe_committed_at(committed_at)
        .build())
}

fn make_multisig(record: MultisigRecord, owners: Vec<ParticipantId>) -> Result<Multisig> {
    let MultisigRecordDissolved {
        id,
        organization_id,
        title,
        address,
        confirmations_required,
        created_at,
        updated_at,
    } = record.dissolve();

    let confirmations_required = u32::try_from(confirmations_required)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| {
            StoreError::invalid_value(format!(
                "multisig {id} has invalid confirmations required {confirmations_required}"
            ))
        })?;

    let timestamps = Timestamps::builder().created_at(created_at).updated_at(updated_at).build();

    Ok(Multisig::builder()
        .id(id.into())
        .organization_id(organization_id.into())
        .title(title)
        .address(address)
        .owners(owners)
        .confirmations_required(confirmations_required)
        .timestamps(timestamps)
        .build())
}

fn make_multisig_confirmation(record: MultisigConfirmationRecord) -> MultisigConfirmation {
    let MultisigConfirmationRecordDissolved {
        multisig_id,
        owner_id,
        organization_id,
        created_at,
        updated_at,
    } = record.dissolve();

    MultisigConfirmation::builder()
        .multisig_id(multisig_id.into())
        .organization_id(organization_id.into())
        .owner_id(owner_id.into())
        .timestamps(Timestamps::builder().created_at(created_at).updated_at(updated_at).build())
        .build()
}

fn make_payroll(record: PayrollRecord) -> Payroll {
    let PayrollRecordDissolved {
        id,
        title,
        address,
        organization_id,
        multisig_id,
        created_at,
        updated_at,
    } = record.dissolve();

    Payroll::builder()
        .id(id.into())
        .title(title)
        .address(address)
        .organization_id(organization_id.into())
        .multisig_id(multisig_id.into())
        .timestamps(Timestamps::builder().created_at(created_at).updated_at(updated_at).build())
        .build()
}

fn make_organization_user(
    org_user: OrganizationUserRecord,
    user: UserRecord,
    employee: Option<Employee>,
) -> OrganizationUser {
    let OrganizationUserRecordDissolved {
        organization_id,
        position,
        is_admin,
        is_owner,
        added_at,
        updated_at,
        deleted_at,
        ..
    } = org_user.dissolve();

    let UserRecordDissolved {
        id,
        name,
        seed,
        public_key,
        mnemonic,
        activated_at,
        created_at: user_created_at,
        updated_at: user_updated_at,
    } = user.dissolve();

    let user = User::builder()
        .id(id.into())
        .name(name)
        .seed(seed)
        .public_key(public_key)
        .maybe_mnemonic(mnemonic)
        .maybe_activated_at(activated_at)
        .timestamps(
            Timestamps::builder().created_at(user_created_at).updated_at(user_updated_at).build(),
        )
        .build();

    OrganizationUser::builder()
        .user(user)
        .organization_id(organization_id.into())
        .position(position)
        .is_admin(is_admin)
        .is_owner(is_owner)
        .timestamps(Timestamps::builder().created_at(added_at).updated_at(updated_at).build())
        .maybe_deleted_at(deleted_at)
        .maybe_employee(employee)
        .build()
}

fn make_employee(record: EmployeeRecord) -> Employee {
    let EmployeeRecordDissolved {
        id,
        name,
        user_id,
        organization_id,
        wallet_address,
        position,
        created_at,
        updated_at,
        deleted_at,
    } = record.dissolve();

    Employee::builder()
        .id(id.into())
        .name(name)
        .maybe_user_id(user_id.map(From::from))
        .organization_id(organization_id.into())
        .wallet_address(wallet_address)
        .position(position)
        .timestamps(Timestamps::builder().created_at(created_at).updated_at(updated_at).build())
        .maybe_deleted_at(deleted_at)
        .build()
}
