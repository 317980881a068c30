use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use block_accounting_domain::{OrganizationId, participant::User};
use block_accounting_engine::{
    JobId, LedgerEngine, Started,
    request::{
        CreateTransactionRequest, ListMultisigsRequest, ListPayrollsRequest,
        ListTransactionsRequest, NewMultisigRequest, PayrollDeployRequest, RequestError,
        SetSalaryRequest,
    },
    response::{ListTransactionsResponse, ListTransactionsResponseDissolved},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    App, AppDissolved, USER_ID_HEADER,
    error::AppError,
    payload::{
        JobPayload, encode_address,
        request::{
            CreateTransactionRequestPayload, CreateTransactionRequestPayloadDissolved,
            ListMultisigsRequestPayload, ListMultisigsRequestPayloadDissolved,
            ListPayrollsRequestPayload, ListPayrollsRequestPayloadDissolved,
            ListTransactionsRequestPayload, ListTransactionsRequestPayloadDissolved,
            MultisigOwnerPayload, MultisigOwnerPayloadDissolved, NewMultisigRequestPayload,
            NewMultisigRequestPayloadDissolved, PayrollDeployRequestPayload,
            PayrollDeployRequestPayloadDissolved, SetSalaryRequestPayload,
            SetSalaryRequestPayloadDissolved, UpdateTransactionStatusRequestPayload,
            UpdateTransactionStatusRequestPayloadDissolved,
        },
        response::{
            DeploymentTicketResponsePayload, ListMultisigsResponsePayload,
            ListPayrollsResponsePayload, ListTransactionsResponsePayload, PaginationPayload,
            PubKeyResponsePayload, QuorumResponsePayload, TransactionResponsePayload,
        },
    },
};

#[tracing::instrument]
pub async fn health() -> StatusCode {
    StatusCode::OK
}

#[tracing::instrument(skip_all)]
pub async fn create_transaction(
    State(app): State<App>,
    Path(organization_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<CreateTransactionRequestPayload>,
) -> Result<Json<TransactionResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();
    let organization_id = OrganizationId::from(organization_id);
    let caller = identify(&engine, &headers, organization_id).await?;

    let CreateTransactionRequestPayloadDissolved {
        id,
        description,
        amount,
        to,
        max_fee_allowed,
        deadline,
    } = payload.dissolve();

    let request = CreateTransactionRequest::builder()
        .maybe_id(id.map(From::from))
        .description(description)
        .amount(amount)
        .to_addr(decode_address(&to)?)
        .max_fee_allowed(max_fee_allowed)
        .maybe_deadline(deadline)
        .build()
        .map_err(RequestError::from)?;

    let tx = engine.transactions().create(&caller, organization_id, request).await?;

    let response = TransactionResponsePayload::builder().transaction(tx.into()).build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn list_transactions(
    State(app): State<App>,
    Path(organization_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<ListTransactionsRequestPayload>,
) -> Result<Json<ListTransactionsResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();
    let organization_id = OrganizationId::from(organization_id);
    let caller = identify(&engine, &headers, organization_id).await?;

    let ListTransactionsRequestPayloadDissolved {
        ids,
        created_by,
        to,
        pending,
        confirmed,
        cancelled,
        committed,
        expired,
        cursor,
        limit,
    } = payload.dissolve();

    let to_addr = to.as_deref().map(decode_address).transpose()?;

    let request = ListTransactionsRequest::builder()
        .ids(ids.into_iter().map(From::from).collect())
        .maybe_created_by(created_by.map(From::from))
        .maybe_to_addr(to_addr)
        .pending(pending)
        .confirmed(confirmed)
        .cancelled(cancelled)
        .committed(committed)
        .expired(expired)
        .maybe_cursor(cursor)
        .maybe_limit(limit)
        .build();

    let ListTransactionsResponseDissolved { txs, next_cursor } = engine
        .transactions()
        .list(&caller, organization_id, request)
        .await
        .map(ListTransactionsResponse::dissolve)?;

    let response = ListTransactionsResponsePayload::builder()
        .items(txs.into_iter().map(From::from).collect())
        .pagination(PaginationPayload::builder().maybe_next_cursor(next_cursor).build())
        .build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn update_transaction_status(
    State(app): State<App>,
    Path((organization_id, tx_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    Json(payload): Json<UpdateTransactionStatusRequestPayload>,
) -> Result<Json<TransactionResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();
    let organization_id = OrganizationId::from(organization_id);
    let caller = identify(&engine, &headers, organization_id).await?;

    let UpdateTransactionStatusRequestPayloadDissolved { confirm, cancel } = payload.dissolve();

    let tx = match (confirm, cancel) {
        (true, false) => {
            engine.transactions().confirm(&caller, organization_id, tx_id.into()).await?
        },
        (false, true) => {
            engine.transactions().cancel(&caller, organization_id, tx_id.into()).await?
        },
        _ => return Err(AppError::InvalidStatusUpdate),
    };

    let response = TransactionResponsePayload::builder().transaction(tx.into()).build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn new_multisig(
    State(app): State<App>,
    Path(organization_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<NewMultisigRequestPayload>,
) -> Result<(StatusCode, Json<DeploymentTicketResponsePayload>), AppError> {
    let AppDissolved { engine } = app.dissolve();
    let organization_id = OrganizationId::from(organization_id);
    let caller = identify(&engine, &headers, organization_id).await?;

    let NewMultisigRequestPayloadDissolved { title, owners, confirmations } = payload.dissolve();

    let owners = owners
        .into_iter()
        .map(MultisigOwnerPayload::dissolve)
        .map(|MultisigOwnerPayloadDissolved { public_key }| decode_address(&public_key))
        .collect::<Result<Vec<_>, _>>()?;

    let request = NewMultisigRequest::builder()
        .title(title)
        .owners(owners)
        .confirmations(confirmations)
        .build()
        .map_err(RequestError::from)?;

    let ticket = engine.deployments().new_multisig(&caller, organization_id, request).await?;

    let response =
        DeploymentTicketResponsePayload::builder().job_id(ticket.job_id().as_uuid()).build();

    Ok((StatusCode::ACCEPTED, Json(response)))
}

#[tracing::instrument(skip_all)]
pub async fn list_multisigs(
    State(app): State<App>,
    Path(organization_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<ListMultisigsRequestPayload>,
) -> Result<Json<ListMultisigsResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();
    let organization_id = OrganizationId::from(organization_id);
    let caller = identify(&engine, &headers, organization_id).await?;

    let ListMultisigsRequestPayloadDissolved { ids } = payload.dissolve();

    let request =
        ListMultisigsRequest::builder().ids(ids.into_iter().map(From::from).collect()).build();

    let multisigs = engine.deployments().list_multisigs(&caller, organization_id, request).await?;

    let response = ListMultisigsResponsePayload::builder()
        .multisigs(multisigs.into_iter().map(From::from).collect())
        .build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn confirm_multisig(
    State(app): State<App>,
    Path((organization_id, multisig_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> Result<Json<QuorumResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();
    let organization_id = OrganizationId::from(organization_id);
    let caller = identify(&engine, &headers, organization_id).await?;

    let quorum = engine
        .quorum()
        .confirm(&caller, organization_id, multisig_id.into(), Utc::now())
        .await?;

    let response = QuorumResponsePayload::builder()
        .multisig_id(multisig_id)
        .reached(quorum.reached())
        .quorum(quorum)
        .build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn get_quorum(
    State(app): State<App>,
    Path((organization_id, multisig_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> Result<Json<QuorumResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();
    let organization_id = OrganizationId::from(organization_id);
    let caller = identify(&engine, &headers, organization_id).await?;

    let quorum = engine.quorum().quorum(&caller, organization_id, multisig_id.into()).await?;

    let response = QuorumResponsePayload::builder()
        .multisig_id(multisig_id)
        .reached(quorum.reached())
        .quorum(quorum)
        .build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn payroll_deploy(
    State(app): State<App>,
    Path(organization_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<PayrollDeployRequestPayload>,
) -> Result<(StatusCode, Json<DeploymentTicketResponsePayload>), AppError> {
    let AppDissolved { engine } = app.dissolve();
    let organization_id = OrganizationId::from(organization_id);
    let caller = identify(&engine, &headers, organization_id).await?;

    let PayrollDeployRequestPayloadDissolved { multisig_id, first_admin, title } =
        payload.dissolve();

    let request = PayrollDeployRequest::builder()
        .multisig_id(multisig_id.into())
        .first_admin(first_admin.into())
        .title(title)
        .build()
        .map_err(RequestError::from)?;

    let ticket = engine.deployments().payroll_deploy(&caller, organization_id, request).await?;

    let response =
        DeploymentTicketResponsePayload::builder().job_id(ticket.job_id().as_uuid()).build();

    Ok((StatusCode::ACCEPTED, Json(response)))
}

#[tracing::instrument(skip_all)]
pub async fn list_payrolls(
    State(app): State<App>,
    Path(organization_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<ListPayrollsRequestPayload>,
) -> Result<Json<ListPayrollsResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();
    let organization_id = OrganizationId::from(organization_id);
    let caller = identify(&engine, &headers, organization_id).await?;

    let ListPayrollsRequestPayloadDissolved { ids, multisig_id } = payload.dissolve();

    let request = ListPayrollsRequest::builder()
        .ids(ids.into_iter().map(From::from).collect())
        .maybe_multisig_id(multisig_id.map(From::from))
        .build();

    let payrolls = engine.deployments().list_payrolls(&caller, organization_id, request).await?;

    let response = ListPayrollsResponsePayload::builder()
        .payrolls(payrolls.into_iter().map(From::from).collect())
        .build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all)]
pub async fn set_salary(
    State(app): State<App>,
    Path(organization_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<SetSalaryRequestPayload>,
) -> Result<(StatusCode, Json<DeploymentTicketResponsePayload>), AppError> {
    let AppDissolved { engine } = app.dissolve();
    let organization_id = OrganizationId::from(organization_id);
    let caller = identify(&engine, &headers, organization_id).await?;

    let SetSalaryRequestPayloadDissolved { payroll_id, employee_id, salary } = payload.dissolve();

    let request = SetSalaryRequest::builder()
        .payroll_id(payroll_id.into())
        .employee_id(employee_id.into())
        .salary(salary)
        .build();

    let ticket = engine.deployments().set_salary(&caller, organization_id, request).await?;

    let response =
        DeploymentTicketResponsePayload::builder().job_id(ticket.job_id().as_uuid()).build();

    Ok((StatusCode::ACCEPTED, Json(response)))
}

#[tracing::instrument(skip_all)]
pub async fn get_job_status(
    State(app): State<App>,
    Path((organization_id, job_id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> Result<Json<JobPayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();
    let organization_id = OrganizationId::from(organization_id);
    let caller = identify(&engine, &headers, organization_id).await?;

    let status =
        engine.deployments().job_status(&caller, organization_id, JobId::from(job_id)).await?;

    Ok(Json(status.into()))
}

#[tracing::instrument(skip_all)]
pub async fn get_pub_key(
    State(app): State<App>,
    Path(organization_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<PubKeyResponsePayload>, AppError> {
    let AppDissolved { engine } = app.dissolve();
    let organization_id = OrganizationId::from(organization_id);
    let caller = identify(&engine, &headers, organization_id).await?;

    let public_key = engine.deployments().pub_key(&caller).await?;

    let response =
        PubKeyResponsePayload::builder().public_key(encode_address(&public_key)).build();

    Ok(Json(response))
}

async fn identify(
    engine: &LedgerEngine<Started>,
    headers: &HeaderMap,
    organization_id: OrganizationId,
) -> Result<User, AppError> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::missing_identity(format!("{USER_ID_HEADER} header is missing")))?
        .to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or_else(|| AppError::missing_identity(format!("{USER_ID_HEADER} is not a uuid")))?;

    engine.directory().identify(user_id.into(), organization_id).await.map_err(From::from)
}

fn decode_address(address: &str) -> Result<Vec<u8>, AppError> {
    let digits = address.strip_prefix("0x").unwrap_or(address);

    hex::decode(digits).map_err(|e| AppError::invalid_address(format!("{address}: {e}")))
}
