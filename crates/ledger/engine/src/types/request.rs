//! Request types for ledger engine operations.

mod error;

pub use self::error::{
    CreateTransactionRequestError, NewMultisigRequestError, PayrollDeployRequestError,
    RequestError,
};

use std::collections::HashSet;

use block_accounting_domain::{
    MultisigId, ParticipantId, PayrollId, TransactionId, tx::TransactionDraft,
};
use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use rust_decimal::Decimal;

/// Request to record a new transaction.
///
/// # Validation
///
/// The request validates that:
/// - `to_addr` is non-empty
/// - `amount` is positive and `max_fee_allowed` is not negative
#[derive(Debug, Clone, Dissolve)]
pub struct CreateTransactionRequest {
    /// Caller supplied id, generated when absent
    id: Option<TransactionId>,

    description: String,

    amount: Decimal,

    /// Destination address bytes
    to_addr: Vec<u8>,

    max_fee_allowed: Decimal,

    deadline: Option<DateTime<Utc>>,
}

/// Request to list the transactions of an organization.
///
/// Status flags combine conjunctively. `limit` is clamped to `1..=50`; zero or absent selects
/// the maximum page size.
#[derive(Debug, Clone, Default, Builder, Dissolve)]
pub struct ListTransactionsRequest {
    #[builder(default)]
    ids: Vec<TransactionId>,

    created_by: Option<ParticipantId>,

    to_addr: Option<Vec<u8>>,

    #[builder(default)]
    pending: bool,

    #[builder(default)]
    confirmed: bool,

    #[builder(default)]
    cancelled: bool,

    #[builder(default)]
    committed: bool,

    #[builder(default)]
    expired: bool,

    /// Opaque cursor returned with the previous page
    cursor: Option<String>,

    limit: Option<u32>,
}

/// Request to deploy a new multisig wallet.
///
/// # Validation
///
/// The request validates that:
/// - `title` is not blank
/// - `owners` is non-empty and holds distinct, non-empty public keys
#[derive(Debug, Clone, Dissolve)]
pub struct NewMultisigRequest {
    title: String,

    /// Public keys of the owners, in signing order
    owners: Vec<Vec<u8>>,

    /// Required confirmations, raised to one when zero
    confirmations: u32,
}

/// Request to deploy a payroll contract controlled by a multisig.
#[derive(Debug, Clone, Dissolve)]
pub struct PayrollDeployRequest {
    /// The already-deployed multisig authorizing the contract
    multisig_id: MultisigId,

    /// The admin deploying the contract; must be the caller
    first_admin: ParticipantId,

    title: String,
}

/// Request to set the salary of an employee in a payroll contract.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct SetSalaryRequest {
    payroll_id: PayrollId,

    /// Employee participant receiving the salary
    employee_id: ParticipantId,

    salary: u64,
}

/// Request to list multisigs of an organization.
#[derive(Debug, Clone, Default, Builder, Dissolve)]
pub struct ListMultisigsRequest {
    /// Optional id set. Lists every multisig when empty.
    #[builder(default)]
    ids: Vec<MultisigId>,
}

/// Request to list payroll contracts of an organization.
#[derive(Debug, Clone, Default, Builder, Dissolve)]
pub struct ListPayrollsRequest {
    #[builder(default)]
    ids: Vec<PayrollId>,

    multisig_id: Option<MultisigId>,
}

#[bon::bon]
impl CreateTransactionRequest {
    /// Creates a new transaction request with validation.
    ///
    /// Returns an error if validation fails.
    #[builder]
    pub fn new(
        id: Option<TransactionId>,
        #[builder(default)] description: String,
        amount: Decimal,
        to_addr: Vec<u8>,
        #[builder(default)] max_fee_allowed: Decimal,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Self, CreateTransactionRequestError> {
        if to_addr.is_empty() {
            return Err(CreateTransactionRequestError::EmptyDestination);
        }

        if amount <= Decimal::ZERO {
            return Err(CreateTransactionRequestError::NonPositiveAmount);
        }

        if max_fee_allowed < Decimal::ZERO {
            return Err(CreateTransactionRequestError::NegativeMaxFee);
        }

        Ok(Self {
            id,
            description,
            amount,
            to_addr,
            max_fee_allowed,
            deadline,
        })
    }
}

impl CreateTransactionRequest {
    pub(crate) fn into_draft(self) -> TransactionDraft {
        TransactionDraft::builder()
            .maybe_id(self.id)
            .description(self.description)
            .amount(self.amount)
            .to_addr(self.to_addr)
            .max_fee_allowed(self.max_fee_allowed)
            .maybe_deadline(self.deadline)
            .build()
    }
}

#[bon::bon]
impl NewMultisigRequest {
    /// Creates a new multisig deployment request with validation.
    ///
    /// Returns an error if validation fails.
    #[builder]
    pub fn new(
        title: String,
        owners: Vec<Vec<u8>>,
        confirmations: u32,
    ) -> Result<Self, NewMultisigRequestError> {
        if title.trim().is_empty() {
            return Err(NewMultisigRequestError::EmptyTitle);
        }

        if owners.is_empty() {
            return Err(NewMultisigRequestError::EmptyOwners);
        }

        if owners.iter().any(Vec::is_empty) {
            return Err(NewMultisigRequestError::EmptyOwnerKey);
        }

        let mut seen = HashSet::with_capacity(owners.len());
        if !owners.iter().all(|owner| seen.insert(owner)) {
            return Err(NewMultisigRequestError::DuplicateOwner);
        }

        Ok(Self { title, owners, confirmations })
    }
}

#[bon::bon]
impl PayrollDeployRequest {
    /// Creates a new payroll deployment request with validation.
    ///
    /// Returns an error if validation fails.
    #[builder]
    pub fn new(
        multisig_id: MultisigId,
        first_admin: ParticipantId,
        title: String,
    ) -> Result<Self, PayrollDeployRequestError> {
        if title.trim().is_empty() {
            return Err(PayrollDeployRequestError::EmptyTitle);
        }

        Ok(Self { multisig_id, first_admin, title })
    }
}
