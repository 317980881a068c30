/// Top-level error for request validation.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Error creating a transaction request.
    #[error("create transaction error: {0}")]
    CreateTransaction(#[from] CreateTransactionRequestError),

    /// Error creating a multisig deployment request.
    #[error("new multisig error: {0}")]
    NewMultisig(#[from] NewMultisigRequestError),

    /// Error creating a payroll deployment request.
    #[error("payroll deploy error: {0}")]
    PayrollDeploy(#[from] PayrollDeployRequestError),
}

/// Errors that can occur when validating a transaction creation request.
#[derive(Debug, thiserror::Error)]
pub enum CreateTransactionRequestError {
    /// The destination address is empty
    #[error("empty destination address")]
    EmptyDestination,

    /// The amount is zero or negative
    #[error("amount must be positive")]
    NonPositiveAmount,

    /// The maximum fee is negative
    #[error("max fee allowed must not be negative")]
    NegativeMaxFee,
}

/// Errors that can occur when validating a multisig deployment request.
#[derive(Debug, thiserror::Error)]
pub enum NewMultisigRequestError {
    /// The title is blank
    #[error("empty title")]
    EmptyTitle,

    /// No owner public key was given
    #[error("empty owners")]
    EmptyOwners,

    /// An owner public key is empty
    #[error("empty owner public key")]
    EmptyOwnerKey,

    /// The same owner public key appears twice
    #[error("duplicate owner public key")]
    DuplicateOwner,
}

/// Errors that can occur when validating a payroll deployment request.
#[derive(Debug, thiserror::Error)]
pub enum PayrollDeployRequestError {
    /// The title is blank
    #[error("empty title")]
    EmptyTitle,
}
