use std::borrow::Cow;

use block_accounting_chain_client::ChainClientError;
use block_accounting_store::StoreError;

use crate::types::request::RequestError;

pub type Result<T, E = EngineError> = core::result::Result<T, E>;

/// Errors returned by the ledger engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The caller is missing from the organization, inactive, or lacks the required role.
    #[error("unauthorized: {0}")]
    Unauthorized(Cow<'static, str>),

    /// A referenced transaction, multisig, payroll, participant or job does not exist.
    #[error("not found: {0}")]
    NotFound(Cow<'static, str>),

    /// The owner list of a new multisig contains a non-user or keyless participant.
    #[error("invalid owner set: {0}")]
    InvalidOwnerSet(Cow<'static, str>),

    /// A deployed contract or wallet has no usable address.
    #[error("empty address: {0}")]
    EmptyAddress(Cow<'static, str>),

    /// The chain service answered with something that is not a usable result.
    #[error("deployment failed: {0}")]
    DeploymentFailed(Cow<'static, str>),

    /// The chain service could not be reached or rejected the call.
    #[error("chain transport error: {0}")]
    ChainTransport(Cow<'static, str>),

    /// A pagination cursor could not be decoded.
    #[error("cursor decode error: {0}")]
    CursorDecode(Cow<'static, str>),

    /// A request failed validation.
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),

    /// The persistence layer failed.
    #[error("store error: {0}")]
    Store(StoreError),

    /// The deployment queue is at capacity.
    #[error("deployment queue is full")]
    QueueFull,

    /// The deployment runtime no longer accepts work.
    #[error("mpsc sender error: {0}")]
    MpscSender(Cow<'static, str>),

    /// Catch-all for everything else.
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl EngineError {
    pub(crate) fn unauthorized<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Unauthorized(err.into())
    }

    pub(crate) fn not_found<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::NotFound(err.into())
    }

    pub(crate) fn invalid_owner_set<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::InvalidOwnerSet(err.into())
    }

    pub(crate) fn empty_address<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::EmptyAddress(err.into())
    }

    pub(crate) fn cursor_decode<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::CursorDecode(err.into())
    }

    pub(crate) fn mpsc_sender<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::MpscSender(err.into())
    }

    pub(crate) fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(err.into())
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => Self::NotFound(msg),
            err => Self::Store(err),
        }
    }
}

impl From<ChainClientError> for EngineError {
    fn from(err: ChainClientError) -> Self {
        match err {
            ChainClientError::EmptyAddress => {
                Self::empty_address("chain service returned an empty address")
            },
            ChainClientError::Decode(msg) => Self::DeploymentFailed(msg),
            err @ (ChainClientError::Transport(_) | ChainClientError::Status { .. }) => {
                Self::ChainTransport(err.to_string().into())
            },
        }
    }
}
