use block_accounting_chain_client::ChainClientError;
use block_accounting_store::StoreError;

pub type Result<T, E = DeploymentRuntimeError> = core::result::Result<T, E>;

/// Errors that end a background job.
#[derive(Debug, thiserror::Error)]
pub enum DeploymentRuntimeError {
    /// The chain service call failed.
    #[error("chain client error: {0}")]
    ChainClient(#[from] ChainClientError),

    /// The deployed contract could not be persisted.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
