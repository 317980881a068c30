use diesel_async::pooled_connection::deadpool::BuildError;
use tokio::task::JoinError;

/// Errors raised while building the connection pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("tls setup task failed: {0}")]
    Join(#[from] JoinError),

    #[error("pool build error: {0}")]
    Build(#[from] BuildError),

    #[error("rustls error: {0}")]
    Rustls(#[from] rustls::Error),
}
