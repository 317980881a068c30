use std::borrow::Cow;

pub type Result<T, E = StoreError> = core::result::Result<T, E>;

/// Errors that can occur when interacting with a ledger store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A query, connection or transaction failed in the database.
    #[error("database error: {0}")]
    Db(#[from] diesel::result::Error),

    /// No connection could be acquired from the pool.
    ///
    /// This typically means the pool is exhausted or the database is unavailable.
    #[error("pool error: {0}")]
    Pool(Cow<'static, str>),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(Cow<'static, str>),

    /// A stored value could not be converted into its domain type.
    #[error("invalid value: {0}")]
    InvalidValue(Cow<'static, str>),

    /// An unclassified error occurred.
    #[error("other error: {0}")]
    Other(Cow<'static, str>),
}

impl StoreError {
    pub fn not_found<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::NotFound(From::from(err))
    }

    pub fn invalid_value<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::InvalidValue(From::from(err))
    }

    pub fn other<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Other(From::from(err))
    }
}
