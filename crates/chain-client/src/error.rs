use std::borrow::Cow;

pub type Result<T, E = ChainClientError> = core::result::Result<T, E>;

/// Errors returned by a [`ChainClient`](crate::ChainClient).
#[derive(Debug, thiserror::Error)]
pub enum ChainClientError {
    /// The request could not be sent or its response could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The chain service answered with a non-success status code.
    #[error("chain service responded with status {status}: {body}")]
    Status {
        /// HTTP status code of the response.
        status: u16,

        /// Raw response body, kept for diagnostics.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(Cow<'static, str>),

    /// The chain service returned an empty address.
    #[error("chain service returned an empty address")]
    EmptyAddress,
}

impl ChainClientError {
    pub(crate) fn decode<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Decode(err.into())
    }
}
