use std::borrow::Cow;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use block_accounting_engine::{EngineError, request::RequestError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub(crate) enum AppError {
    #[error("ledger engine error: {0}")]
    LedgerEngine(Box<EngineError>),

    #[error("missing identity: {0}")]
    MissingIdentity(Cow<'static, str>),

    #[error("invalid address: {0}")]
    InvalidAddress(Cow<'static, str>),

    #[error("invalid status update: exactly one of confirm and cancel must be set")]
    InvalidStatusUpdate,

    #[error("request error: {0}")]
    RequestError(#[from] RequestError),
}

#[derive(Serialize)]
struct ErrorPayload {
    code: u16,
    error: String,
}

impl AppError {
    pub fn missing_identity<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::MissingIdentity(err.into())
    }

    pub fn invalid_address<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::InvalidAddress(err.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingIdentity(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidAddress(_)
            | AppError::InvalidStatusUpdate
            | AppError::RequestError(_) => StatusCode::BAD_REQUEST,
            AppError::LedgerEngine(err) => match err.as_ref() {
                EngineError::Unauthorized(_) => StatusCode::FORBIDDEN,
                EngineError::NotFound(_) => StatusCode::NOT_FOUND,
                EngineError::InvalidOwnerSet(_)
                | EngineError::EmptyAddress(_)
                | EngineError::CursorDecode(_)
                | EngineError::Request(_) => StatusCode::BAD_REQUEST,
                EngineError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
                EngineError::DeploymentFailed(_)
                | EngineError::ChainTransport(_)
                | EngineError::Store(_)
                | EngineError::MpscSender(_)
                | EngineError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        Self::LedgerEngine(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status_code();

        if code.is_server_error() {
            tracing::error!("server error: {self}");
        } else if code == StatusCode::NOT_FOUND {
            tracing::info!("not found: {self}");
        } else {
            tracing::warn!("client error: {self}");
        }

        let payload = ErrorPayload { code: code.as_u16(), error: self.to_string() };

        (code, Json(payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_status_codes() {
        let cases = [
            (EngineError::Unauthorized("no".into()), StatusCode::FORBIDDEN),
            (EngineError::NotFound("tx".into()), StatusCode::NOT_FOUND),
            (EngineError::CursorDecode("bad".into()), StatusCode::BAD_REQUEST),
            (EngineError::QueueFull, StatusCode::SERVICE_UNAVAILABLE),
            (EngineError::ChainTransport("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status_code(), expected);
        }
    }
}
