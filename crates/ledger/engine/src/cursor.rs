//! Opaque pagination cursors.
//!
//! A cursor is the standard base64 encoding of the JSON object `{"id": "<uuid>"}` naming the
//! last item of the previous page.

use core::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};
use block_accounting_domain::TransactionId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

/// Position after which the next page starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    id: Uuid,
}

impl Cursor {
    /// Creates a cursor pointing at `id`.
    pub fn new<I: Into<Uuid>>(id: I) -> Self {
        Self { id: id.into() }
    }

    /// Returns the last-seen id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the last-seen id as a transaction id.
    pub fn transaction_id(&self) -> TransactionId {
        TransactionId::from(self.id)
    }

    /// Encodes the cursor into its opaque string form.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_vec(self)
            .map(|json| STANDARD.encode(json))
            .map_err(|e| EngineError::other(format!("failed to encode cursor: {e}")))
    }

    /// Decodes a cursor from its opaque string form.
    pub fn decode(s: &str) -> Result<Self> {
        let json = STANDARD
            .decode(s.trim())
            .map_err(|e| EngineError::cursor_decode(format!("invalid base64: {e}")))?;

        serde_json::from_slice(&json)
            .map_err(|e| EngineError::cursor_decode(format!("invalid cursor payload: {e}")))
    }
}

impl FromStr for Cursor {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}
