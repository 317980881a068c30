//! Response types for ledger engine operations.

use block_accounting_domain::tx::Transaction;
use bon::Builder;
use dissolve_derive::Dissolve;

use crate::jobs::JobId;

/// A page of transactions.
#[derive(Debug, Clone, Builder, Dissolve)]
pub struct ListTransactionsResponse {
    txs: Vec<Transaction>,

    /// Cursor of the next page. `None` on the last page.
    next_cursor: Option<String>,
}

impl ListTransactionsResponse {
    /// Returns the transactions of the page.
    pub fn txs(&self) -> &[Transaction] {
        &self.txs
    }

    /// Returns the cursor of the next page.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }
}

/// Handle of an accepted background job.
///
/// Holding a ticket does not mean the job succeeded; poll its status for the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct DeploymentTicket {
    job_id: JobId,
}

impl DeploymentTicket {
    /// Returns the job id to poll.
    pub fn job_id(&self) -> JobId {
        self.job_id
    }
}
