//! Client for the external chain-execution service.
//!
//! The chain-execution service deploys multisig wallets and payroll contracts and resolves the
//! public key behind a seed phrase. Every call carries the caller's seed in the `X-Seed` header;
//! the client never retries and surfaces transport and decoding failures to its caller.
//!
//! The [`ChainClient`] trait is the seam the ledger engine depends on. [`HttpChainClient`] is the
//! production implementation.

mod error;
mod http;

pub use self::{
    error::{ChainClientError, Result},
    http::HttpChainClient,
};

use async_trait::async_trait;
use bon::Builder;

/// Operations offered by the chain-execution service.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    /// Deploys a multisig wallet owned by `owners` (public keys) requiring `confirmations`
    /// signatures, and returns its on-chain address.
    async fn deploy_multisig(
        &self,
        seed: &[u8],
        owners: &[Vec<u8>],
        confirmations: u32,
    ) -> Result<Vec<u8>>;

    /// Deploys a payroll contract controlled by `authorized_wallet` and returns its address.
    async fn deploy_payroll_contract(
        &self,
        seed: &[u8],
        authorized_wallet: &[u8],
    ) -> Result<Vec<u8>>;

    /// Sets the salary of an employee in a payroll contract.
    async fn set_salary(&self, seed: &[u8], call: &SetSalaryCall) -> Result<()>;

    /// Resolves the public key derived from `seed_phrase`.
    async fn address_from_seed(&self, seed: &[u8], seed_phrase: &str) -> Result<Vec<u8>>;
}

/// Arguments of a set-salary call.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct SetSalaryCall {
    multisig_address: Vec<u8>,
    contract_address: Vec<u8>,
    employee_address: Vec<u8>,
    salary: u64,
}

impl SetSalaryCall {
    /// Address of the multisig wallet authorizing the payroll contract.
    pub fn multisig_address(&self) -> &[u8] {
        &self.multisig_address
    }

    /// Address of the payroll contract.
    pub fn contract_address(&self) -> &[u8] {
        &self.contract_address
    }

    /// Wallet address of the employee.
    pub fn employee_address(&self) -> &[u8] {
        &self.employee_address
    }

    /// Salary amount, in the contract's base unit.
    pub fn salary(&self) -> u64 {
        self.salary
    }
}
