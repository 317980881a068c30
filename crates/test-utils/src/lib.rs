//! Test utilities for the block accounting ledger.
//!
//! This crate provides a scripted [`StubChainClient`] standing in for the chain-execution
//! service and an [`OrgFixture`] that seeds an [`InMemoryStore`] with the participants of one
//! organization. Both are shared by the integration tests across this workspace.

mod chain;
mod fixture;

pub use self::{
    chain::{ChainCall, StubChainClient, StubResponse},
    fixture::OrgFixture,
};

pub use block_accounting_store::InMemoryStore;

/// Returns `len` random bytes.
pub fn random_bytes(len: usize) -> Vec<u8> {
    use rand::RngCore;

    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}
