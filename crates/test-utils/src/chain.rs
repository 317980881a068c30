use core::time::Duration;

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use block_accounting_chain_client::{ChainClient, ChainClientError, Result, SetSalaryCall};

use crate::random_bytes;

/// Scripted outcome of a stubbed chain call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubResponse {
    /// The call succeeds with this address or key.
    Address(Vec<u8>),
    /// The service answers with an empty address.
    EmptyAddress,
    /// The service answers with a body that is not an address.
    Malformed,
    /// The service answers with a non-success status.
    Status(u16),
}

impl StubResponse {
    fn into_result(self) -> Result<Vec<u8>> {
        match self {
            Self::Address(address) => Ok(address),
            Self::EmptyAddress => Err(ChainClientError::EmptyAddress),
            Self::Malformed => Err(ChainClientError::Decode("missing address field".into())),
            Self::Status(status) => {
                Err(ChainClientError::Status { status, body: "stubbed failure".to_owned() })
            },
        }
    }
}

/// A call received by the [`StubChainClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ChainCall {
    DeployMultisig { seed: Vec<u8>, owners: Vec<Vec<u8>>, confirmations: u32 },
    DeployPayroll { seed: Vec<u8>, authorized_wallet: Vec<u8> },
    SetSalary { seed: Vec<u8>, call: SetSalaryCall },
    AddressFromSeed { seed: Vec<u8>, seed_phrase: String },
}

#[derive(Debug, Default)]
struct State {
    multisig: VecDeque<StubResponse>,
    payroll: VecDeque<StubResponse>,
    set_salary: VecDeque<StubResponse>,
    pub_key: VecDeque<StubResponse>,
    calls: Vec<ChainCall>,
    delay: Option<Duration>,
}

/// In-process [`ChainClient`] with scripted responses.
///
/// Each operation pops its next scripted [`StubResponse`]. When nothing is scripted, deployments
/// return a fresh random address, set-salary succeeds and the public key is `0x02 || seed`.
/// Every call is recorded and can be inspected with [`calls`](Self::calls).
#[derive(Debug, Clone, Default)]
pub struct StubChainClient {
    state: Arc<Mutex<State>>,
}

impl StubChainClient {
    /// Creates a stub answering every call immediately with the default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call by `delay` before answering.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    /// Queues the outcome of an upcoming multisig deployment.
    pub fn push_multisig_response(&self, response: StubResponse) {
        self.lock().multisig.push_back(response);
    }

    /// Queues the outcome of an upcoming payroll contract deployment.
    pub fn push_payroll_response(&self, response: StubResponse) {
        self.lock().payroll.push_back(response);
    }

    /// Queues the outcome of an upcoming set-salary call.
    pub fn push_set_salary_response(&self, response: StubResponse) {
        self.lock().set_salary.push_back(response);
    }

    /// Queues the outcome of an upcoming public key lookup.
    pub fn push_pub_key_response(&self, response: StubResponse) {
        self.lock().pub_key.push_back(response);
    }

    /// Returns the calls received so far, oldest first.
    pub fn calls(&self) -> Vec<ChainCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn record<F>(&self, call: ChainCall, next: F) -> Option<StubResponse>
    where
        F: FnOnce(&mut State) -> Option<StubResponse>,
    {
        let (delay, response) = {
            let mut state = self.lock();
            state.calls.push(call);
            (state.delay, next(&mut state))
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        response
    }
}

#[async_trait]
impl ChainClient for StubChainClient {
    async fn deploy_multisig(
        &self,
        seed: &[u8],
        owners: &[Vec<u8>],
        confirmations: u32,
    ) -> Result<Vec<u8>> {
        let call = ChainCall::DeployMultisig {
            seed: seed.to_vec(),
            owners: owners.to_vec(),
            confirmations,
        };

        self.record(call, |state| state.multisig.pop_front())
            .await
            .unwrap_or_else(|| StubResponse::Address(random_bytes(20)))
            .into_result()
    }

    async fn deploy_payroll_contract(
        &self,
        seed: &[u8],
        authorized_wallet: &[u8],
    ) -> Result<Vec<u8>> {
        let call = ChainCall::DeployPayroll {
            seed: seed.to_vec(),
            authorized_wallet: authorized_wallet.to_vec(),
        };

        self.record(call, |state| state.payroll.pop_front())
            .await
            .unwrap_or_else(|| StubResponse::Address(random_bytes(20)))
            .into_result()
    }

    async fn set_salary(&self, seed: &[u8], call: &SetSalaryCall) -> Result<()> {
        let recorded = ChainCall::SetSalary { seed: seed.to_vec(), call: call.clone() };

        match self.record(recorded, |state| state.set_salary.pop_front()).await {
            Some(response) => response.into_result().map(drop),
            None => Ok(()),
        }
    }

    async fn address_from_seed(&self, seed: &[u8], seed_phrase: &str) -> Result<Vec<u8>> {
        let call = ChainCall::AddressFromSeed {
            seed: seed.to_vec(),
            seed_phrase: seed_phrase.to_owned(),
        };

        self.record(call, |state| state.pub_key.pop_front())
            .await
            .unwrap_or_else(|| StubResponse::Address([&[0x02][..], seed].concat()))
            .into_result()
    }
}
