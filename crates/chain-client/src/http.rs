use core::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    ChainClient, SetSalaryCall,
    error::{ChainClientError, Result},
};

const SEED_HEADER: &str = "X-Seed";

/// [`ChainClient`] talking JSON over HTTP to the chain-execution service.
#[derive(Debug, Clone)]
pub struct HttpChainClient {
    host: String,
    client: Client,
}

#[bon::bon]
impl HttpChainClient {
    /// Creates a client for the service reachable at `host`.
    ///
    /// `timeout` bounds every request, from connecting until the response body is read.
    #[builder]
    pub fn new(host: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            host: host.as_str().trim_end_matches('/').to_owned(),
            client,
        })
    }
}

impl HttpChainClient {
    /// Base URL of the chain-execution service.
    pub fn host(&self) -> &str {
        &self.host
    }

    fn post(&self, path: &str, seed: &[u8]) -> RequestBuilder {
        self.client.post(format!("{}{path}", self.host)).header(SEED_HEADER, hex::encode(seed))
    }
}

#[derive(Serialize)]
struct DeployMultisigBody {
    owners: Vec<String>,
    confirmations: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeployPayrollBody {
    authorized_wallet: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetSalaryBody {
    multi_sig_wallet: String,
    contract_address: String,
    employee_address: String,
    salary: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddressFromSeedBody<'a> {
    seed_phrase: &'a str,
}

#[derive(Deserialize)]
struct AddressBody {
    address: Option<String>,
}

#[async_trait]
impl ChainClient for HttpChainClient {
    #[tracing::instrument(skip_all, fields(owners = owners.len(), confirmations = confirmations))]
    async fn deploy_multisig(
        &self,
        seed: &[u8],
        owners: &[Vec<u8>],
        confirmations: u32,
    ) -> Result<Vec<u8>> {
        let body = DeployMultisigBody {
            owners: owners.iter().map(encode_prefixed).collect(),
            confirmations,
        };

        let response = self.post("/multi-sig/deploy", seed).json(&body).send().await?;

        decode_address(response).await
    }

    #[tracing::instrument(
        skip_all,
        fields(authorized_wallet = %encode_prefixed(authorized_wallet))
    )]
    async fn deploy_payroll_contract(
        &self,
        seed: &[u8],
        authorized_wallet: &[u8],
    ) -> Result<Vec<u8>> {
        let body = DeployPayrollBody { authorized_wallet: encode_prefixed(authorized_wallet) };

        let response = self.post("/salaries/deploy", seed).json(&body).send().await?;

        decode_address(response).await
    }

    #[tracing::instrument(skip_all, fields(salary = call.salary()))]
    async fn set_salary(&self, seed: &[u8], call: &SetSalaryCall) -> Result<()> {
        let body = SetSalaryBody {
            multi_sig_wallet: encode_prefixed(call.multisig_address()),
            contract_address: encode_prefixed(call.contract_address()),
            employee_address: encode_prefixed(call.employee_address()),
            salary: call.salary(),
        };

        let response = self.post("/salaries/set-salary", seed).json(&body).send().await?;

        ensure_success(response).await.map(drop)
    }

    #[tracing::instrument(skip_all)]
    async fn address_from_seed(&self, seed: &[u8], seed_phrase: &str) -> Result<Vec<u8>> {
        let body = AddressFromSeedBody { seed_phrase };

        let response = self.post("/address-from-seed", seed).json(&body).send().await?;
        let raw = ensure_success(response).await?.text().await?;

        let key = decode_hex(raw.trim().trim_matches('"'))?;
        if key.is_empty() {
            return Err(ChainClientError::EmptyAddress);
        }

        Ok(key)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), %body, "chain service rejected the request");

    Err(ChainClientError::Status { status: status.as_u16(), body })
}

async fn decode_address(response: Response) -> Result<Vec<u8>> {
    let raw = ensure_success(response).await?.bytes().await?;

    let AddressBody { address } = serde_json::from_slice(&raw)
        .map_err(|e| ChainClientError::decode(format!("malformed address response: {e}")))?;

    let address = address.ok_or(ChainClientError::decode("response carries no address"))?;
    let address = decode_hex(&address)?;

    if address.is_empty() {
        return Err(ChainClientError::EmptyAddress);
    }

    Ok(address)
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.strip_prefix("0x").unwrap_or(s);

    hex::decode(s).map_err(|e| ChainClientError::decode(format!("invalid hex {s:?}: {e}")))
}

fn encode_prefixed<B: AsRef<[u8]>>(bytes: B) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_decoded_with_or_without_prefix() {
        assert_eq!(decode_hex("0xabcd").unwrap(), vec![0xab, 0xcd]);
        assert_eq!(decode_hex("abcd").unwrap(), vec![0xab, 0xcd]);
        assert!(matches!(decode_hex("0xzz"), Err(ChainClientError::Decode(_))));
    }

    #[test]
    fn host_trailing_slash_is_dropped() {
        let client = HttpChainClient::builder()
            .host("http://localhost:8081/".parse().unwrap())
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();

        assert_eq!(client.host(), "http://localhost:8081");
    }
}
