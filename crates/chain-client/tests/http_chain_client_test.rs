//! integration tests for the HTTP chain client against an in-process chain service

use core::time::Duration;

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use block_accounting_chain_client::{ChainClient, ChainClientError, HttpChainClient, SetSalaryCall};
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Recorded {
    calls: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

impl Recorded {
    fn push(&self, path: &str, headers: &HeaderMap, body: Value) {
        let seed = headers.get("x-seed").and_then(|v| v.to_str().ok()).map(str::to_owned);
        self.calls.lock().unwrap().push((path.to_owned(), seed, body));
    }

    fn take(&self) -> Vec<(String, Option<String>, Value)> {
        core::mem::take(&mut *self.calls.lock().unwrap())
    }
}

async fn spawn_chain_service(router: Router) -> HttpChainClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move { axum::serve(listener, router).await });

    HttpChainClient::builder()
        .host(format!("http://{addr}/").parse().unwrap())
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn well_behaved_service(recorded: Recorded) -> Router {
    Router::new()
        .route(
            "/multi-sig/deploy",
            post(|State(r): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>| async move {
                r.push("/multi-sig/deploy", &headers, body);
                Json(json!({ "address": "0x00000000000000000000000000000000000000aa" }))
            }),
        )
        .route(
            "/salaries/deploy",
            post(|State(r): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>| async move {
                r.push("/salaries/deploy", &headers, body);
                Json(json!({ "address": "bbbb" }))
            }),
        )
        .route(
            "/salaries/set-salary",
            post(|State(r): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>| async move {
                r.push("/salaries/set-salary", &headers, body);
                StatusCode::CREATED
            }),
        )
        .route(
            "/address-from-seed",
            post(|State(r): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>| async move {
                r.push("/address-from-seed", &headers, body);
                "0x02a1b2c3"
            }),
        )
        .with_state(recorded)
}

#[tokio::test]
async fn deploy_multisig_sends_owners_and_seed() {
    // Arrange
    let recorded = Recorded::default();
    let client = spawn_chain_service(well_behaved_service(recorded.clone())).await;

    // Act
    let address = client
        .deploy_multisig(&[0x01, 0x02], &[vec![0xa1, 0xa2], vec![0xb1]], 2)
        .await
        .unwrap();

    // Assert
    let mut expected = vec![0u8; 19];
    expected.push(0xaa);
    assert_eq!(address, expected);

    let calls = recorded.take();
    assert_eq!(calls.len(), 1);

    let (path, seed, body) = &calls[0];
    assert_eq!(path, "/multi-sig/deploy");
    assert_eq!(seed.as_deref(), Some("0102"));
    assert_eq!(body, &json!({ "owners": ["0xa1a2", "0xb1"], "confirmations": 2 }));
}

#[tokio::test]
async fn payroll_and_salary_calls_use_camel_case_bodies() {
    // Arrange
    let recorded = Recorded::default();
    let client = spawn_chain_service(well_behaved_service(recorded.clone())).await;

    let call = SetSalaryCall::builder()
        .multisig_address(vec![0x0a])
        .contract_address(vec![0x0b])
        .employee_address(vec![0x0c])
        .salary(1_500)
        .build();

    // Act
    let contract = client.deploy_payroll_contract(&[0xff], &[0x0a]).await.unwrap();
    client.set_salary(&[0xff], &call).await.unwrap();

    // Assert
    assert_eq!(contract, vec![0xbb, 0xbb]);

    let calls = recorded.take();
    assert_eq!(calls[0].2, json!({ "authorizedWallet": "0x0a" }));
    assert_eq!(
        calls[1].2,
        json!({
            "multiSigWallet": "0x0a",
            "contractAddress": "0x0b",
            "employeeAddress": "0x0c",
            "salary": 1500,
        })
    );
}

#[tokio::test]
async fn address_from_seed_decodes_raw_hex_body() {
    // Arrange
    let recorded = Recorded::default();
    let client = spawn_chain_service(well_behaved_service(recorded.clone())).await;

    // Act
    let key = client.address_from_seed(&[0x07], "correct horse battery staple").await.unwrap();

    // Assert
    assert_eq!(key, vec![0x02, 0xa1, 0xb2, 0xc3]);
    assert_eq!(recorded.take()[0].2, json!({ "seedPhrase": "correct horse battery staple" }));
}

#[tokio::test]
async fn empty_address_is_rejected() {
    // Arrange
    let router = Router::new()
        .route("/multi-sig/deploy", post(|| async { Json(json!({ "address": "" })) }));
    let client = spawn_chain_service(router).await;

    // Act
    let result = client.deploy_multisig(&[0x01], &[vec![0xa1]], 1).await;

    // Assert
    assert!(matches!(result, Err(ChainClientError::EmptyAddress)));
}

#[tokio::test]
async fn malformed_response_is_a_decode_error() {
    // Arrange
    let router = Router::new()
        .route("/salaries/deploy", post(|| async { Json(json!({ "error": "reverted" })) }));
    let client = spawn_chain_service(router).await;

    // Act
    let result = client.deploy_payroll_contract(&[0x01], &[0x0a]).await;

    // Assert
    assert!(matches!(result, Err(ChainClientError::Decode(_))));
}

#[tokio::test]
async fn non_success_status_keeps_the_body() {
    // Arrange
    let router = Router::new().route(
        "/multi-sig/deploy",
        post(|| async { (StatusCode::BAD_GATEWAY, "node unavailable") }),
    );
    let client = spawn_chain_service(router).await;

    // Act
    let result = client.deploy_multisig(&[0x01], &[vec![0xa1]], 1).await;

    // Assert
    match result {
        Err(ChainClientError::Status { status, body }) => {
            assert_eq!(status, 502);
            assert_eq!(body, "node unavailable");
        },
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    // Arrange
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpChainClient::builder()
        .host(format!("http://{addr}").parse().unwrap())
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    // Act
    let result = client.deploy_multisig(&[0x01], &[vec![0xa1]], 1).await;

    // Assert
    assert!(matches!(result, Err(ChainClientError::Transport(_))));
}
