//! integration tests for the transaction lifecycle of block-accounting-engine

use std::sync::Arc;

use block_accounting_domain::{TransactionId, participant::User, tx::TransactionStatus};
use block_accounting_engine::{
    DeploymentRuntimeConfig, EngineError, LedgerEngine, MAX_PAGE_SIZE, Started,
    request::{CreateTransactionRequest, ListTransactionsRequest},
};
use block_accounting_test_utils::{OrgFixture, StubChainClient};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn start_engine(fixture: &OrgFixture) -> LedgerEngine<Started> {
    let store = Arc::new(fixture.store().clone());

    LedgerEngine::new(store.clone(), store, Arc::new(StubChainClient::new()))
        .start_deployment_runtime(DeploymentRuntimeConfig::default())
}

fn tx_request(amount: Decimal) -> CreateTransactionRequest {
    CreateTransactionRequest::builder()
        .description("supplier invoice".into())
        .amount(amount)
        .to_addr(vec![0x0a, 0xbc, 0xde])
        .build()
        .unwrap()
}

async fn create_txs(
    engine: &LedgerEngine<Started>,
    fixture: &OrgFixture,
    caller: &User,
    count: usize,
) {
    for _ in 0..count {
        engine
            .transactions()
            .create(caller, fixture.organization_id(), tx_request(dec!(1)))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn confirm_then_cancel_flips_terminal_timestamps() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().name("U1").admin(true).call().await;
    let engine = start_engine(&fixture);
    let org = fixture.organization_id();

    let tx = engine.transactions().create(&admin, org, tx_request(dec!(10.5))).await.unwrap();

    assert_eq!(tx.status(), TransactionStatus::Pending);
    assert_eq!(tx.created_by(), admin.id());
    assert_eq!(tx.amount(), dec!(10.5));

    // Act
    let confirmed = engine.transactions().confirm(&admin, org, tx.id()).await.unwrap();
    let cancelled = engine.transactions().cancel(&admin, org, tx.id()).await.unwrap();

    // Assert
    assert!(confirmed.confirmed_at().is_some());
    assert!(confirmed.cancelled_at().is_none());
    assert_eq!(confirmed.status(), TransactionStatus::Confirmed);

    assert!(cancelled.confirmed_at().is_none());
    assert!(cancelled.cancelled_at().is_some());
    assert_eq!(cancelled.status(), TransactionStatus::Cancelled);
}

#[tokio::test]
async fn repeated_flips_never_set_both_timestamps() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let engine = start_engine(&fixture);
    let org = fixture.organization_id();

    let tx = engine.transactions().create(&admin, org, tx_request(dec!(3))).await.unwrap();

    // Act & Assert
    for round in 0..6 {
        let tx = if round % 2 == 0 {
            engine.transactions().cancel(&admin, org, tx.id()).await.unwrap()
        } else {
            engine.transactions().confirm(&admin, org, tx.id()).await.unwrap()
        };

        assert!(tx.confirmed_at().is_none() || tx.cancelled_at().is_none());
        assert!(tx.confirmed_at().is_some() || tx.cancelled_at().is_some());
    }
}

#[tokio::test]
async fn confirm_and_cancel_require_an_active_admin_of_the_organization() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let member = fixture.user().name("member").call().await;
    let inactive_admin = fixture.user().name("dormant").admin(true).active(false).call().await;

    let other_org = OrgFixture::with_store(fixture.store().clone());
    let foreign_admin = other_org.user().name("outsider").admin(true).call().await;

    let engine = start_engine(&fixture);
    let org = fixture.organization_id();

    let tx = engine.transactions().create(&admin, org, tx_request(dec!(1))).await.unwrap();

    // Act & Assert
    for caller in [&member, &inactive_admin, &foreign_admin] {
        let confirm = engine.transactions().confirm(caller, org, tx.id()).await;
        let cancel = engine.transactions().cancel(caller, org, tx.id()).await;

        assert!(matches!(confirm, Err(EngineError::Unauthorized(_))), "{}", caller.name());
        assert!(matches!(cancel, Err(EngineError::Unauthorized(_))), "{}", caller.name());
    }

    let create = engine.transactions().create(&inactive_admin, org, tx_request(dec!(1))).await;
    assert!(matches!(create, Err(EngineError::Unauthorized(_))));
}

#[tokio::test]
async fn confirm_of_unknown_transaction_is_not_found() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let engine = start_engine(&fixture);

    // Act
    let result = engine
        .transactions()
        .confirm(&admin, fixture.organization_id(), TransactionId::new_v7())
        .await;

    // Assert
    assert!(matches!(result, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn page_size_is_clamped_and_cursor_walks_every_row() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let engine = start_engine(&fixture);
    let org = fixture.organization_id();

    create_txs(&engine, &fixture, &admin, 60).await;

    // Act
    let zero = engine
        .transactions()
        .list(&admin, org, ListTransactionsRequest::builder().limit(0).build())
        .await
        .unwrap();
    let huge = engine
        .transactions()
        .list(&admin, org, ListTransactionsRequest::builder().limit(500).build())
        .await
        .unwrap();

    let next = engine
        .transactions()
        .list(
            &admin,
            org,
            ListTransactionsRequest::builder()
                .limit(500)
                .maybe_cursor(huge.next_cursor().map(str::to_owned))
                .build(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(zero.txs().len(), MAX_PAGE_SIZE as usize);
    assert!(zero.next_cursor().is_some());

    assert_eq!(huge.txs().len(), MAX_PAGE_SIZE as usize);
    assert!(huge.next_cursor().is_some());

    assert_eq!(next.txs().len(), 10);
    assert!(next.next_cursor().is_none());

    let last_of_first = huge.txs().last().unwrap().id();
    assert!(next.txs().iter().all(|tx| tx.id() > last_of_first));
}

#[tokio::test]
async fn exactly_one_default_page_of_rows_has_no_cursor() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let engine = start_engine(&fixture);

    create_txs(&engine, &fixture, &admin, MAX_PAGE_SIZE as usize).await;

    // Act
    let page = engine
        .transactions()
        .list(
            &admin,
            fixture.organization_id(),
            ListTransactionsRequest::builder().limit(0).build(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(page.txs().len(), MAX_PAGE_SIZE as usize);
    assert!(page.next_cursor().is_none());
}

#[tokio::test]
async fn full_last_page_has_no_cursor() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let engine = start_engine(&fixture);

    create_txs(&engine, &fixture, &admin, 10).await;

    // Act
    let page = engine
        .transactions()
        .list(
            &admin,
            fixture.organization_id(),
            ListTransactionsRequest::builder().limit(10).build(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(page.txs().len(), 10);
    assert!(page.next_cursor().is_none());
}

#[tokio::test]
async fn status_filters_select_matching_transactions() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let engine = start_engine(&fixture);
    let org = fixture.organization_id();

    let confirmed = engine.transactions().create(&admin, org, tx_request(dec!(1))).await.unwrap();
    let pending = engine.transactions().create(&admin, org, tx_request(dec!(2))).await.unwrap();
    engine.transactions().confirm(&admin, org, confirmed.id()).await.unwrap();

    // Act
    let pending_page = engine
        .transactions()
        .list(&admin, org, ListTransactionsRequest::builder().pending(true).build())
        .await
        .unwrap();
    let confirmed_page = engine
        .transactions()
        .list(&admin, org, ListTransactionsRequest::builder().confirmed(true).build())
        .await
        .unwrap();

    // Assert
    let pending_ids: Vec<_> = pending_page.txs().iter().map(|tx| tx.id()).collect();
    let confirmed_ids: Vec<_> = confirmed_page.txs().iter().map(|tx| tx.id()).collect();

    assert_eq!(pending_ids, vec![pending.id()]);
    assert_eq!(confirmed_ids, vec![confirmed.id()]);
}

#[tokio::test]
async fn corrupted_cursor_is_rejected() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let engine = start_engine(&fixture);

    // Act
    let result = engine
        .transactions()
        .list(
            &admin,
            fixture.organization_id(),
            ListTransactionsRequest::builder().cursor("not-a-cursor".into()).build(),
        )
        .await;

    // Assert
    assert!(matches!(result, Err(EngineError::CursorDecode(_))));
}
