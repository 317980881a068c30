//! integration tests for asynchronous multisig and payroll provisioning

use core::{
    num::{NonZeroU32, NonZeroUsize},
    time::Duration,
};

use std::sync::Arc;

use block_accounting_domain::{
    MultisigId, ParticipantId, PayrollId, Timestamps,
    multisig::{Multisig, Payroll},
    participant::User,
};
use block_accounting_engine::{
    DeploymentRuntimeConfig, EngineError, JobKind, JobState, LedgerEngine, Started, Stopped,
    TaskLimits,
    request::{
        ListMultisigsRequest, ListPayrollsRequest, NewMultisigRequest, PayrollDeployRequest,
        SetSalaryRequest,
    },
};
use block_accounting_store::LedgerStore;
use block_accounting_test_utils::{
    ChainCall, OrgFixture, StubChainClient, StubResponse, random_bytes,
};
use chrono::Utc;

fn start_engine(
    fixture: &OrgFixture,
    chain: &StubChainClient,
    config: DeploymentRuntimeConfig,
) -> LedgerEngine<Started> {
    let store = Arc::new(fixture.store().clone());

    LedgerEngine::new(store.clone(), store, Arc::new(chain.clone()))
        .start_deployment_runtime(config)
}

fn multisig_request(owners: &[&User], confirmations: u32) -> NewMultisigRequest {
    NewMultisigRequest::builder()
        .title("treasury".into())
        .owners(owners.iter().map(|owner| owner.public_key().to_vec()).collect())
        .confirmations(confirmations)
        .build()
        .unwrap()
}

async fn seeded_multisig(fixture: &OrgFixture, owner: &User, address: Vec<u8>) -> Multisig {
    let multisig = Multisig::builder()
        .id(MultisigId::new_v7())
        .organization_id(fixture.organization_id())
        .title("treasury".into())
        .address(address)
        .owners(vec![owner.id()])
        .confirmations_required(NonZeroU32::MIN)
        .timestamps(Timestamps::created(Utc::now()))
        .build();

    fixture.store().add_multisig(&multisig).await.unwrap();
    multisig
}

async fn seeded_payroll(fixture: &OrgFixture, multisig: &Multisig) -> Payroll {
    let payroll = Payroll::builder()
        .id(PayrollId::new_v7())
        .title("salaries".into())
        .address(random_bytes(20))
        .organization_id(fixture.organization_id())
        .multisig_id(multisig.id())
        .timestamps(Timestamps::created(Utc::now()))
        .build();

    fixture.store().add_payroll(&payroll).await.unwrap();
    payroll
}

async fn multisigs(
    engine: &LedgerEngine<Stopped>,
    caller: &User,
    fixture: &OrgFixture,
) -> Vec<Multisig> {
    engine
        .deployments()
        .list_multisigs(caller, fixture.organization_id(), ListMultisigsRequest::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn multisig_is_persisted_once_deployed() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().name("admin").admin(true).call().await;
    let bob = fixture.user().name("bob").call().await;
    let chain = StubChainClient::new();
    chain.push_multisig_response(StubResponse::Address(vec![0xee; 20]));

    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());
    let org = fixture.organization_id();

    // Act
    let ticket = engine
        .deployments()
        .new_multisig(&admin, org, multisig_request(&[&bob, &admin], 2))
        .await
        .unwrap();

    let engine = engine.stop_deployment_runtime().await.unwrap();

    // Assert
    let status = engine.deployments().job_status(&admin, org, ticket.job_id()).await.unwrap();
    assert_eq!(status.state(), &JobState::Succeeded);
    assert_eq!(status.kind(), JobKind::MultisigDeployment);
    assert!(!status.stalled());

    let multisigs = multisigs(&engine, &admin, &fixture).await;
    assert_eq!(multisigs.len(), 1);
    assert_eq!(multisigs[0].address(), &[0xee; 20]);
    assert_eq!(multisigs[0].owners(), &[bob.id(), admin.id()]);
    assert_eq!(multisigs[0].confirmations_required().get(), 2);

    assert_eq!(chain.calls(), vec![ChainCall::DeployMultisig {
        seed: admin.seed().to_vec(),
        owners: vec![bob.public_key().to_vec(), admin.public_key().to_vec()],
        confirmations: 2,
    }]);
}

#[tokio::test]
async fn zero_confirmations_are_raised_to_one() {
    // Arrange
    let fixture = OrgFixture::new();
    let owner = fixture.user().owner(true).call().await;
    let chain = StubChainClient::new();
    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());

    // Act
    engine
        .deployments()
        .new_multisig(&owner, fixture.organization_id(), multisig_request(&[&owner], 0))
        .await
        .unwrap();

    let engine = engine.stop_deployment_runtime().await.unwrap();

    // Assert
    let multisigs = multisigs(&engine, &owner, &fixture).await;
    assert_eq!(multisigs[0].confirmations_required(), NonZeroU32::MIN);
    assert!(matches!(
        chain.calls().as_slice(),
        [ChainCall::DeployMultisig { confirmations: 1, .. }]
    ));
}

#[tokio::test]
async fn owners_must_be_active_users_of_the_organization() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let dormant = fixture.user().name("dormant").active(false).call().await;

    let other_org = OrgFixture::with_store(fixture.store().clone());
    let outsider = other_org.user().name("outsider").call().await;

    let chain = StubChainClient::new();
    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());
    let org = fixture.organization_id();

    // Act
    let inactive = engine
        .deployments()
        .new_multisig(&admin, org, multisig_request(&[&admin, &dormant], 1))
        .await;
    let foreign = engine
        .deployments()
        .new_multisig(&admin, org, multisig_request(&[&outsider], 1))
        .await;

    // Assert
    assert!(matches!(inactive, Err(EngineError::InvalidOwnerSet(_))));
    assert!(matches!(foreign, Err(EngineError::InvalidOwnerSet(_))));

    let engine = engine.stop_deployment_runtime().await.unwrap();
    assert!(chain.calls().is_empty());
    assert!(multisigs(&engine, &admin, &fixture).await.is_empty());
}

#[tokio::test]
async fn plain_members_cannot_deploy() {
    // Arrange
    let fixture = OrgFixture::new();
    let member = fixture.user().call().await;
    let chain = StubChainClient::new();
    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());

    // Act
    let result = engine
        .deployments()
        .new_multisig(&member, fixture.organization_id(), multisig_request(&[&member], 1))
        .await;

    // Assert
    assert!(matches!(result, Err(EngineError::Unauthorized(_))));
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn failed_deployment_leaves_no_row() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let chain = StubChainClient::new();
    chain.push_multisig_response(StubResponse::EmptyAddress);
    chain.push_multisig_response(StubResponse::Malformed);

    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());
    let org = fixture.organization_id();

    // Act
    let empty = engine
        .deployments()
        .new_multisig(&admin, org, multisig_request(&[&admin], 1))
        .await
        .unwrap();
    let malformed = engine
        .deployments()
        .new_multisig(&admin, org, multisig_request(&[&admin], 1))
        .await
        .unwrap();

    let engine = engine.stop_deployment_runtime().await.unwrap();

    // Assert
    for ticket in [empty, malformed] {
        let status = engine.deployments().job_status(&admin, org, ticket.job_id()).await.unwrap();
        assert!(matches!(status.state(), JobState::Failed { reason } if !reason.is_empty()));
    }

    assert!(multisigs(&engine, &admin, &fixture).await.is_empty());
}

#[tokio::test]
async fn payroll_contract_is_authorized_by_the_multisig() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let multisig = seeded_multisig(&fixture, &admin, vec![0xaa; 20]).await;
    let chain = StubChainClient::new();
    chain.push_payroll_response(StubResponse::Address(vec![0xcc; 20]));

    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());
    let org = fixture.organization_id();

    let request = PayrollDeployRequest::builder()
        .multisig_id(multisig.id())
        .first_admin(admin.id())
        .title("monthly".into())
        .build()
        .unwrap();

    // Act
    let ticket = engine.deployments().payroll_deploy(&admin, org, request).await.unwrap();
    let engine = engine.stop_deployment_runtime().await.unwrap();

    // Assert
    let status = engine.deployments().job_status(&admin, org, ticket.job_id()).await.unwrap();
    assert_eq!(status.state(), &JobState::Succeeded);

    let payrolls = engine
        .deployments()
        .list_payrolls(
            &admin,
            org,
            ListPayrollsRequest::builder().multisig_id(multisig.id()).build(),
        )
        .await
        .unwrap();

    assert_eq!(payrolls.len(), 1);
    assert_eq!(payrolls[0].address(), &[0xcc; 20]);
    assert_eq!(payrolls[0].title(), "monthly");

    assert_eq!(chain.calls(), vec![ChainCall::DeployPayroll {
        seed: admin.seed().to_vec(),
        authorized_wallet: vec![0xaa; 20],
    }]);
}

#[tokio::test]
async fn failed_payroll_deployment_leaves_no_row() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let multisig = seeded_multisig(&fixture, &admin, vec![0xaa; 20]).await;
    let chain = StubChainClient::new();
    chain.push_payroll_response(StubResponse::EmptyAddress);
    chain.push_payroll_response(StubResponse::Malformed);

    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());
    let org = fixture.organization_id();

    let request = || {
        PayrollDeployRequest::builder()
            .multisig_id(multisig.id())
            .first_admin(admin.id())
            .title("monthly".into())
            .build()
            .unwrap()
    };

    // Act
    let empty = engine.deployments().payroll_deploy(&admin, org, request()).await.unwrap();
    let malformed = engine.deployments().payroll_deploy(&admin, org, request()).await.unwrap();

    let engine = engine.stop_deployment_runtime().await.unwrap();

    // Assert
    for ticket in [empty, malformed] {
        let status = engine.deployments().job_status(&admin, org, ticket.job_id()).await.unwrap();
        assert_eq!(status.kind(), JobKind::PayrollDeployment);
        assert!(matches!(status.state(), JobState::Failed { reason } if !reason.is_empty()));
    }

    let payrolls = engine
        .deployments()
        .list_payrolls(&admin, org, ListPayrollsRequest::default())
        .await
        .unwrap();

    assert!(payrolls.is_empty());
    assert_eq!(chain.calls().len(), 2);
}

#[tokio::test]
async fn payroll_deploy_preconditions_are_checked_before_queueing() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().name("admin").admin(true).call().await;
    let other_admin = fixture.user().name("other").admin(true).call().await;
    let undeployed = seeded_multisig(&fixture, &admin, Vec::new()).await;
    let deployed = seeded_multisig(&fixture, &admin, random_bytes(20)).await;

    let chain = StubChainClient::new();
    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());
    let org = fixture.organization_id();

    let request = |multisig_id: MultisigId, first_admin: ParticipantId| {
        PayrollDeployRequest::builder()
            .multisig_id(multisig_id)
            .first_admin(first_admin)
            .title("monthly".into())
            .build()
            .unwrap()
    };

    // Act
    let not_first_admin = engine
        .deployments()
        .payroll_deploy(&other_admin, org, request(deployed.id(), admin.id()))
        .await;
    let no_address = engine
        .deployments()
        .payroll_deploy(&admin, org, request(undeployed.id(), admin.id()))
        .await;
    let missing = engine
        .deployments()
        .payroll_deploy(&admin, org, request(MultisigId::new_v7(), admin.id()))
        .await;

    // Assert
    assert!(matches!(not_first_admin, Err(EngineError::Unauthorized(_))));
    assert!(matches!(no_address, Err(EngineError::EmptyAddress(_))));
    assert!(matches!(missing, Err(EngineError::NotFound(_))));

    engine.stop_deployment_runtime().await.unwrap();
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn set_salary_targets_the_employee_wallet() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let employee = fixture.employee().name("bob").wallet_address(vec![0xbb; 20]).call().await;
    let multisig = seeded_multisig(&fixture, &admin, vec![0xaa; 20]).await;
    let payroll = seeded_payroll(&fixture, &multisig).await;

    let chain = StubChainClient::new();
    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());
    let org = fixture.organization_id();

    let request = SetSalaryRequest::builder()
        .payroll_id(payroll.id())
        .employee_id(employee.id())
        .salary(4_200)
        .build();

    // Act
    let ticket = engine.deployments().set_salary(&admin, org, request).await.unwrap();
    let engine = engine.stop_deployment_runtime().await.unwrap();

    // Assert
    let status = engine.deployments().job_status(&admin, org, ticket.job_id()).await.unwrap();
    assert_eq!(status.state(), &JobState::Succeeded);
    assert_eq!(status.kind(), JobKind::SetSalary);

    let calls = chain.calls();
    let [ChainCall::SetSalary { seed, call }] = calls.as_slice() else {
        panic!("expected a single set-salary call, got {calls:?}");
    };

    assert_eq!(seed.as_slice(), admin.seed());
    assert_eq!(call.multisig_address(), &[0xaa; 20]);
    assert_eq!(call.contract_address(), payroll.address());
    assert_eq!(call.employee_address(), &[0xbb; 20]);
    assert_eq!(call.salary(), 4_200);
}

#[tokio::test]
async fn set_salary_requires_a_wallet_address() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let employee = fixture.employee().wallet_address(Vec::new()).call().await;
    let multisig = seeded_multisig(&fixture, &admin, random_bytes(20)).await;
    let payroll = seeded_payroll(&fixture, &multisig).await;

    let chain = StubChainClient::new();
    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());

    let request = SetSalaryRequest::builder()
        .payroll_id(payroll.id())
        .employee_id(employee.id())
        .salary(1)
        .build();

    // Act
    let result = engine.deployments().set_salary(&admin, fixture.organization_id(), request).await;

    // Assert
    assert!(matches!(result, Err(EngineError::EmptyAddress(_))));
    assert!(chain.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_deployment_is_flagged_as_stalled_but_completes() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let chain = StubChainClient::new().with_delay(Duration::from_secs(90));
    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());
    let org = fixture.organization_id();

    // Act
    let ticket = engine
        .deployments()
        .new_multisig(&admin, org, multisig_request(&[&admin], 1))
        .await
        .unwrap();

    let engine = engine.stop_deployment_runtime().await.unwrap();

    // Assert
    let status = engine.deployments().job_status(&admin, org, ticket.job_id()).await.unwrap();
    assert_eq!(status.state(), &JobState::Succeeded);
    assert!(status.stalled());

    assert_eq!(multisigs(&engine, &admin, &fixture).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn deployment_past_its_deadline_is_abandoned() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let chain = StubChainClient::new().with_delay(Duration::from_secs(60));

    let limits = TaskLimits::builder()
        .timeout(Duration::from_secs(30))
        .stall_after(Duration::from_secs(10))
        .build();
    let config = DeploymentRuntimeConfig::builder().multisig(limits).build();

    let engine = start_engine(&fixture, &chain, config);
    let org = fixture.organization_id();

    // Act
    let ticket = engine
        .deployments()
        .new_multisig(&admin, org, multisig_request(&[&admin], 1))
        .await
        .unwrap();

    let engine = engine.stop_deployment_runtime().await.unwrap();

    // Assert
    let status = engine.deployments().job_status(&admin, org, ticket.job_id()).await.unwrap();
    assert_eq!(status.state(), &JobState::TimedOut);
    assert!(status.stalled());

    assert!(multisigs(&engine, &admin, &fixture).await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn time_waiting_in_the_queue_counts_against_the_limits() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let chain = StubChainClient::new().with_delay(Duration::from_secs(40));

    let limits = TaskLimits::builder()
        .timeout(Duration::from_secs(70))
        .stall_after(Duration::from_secs(60))
        .build();
    let config =
        DeploymentRuntimeConfig::builder().workers(NonZeroUsize::MIN).multisig(limits).build();

    let engine = start_engine(&fixture, &chain, config);
    let org = fixture.organization_id();

    // Act
    let mut tickets = Vec::new();
    for _ in 0..3 {
        let ticket = engine
            .deployments()
            .new_multisig(&admin, org, multisig_request(&[&admin], 1))
            .await
            .unwrap();
        tickets.push(ticket);
    }

    let engine = engine.stop_deployment_runtime().await.unwrap();

    // Assert
    let mut statuses = Vec::new();
    for ticket in &tickets {
        let status = engine.deployments().job_status(&admin, org, ticket.job_id()).await;
        statuses.push(status.unwrap());
    }

    // runs 0s..40s
    assert_eq!(statuses[0].state(), &JobState::Succeeded);
    assert!(!statuses[0].stalled());

    // starts at 40s, flagged at 60s, abandoned at 70s
    assert_eq!(statuses[1].state(), &JobState::TimedOut);
    assert!(statuses[1].stalled());

    // deadline passed before a worker was free
    assert_eq!(statuses[2].state(), &JobState::TimedOut);
    assert!(statuses[2].stalled());

    assert_eq!(chain.calls().len(), 2);
    assert_eq!(multisigs(&engine, &admin, &fixture).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn finished_jobs_are_forgotten_after_the_retention_window() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let chain = StubChainClient::new();

    let config = DeploymentRuntimeConfig::builder().job_retention(Duration::from_secs(60)).build();
    let engine = start_engine(&fixture, &chain, config);
    let org = fixture.organization_id();

    let old = engine
        .deployments()
        .new_multisig(&admin, org, multisig_request(&[&admin], 1))
        .await
        .unwrap();

    loop {
        let status = engine.deployments().job_status(&admin, org, old.job_id()).await.unwrap();
        if status.state().is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    tokio::time::advance(Duration::from_secs(120)).await;

    // Act
    let recent = engine
        .deployments()
        .new_multisig(&admin, org, multisig_request(&[&admin], 1))
        .await
        .unwrap();

    let engine = engine.stop_deployment_runtime().await.unwrap();

    // Assert
    let evicted = engine.deployments().job_status(&admin, org, old.job_id()).await;
    assert!(matches!(evicted, Err(EngineError::NotFound(_))));

    let kept = engine.deployments().job_status(&admin, org, recent.job_id()).await.unwrap();
    assert_eq!(kept.state(), &JobState::Succeeded);

    assert_eq!(multisigs(&engine, &admin, &fixture).await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn full_queue_turns_requests_away() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;
    let chain = StubChainClient::new().with_delay(Duration::from_secs(30));

    let config = DeploymentRuntimeConfig::builder()
        .workers(NonZeroUsize::MIN)
        .queue_capacity(NonZeroUsize::MIN)
        .build();

    let engine = start_engine(&fixture, &chain, config);
    let org = fixture.organization_id();

    let running = engine
        .deployments()
        .new_multisig(&admin, org, multisig_request(&[&admin], 1))
        .await
        .unwrap();

    // wait until the only worker is busy
    loop {
        let status = engine.deployments().job_status(&admin, org, running.job_id()).await.unwrap();
        if status.state() == &JobState::Running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    // Act
    let queued = engine
        .deployments()
        .new_multisig(&admin, org, multisig_request(&[&admin], 1))
        .await;
    let rejected = engine
        .deployments()
        .new_multisig(&admin, org, multisig_request(&[&admin], 1))
        .await;

    // Assert
    assert!(queued.is_ok());
    assert!(matches!(rejected, Err(EngineError::QueueFull)));

    let engine = engine.stop_deployment_runtime().await.unwrap();
    assert_eq!(multisigs(&engine, &admin, &fixture).await.len(), 2);
}

#[tokio::test]
async fn jobs_are_scoped_to_their_organization() {
    // Arrange
    let fixture = OrgFixture::new();
    let admin = fixture.user().admin(true).call().await;

    let other_org = OrgFixture::with_store(fixture.store().clone());
    let outsider = other_org.user().admin(true).call().await;

    let chain = StubChainClient::new();
    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());

    let ticket = engine
        .deployments()
        .new_multisig(&admin, fixture.organization_id(), multisig_request(&[&admin], 1))
        .await
        .unwrap();

    // Act
    let result = engine
        .deployments()
        .job_status(&outsider, other_org.organization_id(), ticket.job_id())
        .await;

    // Assert
    assert!(matches!(result, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn pub_key_is_derived_from_the_caller_credentials() {
    // Arrange
    let fixture = OrgFixture::new();
    let user = fixture.user().mnemonic("abandon ability able".to_owned()).call().await;
    let chain = StubChainClient::new();
    let engine = start_engine(&fixture, &chain, DeploymentRuntimeConfig::default());

    // Act
    let key = engine.deployments().pub_key(&user).await.unwrap();

    chain.push_pub_key_response(StubResponse::Status(502));
    let failure = engine.deployments().pub_key(&user).await;

    // Assert
    assert_eq!(key[0], 0x02);
    assert_eq!(&key[1..], user.seed());
    assert!(matches!(failure, Err(EngineError::ChainTransport(_))));

    assert!(matches!(
        chain.calls().first(),
        Some(ChainCall::AddressFromSeed { seed_phrase, .. })
            if seed_phrase == "abandon ability able"
    ));
}
