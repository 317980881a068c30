#![allow(missing_docs)]

pub mod config;

mod error;
mod payload;
mod routes;

use std::sync::Arc;

use axum::{Router, routing};
use block_accounting_engine::{LedgerEngine, Started};
use bon::Builder;
use dissolve_derive::Dissolve;

/// Header carrying the id of the authenticated user.
pub const USER_ID_HEADER: &str = "x-user-id";

pub fn create_router(app: App) -> Router {
    Router::new()
        .route("/health", routing::get(routes::health))
        .nest("/api/v1/organizations/{organization_id}", organization_router())
        .with_state(app)
}

fn organization_router() -> Router<App> {
    Router::new()
        .route("/transactions/create", routing::post(routes::create_transaction))
        .route("/transactions/list", routing::post(routes::list_transactions))
        .route("/transactions/{tx_id}/status", routing::post(routes::update_transaction_status))
        .route("/multisigs/create", routing::post(routes::new_multisig))
        .route("/multisigs/list", routing::post(routes::list_multisigs))
        .route("/multisigs/{multisig_id}/confirm", routing::post(routes::confirm_multisig))
        .route("/multisigs/{multisig_id}/quorum", routing::get(routes::get_quorum))
        .route("/payrolls/create", routing::post(routes::payroll_deploy))
        .route("/payrolls/list", routing::post(routes::list_payrolls))
        .route("/payrolls/set-salary", routing::post(routes::set_salary))
        .route("/jobs/{job_id}", routing::get(routes::get_job_status))
        .route("/pub-key", routing::get(routes::get_pub_key))
}

#[derive(Clone, Builder, Dissolve)]
pub struct App {
    engine: Arc<LedgerEngine<Started>>,
}
