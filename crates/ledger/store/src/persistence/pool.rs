mod error;

pub use self::error::PoolError;

use core::num::NonZeroUsize;

use diesel::ConnectionError;
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{
        AsyncDieselConnectionManager, ManagerConfig,
        deadpool::{Object, Pool},
    },
};
use rustls::{ClientConfig, RootCertStore};
use rustls_native_certs::CertificateResult;
use tokio::task;
use tokio_postgres_rustls::MakeRustlsConnect;

/// Deadpool managed pool of async PostgreSQL connections.
pub type DbPool = Pool<AsyncPgConnection>;

/// A pooled connection, returned to the pool on drop.
pub type DbConn = Object<AsyncPgConnection>;

/// Builds a connection pool of at most `max_size` connections for the ledger database.
///
/// Connections negotiate TLS against the platform's native root certificates when the server
/// offers it.
///
/// # Errors
///
/// Fails when the native certificates cannot be loaded or the pool cannot be built.
#[tracing::instrument(skip(url), fields(max_size = max_size.get()))]
pub async fn establish_pool<U>(url: U, max_size: NonZeroUsize) -> Result<DbPool, PoolError>
where
    String: From<U>,
{
    let tls = task::spawn_blocking(native_tls_connector).await??;

    let mut manager_config = ManagerConfig::default();
    manager_config.custom_setup = Box::new(move |url: &str| {
        let tls = tls.clone();
        let url = url.to_owned();
        Box::pin(async move {
            let (client, conn) = tokio_postgres::connect(&url, tls)
                .await
                .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    tracing::error!(error = %e, "postgres connection closed with error");
                }
            });

            AsyncPgConnection::try_from(client).await
        })
    });

    let manager =
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(url, manager_config);

    Pool::builder(manager).max_size(max_size.get()).build().map_err(From::from)
}

fn native_tls_connector() -> Result<MakeRustlsConnect, rustls::Error> {
    let mut roots = RootCertStore::empty();
    let CertificateResult { certs, errors, .. } = rustls_native_certs::load_native_certs();

    if !errors.is_empty() {
        tracing::warn!(count = errors.len(), "some native certificates could not be loaded");
    }

    for cert in certs {
        roots.add(cert)?;
    }

    let config = ClientConfig::builder().with_root_certificates(roots).with_no_client_auth();

    Ok(MakeRustlsConnect::new(config))
}
