//! Integration test harness for Charter.
//!
//! The tests under `tests/` run the real router on a loopback port and
//! drive client stores against the real services.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p charter-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use charter_client::api::Result as ClientResult;
use charter_client::{ClientError, ContractsApi, Filters};
use charter_daemon::config::DaemonConfig;
use charter_daemon::error::ServiceError;
use charter_daemon::validation::ListQuery;
use charter_daemon::{build_router, DaemonState};
use charter_types::{Contract, ContractId, ContractPage, ContractPatch, DeleteResult, NewContract};

/// Daemon state over a fresh in-memory database.
pub fn memory_state() -> charter_db::Result<Arc<DaemonState>> {
    let conn = charter_db::open_memory()?;
    Ok(Arc::new(DaemonState::new(conn, DaemonConfig::default())))
}

/// Serve the full router on `127.0.0.1:0` in the background.
pub async fn spawn_daemon(state: Arc<DaemonState>) -> std::io::Result<SocketAddr> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}

/// [`ContractsApi`] that calls the daemon services directly.
pub struct InProcessApi {
    state: Arc<DaemonState>,
}

impl InProcessApi {
    pub fn new(state: Arc<DaemonState>) -> Self {
        Self { state }
    }
}

fn client_error(e: ServiceError) -> ClientError {
    ClientError::Api {
        status: e.status().as_u16(),
        message: e.public_message(),
    }
}

#[async_trait]
impl ContractsApi for InProcessApi {
    async fn list(&self, filters: &Filters) -> ClientResult<ContractPage> {
        let query = ListQuery {
            filter: filters.to_filter(),
            page: filters.page,
            limit: self.state.config.query.default_limit,
        };
        self.state.queries.find(&query).await.map_err(client_error)
    }

    async fn get(&self, id: &ContractId) -> ClientResult<Contract> {
        self.state.queries.get(id).await.map_err(client_error)
    }

    async fn create(&self, new: &NewContract) -> ClientResult<Contract> {
        self.state
            .mutations
            .create(new.clone())
            .await
            .map_err(client_error)
    }

    async fn update(&self, id: &ContractId, patch: &ContractPatch) -> ClientResult<Contract> {
        self.state
            .mutations
            .update(id, patch.clone())
            .await
            .map_err(client_error)
    }

    async fn delete(&self, id: &ContractId) -> ClientResult<DeleteResult> {
        self.state.mutations.delete(id).await.map_err(client_error)
    }
}
