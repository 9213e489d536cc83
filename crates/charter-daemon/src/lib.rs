//! charter-daemon: contract record service.
//!
//! Serves the contract CRUD API over HTTP and pushes every committed
//! mutation to connected WebSocket clients.

pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod services;
pub mod validation;
pub mod ws;

use std::sync::Arc;

use crate::config::DaemonConfig;
use crate::events::EventBus;
use crate::services::{MutationService, QueryService};

pub use crate::http::build_router;

/// The single store connection, shared by every request.
pub type SharedDb = Arc<tokio::sync::Mutex<rusqlite::Connection>>;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Database connection.
    pub db: SharedDb,
    /// Configuration.
    pub config: DaemonConfig,
    /// Event bus feeding WebSocket sessions.
    pub event_bus: EventBus,
    pub queries: QueryService,
    pub mutations: MutationService,
}

impl DaemonState {
    /// Wire services around an open connection and a fresh event bus.
    pub fn new(conn: rusqlite::Connection, config: DaemonConfig) -> Self {
        let event_bus = EventBus::init(config.events.capacity);
        Self::with_bus(conn, config, event_bus)
    }

    /// Same as [`DaemonState::new`] but with a caller-owned bus.
    pub fn with_bus(conn: rusqlite::Connection, config: DaemonConfig, event_bus: EventBus) -> Self {
        let db: SharedDb = Arc::new(tokio::sync::Mutex::new(conn));
        let queries = QueryService::new(db.clone(), config.query.clone());
        let mutations = MutationService::new(db.clone(), Arc::new(event_bus.clone()));
        Self {
            db,
            config,
            event_bus,
            queries,
            mutations,
        }
    }
}
