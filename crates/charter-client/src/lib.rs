//! charter-client: the client half of Charter.
//!
//! Holds a cached page of contracts behind the user's filters and keeps it
//! current from WebSocket pushes, refetching only when an event could
//! change what the page shows.

pub mod api;
pub mod events;
pub mod filters;
pub mod reconcile;
pub mod store;

pub use api::{decode_event_frame, ClientError, ContractsApi, HttpContractsApi};
pub use events::EventStream;
pub use filters::{FilterUpdate, Filters};
pub use reconcile::{reconcile, should_refetch, Reconciliation, UpdatePolicy};
pub use store::{ContractStore, ContractsState};
