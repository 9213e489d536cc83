//! # charter-types
//!
//! Shared domain and wire types used across the Charter workspace.
//! The JSON shapes here are the contract between the daemon's HTTP and
//! WebSocket surfaces and every client.

pub mod api;
pub mod contract;
pub mod events;
pub mod query;

pub use api::{ContractPage, DeleteResult, ErrorBody, UpdateResult};
pub use contract::{Contract, ContractId, ContractPatch, ContractStatus, NewContract};
pub use events::{ContractEvent, DeletedContract};
pub use query::{fold_case, ContractFilter, SearchTerm};

/// Minimum length of `client` and `title`, in characters.
pub const MIN_NAME_LEN: usize = 3;

/// Maximum length of `client` and `title`, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Page size used when a query does not specify one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Errors raised while parsing domain values from untrusted strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// Not a canonical UUID v4 string.
    #[error("invalid contract id: {0}")]
    InvalidId(String),

    /// Not one of the known contract statuses.
    #[error("invalid contract status: {0}")]
    InvalidStatus(String),
}
