//! Query and mutation services.
//!
//! Both hold the shared connection; only mutations publish events.

pub mod mutation;
pub mod query;

pub use mutation::MutationService;
pub use query::QueryService;
