//! List filters shared by the store and by client-side reconciliation.
//!
//! Both sides decide "does this record match the active filter" with the
//! same code, so a server-side search and a client-side relevance check
//! never disagree about case folding or id detection.

use crate::contract::{Contract, ContractId, ContractStatus};

/// Case folding used for client-name search.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// Interpreted free-text search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchTerm {
    /// The term has the identifier shape: match ids exactly.
    Id(ContractId),
    /// Anything else: case-insensitive substring of `client`. Stored folded.
    Client(String),
}

impl SearchTerm {
    /// Interpret a raw search string. Blank input means "no search".
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match ContractId::parse(trimmed) {
            Ok(id) => Some(SearchTerm::Id(id)),
            Err(_) => Some(SearchTerm::Client(fold_case(trimmed))),
        }
    }

    pub fn matches(&self, contract: &Contract) -> bool {
        match self {
            SearchTerm::Id(id) => contract.id == *id,
            SearchTerm::Client(needle) => fold_case(&contract.client).contains(needle.as_str()),
        }
    }
}

/// Validated filter for listing contracts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractFilter {
    pub status: Option<ContractStatus>,
    pub search: Option<SearchTerm>,
}

impl ContractFilter {
    pub fn new(status: Option<ContractStatus>, search_term: Option<&str>) -> Self {
        Self {
            status,
            search: search_term.and_then(SearchTerm::parse),
        }
    }

    /// True if no constraint is active.
    pub fn is_unfiltered(&self) -> bool {
        self.status.is_none() && self.search.is_none()
    }

    /// Check if a record satisfies every active constraint.
    pub fn matches(&self, contract: &Contract) -> bool {
        if let Some(status) = self.status {
            if contract.status != status {
                return false;
            }
        }
        if let Some(ref search) = self.search {
            if !search.matches(contract) {
                return false;
            }
        }
        true
    }
}
