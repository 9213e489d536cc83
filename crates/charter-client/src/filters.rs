//! The view a client is currently looking at.

use charter_types::{ContractFilter, ContractStatus};

/// Active filters plus the current page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filters {
    pub status: Option<ContractStatus>,
    pub search_term: Option<String>,
    /// 1-based.
    pub page: u32,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            status: None,
            search_term: None,
            page: 1,
        }
    }
}

impl Filters {
    /// The record predicate these filters select. Shared with the server so
    /// both sides agree on id-shaped search terms and case folding.
    pub fn to_filter(&self) -> ContractFilter {
        ContractFilter::new(self.status, self.search_term.as_deref())
    }

    /// Query string pairs for `GET /contracts`. Unset filters are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(term) = self.search_term.as_deref().map(str::trim) {
            if !term.is_empty() {
                pairs.push(("searchTerm", term.to_string()));
            }
        }
        pairs.push(("page", self.page.to_string()));
        pairs
    }
}

/// Partial change to [`Filters`]. `None` leaves a field as it is;
/// `Some(None)` clears an optional filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    pub status: Option<Option<ContractStatus>>,
    pub search_term: Option<Option<String>>,
    pub page: Option<u32>,
}

impl FilterUpdate {
    pub fn status(status: Option<ContractStatus>) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn search_term(term: Option<&str>) -> Self {
        Self {
            search_term: Some(term.map(str::to_string)),
            ..Self::default()
        }
    }

    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Merge into `filters`. Pages below 1 are clamped to 1.
    pub fn apply(self, filters: &mut Filters) {
        if let Some(status) = self.status {
            filters.status = status;
        }
        if let Some(term) = self.search_term {
            filters.search_term = term;
        }
        if let Some(page) = self.page {
            filters.page = page.max(1);
        }
    }
}
