//! Read side: filtered, paginated listing and single-record lookup.

use charter_db::queries::contracts;
use charter_types::{Contract, ContractId, ContractPage};
use tracing::debug;

use crate::config::QueryConfig;
use crate::error::Result;
use crate::validation::{self, ListParams, ListQuery};
use crate::SharedDb;

/// Translates untrusted list requests into bounded store queries.
#[derive(Clone)]
pub struct QueryService {
    db: SharedDb,
    bounds: QueryConfig,
}

impl QueryService {
    pub fn new(db: SharedDb, bounds: QueryConfig) -> Self {
        Self { db, bounds }
    }

    /// Validate raw parameters, then list.
    pub async fn list(&self, params: &ListParams) -> Result<ContractPage> {
        let query = validation::list_query(params, &self.bounds)?;
        self.find(&query).await
    }

    /// List with an already-validated query.
    pub async fn find(&self, query: &ListQuery) -> Result<ContractPage> {
        debug!(
            "Listing contracts page={} limit={} filter={:?}",
            query.page, query.limit, query.filter
        );
        let (results, total) = {
            let db = self.db.lock().await;
            contracts::find_page(&db, &query.filter, query.page, query.limit)?
        };
        Ok(ContractPage {
            total,
            page: query.page,
            limit: query.limit,
            results,
        })
    }

    pub async fn get(&self, id: &ContractId) -> Result<Contract> {
        let db = self.db.lock().await;
        Ok(contracts::get(&db, id)?)
    }
}
