//! Client-side cache of the current contract page.

use charter_types::{
    Contract, ContractEvent, ContractId, ContractPatch, DeleteResult, NewContract,
};
use tracing::{debug, warn};

use crate::api::{ClientError, ContractsApi, Result};
use crate::events::EventStream;
use crate::filters::{FilterUpdate, Filters};
use crate::reconcile::{self, Reconciliation, UpdatePolicy};

/// Shown when a refetch fails.
pub const FETCH_FAILED: &str = "Failed to fetch contracts";

/// Everything a list view renders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractsState {
    pub records: Vec<Contract>,
    pub total: u64,
    pub filters: Filters,
    pub loading: bool,
    pub error: Option<String>,
}

impl ContractsState {
    pub fn cached_ids(&self) -> Vec<ContractId> {
        self.records.iter().map(|r| r.id).collect()
    }
}

/// Cached page kept consistent with user navigation and pushed events.
pub struct ContractStore<A> {
    api: A,
    state: ContractsState,
    policy: UpdatePolicy,
}

impl<A: ContractsApi> ContractStore<A> {
    pub fn new(api: A) -> Self {
        Self::with_policy(api, UpdatePolicy::default())
    }

    pub fn with_policy(api: A, policy: UpdatePolicy) -> Self {
        Self {
            api,
            state: ContractsState::default(),
            policy,
        }
    }

    pub fn state(&self) -> &ContractsState {
        &self.state
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Merge a filter change and refetch.
    pub async fn set_filters(&mut self, update: FilterUpdate) {
        update.apply(&mut self.state.filters);
        self.fetch_contracts().await;
    }

    pub async fn set_page(&mut self, page: u32) {
        self.set_filters(FilterUpdate::page(page)).await;
    }

    /// Replace the cached page with a fresh query. On failure the previous
    /// records stay and `error` is set.
    pub async fn fetch_contracts(&mut self) {
        self.state.loading = true;
        self.state.error = None;
        match self.api.list(&self.state.filters).await {
            Ok(page) => {
                debug!("Fetched {} of {} contracts", page.results.len(), page.total);
                self.state.records = page.results;
                self.state.total = page.total;
            }
            Err(e) => {
                warn!("Error fetching contracts: {}", e);
                self.state.error = Some(FETCH_FAILED.to_string());
            }
        }
        self.state.loading = false;
    }

    pub async fn get_contract(&self, id: &ContractId) -> Result<Contract> {
        self.api.get(id).await
    }

    /// The cache is not touched; the resulting `newContract` push does that.
    pub async fn create_contract(&self, new: &NewContract) -> Result<Contract> {
        self.api.create(new).await
    }

    pub async fn update_contract(&self, id: &ContractId, patch: &ContractPatch) -> Result<Contract> {
        self.api.update(id, patch).await
    }

    pub async fn delete_contract(&self, id: &ContractId) -> Result<DeleteResult> {
        self.api.delete(id).await
    }

    /// Apply a pushed event and report what was done.
    pub async fn handle_event(&mut self, event: &ContractEvent) -> Reconciliation {
        let decision = reconcile::reconcile(event, &self.state.filters, &self.state.records, self.policy);
        debug!("{} -> {:?}", event.name(), decision);
        match &decision {
            Reconciliation::Refetch => self.fetch_contracts().await,
            Reconciliation::Replace { index, record } => {
                if let Some(slot) = self.state.records.get_mut(*index) {
                    *slot = record.clone();
                }
            }
            Reconciliation::MoveToFront { index, record } => {
                if *index < self.state.records.len() {
                    self.state.records.remove(*index);
                    self.state.records.insert(0, record.clone());
                }
            }
            Reconciliation::Ignore => {}
        }
        decision
    }

    /// Wait for one pushed event and apply it. `None` once the session has
    /// closed.
    pub async fn apply_next(&mut self, events: &mut EventStream) -> Option<Result<Reconciliation>> {
        let event = match events.next().await? {
            Ok(event) => event,
            Err(e) => return Some(Err(e)),
        };
        Some(Ok(self.handle_event(&event).await))
    }

    /// Apply pushed events until the server closes the session.
    ///
    /// Frames that fail to decode are skipped. A transport failure ends the
    /// loop with an error; the cached page stays as it was.
    pub async fn follow(&mut self, events: &mut EventStream) -> Result<()> {
        while let Some(applied) = self.apply_next(events).await {
            match applied {
                Ok(_) => {}
                Err(ClientError::Decode(reason)) => warn!("Skipping event frame: {}", reason),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use charter_types::{ContractPage, ContractStatus};
    use chrono::{DateTime, Utc};

    /// Serves a fixed record list, paged ten at a time, and counts lists.
    #[derive(Default)]
    struct FakeApi {
        records: Mutex<Vec<Contract>>,
        lists: AtomicUsize,
        failing: AtomicBool,
    }

    impl FakeApi {
        fn with(records: Vec<Contract>) -> Self {
            Self {
                records: Mutex::new(records),
                ..Self::default()
            }
        }

        fn lists(&self) -> usize {
            self.lists.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContractsApi for FakeApi {
        async fn list(&self, filters: &Filters) -> Result<ContractPage> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(ClientError::Request {
                    url: "fake".to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            let filter = filters.to_filter();
            let records = self.records.lock().map(|r| r.clone()).unwrap_or_default();
            let matching: Vec<Contract> = records.into_iter().filter(|r| filter.matches(r)).collect();
            let skip = (filters.page as usize - 1) * 10;
            Ok(ContractPage {
                total: matching.len() as u64,
                page: filters.page,
                limit: 10,
                results: matching.into_iter().skip(skip).take(10).collect(),
            })
        }

        async fn get(&self, id: &ContractId) -> Result<Contract> {
            let records = self.records.lock().map(|r| r.clone()).unwrap_or_default();
            records
                .into_iter()
                .find(|r| &r.id == id)
                .ok_or_else(|| ClientError::Api {
                    status: 404,
                    message: "Contract record not found".to_string(),
                })
        }

        async fn create(&self, _new: &NewContract) -> Result<Contract> {
            Err(ClientError::Decode("not used".to_string()))
        }

        async fn update(&self, _id: &ContractId, _patch: &ContractPatch) -> Result<Contract> {
            Err(ClientError::Decode("not used".to_string()))
        }

        async fn delete(&self, id: &ContractId) -> Result<DeleteResult> {
            Ok(DeleteResult {
                success: true,
                deleted_id: *id,
            })
        }
    }

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).expect("timestamp")
    }

    fn record(n: i64, status: ContractStatus) -> Contract {
        Contract {
            id: ContractId::generate(),
            client: if n % 2 == 0 { "Acme" } else { "Globex" }.to_string(),
            title: format!("Contract {n:02}"),
            status,
            data: "{}".to_string(),
            created_at: at(n),
            updated_at: at(n),
        }
    }

    fn drafts(count: i64) -> Vec<Contract> {
        (0..count).map(|n| record(n, ContractStatus::Draft)).collect()
    }

    #[tokio::test]
    async fn test_fetch_replaces_state() {
        let mut store = ContractStore::new(FakeApi::with(drafts(15)));
        store.fetch_contracts().await;

        let state = store.state();
        assert_eq!(state.records.len(), 10);
        assert_eq!(state.total, 15);
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_fetch_failure_sets_error() {
        let api = FakeApi::with(drafts(3));
        api.failing.store(true, Ordering::SeqCst);
        let mut store = ContractStore::new(api);
        store.fetch_contracts().await;

        assert_eq!(store.state().error.as_deref(), Some(FETCH_FAILED));
        assert!(!store.state().loading);
        assert!(store.state().records.is_empty());
    }

    #[tokio::test]
    async fn test_filter_and_page_changes_refetch() {
        let mut records = drafts(12);
        records.push(record(99, ContractStatus::Finalized));
        let mut store = ContractStore::new(FakeApi::with(records));

        store.set_page(2).await;
        assert_eq!(store.api().lists(), 1);
        assert_eq!(store.state().records.len(), 3);

        store
            .set_filters(FilterUpdate {
                status: Some(Some(ContractStatus::Finalized)),
                page: Some(1),
                ..FilterUpdate::default()
            })
            .await;
        assert_eq!(store.api().lists(), 2);
        assert_eq!(store.state().total, 1);
        assert_eq!(store.state().records[0].status, ContractStatus::Finalized);
    }

    #[tokio::test]
    async fn test_new_contract_refetches_on_page_one_only() {
        let mut store = ContractStore::new(FakeApi::with(drafts(15)));
        store.fetch_contracts().await;
        let event = ContractEvent::Created(record(100, ContractStatus::Draft));

        assert_eq!(store.handle_event(&event).await, Reconciliation::Refetch);
        assert_eq!(store.api().lists(), 2);

        store.set_page(2).await;
        assert_eq!(store.handle_event(&event).await, Reconciliation::Ignore);
        assert_eq!(store.api().lists(), 3);
    }

    #[tokio::test]
    async fn test_cached_update_patched_without_refetch() {
        let mut store = ContractStore::new(FakeApi::with(drafts(5)));
        store.fetch_contracts().await;
        let before = store.state().records.clone();

        let mut changed = before[3].clone();
        changed.data = r#"{"v":2}"#.to_string();
        changed.updated_at = at(10_000);
        store
            .handle_event(&ContractEvent::Updated(vec![changed.clone()]))
            .await;

        assert_eq!(store.api().lists(), 1);
        assert_eq!(store.state().records[3], changed);
        assert_eq!(store.state().records.len(), before.len());
    }

    #[tokio::test]
    async fn test_reorder_policy_moves_update_to_front() {
        let mut store =
            ContractStore::with_policy(FakeApi::with(drafts(5)), UpdatePolicy::ReorderByRecency);
        store.fetch_contracts().await;

        let mut changed = store.state().records[4].clone();
        changed.updated_at = at(10_000);
        store
            .handle_event(&ContractEvent::Updated(vec![changed.clone()]))
            .await;

        assert_eq!(store.api().lists(), 1);
        assert_eq!(store.state().records[0], changed);
        assert_eq!(store.state().records.len(), 5);
    }

    #[tokio::test]
    async fn test_delete_of_cached_record_refetches() {
        let mut store = ContractStore::new(FakeApi::with(drafts(5)));
        store.fetch_contracts().await;
        let cached = store.state().records[0].id;

        store.handle_event(&ContractEvent::deleted(ContractId::generate())).await;
        assert_eq!(store.api().lists(), 1);

        store.handle_event(&ContractEvent::deleted(cached)).await;
        assert_eq!(store.api().lists(), 2);
    }

    #[tokio::test]
    async fn test_get_passes_through_errors() {
        let store = ContractStore::new(FakeApi::default());
        let result = store.get_contract(&ContractId::generate()).await;
        assert!(matches!(result, Err(ClientError::Api { status: 404, .. })));
    }
}
