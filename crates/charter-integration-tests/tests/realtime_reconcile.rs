//! Integration test: mutation events reaching client stores.
//!
//! Exercises the push path end to end:
//! 1. A store follows a live `/ws` session over HTTP until the server closes it
//! 2. Two stores on different pages reconcile the same push differently
//! 3. Updates patch in place, deletes of cached records refetch
//! 4. Shutting the bus down ends subscriptions

use std::sync::Arc;
use std::time::Duration;

use charter_client::{
    ContractStore, ContractsApi, EventStream, FilterUpdate, HttpContractsApi, Reconciliation,
    UpdatePolicy,
};
use charter_daemon::events::Subscription;
use charter_daemon::DaemonState;
use charter_integration_tests::{memory_state, spawn_daemon, InProcessApi};
use charter_types::{ContractEvent, ContractPatch, ContractStatus, NewContract};

fn new_contract(client: &str, title: &str, status: ContractStatus) -> NewContract {
    NewContract {
        client: client.to_string(),
        title: title.to_string(),
        status,
        data: "{}".to_string(),
    }
}

async fn next_event(subscription: &mut Subscription) -> ContractEvent {
    tokio::time::timeout(Duration::from_secs(5), subscription.next())
        .await
        .expect("event within timeout")
        .expect("bus open")
}

async fn seed(state: &Arc<DaemonState>, count: usize) {
    for i in 0..count {
        state
            .mutations
            .create(new_contract("Acme", &format!("Contract {i:02}"), ContractStatus::Draft))
            .await
            .expect("seed");
    }
}

async fn wait_for_sessions(state: &DaemonState, expected: usize) {
    for _ in 0..100 {
        if state.event_bus.subscriber_count() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session never subscribed");
}

async fn apply_next<A: ContractsApi>(
    store: &mut ContractStore<A>,
    events: &mut EventStream,
) -> Reconciliation {
    tokio::time::timeout(Duration::from_secs(5), store.apply_next(events))
        .await
        .expect("event within timeout")
        .expect("session open")
        .expect("decoded event")
}

#[tokio::test]
async fn live_session_keeps_store_current() {
    let state = memory_state().expect("state");
    let addr = spawn_daemon(state.clone()).await.expect("spawn daemon");

    let mut events = EventStream::connect(&format!("ws://{addr}/ws"))
        .await
        .expect("connect socket");
    wait_for_sessions(&state, 1).await;

    let mut store = ContractStore::new(HttpContractsApi::new(format!("http://{addr}/api")));
    store.fetch_contracts().await;
    assert_eq!(store.state().total, 0);

    let created = store
        .create_contract(&new_contract("Acme", "MSA", ContractStatus::Draft))
        .await
        .expect("create");
    assert!(store.state().records.is_empty());
    assert_eq!(apply_next(&mut store, &mut events).await, Reconciliation::Refetch);
    assert_eq!(store.state().total, 1);
    assert_eq!(store.state().records, vec![created.clone()]);

    let updated = store
        .update_contract(
            &created.id,
            &ContractPatch {
                status: Some(ContractStatus::Finalized),
                data: None,
            },
        )
        .await
        .expect("update");
    assert_eq!(
        apply_next(&mut store, &mut events).await,
        Reconciliation::Replace {
            index: 0,
            record: updated.clone(),
        }
    );
    assert_eq!(store.state().records, vec![updated]);

    store.delete_contract(&created.id).await.expect("delete");
    assert_eq!(apply_next(&mut store, &mut events).await, Reconciliation::Refetch);
    assert_eq!(store.state().total, 0);
    assert!(store.state().records.is_empty());

    state.event_bus.shutdown();
    tokio::time::timeout(Duration::from_secs(5), store.follow(&mut events))
        .await
        .expect("session closes")
        .expect("clean close");
}

#[tokio::test]
async fn client_close_drops_session() {
    let state = memory_state().expect("state");
    let addr = spawn_daemon(state.clone()).await.expect("spawn daemon");

    let events = EventStream::connect(&format!("ws://{addr}/ws"))
        .await
        .expect("connect socket");
    wait_for_sessions(&state, 1).await;
    events.close().await.expect("close");

    for _ in 0..100 {
        if state.event_bus.subscriber_count() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session never unsubscribed");
}

#[tokio::test]
async fn new_contract_refetches_page_one_only() {
    let state = memory_state().expect("state");
    seed(&state, 12).await;
    let mut subscription = state.event_bus.subscribe().expect("subscribe");

    let mut first_page = ContractStore::new(InProcessApi::new(state.clone()));
    first_page.fetch_contracts().await;
    let mut second_page = ContractStore::new(InProcessApi::new(state.clone()));
    second_page.set_page(2).await;
    let second_before = second_page.state().records.clone();
    assert_eq!(second_before.len(), 2);

    let created = state
        .mutations
        .create(new_contract("Acme", "Brand New", ContractStatus::Draft))
        .await
        .expect("create");
    let event = next_event(&mut subscription).await;

    assert_eq!(first_page.handle_event(&event).await, Reconciliation::Refetch);
    assert_eq!(first_page.state().total, 13);
    assert_eq!(first_page.state().records.len(), 10);
    let stored = first_page.get_contract(&created.id).await.expect("get");
    assert_eq!(stored, created);

    assert_eq!(second_page.handle_event(&event).await, Reconciliation::Ignore);
    assert_eq!(second_page.state().records, second_before);
    assert_eq!(second_page.state().total, 12);
}

#[tokio::test]
async fn filtered_store_ignores_non_matching_create() {
    let state = memory_state().expect("state");
    let mut subscription = state.event_bus.subscribe().expect("subscribe");

    let mut store = ContractStore::new(InProcessApi::new(state.clone()));
    store
        .set_filters(FilterUpdate::status(Some(ContractStatus::Finalized)))
        .await;

    state
        .mutations
        .create(new_contract("Acme", "Draft One", ContractStatus::Draft))
        .await
        .expect("create");
    let event = next_event(&mut subscription).await;
    assert_eq!(store.handle_event(&event).await, Reconciliation::Ignore);

    state
        .mutations
        .create(new_contract("Acme", "Final One", ContractStatus::Finalized))
        .await
        .expect("create");
    let event = next_event(&mut subscription).await;
    assert_eq!(store.handle_event(&event).await, Reconciliation::Refetch);
    assert_eq!(store.state().total, 1);
}

#[tokio::test]
async fn update_patches_cached_record() {
    let state = memory_state().expect("state");
    seed(&state, 3).await;
    let mut subscription = state.event_bus.subscribe().expect("subscribe");

    let mut store = ContractStore::new(InProcessApi::new(state.clone()));
    store.fetch_contracts().await;
    let target = store.state().records[2].clone();

    let updated = store
        .update_contract(
            &target.id,
            &ContractPatch {
                status: Some(ContractStatus::Finalized),
                data: None,
            },
        )
        .await
        .expect("update");
    let event = next_event(&mut subscription).await;

    assert_eq!(
        store.handle_event(&event).await,
        Reconciliation::Replace {
            index: 2,
            record: updated.clone(),
        }
    );
    assert_eq!(store.state().records[2], updated);
}

#[tokio::test]
async fn reorder_policy_moves_updated_record_first() {
    let state = memory_state().expect("state");
    seed(&state, 3).await;
    let mut subscription = state.event_bus.subscribe().expect("subscribe");

    let mut store = ContractStore::with_policy(
        InProcessApi::new(state.clone()),
        UpdatePolicy::ReorderByRecency,
    );
    store.fetch_contracts().await;
    let target = store.state().records[2].clone();

    let updated = store
        .update_contract(
            &target.id,
            &ContractPatch {
                status: None,
                data: Some(r#"{"rev":2}"#.to_string()),
            },
        )
        .await
        .expect("update");
    let event = next_event(&mut subscription).await;
    store.handle_event(&event).await;

    assert_eq!(store.state().records[0], updated);
    assert_eq!(store.state().records.len(), 3);
    assert_eq!(store.api().list(&store.state().filters).await.expect("list").total, 3);
}

#[tokio::test]
async fn delete_of_cached_record_refetches() {
    let state = memory_state().expect("state");
    seed(&state, 11).await;
    let mut subscription = state.event_bus.subscribe().expect("subscribe");

    let mut store = ContractStore::new(InProcessApi::new(state.clone()));
    store.fetch_contracts().await;
    assert_eq!(store.state().records.len(), 10);
    let victim = store.state().records[0].id;

    store.delete_contract(&victim).await.expect("delete");
    let event = next_event(&mut subscription).await;

    assert_eq!(store.handle_event(&event).await, Reconciliation::Refetch);
    assert_eq!(store.state().total, 10);
    assert_eq!(store.state().records.len(), 10);
    assert!(store.state().records.iter().all(|r| r.id != victim));
}

#[tokio::test]
async fn failed_mutation_emits_nothing() {
    let state = memory_state().expect("state");
    seed(&state, 1).await;
    let before = state.event_bus.sequence();

    let duplicate = state
        .mutations
        .create(new_contract("Acme", "Contract 00", ContractStatus::Draft))
        .await;
    assert!(duplicate.is_err());
    assert_eq!(state.event_bus.sequence(), before);
}

#[tokio::test]
async fn shutdown_ends_subscriptions() {
    let state = memory_state().expect("state");
    let mut subscription = state.event_bus.subscribe().expect("subscribe");

    state.event_bus.shutdown();
    assert_eq!(subscription.next().await, None);
    assert!(state.event_bus.subscribe().is_none());
}
