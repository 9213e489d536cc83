//! Deciding what a pushed event means for the cached page.
//!
//! The server sends every event to every client. The client only knows its
//! own filters and the records it holds, so it cannot place a new record
//! itself. Anything that might change page membership becomes a refetch.
//!
//! Rules:
//!
//! - `newContract`: refetch when on page 1 and the record matches the
//!   active filters. Otherwise ignore.
//! - `contractUpdate`: look at the first record. If it is cached, patch it
//!   (or reorder, see [`UpdatePolicy`]). If not cached but it matches the
//!   filters, refetch. Otherwise ignore.
//! - `contractDelete`: refetch when the deleted id is cached.

use charter_types::{Contract, ContractEvent, ContractId};

use crate::filters::Filters;

/// What to do with an updated record that is already cached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Replace the cached entry where it stands. Its newer `updatedAt` is
    /// not reflected in its position until the next refetch.
    #[default]
    PatchInPlace,
    /// Keep most-recent-first order: on page 1 a still-matching record
    /// moves to the front, anything else refetches.
    ReorderByRecency,
}

/// Outcome of reconciling one event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    Refetch,
    /// Overwrite `records[index]`.
    Replace { index: usize, record: Contract },
    /// Remove `records[index]` and insert `record` at the front.
    MoveToFront { index: usize, record: Contract },
    Ignore,
}

/// Whether `event` requires refetching the current view, under the default
/// [`UpdatePolicy::PatchInPlace`].
pub fn should_refetch(event: &ContractEvent, filters: &Filters, cached_ids: &[ContractId]) -> bool {
    let position = |id: &ContractId| cached_ids.iter().position(|cached| cached == id);
    matches!(
        decide(event, filters, position, UpdatePolicy::PatchInPlace),
        Reconciliation::Refetch
    )
}

/// Full decision for `event` against the cached page.
pub fn reconcile(
    event: &ContractEvent,
    filters: &Filters,
    cached: &[Contract],
    policy: UpdatePolicy,
) -> Reconciliation {
    let position = |id: &ContractId| cached.iter().position(|record| &record.id == id);
    decide(event, filters, position, policy)
}

fn decide(
    event: &ContractEvent,
    filters: &Filters,
    position: impl Fn(&ContractId) -> Option<usize>,
    policy: UpdatePolicy,
) -> Reconciliation {
    match event {
        ContractEvent::Created(record) => {
            if filters.page == 1 && filters.to_filter().matches(record) {
                Reconciliation::Refetch
            } else {
                Reconciliation::Ignore
            }
        }
        ContractEvent::Updated(records) => {
            let Some(record) = records.first() else {
                return Reconciliation::Ignore;
            };
            let matches = filters.to_filter().matches(record);
            match (position(&record.id), policy) {
                (Some(index), UpdatePolicy::PatchInPlace) => Reconciliation::Replace {
                    index,
                    record: record.clone(),
                },
                (Some(index), UpdatePolicy::ReorderByRecency) => {
                    if filters.page == 1 && matches {
                        Reconciliation::MoveToFront {
                            index,
                            record: record.clone(),
                        }
                    } else {
                        Reconciliation::Refetch
                    }
                }
                (None, _) if matches => Reconciliation::Refetch,
                (None, _) => Reconciliation::Ignore,
            }
        }
        ContractEvent::Deleted(deleted) => {
            if position(&deleted.deleted_id).is_some() {
                Reconciliation::Refetch
            } else {
                Reconciliation::Ignore
            }
        }
    }
}
