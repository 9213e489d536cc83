//! Write side: create, update, delete, each followed by an event.
//!
//! Events are emitted after the write commits but while the connection lock
//! is still held, so event order always equals commit order. Emission never
//! blocks and cannot fail the request.

use std::sync::Arc;

use charter_db::queries::contracts;
use charter_types::{Contract, ContractEvent, ContractId, ContractPatch, DeleteResult, NewContract};
use chrono::Utc;
use tracing::info;

use crate::error::Result;
use crate::events::EventSink;
use crate::validation;
use crate::SharedDb;

/// Validated writes with notification.
#[derive(Clone)]
pub struct MutationService {
    db: SharedDb,
    events: Arc<dyn EventSink>,
}

impl MutationService {
    pub fn new(db: SharedDb, events: Arc<dyn EventSink>) -> Self {
        Self { db, events }
    }

    /// Create a contract and emit `newContract`.
    pub async fn create(&self, new: NewContract) -> Result<Contract> {
        validation::check_new_contract(&new)?;
        let db = self.db.lock().await;
        let created = contracts::insert(&db, &new, Utc::now())?;
        info!("Created contract {} ({} / {})", created.id, created.client, created.title);
        self.events.emit(ContractEvent::Created(created.clone()));
        drop(db);
        Ok(created)
    }

    /// Update status and/or data and emit `contractUpdate`.
    pub async fn update(&self, id: &ContractId, patch: ContractPatch) -> Result<Contract> {
        validation::check_patch(&patch)?;
        let db = self.db.lock().await;
        let updated = contracts::update(&db, id, &patch, Utc::now())?;
        info!("Updated contract {}", updated.id);
        self.events.emit(ContractEvent::Updated(vec![updated.clone()]));
        drop(db);
        Ok(updated)
    }

    /// Permanently delete a contract and emit `contractDelete`.
    pub async fn delete(&self, id: &ContractId) -> Result<DeleteResult> {
        let db = self.db.lock().await;
        let deleted_id = contracts::delete(&db, id)?;
        info!("Deleted contract {}", deleted_id);
        self.events.emit(ContractEvent::deleted(deleted_id));
        drop(db);
        Ok(DeleteResult {
            success: true,
            deleted_id,
        })
    }
}
