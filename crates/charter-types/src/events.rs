//! Mutation events pushed from the daemon to every connected client.
//!
//! Serialized as `{"event": <name>, "payload": <body>}` text frames.

use serde::{Deserialize, Serialize};

use crate::contract::{Contract, ContractId};

/// A contract mutation, broadcast unconditionally to all sessions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[serde(tag = "event", content = "payload")]
#[ts(export)]
pub enum ContractEvent {
    /// Full newly created record.
    #[serde(rename = "newContract")]
    Created(Contract),
    /// Updated records, in order. Currently always exactly one.
    #[serde(rename = "contractUpdate")]
    Updated(Vec<Contract>),
    /// Id of a permanently removed record.
    #[serde(rename = "contractDelete")]
    Deleted(DeletedContract),
}

/// Payload of a delete event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeletedContract {
    pub deleted_id: ContractId,
}

impl ContractEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ContractEvent::Created(_) => "newContract",
            ContractEvent::Updated(_) => "contractUpdate",
            ContractEvent::Deleted(_) => "contractDelete",
        }
    }

    pub fn deleted(id: ContractId) -> Self {
        ContractEvent::Deleted(DeletedContract { deleted_id: id })
    }
}
