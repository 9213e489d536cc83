//! HTTP response bodies.

use serde::{Deserialize, Serialize};

use crate::contract::{Contract, ContractId};

/// One page of list results. `total` counts every match, not just this page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct ContractPage {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub results: Vec<Contract>,
}

/// Body of a successful update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct UpdateResult {
    pub result: Vec<Contract>,
}

/// Body of a successful delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeleteResult {
    pub success: bool,
    pub deleted_id: ContractId,
}

/// Body of every error response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
