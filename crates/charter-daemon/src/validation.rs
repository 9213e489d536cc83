//! Request validation.
//!
//! Every check reports only the first violation, walking fields in a fixed
//! order, so callers always get one actionable message.

use charter_types::{
    ContractFilter, ContractId, ContractPatch, ContractStatus, NewContract, MAX_NAME_LEN,
    MIN_NAME_LEN,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::QueryConfig;
use crate::error::{Result, ServiceError};

const CREATE_FIELDS: [&str; 4] = ["client", "title", "status", "data"];
const UPDATE_FIELDS: [&str; 2] = ["status", "data"];

/// Raw list query parameters, exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    #[serde(rename = "searchTerm")]
    pub search_term: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// A validated, bounded list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: ContractFilter,
    pub page: u32,
    pub limit: u32,
}

/// Validate list parameters against the configured bounds.
pub fn list_query(params: &ListParams, bounds: &QueryConfig) -> Result<ListQuery> {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<ContractStatus>().map_err(|_| {
            ServiceError::validation("Status must be either 'Draft' or 'Finalized'")
        })?),
    };

    let page = positive_int("Page", params.page.as_deref())?.unwrap_or(1);
    let limit = positive_int("Limit", params.limit.as_deref())?.unwrap_or(bounds.default_limit);
    if limit > bounds.max_limit {
        return Err(ServiceError::validation(format!(
            "Limit must be at most {}.",
            bounds.max_limit
        )));
    }

    Ok(ListQuery {
        filter: ContractFilter::new(status, params.search_term.as_deref()),
        page,
        limit,
    })
}

/// Validate a create request body.
pub fn new_contract(body: &Value) -> Result<NewContract> {
    let obj = as_object(body)?;

    let client = required_str(obj, "client")?;
    check_name("Client", client)?;
    let title = required_str(obj, "title")?;
    check_name("Title", title)?;
    let status = required_str(obj, "status")?
        .parse::<ContractStatus>()
        .map_err(|_| ServiceError::validation("Status must be one of [Draft, Finalized]."))?;
    let data = required_str(obj, "data")?;
    check_data(data)?;
    reject_unknown(obj, &CREATE_FIELDS)?;

    Ok(NewContract {
        client: client.to_string(),
        title: title.to_string(),
        status,
        data: data.to_string(),
    })
}

/// Validate an update request body. Only `status` and `data` may appear.
pub fn patch(body: &Value) -> Result<ContractPatch> {
    let obj = as_object(body)?;

    let status = match optional_str(obj, "status")? {
        None => None,
        Some(raw) => Some(raw.parse::<ContractStatus>().map_err(|_| {
            ServiceError::validation("Status must be either 'Draft' or 'Finalized'")
        })?),
    };
    let data = optional_str(obj, "data")?;
    if let Some(data) = data {
        check_data(data)?;
    }
    reject_unknown(obj, &UPDATE_FIELDS)?;

    Ok(ContractPatch {
        status,
        data: data.map(str::to_string),
    })
}

/// Validate a path identifier.
pub fn contract_id(raw: &str) -> Result<ContractId> {
    ContractId::parse(raw).map_err(|_| ServiceError::validation("\"id\" must be a valid GUID"))
}

/// Field rules for an already-typed create request.
pub fn check_new_contract(new: &NewContract) -> Result<()> {
    check_name("Client", &new.client)?;
    check_name("Title", &new.title)?;
    check_data(&new.data)
}

/// Field rules for an already-typed patch.
pub fn check_patch(patch: &ContractPatch) -> Result<()> {
    match patch.data {
        Some(ref data) => check_data(data),
        None => Ok(()),
    }
}

fn check_name(label: &str, value: &str) -> Result<()> {
    let len = value.chars().count();
    if len == 0 {
        return Err(ServiceError::validation(format!("{label} is required")));
    }
    if len < MIN_NAME_LEN {
        return Err(ServiceError::validation(format!(
            "{label} must be at least {MIN_NAME_LEN} characters long."
        )));
    }
    if len > MAX_NAME_LEN {
        return Err(ServiceError::validation(format!(
            "{label} must be at most {MAX_NAME_LEN} characters long."
        )));
    }
    Ok(())
}

fn check_data(data: &str) -> Result<()> {
    if data.is_empty() {
        return Err(ServiceError::validation("Contract data is required."));
    }
    Ok(())
}

fn positive_int(label: &str, raw: Option<&str>) -> Result<Option<u32>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let number: f64 = raw
        .trim()
        .parse()
        .ok()
        .filter(|n: &f64| n.is_finite())
        .ok_or_else(|| ServiceError::validation(format!("{label} must be a number.")))?;
    if number.fract() != 0.0 {
        return Err(ServiceError::validation(format!("{label} must be an integer")));
    }
    if number <= 0.0 {
        return Err(ServiceError::validation(format!(
            "{label} must be a positive integer."
        )));
    }
    if number > f64::from(u32::MAX) {
        return Err(ServiceError::validation(format!("{label} is too large.")));
    }
    Ok(Some(number as u32))
}

fn as_object(body: &Value) -> Result<&Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| ServiceError::validation("\"value\" must be of type object"))
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a str> {
    optional_str(obj, field)?
        .ok_or_else(|| ServiceError::validation(format!("\"{field}\" is required")))
}

fn optional_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<Option<&'a str>> {
    match obj.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ServiceError::validation(format!(
            "\"{field}\" must be a string"
        ))),
    }
}

fn reject_unknown(obj: &Map<String, Value>, allowed: &[&str]) -> Result<()> {
    match obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(ServiceError::validation(format!("\"{key}\" is not allowed"))),
        None => Ok(()),
    }
}
