//! Contract query functions.
//!
//! Every write is a single statement, so existence and uniqueness checks
//! happen atomically with the write itself.

use charter_types::{
    fold_case, Contract, ContractFilter, ContractId, ContractPatch, NewContract, SearchTerm,
};
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, Row};

use crate::{DbError, Result};

const COLUMNS: &str = "id, client, title, status, data, created_at, updated_at";

/// Insert a new contract, generating its id.
///
/// Fails with [`DbError::DuplicateKey`] if `(client, title)` already exists.
pub fn insert(conn: &Connection, new: &NewContract, now: DateTime<Utc>) -> Result<Contract> {
    let id = ContractId::generate();
    let now_ms = now.timestamp_millis();

    conn.execute(
        "INSERT INTO contracts (id, client, client_folded, title, status, data, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        rusqlite::params![
            id.to_string(),
            new.client,
            fold_case(&new.client),
            new.title,
            new.status.as_str(),
            new.data,
            now_ms,
        ],
    )
    .map_err(|e| map_write_error(e, &new.client, &new.title))?;

    let stamp = from_millis(now_ms)?;
    Ok(Contract {
        id,
        client: new.client.clone(),
        title: new.title.clone(),
        status: new.status,
        data: new.data.clone(),
        created_at: stamp,
        updated_at: stamp,
    })
}

/// Get a contract by id.
pub fn get(conn: &Connection, id: &ContractId) -> Result<Contract> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM contracts WHERE id = ?1"),
        [id.to_string()],
        row_to_contract,
    )
    .map_err(|e| not_found_or(e, id))
}

/// List one page of contracts matching `filter`, newest `updated_at` first.
///
/// Returns the page and the total number of matches. `page` is 1-based.
pub fn find_page(
    conn: &Connection,
    filter: &ContractFilter,
    page: u32,
    limit: u32,
) -> Result<(Vec<Contract>, u64)> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        args.push(Value::Text(status.as_str().to_string()));
    }
    match &filter.search {
        Some(SearchTerm::Id(id)) => {
            clauses.push("id = ?");
            args.push(Value::Text(id.to_string()));
        }
        Some(SearchTerm::Client(needle)) => {
            clauses.push("instr(client_folded, ?) > 0");
            args.push(Value::Text(needle.clone()));
        }
        None => {}
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM contracts{where_sql}"),
        rusqlite::params_from_iter(args.iter()),
        |row| row.get(0),
    )?;

    let offset = (i64::from(page.max(1)) - 1) * i64::from(limit);
    args.push(Value::Integer(i64::from(limit)));
    args.push(Value::Integer(offset));

    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM contracts{where_sql}
         ORDER BY updated_at DESC, id DESC LIMIT ? OFFSET ?"
    ))?;

    let rows = stmt
        .query_map(rusqlite::params_from_iter(args.iter()), row_to_contract)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok((rows, total as u64))
}

/// Apply a partial update and bump `updated_at`.
///
/// The new `updated_at` is `max(now, previous + 1ms)` so it always advances.
pub fn update(
    conn: &Connection,
    id: &ContractId,
    patch: &ContractPatch,
    now: DateTime<Utc>,
) -> Result<Contract> {
    conn.query_row(
        &format!(
            "UPDATE contracts
             SET status = COALESCE(?2, status),
                 data = COALESCE(?3, data),
                 updated_at = MAX(?4, updated_at + 1)
             WHERE id = ?1
             RETURNING {COLUMNS}"
        ),
        rusqlite::params![
            id.to_string(),
            patch.status.map(|s| s.as_str()),
            patch.data.as_deref(),
            now.timestamp_millis(),
        ],
        row_to_contract,
    )
    .map_err(|e| not_found_or(e, id))
}

/// Permanently remove a contract. Returns the removed id.
pub fn delete(conn: &Connection, id: &ContractId) -> Result<ContractId> {
    let removed = conn.execute("DELETE FROM contracts WHERE id = ?1", [id.to_string()])?;
    if removed == 0 {
        return Err(DbError::NotFound(format!("contract {id}")));
    }
    Ok(*id)
}

/// Count all contracts.
pub fn count(conn: &Connection) -> Result<u64> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM contracts", [], |row| row.get(0))?;
    Ok(total as u64)
}

fn row_to_contract(row: &Row<'_>) -> rusqlite::Result<Contract> {
    let id: String = row.get(0)?;
    let status: String = row.get(3)?;
    Ok(Contract {
        id: ContractId::parse(&id).map_err(|e| conversion_error(0, Type::Text, e))?,
        client: row.get(1)?,
        title: row.get(2)?,
        status: status
            .parse()
            .map_err(|e| conversion_error(3, Type::Text, e))?,
        data: row.get(4)?,
        created_at: from_millis(row.get(5)?).map_err(|e| conversion_error(5, Type::Integer, e))?,
        updated_at: from_millis(row.get(6)?).map_err(|e| conversion_error(6, Type::Integer, e))?,
    })
}

fn from_millis(ms: i64) -> std::result::Result<DateTime<Utc>, DbError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| DbError::Serialization(format!("timestamp out of range: {ms}")))
}

fn conversion_error<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn not_found_or(e: rusqlite::Error, id: &ContractId) -> DbError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("contract {id}")),
        other => DbError::Sqlite(other),
    }
}

fn map_write_error(e: rusqlite::Error, client: &str, title: &str) -> DbError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            DbError::DuplicateKey(format!("contract ({client}, {title})"))
        }
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(msg.unwrap_or_else(|| err.to_string()))
        }
        other => DbError::Sqlite(other),
    }
}
