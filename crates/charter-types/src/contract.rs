//! Contract record, identifier and status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::{Uuid, Variant};

use crate::TypesError;

/// Opaque contract identifier.
///
/// Always a UUID v4 in canonical hyphenated lowercase form on the wire.
/// Parsing rejects every other UUID rendering (simple, braced, URN) and
/// every other version, so an id-shaped string either names a contract
/// exactly or is a validation error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ts_rs::TS)]
#[ts(export)]
pub struct ContractId(Uuid);

impl ContractId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a canonical UUID v4 string. Hex digits may be in either case.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let bytes = s.as_bytes();
        let hyphenated = bytes.len() == 36
            && [8, 13, 18, 23].iter().all(|&i| bytes[i] == b'-');
        if !hyphenated {
            return Err(TypesError::InvalidId(s.to_string()));
        }
        let uuid = Uuid::parse_str(s).map_err(|_| TypesError::InvalidId(s.to_string()))?;
        if uuid.get_version_num() != 4 || uuid.get_variant() != Variant::RFC4122 {
            return Err(TypesError::InvalidId(s.to_string()));
        }
        Ok(Self(uuid))
    }

    /// True if `s` has the identifier shape.
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for ContractId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ContractId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContractId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Contract lifecycle status. Transitions are unrestricted in both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub enum ContractStatus {
    Draft,
    Finalized,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 2] = [ContractStatus::Draft, ContractStatus::Finalized];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "Draft",
            ContractStatus::Finalized => "Finalized",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = TypesError;

    /// Case-sensitive: only `Draft` and `Finalized` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(ContractStatus::Draft),
            "Finalized" => Ok(ContractStatus::Finalized),
            other => Err(TypesError::InvalidStatus(other.to_string())),
        }
    }
}

/// A stored contract record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Contract {
    pub id: ContractId,
    pub client: String,
    pub title: String,
    pub status: ContractStatus,
    /// Opaque payload, usually JSON text. Never parsed by the server.
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct NewContract {
    pub client: String,
    pub title: String,
    pub status: ContractStatus,
    pub data: String,
}

/// Partial update. `client` and `title` are deliberately absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct ContractPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub status: Option<ContractStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub data: Option<String>,
}

impl ContractPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.data.is_none()
    }
}
