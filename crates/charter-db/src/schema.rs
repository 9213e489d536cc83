//! SQL schema definitions.

/// Complete schema for Charter v1 database.
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS contracts (
    id TEXT PRIMARY KEY NOT NULL,
    client TEXT NOT NULL CHECK (length(client) BETWEEN 3 AND 50),
    -- lowercase copy of client for substring search; client is immutable
    client_folded TEXT NOT NULL,
    title TEXT NOT NULL CHECK (length(title) BETWEEN 3 AND 50),
    status TEXT NOT NULL CHECK (status IN ('Draft', 'Finalized')),
    data TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- id is covered by the primary key index
CREATE INDEX IF NOT EXISTS idx_contracts_status ON contracts(status);
CREATE INDEX IF NOT EXISTS idx_contracts_client ON contracts(client);
CREATE UNIQUE INDEX IF NOT EXISTS idx_contracts_client_title ON contracts(client, title);
CREATE INDEX IF NOT EXISTS idx_contracts_recency ON contracts(updated_at DESC, id DESC);
"#;
