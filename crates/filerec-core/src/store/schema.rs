//! SQLite schema for the recommendation store

use rusqlite::{Connection, OptionalExtension, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

const SCHEMA_SQL: &str = r#"
-- Item-to-item similarities, one row per unordered pair (item_a < item_b)
CREATE TABLE IF NOT EXISTS similarities (
    item_a INTEGER NOT NULL,
    item_b INTEGER NOT NULL,
    value REAL NOT NULL,
    PRIMARY KEY (item_a, item_b)
);
CREATE INDEX IF NOT EXISTS idx_similarities_b ON similarities(item_b);

-- TF-IDF keywords per item, in score order
CREATE TABLE IF NOT EXISTS item_keywords (
    item_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    keyword TEXT NOT NULL,
    score REAL NOT NULL,
    count INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (item_id, keyword)
);

-- Merged keyword profile per user, in score order
CREATE TABLE IF NOT EXISTS user_profiles (
    user_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    keyword TEXT NOT NULL,
    score REAL NOT NULL,
    count INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (user_id, keyword)
);

-- Ranked recommendations per user
CREATE TABLE IF NOT EXISTS recommendations (
    user_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    item_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    collaborative REAL NOT NULL,
    content_based REAL NOT NULL,
    group_weight REAL NOT NULL,
    score REAL NOT NULL,
    PRIMARY KEY (user_id, position)
);

-- Directional group affinities; maintained by operators, never by jobs
CREATE TABLE IF NOT EXISTS group_weights (
    source_group TEXT NOT NULL,
    target_group TEXT NOT NULL,
    weight REAL NOT NULL,
    PRIMARY KEY (source_group, target_group)
);

-- Store metadata
CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT
);
"#;

/// Derived tables, safe to drop on a schema change
const DERIVED_TABLES: &[&str] = &[
    "similarities",
    "item_keywords",
    "user_profiles",
    "recommendations",
];

fn stored_version(conn: &Connection) -> Result<Option<i32>> {
    let has_meta: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'store_meta'",
        [],
        |r| r.get(0),
    )?;
    if !has_meta {
        return Ok(None);
    }
    conn.query_row(
        "SELECT value FROM store_meta WHERE key = 'schema_version'",
        [],
        |r| r.get::<_, String>(0),
    )
    .optional()
    .map(|v| v.map(|s| s.parse().unwrap_or(0)))
}

fn write_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO store_meta (key, value) VALUES ('schema_version', ?1)",
        [&CURRENT_SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

/// Create the schema, or rebuild the derived tables when the stored version
/// differs; group weights survive a rebuild
pub fn create_schema(conn: &Connection) -> Result<()> {
    match stored_version(conn)? {
        None => {
            conn.execute_batch(SCHEMA_SQL)?;
            write_version(conn)?;
        }
        Some(v) if v == CURRENT_SCHEMA_VERSION => {}
        Some(v) => {
            for table in DERIVED_TABLES {
                conn.execute(&format!("DROP TABLE IF EXISTS {table}"), [])?;
            }
            conn.execute("DELETE FROM store_meta WHERE key = 'last_computed'", [])?;
            conn.execute_batch(SCHEMA_SQL)?;
            write_version(conn)?;
            tracing::info!(
                "Store schema updated from version {} to {}; derived data cleared",
                v,
                CURRENT_SCHEMA_VERSION
            );
        }
    }
    Ok(())
}

#[cfg(test)]
pub fn force_set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO store_meta (key, value) VALUES ('schema_version', ?1)",
        [&version.to_string()],
    )?;
    Ok(())
}
