use super::schema::create_schema;
use super::{RecommendationStore, Snapshot};
use crate::error::{RecError, Result};
use crate::group::{GroupWeight, GroupWeightLookup};
use crate::item::ItemId;
use crate::keywords::{Keyword, KeywordList};
use crate::map_db_err;
use crate::predict::RankedItem;
use crate::similarity::ItemToItemMatrix;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Params};
use std::path::Path;

/// SQLite-backed store
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

fn sql_id(id: ItemId) -> Result<i64> {
    i64::try_from(id).map_err(|_| RecError::invalid_value("item id", id))
}

fn item_id(value: i64) -> rusqlite::Result<ItemId> {
    ItemId::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, value))
}

fn keyword_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Keyword> {
    let count: i64 = row.get(2)?;
    Ok(Keyword::new(row.get::<_, String>(0)?, row.get(1)?)
        .with_count(usize::try_from(count).unwrap_or(0)))
}

fn load_keywords<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Option<KeywordList>> {
    let mut stmt = conn.prepare(sql)?;
    let keywords = stmt
        .query_map(params, keyword_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if keywords.is_empty() {
        return Ok(None);
    }
    Ok(Some(keywords.into_iter().collect()))
}

fn write_item_keywords(conn: &Connection, item: ItemId, keywords: &KeywordList) -> Result<()> {
    let id = sql_id(item)?;
    conn.execute("DELETE FROM item_keywords WHERE item_id = ?1", [id])
        .map_err(|e| map_db_err!("clear item keywords", e))?;
    let mut stmt = conn.prepare(
        "INSERT INTO item_keywords (item_id, position, keyword, score, count) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (position, keyword) in keywords.iter().enumerate() {
        stmt.execute(params![
            id,
            position as i64,
            keyword.word,
            keyword.score,
            keyword.count as i64
        ])
        .map_err(|e| map_db_err!("insert item keyword", e))?;
    }
    Ok(())
}

fn write_profile(conn: &Connection, user_id: &str, profile: &KeywordList) -> Result<()> {
    conn.execute("DELETE FROM user_profiles WHERE user_id = ?1", [user_id])
        .map_err(|e| map_db_err!("clear profile", e))?;
    let mut stmt = conn.prepare(
        "INSERT INTO user_profiles (user_id, position, keyword, score, count) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (position, keyword) in profile.iter().enumerate() {
        stmt.execute(params![
            user_id,
            position as i64,
            keyword.word,
            keyword.score,
            keyword.count as i64
        ])
        .map_err(|e| map_db_err!("insert profile keyword", e))?;
    }
    Ok(())
}

fn write_recommendations(conn: &Connection, user_id: &str, items: &[RankedItem]) -> Result<()> {
    conn.execute("DELETE FROM recommendations WHERE user_id = ?1", [user_id])
        .map_err(|e| map_db_err!("clear recommendations", e))?;
    let mut stmt = conn.prepare(
        "INSERT INTO recommendations (user_id, position, item_id, name, collaborative, content_based, group_weight, score)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for (position, item) in items.iter().enumerate() {
        stmt.execute(params![
            user_id,
            position as i64,
            sql_id(item.item_id)?,
            item.name,
            item.collaborative,
            item.content_based,
            item.group_weight,
            item.score
        ])
        .map_err(|e| map_db_err!("insert recommendation", e))?;
    }
    Ok(())
}

fn write_matrix(conn: &Connection, matrix: &ItemToItemMatrix) -> Result<()> {
    conn.execute("DELETE FROM similarities", [])
        .map_err(|e| map_db_err!("clear similarities", e))?;
    let mut stmt =
        conn.prepare("INSERT INTO similarities (item_a, item_b, value) VALUES (?1, ?2, ?3)")?;
    for (a, b, value) in matrix.entries() {
        stmt.execute(params![sql_id(a)?, sql_id(b)?, value])
            .map_err(|e| map_db_err!("insert similarity", e))?;
    }
    Ok(())
}

impl SqliteStore {
    /// Open or create the store at `path` in WAL mode
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| RecError::io_operation("create directory", parent.display(), e))?;
        }

        let conn = Connection::open(path).map_err(|e| {
            RecError::Other(format!(
                "failed to open database at {}: {}",
                path.display(),
                e
            ))
        })?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| RecError::Other(format!("failed to enable WAL mode: {}", e)))?;

        Self::with_connection(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| map_db_err!("open in-memory database", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        create_schema(&conn)
            .map_err(|e| RecError::Other(format!("failed to create store schema: {}", e)))?;
        Ok(SqliteStore { conn })
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl GroupWeightLookup for SqliteStore {
    fn group_weight(&self, source: &str, target: &str) -> Result<Option<f64>> {
        self.conn
            .query_row(
                "SELECT weight FROM group_weights WHERE source_group = ?1 AND target_group = ?2",
                [source, target],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| map_db_err!("read group weight", e))
    }
}

impl RecommendationStore for SqliteStore {
    fn load_matrix(&self) -> Result<ItemToItemMatrix> {
        let mut stmt = self
            .conn
            .prepare("SELECT item_a, item_b, value FROM similarities ORDER BY item_a, item_b")?;
        let entries = stmt
            .query_map([], |r| {
                Ok((item_id(r.get(0)?)?, item_id(r.get(1)?)?, r.get::<_, f64>(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| map_db_err!("load similarities", e))?;
        ItemToItemMatrix::from_entries(entries)
    }

    fn replace_matrix(&mut self, matrix: &ItemToItemMatrix) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| map_db_err!("start transaction", e))?;
        write_matrix(&tx, matrix)?;
        tx.commit().map_err(|e| map_db_err!("commit matrix", e))?;
        tracing::debug!(pairs = matrix.len(), "Replaced similarity matrix");
        Ok(())
    }

    fn item_keywords(&self, item: ItemId) -> Result<Option<KeywordList>> {
        load_keywords(
            &self.conn,
            "SELECT keyword, score, count FROM item_keywords WHERE item_id = ?1 ORDER BY position",
            [sql_id(item)?],
        )
    }

    fn put_item_keywords(&mut self, item: ItemId, keywords: &KeywordList) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| map_db_err!("start transaction", e))?;
        write_item_keywords(&tx, item, keywords)?;
        tx.commit().map_err(|e| map_db_err!("commit item keywords", e))
    }

    fn profile(&self, user_id: &str) -> Result<Option<KeywordList>> {
        load_keywords(
            &self.conn,
            "SELECT keyword, score, count FROM user_profiles WHERE user_id = ?1 ORDER BY position",
            [user_id],
        )
    }

    fn put_profile(&mut self, user_id: &str, profile: &KeywordList) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| map_db_err!("start transaction", e))?;
        write_profile(&tx, user_id, profile)?;
        tx.commit().map_err(|e| map_db_err!("commit profile", e))
    }

    fn delete_profile(&mut self, user_id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM user_profiles WHERE user_id = ?1", [user_id])
            .map_err(|e| map_db_err!("delete profile", e))?;
        Ok(())
    }

    fn recommendations(&self, user_id: &str) -> Result<Vec<RankedItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_id, name, collaborative, content_based, group_weight, score
             FROM recommendations WHERE user_id = ?1 ORDER BY position",
        )?;
        let items = stmt
            .query_map([user_id], |r| {
                Ok(RankedItem {
                    item_id: item_id(r.get(0)?)?,
                    name: r.get(1)?,
                    collaborative: r.get(2)?,
                    content_based: r.get(3)?,
                    group_weight: r.get(4)?,
                    score: r.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| map_db_err!("load recommendations", e))?;
        Ok(items)
    }

    fn put_recommendations(&mut self, user_id: &str, items: &[RankedItem]) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| map_db_err!("start transaction", e))?;
        write_recommendations(&tx, user_id, items)?;
        tx.commit().map_err(|e| map_db_err!("commit recommendations", e))
    }

    fn delete_recommendations(&mut self, user_id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM recommendations WHERE user_id = ?1", [user_id])
            .map_err(|e| map_db_err!("delete recommendations", e))?;
        Ok(())
    }

    fn put_group_weight(&mut self, weight: &GroupWeight) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO group_weights (source_group, target_group, weight) VALUES (?1, ?2, ?3)",
                params![weight.source_group, weight.target_group, weight.weight],
            )
            .map_err(|e| map_db_err!("store group weight", e))?;
        Ok(())
    }

    fn delete_group_weight(&mut self, source: &str, target: &str) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM group_weights WHERE source_group = ?1 AND target_group = ?2",
                [source, target],
            )
            .map_err(|e| map_db_err!("delete group weight", e))?;
        Ok(())
    }

    fn group_weights(&self) -> Result<Vec<GroupWeight>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_group, target_group, weight FROM group_weights ORDER BY source_group, target_group",
        )?;
        let weights = stmt
            .query_map([], |r| {
                Ok(GroupWeight {
                    source_group: r.get(0)?,
                    target_group: r.get(1)?,
                    weight: r.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| map_db_err!("load group weights", e))?;
        Ok(weights)
    }

    fn last_computed(&self) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'last_computed'",
                [],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| map_db_err!("read last computed time", e))?;
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| RecError::invalid_value("last_computed", e))
        })
        .transpose()
    }

    #[tracing::instrument(skip_all, fields(pairs = snapshot.matrix.len(), users = snapshot.recommendations.len()))]
    fn commit_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| map_db_err!("start transaction", e))?;

        write_matrix(&tx, &snapshot.matrix)?;

        tx.execute("DELETE FROM item_keywords", [])
            .map_err(|e| map_db_err!("clear item keywords", e))?;
        for (item, keywords) in &snapshot.item_keywords {
            write_item_keywords(&tx, *item, keywords)?;
        }

        tx.execute("DELETE FROM user_profiles", [])
            .map_err(|e| map_db_err!("clear profiles", e))?;
        for (user_id, profile) in &snapshot.profiles {
            write_profile(&tx, user_id, profile)?;
        }

        tx.execute("DELETE FROM recommendations", [])
            .map_err(|e| map_db_err!("clear recommendations", e))?;
        for (user_id, items) in &snapshot.recommendations {
            write_recommendations(&tx, user_id, items)?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO store_meta (key, value) VALUES ('last_computed', ?1)",
            [snapshot.computed_at.to_rfc3339()],
        )
        .map_err(|e| map_db_err!("record last computed time", e))?;

        tx.commit().map_err(|e| map_db_err!("commit snapshot", e))?;
        Ok(())
    }
}
