//! Database schema initialization

use rusqlite::params;

use super::SqliteStore;
use crate::core::error::StoreError;
use crate::core::identity::EntityKind;

/// Current schema version
pub(super) const SCHEMA_VERSION: i32 = 1;

impl SqliteStore {
    /// Create tables and indexes if they do not exist yet
    pub(super) fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Uploaded asset metadata, looked up by the URL stored on records
            CREATE TABLE IF NOT EXISTS assets (
                id TEXT PRIMARY KEY,
                secure_url TEXT NOT NULL UNIQUE,
                storage_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_assets_created ON assets(created_at);
            "#,
        )?;

        for kind in EntityKind::all() {
            self.conn.execute_batch(&kind_table_sql(kind.table()))?;
        }

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }
}

/// One table per kind; `slug` carries the unique index that is the
/// authority for name uniqueness under concurrent writers.
fn kind_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_folded TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            parent_id TEXT,
            icon TEXT,
            attrs TEXT NOT NULL DEFAULT '{{}}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_{table}_created ON {table}(created_at);
        CREATE INDEX IF NOT EXISTS idx_{table}_parent ON {table}(parent_id);
        "#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creates_all_kind_tables() {
        let store = SqliteStore::open_in_memory().unwrap();
        for kind in EntityKind::all() {
            let exists: i64 = store
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![kind.table()],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "missing table {}", kind.table());
        }
    }

    #[test]
    fn test_schema_init_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        let version: i32 = store
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
