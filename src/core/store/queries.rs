//! SQLite implementation of the record and asset stores

use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, ToSql};
use serde_json::{Map, Value};
use tracing::debug;

use super::{AssetLedger, Document, DocumentStore, Filter, Page};
use crate::core::assets::Asset;
use crate::core::error::StoreError;
use crate::core::identity::{EntityKind, RecordId};

const RECORD_COLUMNS: &str =
    "id, name, slug, parent_id, icon, attrs, created_at, updated_at";

/// SQLite-backed store for records and asset metadata
pub struct SqliteStore {
    pub(super) conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        debug!(path = %path.display(), "store: opened database");
        Self::with_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }
}

/// Row as read from SQLite, before id/date/JSON decoding
struct RawRecord {
    id: String,
    name: String,
    slug: String,
    parent_id: Option<String>,
    icon: Option<String>,
    attrs: String,
    created_at: String,
    updated_at: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            parent_id: row.get(3)?,
            icon: row.get(4)?,
            attrs: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn decode(self, table: &'static str) -> Result<Document, StoreError> {
        let corrupt = |message: String| StoreError::Corrupt {
            table,
            id: self.id.clone(),
            message,
        };
        let id = RecordId::parse(&self.id).map_err(|e| corrupt(e.to_string()))?;
        let parent = self
            .parent_id
            .as_deref()
            .map(RecordId::parse)
            .transpose()
            .map_err(|e| corrupt(e.to_string()))?;
        let attrs: Map<String, Value> =
            serde_json::from_str(&self.attrs).map_err(|e| corrupt(e.to_string()))?;
        let created_at = parse_timestamp(&self.created_at).map_err(&corrupt)?;
        let updated_at = parse_timestamp(&self.updated_at).map_err(&corrupt)?;

        Ok(Document {
            id,
            name: self.name,
            slug: self.slug,
            parent,
            parent_name: None,
            icon: self.icon,
            attrs,
            created_at,
            updated_at,
        })
    }
}

/// Fixed-width RFC 3339 so that text order is chronological order
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp '{}': {}", s, e))
}

/// Map a unique-index violation onto [`StoreError::Duplicate`]
fn map_write_error(err: rusqlite::Error, kind: EntityKind, slug: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::Duplicate {
                kind,
                slug: slug.to_string(),
            }
        }
        _ => StoreError::Sqlite(err),
    }
}

/// Build the WHERE clause for a filter
fn where_clause(filter: &Filter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut sql = String::from(" WHERE 1=1");
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

    if let Some(ref slug) = filter.slug {
        sql.push_str(" AND slug = ?");
        params_vec.push(Box::new(slug.clone()));
    }

    if let Some(ref id) = filter.exclude_id {
        sql.push_str(" AND id <> ?");
        params_vec.push(Box::new(id.to_string()));
    }

    if let Some(ref keyword) = filter.keyword {
        sql.push_str(" AND (instr(name_folded, ?) > 0");
        params_vec.push(Box::new(keyword.needle.clone()));
        if keyword.match_slug {
            sql.push_str(" OR instr(slug, ?) > 0");
            params_vec.push(Box::new(keyword.needle.clone()));
        }
        if let Some(id) = keyword.id {
            sql.push_str(" OR id = ?");
            params_vec.push(Box::new(id.to_string()));
        }
        sql.push(')');
    }

    (sql, params_vec)
}

impl SqliteStore {
    fn query_documents(
        &self,
        kind: EntityKind,
        sql: &str,
        params_vec: &[Box<dyn ToSql>],
    ) -> Result<Vec<Document>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), RawRecord::from_row)?;

        let mut docs = Vec::new();
        for row in rows {
            docs.push(row?.decode(kind.table())?);
        }
        Ok(docs)
    }
}

impl DocumentStore for SqliteStore {
    fn find_by_id(&self, kind: EntityKind, id: &RecordId) -> Result<Option<Document>, StoreError> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", RECORD_COLUMNS, kind.table());
        let raw = self
            .conn
            .query_row(&sql, params![id.to_string()], RawRecord::from_row)
            .optional()?;
        raw.map(|r| r.decode(kind.table())).transpose()
    }

    fn find_one(&self, kind: EntityKind, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let (clause, params_vec) = where_clause(filter);
        let sql = format!(
            "SELECT {} FROM {}{} LIMIT 1",
            RECORD_COLUMNS,
            kind.table(),
            clause
        );
        Ok(self.query_documents(kind, &sql, &params_vec)?.into_iter().next())
    }

    fn count(&self, kind: EntityKind, filter: &Filter) -> Result<u64, StoreError> {
        let (clause, params_vec) = where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM {}{}", kind.table(), clause);
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let count: i64 = self
            .conn
            .query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn find(&self, kind: EntityKind, filter: &Filter, page: Page) -> Result<Vec<Document>, StoreError> {
        let (clause, mut params_vec) = where_clause(filter);
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            RECORD_COLUMNS,
            kind.table(),
            clause
        );
        params_vec.push(Box::new(i64::try_from(page.limit).unwrap_or(i64::MAX)));
        params_vec.push(Box::new(i64::try_from(page.offset).unwrap_or(i64::MAX)));
        self.query_documents(kind, &sql, &params_vec)
    }

    fn insert(&self, kind: EntityKind, doc: &Document) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} (id, name, name_folded, slug, parent_id, icon, attrs, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            kind.table()
        );
        self.conn
            .execute(
                &sql,
                params![
                    doc.id.to_string(),
                    doc.name,
                    doc.name.to_lowercase(),
                    doc.slug,
                    doc.parent.map(|p| p.to_string()),
                    doc.icon,
                    Value::Object(doc.attrs.clone()).to_string(),
                    format_timestamp(&doc.created_at),
                    format_timestamp(&doc.updated_at),
                ],
            )
            .map_err(|e| map_write_error(e, kind, &doc.slug))?;
        debug!(kind = %kind, id = %doc.id, slug = %doc.slug, "store: inserted");
        Ok(())
    }

    fn replace(&self, kind: EntityKind, doc: &Document) -> Result<bool, StoreError> {
        let sql = format!(
            "UPDATE {} SET name = ?2, name_folded = ?3, slug = ?4, parent_id = ?5, icon = ?6,
                    attrs = ?7, updated_at = ?8
             WHERE id = ?1",
            kind.table()
        );
        let changed = self
            .conn
            .execute(
                &sql,
                params![
                    doc.id.to_string(),
                    doc.name,
                    doc.name.to_lowercase(),
                    doc.slug,
                    doc.parent.map(|p| p.to_string()),
                    doc.icon,
                    Value::Object(doc.attrs.clone()).to_string(),
                    format_timestamp(&doc.updated_at),
                ],
            )
            .map_err(|e| map_write_error(e, kind, &doc.slug))?;
        debug!(kind = %kind, id = %doc.id, changed, "store: replaced");
        Ok(changed > 0)
    }

    fn delete(&self, kind: EntityKind, id: &RecordId) -> Result<Option<Document>, StoreError> {
        let existing = self.find_by_id(kind, id)?;
        if existing.is_some() {
            let sql = format!("DELETE FROM {} WHERE id = ?1", kind.table());
            self.conn.execute(&sql, params![id.to_string()])?;
            debug!(kind = %kind, id = %id, "store: deleted");
        }
        Ok(existing)
    }
}

impl AssetLedger for SqliteStore {
    fn record_asset(&self, asset: &Asset) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO assets (id, secure_url, storage_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                asset.id.to_string(),
                asset.secure_url,
                asset.storage_id,
                format_timestamp(&asset.created_at),
            ],
        )?;
        Ok(())
    }

    fn find_asset_by_url(&self, secure_url: &str) -> Result<Option<Asset>, StoreError> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, secure_url, storage_id, created_at FROM assets WHERE secure_url = ?1",
                params![secure_url],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        raw.map(decode_asset).transpose()
    }

    fn delete_asset(&self, id: &RecordId) -> Result<bool, StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM assets WHERE id = ?1", params![id.to_string()])?;
        Ok(changed > 0)
    }

    fn list_assets(&self) -> Result<Vec<Asset>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, secure_url, storage_id, created_at FROM assets ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut assets = Vec::new();
        for row in rows {
            assets.push(decode_asset(row?)?);
        }
        Ok(assets)
    }
}

fn decode_asset(
    (id, secure_url, storage_id, created_at): (String, String, String, String),
) -> Result<Asset, StoreError> {
    let corrupt = |message: String| StoreError::Corrupt {
        table: "assets",
        id: id.clone(),
        message,
    };
    Ok(Asset {
        id: RecordId::parse(&id).map_err(|e| corrupt(e.to_string()))?,
        secure_url,
        storage_id,
        created_at: parse_timestamp(&created_at).map_err(&corrupt)?,
    })
}
