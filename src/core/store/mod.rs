//! Persistence boundary
//!
//! [`DocumentStore`] is the per-kind record interface the operation set is
//! written against; [`AssetLedger`] keeps the local metadata of uploaded
//! assets for reverse lookup by URL. [`SqliteStore`] implements both.
//!
//! Slug uniqueness is enforced here, by a unique index per kind table. The
//! check in [`crate::core::guards`] is only an early exit.

mod queries;
mod schema;

use serde_json::{Map, Value};

use crate::core::assets::Asset;
use crate::core::entity::{Attributes, Record};
use crate::core::error::StoreError;
use crate::core::identity::{EntityKind, RecordId};

pub use queries::SqliteStore;

/// A record as the store sees it: kind-specific fields as a JSON object
pub type Document = Record<Map<String, Value>>;

/// Query over the records of one kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    /// Exact slug
    pub slug: Option<String>,
    /// Skip this record (used when re-checking a record's own slug)
    pub exclude_id: Option<RecordId>,
    pub keyword: Option<Keyword>,
}

/// Free-text keyword condition
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    /// Case-folded substring matched against the name
    pub needle: String,
    /// Also match the needle against the slug
    pub match_slug: bool,
    /// Also match this exact id (OR condition)
    pub id: Option<RecordId>,
}

impl Filter {
    pub fn slug(slug: impl Into<String>) -> Self {
        Self {
            slug: Some(slug.into()),
            ..Default::default()
        }
    }

    pub fn excluding(mut self, id: RecordId) -> Self {
        self.exclude_id = Some(id);
        self
    }

    /// Keyword filter for `kind`; a blank keyword matches everything
    pub fn keyword(kind: EntityKind, raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() {
            return Self::default();
        }
        let config = kind.keyword_config();
        let id = if config.match_id {
            RecordId::parse(text).ok()
        } else {
            None
        };
        Self {
            keyword: Some(Keyword {
                needle: text.to_lowercase(),
                match_slug: config.match_slug,
                id,
            }),
            ..Default::default()
        }
    }
}

/// Pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

/// Record persistence for all kinds
pub trait DocumentStore {
    fn find_by_id(&self, kind: EntityKind, id: &RecordId) -> Result<Option<Document>, StoreError>;

    fn find_one(&self, kind: EntityKind, filter: &Filter) -> Result<Option<Document>, StoreError>;

    fn count(&self, kind: EntityKind, filter: &Filter) -> Result<u64, StoreError>;

    /// Matching records, newest first
    fn find(&self, kind: EntityKind, filter: &Filter, page: Page) -> Result<Vec<Document>, StoreError>;

    /// Insert a new record; a taken slug fails with [`StoreError::Duplicate`]
    fn insert(&self, kind: EntityKind, doc: &Document) -> Result<(), StoreError>;

    /// Replace the stored record with the same id; `false` if it no longer exists
    fn replace(&self, kind: EntityKind, doc: &Document) -> Result<bool, StoreError>;

    /// Delete by id, returning the deleted record
    fn delete(&self, kind: EntityKind, id: &RecordId) -> Result<Option<Document>, StoreError>;
}

/// Local metadata of uploaded assets
pub trait AssetLedger {
    fn record_asset(&self, asset: &Asset) -> Result<(), StoreError>;

    fn find_asset_by_url(&self, secure_url: &str) -> Result<Option<Asset>, StoreError>;

    fn delete_asset(&self, id: &RecordId) -> Result<bool, StoreError>;

    /// All recorded assets, newest first
    fn list_assets(&self) -> Result<Vec<Asset>, StoreError>;
}

/// Convert a typed record into its stored form
pub fn to_document<A: Attributes>(record: &Record<A>) -> Result<Document, StoreError> {
    let attrs = match serde_json::to_value(&record.attrs) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            return Err(StoreError::Corrupt {
                table: "attrs",
                id: record.id.to_string(),
                message: format!("attributes must be an object, got {}", other),
            })
        }
        Err(e) => {
            return Err(StoreError::Corrupt {
                table: "attrs",
                id: record.id.to_string(),
                message: e.to_string(),
            })
        }
    };
    Ok(Record {
        id: record.id,
        name: record.name.clone(),
        slug: record.slug.clone(),
        parent: record.parent,
        parent_name: record.parent_name.clone(),
        icon: record.icon.clone(),
        attrs,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

/// Decode a stored record into its typed form
pub fn from_document<A: Attributes>(kind: EntityKind, doc: Document) -> Result<Record<A>, StoreError> {
    let attrs = serde_json::from_value(Value::Object(doc.attrs)).map_err(|e| StoreError::Corrupt {
        table: kind.table(),
        id: doc.id.to_string(),
        message: e.to_string(),
    })?;
    Ok(Record {
        id: doc.id,
        name: doc.name,
        slug: doc.slug,
        parent: doc.parent,
        parent_name: doc.parent_name,
        icon: doc.icon,
        attrs,
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    })
}
