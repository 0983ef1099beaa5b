//! Resource operation set: create, list, show, update and remove for any kind
//!
//! One generic implementation serves every [`Taxon`]. Kind-specific behavior
//! comes from [`EntityKind`] (parent kind, name bound, keyword rules) and from
//! the kind's [`Attributes`].
//!
//! Validation and reference checks run before any write. An uploaded icon is
//! attached before the record is written and detached again if the write
//! fails; the icon being replaced is detached only once the new record state
//! is stored. The temporary upload is owned by the operation and removed when
//! it returns, whichever way it returns.

use std::collections::HashMap;
use std::marker::PhantomData;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::assets::{Asset, AssetLifecycle, AssetStore, TempUpload};
use crate::core::entity::{required_text, Attributes, Fields, Record, Taxon};
use crate::core::error::ServiceError;
use crate::core::guards::{ensure_parent_exists, ensure_unique};
use crate::core::identity::{EntityKind, RecordId};
use crate::core::slug::slugify;
use crate::core::store::{
    from_document, to_document, AssetLedger, DocumentStore, Filter, Page,
};

/// Default page size for `list`
pub const DEFAULT_LIMIT: u64 = 10;

/// Successful result of an operation
#[derive(Debug, Clone, Serialize)]
pub struct Reply<T> {
    /// HTTP-style status intent (201 for create, 200 otherwise)
    pub status: u16,
    pub message: String,
    pub payload: T,
}

impl<T> Reply<T> {
    fn ok(message: String, payload: T) -> Self {
        Self {
            status: 200,
            message,
            payload,
        }
    }

    fn created(message: String, payload: T) -> Self {
        Self {
            status: 201,
            message,
            payload,
        }
    }
}

/// Raw listing parameters as supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub keyword: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: impl ToString) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    pub fn offset(mut self, offset: impl ToString) -> Self {
        self.offset = Some(offset.to_string());
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }
}

/// One page of a listing plus the total number of matches
#[derive(Debug, Clone, Serialize)]
pub struct ListPage<A> {
    pub results: Vec<Record<A>>,
    pub limit: u64,
    pub offset: u64,
    pub count: u64,
}

fn parse_window_value(raw: Option<&str>, default: u64) -> Result<u64, ServiceError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse::<u64>()
        .map_err(|_| ServiceError::validation("Invalid limit or offset value"))
}

fn parse_record_id(kind: EntityKind, raw: &str) -> Result<RecordId, ServiceError> {
    RecordId::parse(raw.trim())
        .map_err(|_| ServiceError::validation(format!("Invalid {} ID", kind.label())))
}

/// Record store plus asset store: everything the operations need
pub struct Catalog<S, A> {
    store: S,
    assets: A,
    default_limit: u64,
}

impl<S, A> Catalog<S, A>
where
    S: DocumentStore + AssetLedger,
    A: AssetStore,
{
    pub fn new(store: S, assets: A) -> Self {
        Self {
            store,
            assets,
            default_limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    pub fn lifecycle(&self) -> AssetLifecycle<'_, S, A> {
        AssetLifecycle::new(&self.store, &self.assets)
    }

    /// Operation set for kind `T`
    pub fn resource<T: Taxon>(&self) -> ResourceSet<'_, T, S, A> {
        ResourceSet {
            catalog: self,
            _taxon: PhantomData,
        }
    }

    /// Recorded asset metadata, newest first
    pub fn list_assets(&self) -> Result<Reply<Vec<Asset>>, ServiceError> {
        let assets = self.store.list_assets()?;
        Ok(Reply::ok(
            format!("{} assets recorded", assets.len()),
            assets,
        ))
    }
}

/// The operations of one kind
pub struct ResourceSet<'a, T, S, A> {
    catalog: &'a Catalog<S, A>,
    _taxon: PhantomData<T>,
}

type Patch<T> = <<T as Taxon>::Attrs as Attributes>::Patch;

impl<'a, T, S, A> ResourceSet<'a, T, S, A>
where
    T: Taxon,
    S: DocumentStore + AssetLedger,
    A: AssetStore,
{
    fn kind(&self) -> EntityKind {
        T::KIND
    }

    fn store(&self) -> &'a S {
        &self.catalog.store
    }

    /// Resolve a caller-supplied parent id against the kind's parent kind
    fn resolve_parent(&self, raw: Option<&str>) -> Result<Option<RecordId>, ServiceError> {
        let kind = self.kind();
        match kind.parent() {
            Some(parent_kind) => ensure_parent_exists(self.store(), parent_kind, raw).map(Some),
            None if raw.map(str::trim).is_some_and(|s| !s.is_empty()) => Err(
                ServiceError::validation(format!("{} does not take a parent", kind.label())),
            ),
            None => Ok(None),
        }
    }

    /// Fill in `parent_name`, looking each distinct parent up once.
    ///
    /// A parent that no longer exists leaves the name empty.
    fn resolve_parent_names(&self, records: &mut [Record<T::Attrs>]) -> Result<(), ServiceError> {
        let Some(parent_kind) = self.kind().parent() else {
            return Ok(());
        };
        let mut names: HashMap<RecordId, Option<String>> = HashMap::new();
        for record in records.iter_mut() {
            let Some(parent) = record.parent else {
                continue;
            };
            let name = match names.get(&parent) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .store()
                        .find_by_id(parent_kind, &parent)?
                        .map(|doc| doc.name);
                    names.insert(parent, name.clone());
                    name
                }
            };
            record.parent_name = name;
        }
        Ok(())
    }

    /// Create a record, attaching `file` as its icon
    pub fn create(
        &self,
        fields: Fields<Patch<T>>,
        file: Option<TempUpload>,
    ) -> Result<Reply<RecordId>, ServiceError> {
        let kind = self.kind();
        debug!(kind = %kind, has_file = file.is_some(), "resource: create");

        let name = required_text(fields.name.as_deref(), kind.name_label(), kind.name_max_len())?;
        let attrs = T::Attrs::create(fields.attrs)?;
        let parent = self.resolve_parent(fields.parent.as_deref())?;
        let slug = slugify(&name);
        ensure_unique(self.store(), kind, &slug, None)?;

        let lifecycle = self.catalog.lifecycle();
        let asset = file.as_ref().map(|f| lifecycle.attach(f)).transpose()?;

        let now = Utc::now();
        let record = Record {
            id: RecordId::new(),
            name,
            slug,
            parent,
            parent_name: None,
            icon: asset.as_ref().map(|a| a.secure_url.clone()),
            attrs,
            created_at: now,
            updated_at: now,
        };

        let written = to_document(&record).and_then(|doc| self.store().insert(kind, &doc));
        if let Err(e) = written {
            if let Some(asset) = &asset {
                lifecycle.detach_logged(&asset.secure_url);
            }
            return Err(e.into());
        }

        info!(kind = %kind, id = %record.id, slug = %record.slug, "resource: created");
        Ok(Reply::created(
            format!("{} created successfully", kind.label()),
            record.id,
        ))
    }

    /// Page through records, newest first
    pub fn list(&self, query: ListQuery) -> Result<Reply<ListPage<T::Attrs>>, ServiceError> {
        let kind = self.kind();
        let limit = parse_window_value(query.limit.as_deref(), self.catalog.default_limit)?;
        let offset = parse_window_value(query.offset.as_deref(), 0)?;
        let filter = Filter::keyword(kind, query.keyword.as_deref().unwrap_or_default());
        debug!(kind = %kind, limit, offset, keyword = ?filter.keyword, "resource: list");

        let count = self.store().count(kind, &filter)?;
        let docs = if limit == 0 {
            Vec::new()
        } else {
            self.store().find(kind, &filter, Page { limit, offset })?
        };
        let mut results = docs
            .into_iter()
            .map(|doc| from_document(kind, doc))
            .collect::<Result<Vec<_>, _>>()?;
        self.resolve_parent_names(&mut results)?;

        Ok(Reply::ok(
            format!("{} list fetched successfully", kind.label()),
            ListPage {
                results,
                limit,
                offset,
                count,
            },
        ))
    }

    /// Fetch one record by id
    pub fn show(&self, id: &str) -> Result<Reply<Record<T::Attrs>>, ServiceError> {
        let kind = self.kind();
        let id = parse_record_id(kind, id)?;
        let doc = self
            .store()
            .find_by_id(kind, &id)?
            .ok_or_else(|| ServiceError::NotFound(format!("{} not found", kind.label())))?;
        let mut record = from_document(kind, doc)?;
        self.resolve_parent_names(std::slice::from_mut(&mut record))?;
        Ok(Reply::ok(
            format!("{} fetched successfully", kind.label()),
            record,
        ))
    }

    /// Apply the supplied fields to an existing record.
    ///
    /// Absent fields keep their stored values.
    pub fn update(
        &self,
        id: &str,
        fields: Fields<Patch<T>>,
        file: Option<TempUpload>,
    ) -> Result<Reply<RecordId>, ServiceError> {
        let kind = self.kind();
        let id = parse_record_id(kind, id)?;
        if fields.name.is_none()
            && fields.parent.is_none()
            && T::Attrs::is_empty(&fields.attrs)
            && file.is_none()
        {
            return Err(ServiceError::validation("No fields to update"));
        }
        debug!(kind = %kind, id = %id, has_file = file.is_some(), "resource: update");

        let doc = self
            .store()
            .find_by_id(kind, &id)?
            .ok_or_else(|| ServiceError::NotFound(format!("{} not found", kind.label())))?;
        let mut record: Record<T::Attrs> = from_document(kind, doc)?;

        let name = fields
            .name
            .as_deref()
            .map(|n| required_text(Some(n), kind.name_label(), kind.name_max_len()))
            .transpose()?;
        record.attrs.apply(fields.attrs)?;
        if fields.parent.is_some() {
            record.parent = self.resolve_parent(fields.parent.as_deref())?;
        }
        if let Some(name) = name {
            let slug = slugify(&name);
            ensure_unique(self.store(), kind, &slug, Some(id))?;
            record.name = name;
            record.slug = slug;
        }

        let lifecycle = self.catalog.lifecycle();
        let asset = file.as_ref().map(|f| lifecycle.attach(f)).transpose()?;
        let previous_icon = match &asset {
            Some(a) => record.icon.replace(a.secure_url.clone()),
            None => None,
        };
        record.updated_at = Utc::now();

        let written = match to_document(&record).and_then(|doc| self.store().replace(kind, &doc)) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ServiceError::NotFound(format!("{} not found", kind.label()))),
            Err(e) => Err(ServiceError::from(e)),
        };
        if let Err(e) = written {
            if let Some(asset) = &asset {
                lifecycle.detach_logged(&asset.secure_url);
            }
            return Err(e);
        }

        if let Some(old) = previous_icon {
            lifecycle.detach_logged(&old);
        }

        info!(kind = %kind, id = %id, "resource: updated");
        Ok(Reply::ok(
            format!("{} updated successfully", kind.label()),
            id,
        ))
    }

    /// Delete a record and detach its icon
    pub fn remove(&self, id: &str) -> Result<Reply<Record<T::Attrs>>, ServiceError> {
        let kind = self.kind();
        let id = parse_record_id(kind, id)?;
        debug!(kind = %kind, id = %id, "resource: remove");

        let doc = self
            .store()
            .delete(kind, &id)?
            .ok_or_else(|| ServiceError::NotFound(format!("{} not found", kind.label())))?;
        if let Some(icon) = &doc.icon {
            self.catalog.lifecycle().detach_logged(icon);
        }

        info!(kind = %kind, id = %id, "resource: removed");
        Ok(Reply::ok(
            format!("{} deleted successfully", kind.label()),
            from_document(kind, doc)?,
        ))
    }
}
