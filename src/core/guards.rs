//! Pre-write checks: slug uniqueness and parent references
//!
//! Both run before any asset upload so a rejected request costs no remote
//! round-trip. Uniqueness here is advisory; the unique index in the store
//! decides races.

use tracing::debug;

use crate::core::error::ServiceError;
use crate::core::identity::{EntityKind, RecordId};
use crate::core::store::{DocumentStore, Filter};

/// Fail with `Conflict` if another record of `kind` already owns `slug`.
///
/// `exclude` skips the record being updated so it does not conflict with itself.
pub fn ensure_unique<S: DocumentStore + ?Sized>(
    store: &S,
    kind: EntityKind,
    slug: &str,
    exclude: Option<RecordId>,
) -> Result<(), ServiceError> {
    let mut filter = Filter::slug(slug);
    if let Some(id) = exclude {
        filter = filter.excluding(id);
    }
    if let Some(existing) = store.find_one(kind, &filter)? {
        debug!(kind = %kind, slug = %slug, existing = %existing.id, "guards: slug taken");
        return Err(ServiceError::name_taken(kind));
    }
    Ok(())
}

/// Check that `raw` names an existing record of `parent_kind`.
///
/// A malformed id is rejected without touching the store.
pub fn ensure_parent_exists<S: DocumentStore + ?Sized>(
    store: &S,
    parent_kind: EntityKind,
    raw: Option<&str>,
) -> Result<RecordId, ServiceError> {
    let label = parent_kind.label();
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(ServiceError::InvalidReference(format!("{} ID is required", label)));
    }
    let id = RecordId::parse(raw)
        .map_err(|_| ServiceError::InvalidReference(format!("Invalid {} ID", label)))?;

    if store.find_by_id(parent_kind, &id)?.is_none() {
        return Err(ServiceError::InvalidReference(format!("{} does not exist", label)));
    }
    Ok(id)
}
