//! Record model shared by every taxonomy kind

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::core::error::ServiceError;
use crate::core::identity::{EntityKind, RecordId};

/// A stored taxonomy record.
///
/// Every kind shares the name/slug/icon/parent shape; kind-specific fields
/// live in `attrs` and are flattened when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<A> {
    pub id: RecordId,

    /// Display name (trimmed)
    pub name: String,

    /// Unique key derived from `name`
    pub slug: String,

    /// Parent record (Category → Location, Subcategory → Category)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<RecordId>,

    /// Name of `parent`, looked up when the record is read; never stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,

    /// Secure URL of the icon asset
    #[serde(default)]
    pub icon: Option<String>,

    #[serde(flatten)]
    pub attrs: A,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind-specific fields of a record.
///
/// `Patch` is the caller-supplied form where every field is optional. For
/// updates, `None` leaves a field unchanged; a blank value for a required field
/// is a validation error.
pub trait Attributes: Serialize + DeserializeOwned + Clone + Debug + PartialEq {
    type Patch: Default + Clone + Debug;

    /// Build the attributes of a new record; all required fields must be supplied
    fn create(patch: Self::Patch) -> Result<Self, ServiceError>;

    /// Validate and apply the supplied fields of `patch`
    fn apply(&mut self, patch: Self::Patch) -> Result<(), ServiceError>;

    /// Whether `patch` supplies no field at all
    fn is_empty(patch: &Self::Patch) -> bool;
}

/// Attributes of kinds that carry nothing beyond the common shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoAttrs {}

impl Attributes for NoAttrs {
    type Patch = ();

    fn create(_patch: ()) -> Result<Self, ServiceError> {
        Ok(NoAttrs {})
    }

    fn apply(&mut self, _patch: ()) -> Result<(), ServiceError> {
        Ok(())
    }

    fn is_empty(_patch: &()) -> bool {
        true
    }
}

/// Binds a marker type to its kind and attribute type
pub trait Taxon {
    const KIND: EntityKind;
    type Attrs: Attributes;
}

/// Plain input record for create and update
#[derive(Debug, Clone, Default)]
pub struct Fields<P> {
    pub name: Option<String>,
    /// Parent id as supplied by the caller (validated before use)
    pub parent: Option<String>,
    pub attrs: P,
}

impl<P: Default> Fields<P> {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: impl ToString) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn with_attrs(mut self, attrs: P) -> Self {
        self.attrs = attrs;
        self
    }
}

/// Validate a required text field: trimmed, non-blank and at most `max_len` characters
pub fn required_text(value: Option<&str>, label: &str, max_len: usize) -> Result<String, ServiceError> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{} is required", label)));
    }
    check_len(trimmed, label, max_len)?;
    Ok(trimmed.to_string())
}

/// Validate an optional text field; blank means "no value"
pub fn optional_text(value: &str, label: &str, max_len: usize) -> Result<Option<String>, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    check_len(trimmed, label, max_len)?;
    Ok(Some(trimmed.to_string()))
}

fn check_len(value: &str, label: &str, max_len: usize) -> Result<(), ServiceError> {
    if value.chars().count() > max_len {
        return Err(ServiceError::validation(format!(
            "{} must be at most {} characters",
            label, max_len
        )));
    }
    Ok(())
}
