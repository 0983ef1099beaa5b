//! Supplier entity - vendor with classification, status and contact details

use serde::{Deserialize, Serialize};

use crate::core::entity::{optional_text, required_text, Attributes, Taxon};
use crate::core::error::ServiceError;
use crate::core::identity::EntityKind;

/// Supplier marker
#[derive(Debug, Clone, Copy)]
pub struct Supplier;

impl Taxon for Supplier {
    const KIND: EntityKind = EntityKind::Supplier;
    type Attrs = SupplierAttrs;
}

/// Supplier-specific fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierAttrs {
    pub category_of_supplier: String,
    pub supplier_product_category: String,
    /// Free-text status such as "Active"
    pub status: String,

    #[serde(default)]
    pub supplier_address: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
}

/// Caller-supplied supplier fields.
///
/// `None` leaves a field unchanged. An empty string is rejected for the
/// required fields and clears the optional ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplierPatch {
    pub category_of_supplier: Option<String>,
    pub supplier_product_category: Option<String>,
    pub status: Option<String>,
    pub supplier_address: Option<String>,
    pub contact_number: Option<String>,
    pub email_address: Option<String>,
    pub contact_person: Option<String>,
}

const CATEGORY: (&str, usize) = ("Category of supplier", 200);
const PRODUCT_CATEGORY: (&str, usize) = ("Supplier product category", 100);
const STATUS: (&str, usize) = ("Status", 50);
const ADDRESS: (&str, usize) = ("Supplier address", 500);
const CONTACT_NUMBER: (&str, usize) = ("Contact number", 100);
const EMAIL: (&str, usize) = ("Email address", 200);
const CONTACT_PERSON: (&str, usize) = ("Contact person", 200);

fn required(value: Option<&str>, (label, max): (&str, usize)) -> Result<String, ServiceError> {
    required_text(value, label, max)
}

fn optional(value: Option<&str>, (label, max): (&str, usize)) -> Result<Option<String>, ServiceError> {
    match value {
        Some(v) => optional_text(v, label, max),
        None => Ok(None),
    }
}

impl Attributes for SupplierAttrs {
    type Patch = SupplierPatch;

    fn create(patch: SupplierPatch) -> Result<Self, ServiceError> {
        Ok(SupplierAttrs {
            category_of_supplier: required(patch.category_of_supplier.as_deref(), CATEGORY)?,
            supplier_product_category: required(
                patch.supplier_product_category.as_deref(),
                PRODUCT_CATEGORY,
            )?,
            status: required(patch.status.as_deref(), STATUS)?,
            supplier_address: optional(patch.supplier_address.as_deref(), ADDRESS)?,
            contact_number: optional(patch.contact_number.as_deref(), CONTACT_NUMBER)?,
            email_address: optional(patch.email_address.as_deref(), EMAIL)?,
            contact_person: optional(patch.contact_person.as_deref(), CONTACT_PERSON)?,
        })
    }

    fn apply(&mut self, patch: SupplierPatch) -> Result<(), ServiceError> {
        // validate everything before touching self
        let mut next = self.clone();
        if let Some(v) = patch.category_of_supplier.as_deref() {
            next.category_of_supplier = required(Some(v), CATEGORY)?;
        }
        if let Some(v) = patch.supplier_product_category.as_deref() {
            next.supplier_product_category = required(Some(v), PRODUCT_CATEGORY)?;
        }
        if let Some(v) = patch.status.as_deref() {
            next.status = required(Some(v), STATUS)?;
        }
        if patch.supplier_address.is_some() {
            next.supplier_address = optional(patch.supplier_address.as_deref(), ADDRESS)?;
        }
        if patch.contact_number.is_some() {
            next.contact_number = optional(patch.contact_number.as_deref(), CONTACT_NUMBER)?;
        }
        if patch.email_address.is_some() {
            next.email_address = optional(patch.email_address.as_deref(), EMAIL)?;
        }
        if patch.contact_person.is_some() {
            next.contact_person = optional(patch.contact_person.as_deref(), CONTACT_PERSON)?;
        }
        *self = next;
        Ok(())
    }

    fn is_empty(patch: &SupplierPatch) -> bool {
        *patch == SupplierPatch::default()
    }
}
