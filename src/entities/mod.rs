//! Taxonomy entity kinds
//!
//! - [`Location`] - delivery/store location, root of the hierarchy
//! - [`Category`] - product category under a location
//! - [`Subcategory`] - sub-category under a category
//! - [`Generic`] - generic product name
//! - [`Supplier`] - supplier with contact details and status

pub mod supplier;
pub mod taxonomy;

pub use supplier::{Supplier, SupplierAttrs, SupplierPatch};
pub use taxonomy::{Category, Generic, Location, Subcategory};
