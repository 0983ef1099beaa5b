//! Kinds that carry only the common record shape

use crate::core::entity::{NoAttrs, Taxon};
use crate::core::identity::EntityKind;

/// Delivery/store location
#[derive(Debug, Clone, Copy)]
pub struct Location;

/// Product category; parent is a [`Location`]
#[derive(Debug, Clone, Copy)]
pub struct Category;

/// Sub-category; parent is a [`Category`]
#[derive(Debug, Clone, Copy)]
pub struct Subcategory;

#[derive(Debug, Clone, Copy)]
pub struct Generic;

impl Taxon for Location {
    const KIND: EntityKind = EntityKind::Location;
    type Attrs = NoAttrs;
}

impl Taxon for Category {
    const KIND: EntityKind = EntityKind::Category;
    type Attrs = NoAttrs;
}

impl Taxon for Subcategory {
    const KIND: EntityKind = EntityKind::Subcategory;
    type Attrs = NoAttrs;
}

impl Taxon for Generic {
    const KIND: EntityKind = EntityKind::Generic;
    type Attrs = NoAttrs;
}
