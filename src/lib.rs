//! taxon: taxonomy catalog management
//!
//! Locations, categories, sub-categories, generics and suppliers stored in
//! SQLite, with icons kept in a pluggable asset store.

pub mod cli;
pub mod core;
pub mod entities;
