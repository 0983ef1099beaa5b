//! Core module - record model, persistence, assets and the operation set

pub mod assets;
pub mod config;
pub mod entity;
pub mod error;
pub mod guards;
pub mod identity;
pub mod resource;
pub mod slug;
pub mod store;

pub use assets::{
    Asset, AssetLifecycle, AssetStore, DirectoryAssetStore, HttpAssetStore, RemoteConfig,
    TempUpload,
};
pub use config::{Config, ConfigError};
pub use entity::{Attributes, Fields, NoAttrs, Record, Taxon};
pub use error::{AssetError, ServiceError, StoreError};
pub use identity::{EntityKind, IdParseError, RecordId};
pub use resource::{Catalog, ListPage, ListQuery, Reply, ResourceSet};
pub use store::{AssetLedger, DocumentStore, SqliteStore};
