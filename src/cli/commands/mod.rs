//! CLI command implementations

pub mod assets;
pub mod completions;
pub mod supplier;
pub mod taxon;

use miette::Result;
use std::path::Path;
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::core::assets::{AssetStore, DirectoryAssetStore, HttpAssetStore, TempUpload};
use crate::core::resource::Catalog;
use crate::core::store::SqliteStore;
use crate::core::Config;

/// Catalog as assembled by the binary
pub type AppCatalog = Catalog<SqliteStore, Box<dyn AssetStore>>;

/// Load configuration and open the catalog it describes
pub fn open_catalog(global: &GlobalOpts) -> Result<(AppCatalog, Config)> {
    let config = Config::load(global.config.as_deref())?;
    let store = SqliteStore::open(&config.database)?;

    let assets: Box<dyn AssetStore> = match &config.remote {
        Some(remote) => {
            debug!(endpoint = %remote.endpoint, "using remote asset store");
            Box::new(HttpAssetStore::new(remote.clone())?)
        }
        None => {
            debug!(root = %config.asset_dir.display(), "using directory asset store");
            Box::new(DirectoryAssetStore::new(
                config.asset_dir.clone(),
                config.public_url.clone(),
            ))
        }
    };

    let catalog = Catalog::new(store, assets).with_default_limit(config.default_limit);
    Ok((catalog, config))
}

/// Copy an `--icon` file into the staging area.
///
/// The staged copy is the operation's temporary upload; the caller's file
/// stays where it is.
pub fn stage_icon(icon: Option<&Path>, config: &Config) -> Result<Option<TempUpload>> {
    match icon {
        Some(path) => Ok(Some(TempUpload::stage(path, &config.staging_dir())?)),
        None => Ok(None),
    }
}
