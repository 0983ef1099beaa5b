//! Icon assets: remote stores, the attach/detach lifecycle and temp uploads
//!
//! An upload arrives as a local temporary file ([`TempUpload`]). It is pushed
//! to an [`AssetStore`] and its metadata recorded in an [`AssetLedger`] so the
//! asset can later be found again from the URL stored on a record.

mod directory;
mod http;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::error::{AssetError, ServiceError};
use crate::core::identity::RecordId;
use crate::core::store::AssetLedger;

pub use directory::DirectoryAssetStore;
pub use http::{HttpAssetStore, RemoteConfig};

/// Locally recorded metadata of an uploaded asset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub id: RecordId,
    pub secure_url: String,
    /// Identifier of the asset inside the store
    pub storage_id: String,
    pub created_at: DateTime<Utc>,
}

/// What a store hands back after an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub secure_url: String,
    pub storage_id: String,
}

/// Durable storage for uploaded files
pub trait AssetStore {
    fn upload(&self, path: &Path) -> Result<UploadedAsset, AssetError>;

    fn destroy(&self, storage_id: &str) -> Result<(), AssetError>;
}

impl<T: AssetStore + ?Sized> AssetStore for Box<T> {
    fn upload(&self, path: &Path) -> Result<UploadedAsset, AssetError> {
        (**self).upload(path)
    }

    fn destroy(&self, storage_id: &str) -> Result<(), AssetError> {
        (**self).destroy(storage_id)
    }
}

/// A local temporary upload file.
///
/// The file is removed when the handle is dropped, whatever path the
/// operation took. A file that is already gone is not an error.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    /// Take ownership of an existing temporary file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Copy `source` into `staging_dir` and own the copy
    pub fn stage(source: &Path, staging_dir: &Path) -> Result<Self, AssetError> {
        if !source.is_file() {
            return Err(AssetError::MissingFile(source.to_path_buf()));
        }
        fs::create_dir_all(staging_dir).map_err(|e| AssetError::Io {
            path: staging_dir.to_path_buf(),
            source: e,
        })?;

        let ext = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let staged = staging_dir.join(format!("{}{}", RecordId::new(), ext));
        fs::copy(source, &staged).map_err(|e| AssetError::Io {
            path: staged.clone(),
            source: e,
        })?;
        debug!(source = %source.display(), path = %staged.display(), "assets: staged upload");
        Ok(Self { path: staged })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        remove_local_file(&self.path);
    }
}

/// Remove a local file, ignoring one that does not exist
pub fn remove_local_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "assets: removed temp file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "assets: could not remove temp file"),
    }
}

/// Attach/detach of assets against a store and its metadata ledger
pub struct AssetLifecycle<'a, L: ?Sized, A: ?Sized> {
    ledger: &'a L,
    store: &'a A,
}

impl<'a, L, A> AssetLifecycle<'a, L, A>
where
    L: AssetLedger + ?Sized,
    A: AssetStore + ?Sized,
{
    pub fn new(ledger: &'a L, store: &'a A) -> Self {
        Self { ledger, store }
    }

    /// Upload `file` and record its metadata.
    ///
    /// If the metadata cannot be recorded the uploaded asset is destroyed
    /// again, so no untracked asset is left behind.
    pub fn attach(&self, file: &TempUpload) -> Result<Asset, ServiceError> {
        let uploaded = self
            .store
            .upload(file.path())
            .map_err(ServiceError::UploadFailure)?;

        let asset = Asset {
            id: RecordId::new(),
            secure_url: uploaded.secure_url,
            storage_id: uploaded.storage_id,
            created_at: Utc::now(),
        };

        if let Err(e) = self.ledger.record_asset(&asset) {
            if let Err(destroy_err) = self.store.destroy(&asset.storage_id) {
                warn!(
                    storage_id = %asset.storage_id,
                    error = %destroy_err,
                    "assets: could not destroy unrecorded upload"
                );
            }
            return Err(ServiceError::UploadFailure(AssetError::Ledger(e)));
        }

        info!(secure_url = %asset.secure_url, storage_id = %asset.storage_id, "assets: attached");
        Ok(asset)
    }

    /// Destroy the asset behind `secure_url` and drop its metadata.
    ///
    /// Callers treat failure as non-fatal and only log it.
    pub fn detach(&self, secure_url: &str) -> Result<(), AssetError> {
        let asset = self
            .ledger
            .find_asset_by_url(secure_url)?
            .ok_or_else(|| AssetError::Unknown(secure_url.to_string()))?;

        self.store.destroy(&asset.storage_id)?;
        self.ledger.delete_asset(&asset.id)?;
        info!(secure_url = %secure_url, storage_id = %asset.storage_id, "assets: detached");
        Ok(())
    }

    /// Detach and log instead of failing
    pub fn detach_logged(&self, secure_url: &str) {
        if let Err(e) = self.detach(secure_url) {
            warn!(secure_url = %secure_url, error = %e, "assets: detach failed");
        }
    }
}
