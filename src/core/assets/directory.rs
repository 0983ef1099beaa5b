//! Asset store backed by a local directory

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{AssetStore, UploadedAsset};
use crate::core::error::AssetError;
use crate::core::identity::RecordId;

/// Stores uploads under `<root>/<aa>/<bb>/<id>-<hash>.<ext>`.
///
/// The storage id is the path relative to the root.
#[derive(Debug, Clone)]
pub struct DirectoryAssetStore {
    root: PathBuf,
    public_url: Option<String>,
}

impl DirectoryAssetStore {
    pub fn new(root: impl Into<PathBuf>, public_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a storage id, refusing anything that escapes the root
    fn full_path(&self, storage_id: &str) -> Result<PathBuf, AssetError> {
        let rel = Path::new(storage_id);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if storage_id.is_empty() || escapes {
            return Err(AssetError::Unknown(storage_id.to_string()));
        }
        Ok(self.root.join(rel))
    }

    fn secure_url(&self, storage_id: &str, full_path: &Path) -> String {
        match &self.public_url {
            Some(base) => format!("{}/{}", base, storage_id),
            None => {
                let abs = fs::canonicalize(full_path).unwrap_or_else(|_| full_path.to_path_buf());
                format!("file://{}", abs.display())
            }
        }
    }
}

/// Relative path for a new upload
fn storage_path(id: &RecordId, content: &[u8], ext: Option<&str>) -> String {
    let hex = id.to_string();
    let digest = Sha256::digest(content);
    let short: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    let ext = ext
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{}/{}/{}-{}{}", &hex[0..2], &hex[2..4], hex, short, ext)
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> AssetError + '_ {
    move |source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl AssetStore for DirectoryAssetStore {
    fn upload(&self, path: &Path) -> Result<UploadedAsset, AssetError> {
        if !path.is_file() {
            return Err(AssetError::MissingFile(path.to_path_buf()));
        }
        let content = fs::read(path).map_err(io_err(path))?;
        let ext = path.extension().and_then(|e| e.to_str());
        let storage_id = storage_path(&RecordId::new(), &content, ext);
        let full_path = self.full_path(&storage_id)?;
        debug!(storage_id = %storage_id, size = content.len(), "directory_store: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        // temp file + rename
        let temp_path = full_path.with_extension("partial");
        let mut file = fs::File::create(&temp_path).map_err(io_err(&temp_path))?;
        file.write_all(&content).map_err(io_err(&temp_path))?;
        file.sync_all().map_err(io_err(&temp_path))?;
        drop(file);
        fs::rename(&temp_path, &full_path).map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "directory_store: rename failed");
            let _ = fs::remove_file(&temp_path);
            AssetError::Io {
                path: full_path.clone(),
                source: e,
            }
        })?;

        Ok(UploadedAsset {
            secure_url: self.secure_url(&storage_id, &full_path),
            storage_id,
        })
    }

    fn destroy(&self, storage_id: &str) -> Result<(), AssetError> {
        let full_path = self.full_path(storage_id)?;
        match fs::remove_file(&full_path) {
            Ok(()) => {
                debug!(storage_id = %storage_id, "directory_store: deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AssetError::Io {
                path: full_path,
                source: e,
            }),
        }
    }
}
