//! Error taxonomy for taxonomy operations, storage and assets

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::identity::EntityKind;

/// Failure of a resource operation.
///
/// Each variant maps onto one HTTP-style status through [`ServiceError::status_code`].
#[derive(Debug, Error, Diagnostic)]
pub enum ServiceError {
    /// Malformed or missing caller input
    #[error("{0}")]
    #[diagnostic(code(taxon::validation))]
    Validation(String),

    /// Parent id malformed or parent record absent
    #[error("{0}")]
    #[diagnostic(
        code(taxon::invalid_reference),
        help("create the parent first, or pass the id printed by `list`")
    )]
    InvalidReference(String),

    /// Another record of the same kind already owns the slug
    #[error("{0}")]
    #[diagnostic(code(taxon::conflict), help("names are compared by slug: case and extra spaces are ignored"))]
    Conflict(String),

    /// Target record absent
    #[error("{0}")]
    #[diagnostic(code(taxon::not_found))]
    NotFound(String),

    /// Remote asset store rejected or failed the upload
    #[error("Failed to upload image")]
    #[diagnostic(code(taxon::upload_failure))]
    UploadFailure(#[source] AssetError),

    /// Storage operation failed
    #[error("Server error occurred")]
    #[diagnostic(code(taxon::persistence))]
    Persistence(#[source] StoreError),
}

impl ServiceError {
    /// HTTP-style status intent of this error
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_)
            | ServiceError::InvalidReference(_)
            | ServiceError::Conflict(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::UploadFailure(_) | ServiceError::Persistence(_) => 500,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    /// Conflict raised for a slug collision in `kind`
    pub fn name_taken(kind: EntityKind) -> Self {
        ServiceError::Conflict(format!(
            "A {} with this name already exists",
            kind.label().to_lowercase()
        ))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { kind, .. } => ServiceError::name_taken(kind),
            other => ServiceError::Persistence(other),
        }
    }
}

/// Failure inside the persistence layer
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    /// The storage-level unique index rejected a write
    #[error("duplicate slug '{slug}' in {}", .kind.table())]
    #[diagnostic(code(taxon::store::duplicate))]
    Duplicate { kind: EntityKind, slug: String },

    #[error("database error: {0}")]
    #[diagnostic(code(taxon::store::sqlite))]
    Sqlite(#[from] rusqlite::Error),

    /// A stored row could not be decoded
    #[error("corrupt {table} row '{id}': {message}")]
    #[diagnostic(code(taxon::store::corrupt))]
    Corrupt {
        table: &'static str,
        id: String,
        message: String,
    },

    #[error("could not prepare database location {path}: {source}")]
    #[diagnostic(code(taxon::store::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure talking to an asset store
#[derive(Debug, Error, Diagnostic)]
pub enum AssetError {
    #[error("file not found: {0}")]
    #[diagnostic(code(taxon::asset::missing_file))]
    MissingFile(PathBuf),

    #[error("asset I/O error on {path}: {source}")]
    #[diagnostic(code(taxon::asset::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset service request failed: {0}")]
    #[diagnostic(code(taxon::asset::transport))]
    Transport(#[from] reqwest::Error),

    #[error("asset service rejected the request ({status}): {body}")]
    #[diagnostic(code(taxon::asset::rejected))]
    Rejected { status: u16, body: String },

    #[error("no asset recorded for url {0}")]
    #[diagnostic(code(taxon::asset::unknown))]
    Unknown(String),

    #[error("asset metadata error: {0}")]
    #[diagnostic(code(taxon::asset::ledger))]
    Ledger(#[from] StoreError),
}
