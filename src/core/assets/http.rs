//! Asset store backed by a remote image service over HTTP

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::{multipart, Client, Response};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{AssetStore, UploadedAsset};
use crate::core::error::AssetError;

/// Connection details of the remote image service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default, skip_serializing)]
    pub api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

/// Signed uploads to a remote image service
pub struct HttpAssetStore {
    client: Client,
    config: RemoteConfig,
}

impl HttpAssetStore {
    pub fn new(config: RemoteConfig) -> Result<Self, AssetError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("taxon/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn check(response: Response) -> Result<Response, AssetError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(AssetError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Request signature: lowercase hex SHA-256 over the sorted `key=value` pairs
/// joined by `&`, followed by the secret.
///
/// The service behind `endpoint` must verify with the same digest. Services
/// that only accept SHA-1 signatures are not supported.
pub(crate) fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut pairs: Vec<_> = params
        .iter()
        .filter(|(k, _)| !matches!(*k, "file" | "api_key" | "signature"))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    let joined = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let digest = Sha256::digest(format!("{}{}", joined, secret).as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

impl AssetStore for HttpAssetStore {
    fn upload(&self, path: &Path) -> Result<UploadedAsset, AssetError> {
        if !path.is_file() {
            return Err(AssetError::MissingFile(path.to_path_buf()));
        }
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(&[("timestamp", timestamp.as_str())], &self.config.api_secret);

        let form = multipart::Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .file("file", path)
            .map_err(|source| AssetError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), endpoint = %self.config.endpoint, "http_store: upload");
        let response = self.client.post(self.url("upload")).multipart(form).send()?;
        let body: UploadResponse = Self::check(response)?.json()?;

        Ok(UploadedAsset {
            secure_url: body.secure_url,
            storage_id: body.public_id,
        })
    }

    fn destroy(&self, storage_id: &str) -> Result<(), AssetError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", storage_id), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        debug!(storage_id = %storage_id, "http_store: destroy");
        let response = self
            .client
            .post(self.url("destroy"))
            .form(&[
                ("public_id", storage_id),
                ("api_key", self.config.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()?;
        Self::check(response)?;
        Ok(())
    }
}
