//! Package inventory source

use crate::error::{InventoryError, InventoryResult};
use async_trait::async_trait;
use monsync_types::{Manifest, Package};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Where the installed packages and their manifests come from.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Every package currently installed
    async fn list_packages(&self) -> InventoryResult<Vec<Package>>;

    /// The manifest of exactly `package`.
    ///
    /// Fails with [`InventoryError::ManifestMismatch`] rather than returning
    /// a manifest for another name or version.
    async fn fetch_manifest(&self, package: &Package) -> InventoryResult<Manifest>;
}

/// HTTP client for the DAppNode package manager
pub struct DappmanagerClient {
    client: Client,
    base_url: String,
}

impl DappmanagerClient {
    /// Create a new client. Every request is bounded by `timeout`.
    pub fn new(endpoint: &str, timeout: Duration) -> InventoryResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> InventoryResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(InventoryError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl InventorySource for DappmanagerClient {
    async fn list_packages(&self) -> InventoryResult<Vec<Package>> {
        self.get("/public-packages").await
    }

    async fn fetch_manifest(&self, package: &Package) -> InventoryResult<Manifest> {
        let manifest: Manifest = self
            .get(&format!("/package-manifest/{}", package.name))
            .await?;
        manifest.ensure_matches(package)?;
        Ok(manifest)
    }
}
