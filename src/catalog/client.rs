// Catalog client for the product catalog and package manifest endpoints

use super::manifest::PackageManifest;
use super::{Catalog, xml};
use crate::config::{Config, Endpoints};
use crate::constants;
use crate::error::Result;
use crate::http;
use crate::platform::Platform;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName};

/// Anything that can produce the package manifest for a build reference
#[async_trait]
pub trait PackageSource: Send + Sync {
    async fn fetch_package_manifest(&self, build_guid: &str) -> Result<PackageManifest>;
}

pub struct CatalogClient {
    http: Client,
    endpoints: Endpoints,
}

impl CatalogClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = http::build_client(&config.transport)?;
        Ok(Self::with_client(http, config.endpoints.clone()))
    }

    pub fn with_client(http: Client, endpoints: Endpoints) -> Self {
        Self { http, endpoints }
    }

    /// The underlying client, shared with the fetcher so both use one connection pool
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn catalog_url(&self, platform: Platform) -> String {
        format!(
            "{}?_type=xml&channel={}&platform={}&productType=Desktop",
            self.endpoints.catalog_url,
            self.endpoints.channels,
            urlencoding::encode(platform.as_str())
        )
    }

    pub async fn fetch_catalog(&self, platform: Platform) -> Result<Catalog> {
        let url = self.catalog_url(platform);
        let text = http::fetch_text(&self.http, &url, HeaderMap::new()).await?;
        xml::parse_catalog(&text, platform)
    }

    pub async fn fetch_package_manifest(&self, build_guid: &str) -> Result<PackageManifest> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(constants::BUILD_GUID_HEADER),
            http::header_value(build_guid)?,
        );
        let text = http::fetch_text(&self.http, &self.endpoints.manifest_url, headers).await?;
        PackageManifest::from_json(&text)
    }
}

#[async_trait]
impl PackageSource for CatalogClient {
    async fn fetch_package_manifest(&self, build_guid: &str) -> Result<PackageManifest> {
        CatalogClient::fetch_package_manifest(self, build_guid).await
    }
}
