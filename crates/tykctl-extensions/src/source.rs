//! Extension source boundary
//!
//! Resolving a repository reference to a downloadable release and fetching
//! its binary is all the lifecycle needs from the outside world, so it is
//! behind a small trait; [`GithubSource`] is the production implementation
//! and tests swap in a local fake.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use tykctl_core::Result;
use tykctl_plugins::naming;

const GITHUB_API_URL: &str = "https://api.github.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A resolved, fetchable extension release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExtension {
    /// Extension name (repository name)
    pub name: String,

    /// Release version (tag without the leading 'v')
    pub version: String,

    /// Canonical repository URL
    pub repository: String,

    /// URL of the binary asset
    pub download_url: String,
}

/// Where extension releases come from
#[async_trait]
pub trait ExtensionSource: Send + Sync {
    /// Resolve an `owner/name` reference to its latest release
    async fn resolve(&self, repo: &str) -> Result<ResolvedExtension>;

    /// Download the resolved release's binary
    async fn fetch(&self, resolved: &ResolvedExtension) -> Result<Vec<u8>>;
}

/// GitHub releases as the extension source
pub struct GithubSource {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
}

impl GithubSource {
    pub fn new() -> Result<Self> {
        Self::with_api_url(GITHUB_API_URL)
    }

    /// Point at a different API base (used by tests against a local server)
    pub fn with_api_url(api_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("tykctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(http_error)?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }
}

#[async_trait]
impl ExtensionSource for GithubSource {
    async fn resolve(&self, repo: &str) -> Result<ResolvedExtension> {
        let name = repo.rsplit('/').next().unwrap_or(repo).to_string();
        let url = format!("{}/repos/{}/releases/latest", self.api_url, repo);
        debug!("Resolving latest release from {}", url);

        let release: Release = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?
            .json()
            .await
            .map_err(http_error)?;

        let binary_name = naming::extension_binary_name(&name);
        let asset = release
            .assets
            .iter()
            .find(|a| a.name == binary_name)
            .or_else(|| release.assets.iter().find(|a| a.name.starts_with(&binary_name)))
            .ok_or_else(|| {
                tykctl_core::Error::Source(format!(
                    "release {} has no asset named {binary_name}",
                    release.tag_name
                ))
            })?;

        Ok(ResolvedExtension {
            version: release.tag_name.trim_start_matches('v').to_string(),
            repository: format!("https://github.com/{repo}"),
            download_url: asset.browser_download_url.clone(),
            name,
        })
    }

    async fn fetch(&self, resolved: &ResolvedExtension) -> Result<Vec<u8>> {
        debug!("Downloading {} from {}", resolved.name, resolved.download_url);
        let bytes = self
            .client
            .get(&resolved.download_url)
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?
            .bytes()
            .await
            .map_err(http_error)?;
        Ok(bytes.to_vec())
    }
}

fn http_error(e: reqwest::Error) -> tykctl_core::Error {
    tykctl_core::Error::Source(e.to_string())
}
