//! Latest Gradle release lookup.
//!
//! The release metadata endpoint returns a JSON document describing the current
//! release. Checksums live behind separate URLs and are fetched one by one.
//! A checksum that cannot be fetched degrades to an empty string: the run only
//! needs it when checksum pinning is enabled, and the engine rejects an empty
//! checksum at that point.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::distribution::DistType;
use crate::errors::{Result, UpdateError};

/// Release metadata endpoint for the current Gradle version.
pub const CURRENT_RELEASE_URL: &str = "https://services.gradle.org/versions/current";

const USER_AGENT: &str = concat!("gradle-wrapper-updater/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Target state of an update run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    pub version: String,
    /// SHA-256 of the `-all.zip` distribution.
    pub full_checksum: String,
    /// SHA-256 of the `-bin.zip` distribution.
    pub bin_checksum: String,
    /// SHA-256 of `gradle-wrapper.jar`.
    pub wrapper_checksum: String,
}

impl ReleaseDescriptor {
    /// Checksum for the given distribution kind, `None` when it was not fetched.
    pub fn checksum_for(&self, dist_type: DistType) -> Option<&str> {
        let checksum = match dist_type {
            DistType::All => &self.full_checksum,
            DistType::Bin => &self.bin_checksum,
        };
        (!checksum.is_empty()).then_some(checksum.as_str())
    }
}

/// Where the latest release comes from.
pub trait ReleaseSource {
    fn fetch_latest(&self) -> impl Future<Output = Result<ReleaseDescriptor>> + Send;
}

/// Payload of `versions/current`. Only the fields the updater reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseData {
    version: Option<String>,
    #[serde(default)]
    current: bool,
    checksum_url: Option<String>,
    wrapper_checksum_url: Option<String>,
}

/// [`ReleaseSource`] backed by services.gradle.org.
#[derive(Debug, Clone)]
pub struct HttpReleaseSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReleaseSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| UpdateError::FetchError(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: CURRENT_RELEASE_URL.to_string(),
        })
    }

    /// Point at a different metadata endpoint (mirrors, tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn get_text(&self, url: &str) -> std::result::Result<String, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        debug!(url, status = %response.status(), "GET");
        response.error_for_status()?.text().await
    }

    async fn fetch_checksum(&self, label: &str, url: Option<&str>) -> String {
        let Some(url) = url else {
            warn!(checksum = label, "Release data has no checksum URL");
            return String::new();
        };
        match self.get_text(url).await {
            Ok(body) => {
                let checksum = body.trim().to_string();
                debug!(checksum = label, value = %checksum, "Fetched checksum");
                checksum
            }
            Err(e) => {
                warn!(checksum = label, url, error = %e, "Failed to fetch checksum");
                String::new()
            }
        }
    }
}

impl ReleaseSource for HttpReleaseSource {
    async fn fetch_latest(&self) -> Result<ReleaseDescriptor> {
        let body = self
            .get_text(&self.endpoint)
            .await
            .map_err(|e| UpdateError::FetchError(e.to_string()))?;
        let data = parse_release_data(&body)?;
        debug!(current = data.current, "Release data received");

        let version = data
            .version
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| UpdateError::FetchError("release data has no version".to_string()))?;

        let bin_url = data.checksum_url.as_deref();
        let all_url = bin_url.map(|url| url.replace("-bin.zip", "-all.zip"));
        debug!(?bin_url, ?all_url, "Checksum URLs");

        let bin_checksum = self.fetch_checksum("bin", bin_url).await;
        let full_checksum = self.fetch_checksum("all", all_url.as_deref()).await;
        let wrapper_checksum = self
            .fetch_checksum("wrapper", data.wrapper_checksum_url.as_deref())
            .await;

        Ok(ReleaseDescriptor {
            version,
            full_checksum,
            bin_checksum,
            wrapper_checksum,
        })
    }
}

fn parse_release_data(body: &str) -> Result<ReleaseData> {
    let data: Option<ReleaseData> = serde_json::from_str(body)
        .map_err(|e| UpdateError::FetchError(format!("invalid release data: {e}")))?;
    data.ok_or_else(|| UpdateError::FetchError("empty release data".to_string()))
}
