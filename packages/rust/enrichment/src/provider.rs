//! Company profile provider client.
//!
//! Fetches firmographic data (headquarters, size, executives, products) by
//! company name. The provider is best-effort: callers treat any failure as
//! "profile unavailable" and continue with an unenriched record.

use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use partnerscout_shared::{PartnerScoutError, Result};

/// Default timeout in seconds for profile requests.
const PROFILE_TIMEOUT_SECS: u64 = 15;

/// User-Agent string for profile requests.
const USER_AGENT: &str = concat!("PartnerScout/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Profile types
// ---------------------------------------------------------------------------

/// A named executive with their title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executive {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
}

/// Firmographic profile for one company. Every field is optional; providers
/// return wildly uneven coverage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub headquarters: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub size_range: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub executives: Vec<Executive>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub customer_segments: Vec<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the profile provider.
#[derive(Debug, Clone)]
pub struct ProfileClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl ProfileClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        // A trailing slash keeps Url::join from eating the last path segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| PartnerScoutError::config(format!("invalid profile base URL: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(PROFILE_TIMEOUT_SECS))
            .build()
            .map_err(|e| PartnerScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Fetch the profile for one company by name.
    #[instrument(skip_all, fields(company = %name))]
    pub async fn fetch_profile(&self, name: &str) -> Result<CompanyProfile> {
        let mut endpoint = self
            .base_url
            .join("company/profile")
            .map_err(|e| PartnerScoutError::config(format!("invalid profile endpoint: {e}")))?;
        endpoint.query_pairs_mut().append_pair("name", name);

        let response = self
            .http
            .get(endpoint.clone())
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| PartnerScoutError::Network(format!("{endpoint}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PartnerScoutError::Provider(format!(
                "profile provider returned HTTP {status} for {name}"
            )));
        }

        response
            .json::<CompanyProfile>()
            .await
            .map_err(|e| PartnerScoutError::parse(format!("malformed profile for {name}: {e}")))
    }
}
