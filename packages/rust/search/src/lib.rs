//! Text search provider client.
//!
//! Given an industry query, fetches up to `num_results` web results from an
//! Exa-style search API, then fetches full page text per result from the
//! content endpoint. Content fetch failures fall back to the search snippet
//! so a degraded provider never sinks the whole run.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use partnerscout_shared::{PartnerScoutError, Result, SearchHit};

/// Default timeout in seconds for the search request.
const SEARCH_TIMEOUT_SECS: u64 = 15;

/// Default timeout in seconds for per-result content fetches.
const CONTENT_TIMEOUT_SECS: u64 = 10;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("PartnerScout/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SearchRequest {
    query: String,
    num_results: usize,
    use_autoprompt: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Serialize)]
struct ContentRequest<'a> {
    url: &'a str,
    include_text: bool,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    text: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the text search provider.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl SearchClient {
    /// Build a client against the given provider base URL.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PartnerScoutError::config(format!("invalid search base URL: {e}")))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| PartnerScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PartnerScoutError::config(format!("invalid endpoint {path}: {e}")))
    }

    /// Search for companies in an industry and return hydrated hits.
    ///
    /// The search request itself is fatal on failure; per-result content
    /// fetches are not — they degrade to the snippet.
    #[instrument(skip_all, fields(industry = %industry, num_results))]
    pub async fn search_industry(&self, industry: &str, num_results: usize) -> Result<Vec<SearchHit>> {
        let endpoint = self.endpoint("/search")?;
        let request = SearchRequest {
            query: format!("top companies in {industry} industry"),
            num_results,
            use_autoprompt: true,
        };

        let response = self
            .http
            .post(endpoint.clone())
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PartnerScoutError::Network(format!("{endpoint}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PartnerScoutError::Provider(format!(
                "search provider returned HTTP {status}"
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| PartnerScoutError::parse(format!("malformed search response: {e}")))?;

        let mut hits = Vec::with_capacity(body.results.len());
        for result in body.results {
            let text = self.fetch_text(&result).await;
            hits.push(SearchHit {
                title: result.title,
                url: result.url,
                text,
                snippet: result.snippet,
            });
        }

        info!(hits = hits.len(), "search results hydrated");
        Ok(hits)
    }

    /// Fetch full page text for one result, falling back to the snippet on
    /// any failure.
    async fn fetch_text(&self, result: &RawResult) -> String {
        let endpoint = match self.endpoint("/content") {
            Ok(url) => url,
            Err(_) => return result.snippet.clone(),
        };

        let request = ContentRequest {
            url: &result.url,
            include_text: true,
        };

        let response = self
            .http
            .post(endpoint)
            .header("x-api-key", &self.api_key)
            .timeout(std::time::Duration::from_secs(CONTENT_TIMEOUT_SECS))
            .json(&request)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.json::<ContentResponse>().await {
                Ok(content) if !content.text.is_empty() => content.text,
                Ok(_) => result.snippet.clone(),
                Err(e) => {
                    debug!(url = %result.url, error = %e, "content response not JSON, using snippet");
                    result.snippet.clone()
                }
            },
            Ok(resp) => {
                // 404s are routine for pages the provider has not indexed
                if resp.status() != reqwest::StatusCode::NOT_FOUND {
                    warn!(url = %result.url, status = %resp.status(), "content fetch failed, using snippet");
                }
                result.snippet.clone()
            }
            Err(e) => {
                warn!(url = %result.url, error = %e, "content request error, using snippet");
                result.snippet.clone()
            }
        }
    }
}
