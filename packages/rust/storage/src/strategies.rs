//! Partner persistence with an ordered fallback chain.
//!
//! Three write strategies, tried in order until one succeeds:
//! 1. [`StoreClient`] — typed REST upsert with merge-on-name conflict
//! 2. [`RestWriter`] — raw REST existence check, then PATCH or POST
//! 3. direct SQL — minimal-field upsert into the local [`Storage`]
//!
//! REST strategies are only present when a REST store is configured, so a
//! local-only deployment goes straight to SQL. Exhausting every strategy
//! fails that one candidate, never the run.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use partnerscout_shared::{PartnerRecord, PartnerScoutError, Result};

use crate::Storage;

/// Default timeout in seconds for store requests.
const STORE_TIMEOUT_SECS: u64 = 10;

/// User-Agent string for store requests.
const USER_AGENT: &str = concat!("PartnerScout/", env!("CARGO_PKG_VERSION"));

fn build_http() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(STORE_TIMEOUT_SECS))
        .build()
        .map_err(|e| PartnerScoutError::Network(format!("failed to build HTTP client: {e}")))
}

// ---------------------------------------------------------------------------
// Strategy 1: typed client upsert
// ---------------------------------------------------------------------------

/// Typed REST store client. One request per record: upsert with merge on the
/// `name` unique constraint.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl StoreClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: build_http()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Upsert one record, merging on name conflict.
    pub async fn upsert(&self, record: &PartnerRecord) -> Result<()> {
        let url = format!(
            "{}/rest/v1/potential_partners?on_conflict=name",
            self.base_url
        );

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| PartnerScoutError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PartnerScoutError::Storage(format!(
                "store upsert returned HTTP {status} for {}",
                record.name
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Strategy 2: raw REST check + PATCH/POST
// ---------------------------------------------------------------------------

/// Raw REST writer: check whether the row exists, then PATCH or POST.
#[derive(Debug, Clone)]
pub struct RestWriter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestWriter {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: build_http()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
    }

    /// Write one record: update if a row with this name exists, insert otherwise.
    pub async fn write(&self, record: &PartnerRecord) -> Result<()> {
        let filter_url = format!(
            "{}/rest/v1/potential_partners?name=eq.{}&select=name",
            self.base_url,
            urlencode(&record.name)
        );

        let check = self
            .request(self.http.get(&filter_url))
            .send()
            .await
            .map_err(|e| PartnerScoutError::Network(format!("{filter_url}: {e}")))?;

        let exists = check.status().is_success()
            && check
                .json::<Vec<serde_json::Value>>()
                .await
                .map(|rows| !rows.is_empty())
                .unwrap_or(false);

        let response = if exists {
            let url = format!(
                "{}/rest/v1/potential_partners?name=eq.{}",
                self.base_url,
                urlencode(&record.name)
            );
            self.request(self.http.patch(&url)).json(record).send().await
        } else {
            let url = format!("{}/rest/v1/potential_partners", self.base_url);
            self.request(self.http.post(&url)).json(record).send().await
        }
        .map_err(|e| PartnerScoutError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PartnerScoutError::Storage(format!(
                "REST write returned HTTP {status} for {}",
                record.name
            )));
        }
        Ok(())
    }
}

/// Percent-encode a company name for use in a query filter.
fn urlencode(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// The chain
// ---------------------------------------------------------------------------

enum Strategy {
    Client(StoreClient),
    Rest(RestWriter),
    Sql(Arc<Storage>),
}

impl Strategy {
    fn name(&self) -> &'static str {
        match self {
            Self::Client(_) => "store-client",
            Self::Rest(_) => "rest-writer",
            Self::Sql(_) => "direct-sql",
        }
    }

    async fn upsert(&self, record: &PartnerRecord) -> Result<()> {
        match self {
            Self::Client(client) => client.upsert(record).await,
            Self::Rest(writer) => writer.write(record).await,
            Self::Sql(storage) => {
                storage
                    .upsert_partner_minimal(
                        &record.name,
                        record.score,
                        &record.industry,
                        &record.description,
                    )
                    .await
            }
        }
    }
}

/// Ordered fallback chain over the configured write strategies.
pub struct PartnerStore {
    strategies: Vec<Strategy>,
}

impl PartnerStore {
    /// Build the chain. REST strategies are included only when a REST store
    /// endpoint is configured; direct SQL is always last.
    pub fn new(rest_endpoint: Option<(String, String)>, storage: Arc<Storage>) -> Result<Self> {
        let mut strategies = Vec::new();

        if let Some((url, key)) = rest_endpoint {
            strategies.push(Strategy::Client(StoreClient::new(url.clone(), key.clone())?));
            strategies.push(Strategy::Rest(RestWriter::new(url, key)?));
        } else {
            debug!("no REST store configured, using direct SQL only");
        }
        strategies.push(Strategy::Sql(storage));

        Ok(Self { strategies })
    }

    /// Upsert one record through the chain. Returns whether any strategy
    /// succeeded; exhaustion is logged, not propagated.
    #[instrument(skip_all, fields(partner = %record.name))]
    pub async fn upsert_partner(&self, record: &PartnerRecord) -> bool {
        for strategy in &self.strategies {
            match strategy.upsert(record).await {
                Ok(()) => {
                    info!(strategy = strategy.name(), "partner saved");
                    return true;
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "save strategy failed, trying next");
                }
            }
        }
        warn!("all save strategies exhausted, partner not saved");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_storage;
    use wiremock::matchers::{headers, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(name: &str) -> PartnerRecord {
        PartnerRecord {
            name: name.into(),
            score: 7.0,
            industry: "sports tech".into(),
            description: "desc".into(),
            leadership: vec![],
            products: vec![],
            opportunities: vec![],
            market_analysis: None,
            partnership_potential: None,
            hq_location: String::new(),
            website: String::new(),
            size_range: String::new(),
            logo: String::new(),
        }
    }

    #[tokio::test]
    async fn store_client_sends_merge_upsert() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/potential_partners"))
            .and(query_param("on_conflict", "name"))
            .and(headers(
                "Prefer",
                vec!["resolution=merge-duplicates", "return=minimal"],
            ))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let client = StoreClient::new(server.uri(), "key").unwrap();
        client.upsert(&record("Acme")).await.expect("upsert");
    }

    #[tokio::test]
    async fn rest_writer_patches_existing_row() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/potential_partners"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{"name": "Acme"}])),
            )
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/potential_partners"))
            .and(query_param("name", "eq.Acme"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let writer = RestWriter::new(server.uri(), "key").unwrap();
        writer.write(&record("Acme")).await.expect("patch");
    }

    #[tokio::test]
    async fn rest_writer_posts_new_row() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/potential_partners"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/potential_partners"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let writer = RestWriter::new(server.uri(), "key").unwrap();
        writer.write(&record("NewCo")).await.expect("post");
    }

    #[tokio::test]
    async fn chain_falls_back_to_sql_when_rest_fails() {
        let server = MockServer::start().await;

        // Every REST call fails.
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let storage = Arc::new(test_storage().await);
        let store = PartnerStore::new(
            Some((server.uri(), "key".into())),
            storage.clone(),
        )
        .unwrap();

        assert!(store.upsert_partner(&record("Acme")).await);
        let saved = storage.get_partner("Acme").await.unwrap().expect("saved via SQL");
        assert_eq!(saved.score, 7.0);
    }

    #[tokio::test]
    async fn chain_without_rest_uses_sql_directly() {
        let storage = Arc::new(test_storage().await);
        let store = PartnerStore::new(None, storage.clone()).unwrap();

        assert!(store.upsert_partner(&record("LocalCo")).await);
        assert!(storage.get_partner("LocalCo").await.unwrap().is_some());
    }

    #[test]
    fn urlencode_escapes_spaces_and_symbols() {
        assert_eq!(urlencode("Acme Sports & Co."), "Acme%20Sports%20%26%20Co.");
        assert_eq!(urlencode("Plain-Name_1.2~x"), "Plain-Name_1.2~x");
    }
}
