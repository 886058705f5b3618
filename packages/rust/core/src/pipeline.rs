//! End-to-end discovery run: search → extract → filter → score → enrich → save.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use partnerscout_analysis::{
    Oracle, extract_candidates, fetch_industry_overview, score_candidates,
};
use partnerscout_enrichment::{EnrichmentOptions, ProfileClient, enrich_companies, logo_url};
use partnerscout_search::SearchClient;
use partnerscout_shared::{
    AppConfig, CompanyAnalysis, CurrentPartner, DefaultsConfig, EnrichedPartner, IndustryAnalysis,
    IndustryReport, PartnerRecord, Result, Rubric, SearchHistoryEntry, SearchPhase, default_roster,
    resolve_key,
};
use partnerscout_storage::{ConsideredSet, PartnerStore, Storage};

use crate::filter::filter_candidates;
use crate::status::StatusTracker;

/// Web results requested per run.
const SEARCH_RESULT_COUNT: usize = 10;

/// Outcome of a start request.
#[derive(Debug, Clone)]
pub struct StartReceipt {
    pub accepted: bool,
    pub message: String,
}

/// The discovery pipeline with all its provider clients and stores wired up.
///
/// One instance per process; runs execute on a spawned task and report
/// through the shared [`StatusTracker`].
pub struct Pipeline {
    defaults: DefaultsConfig,
    search: SearchClient,
    oracle: Oracle,
    profiles: ProfileClient,
    storage: Arc<Storage>,
    considered: ConsideredSet,
    store: PartnerStore,
    roster: Vec<CurrentPartner>,
    rubric: Rubric,
    overview_model: String,
    tracker: StatusTracker,
}

impl Pipeline {
    /// Build the pipeline from application config, resolving provider keys
    /// from the configured env vars and opening the local database.
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let search_key = resolve_key(&config.providers.search_key_env)?;
        let oracle_key = resolve_key(&config.providers.oracle_key_env)?;
        let profile_key = resolve_key(&config.providers.profile_key_env)?;

        let search = SearchClient::new(&config.providers.search_base_url, search_key)?;
        let oracle = Oracle::new(
            &config.providers.oracle_base_url,
            oracle_key,
            &config.providers.oracle_model,
        )?;
        let profiles = ProfileClient::new(&config.providers.profile_base_url, profile_key)?;

        let db_path = config.store.resolved_db_path()?;
        let storage = Arc::new(Storage::open(&db_path).await?);
        let store = PartnerStore::new(config.store.rest_endpoint(), storage.clone())?;

        Ok(Self {
            overview_model: config.providers.overview_model.clone(),
            ..Self::from_parts(config.defaults.clone(), search, oracle, profiles, storage, store)
        })
    }

    /// Assemble a pipeline from already-built parts, with the default roster
    /// and rubric. The overview call reuses the oracle's model unless
    /// overridden by config.
    pub fn from_parts(
        defaults: DefaultsConfig,
        search: SearchClient,
        oracle: Oracle,
        profiles: ProfileClient,
        storage: Arc<Storage>,
        store: PartnerStore,
    ) -> Self {
        Self {
            defaults,
            search,
            overview_model: oracle.model().to_string(),
            oracle,
            profiles,
            considered: ConsideredSet::new(storage.clone()),
            storage,
            store,
            roster: default_roster(),
            rubric: Rubric::standard(),
            tracker: StatusTracker::new(),
        }
    }

    /// Handle to the shared status record.
    pub fn tracker(&self) -> StatusTracker {
        self.tracker.clone()
    }

    /// The local database behind the pipeline.
    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    /// Start a discovery run for a free-text industry query.
    ///
    /// Rejects blank queries and concurrent runs; otherwise the run proceeds
    /// on a background task and this returns immediately.
    pub async fn start(self: &Arc<Self>, query: &str) -> StartReceipt {
        let industry = query.trim().to_string();
        if industry.is_empty() {
            return StartReceipt {
                accepted: false,
                message: "Please enter an industry to search".into(),
            };
        }
        // Check-and-claim is atomic: of two simultaneous starts, one loses.
        if !self.tracker.try_begin(&industry).await {
            return StartReceipt {
                accepted: false,
                message: "A search is already in progress".into(),
            };
        }

        let pipeline = self.clone();
        let query = industry.clone();
        tokio::spawn(async move {
            if let Err(e) = pipeline.run_discovery(&query).await {
                warn!(error = %e, "discovery run failed");
                pipeline.tracker.fail(e.to_string()).await;
            }
        });

        StartReceipt {
            accepted: true,
            message: format!("Search started for {industry}"),
        }
    }

    #[instrument(skip_all, fields(industry = %industry))]
    async fn run_discovery(&self, industry: &str) -> Result<()> {
        self.tracker
            .update(
                SearchPhase::Searching,
                format!("Searching for companies in {industry}..."),
                10,
            )
            .await;
        let hits = self
            .search
            .search_industry(industry, SEARCH_RESULT_COUNT)
            .await?;

        self.tracker
            .update(SearchPhase::Extracting, "Identifying companies...", 30)
            .await;
        let candidates =
            extract_candidates(&self.oracle, &hits, industry, self.defaults.candidate_cap).await;

        let outcome = filter_candidates(candidates, &self.roster, &self.considered).await?;
        if outcome.survivors.is_empty() {
            info!(
                roster_excluded = outcome.roster_excluded,
                already_considered = outcome.already_considered,
                "no new candidates to analyze"
            );
            let report = self.empty_report(industry);
            self.record_history(industry, 0).await;
            self.tracker
                .complete("No new companies found to analyze", report)
                .await;
            return Ok(());
        }

        let names: Vec<String> = outcome
            .survivors
            .iter()
            .map(|c| c.name.clone())
            .collect();
        // Mark candidates before scoring so a failed run still excludes them
        // from the next one.
        self.considered.add_all(&names).await?;

        self.tracker
            .update(
                SearchPhase::Analyzing,
                format!("Analyzing {} companies...", names.len()),
                40,
            )
            .await;
        let analyses = score_candidates(
            &self.oracle,
            &names,
            industry,
            &self.roster,
            &self.rubric,
            self.defaults.batch_size,
            self.defaults.scoring_workers,
        )
        .await;

        self.tracker
            .update(SearchPhase::Analyzing, "Compiling industry overview...", 80)
            .await;
        let overview =
            fetch_industry_overview(&self.oracle, &self.overview_model, industry).await;

        self.tracker
            .update(SearchPhase::Enriching, "Enriching company profiles...", 85)
            .await;
        let options = EnrichmentOptions {
            workers: self.defaults.enrichment_workers,
            delay_ms: self.defaults.enrichment_delay_ms,
            max_total_score: self.rubric.max_total_score(),
        };

        // Zero-score and conflicting candidates skip the profile provider
        // entirely; they still appear in the report, unenriched.
        let mut partners: Vec<Option<EnrichedPartner>> = Vec::new();
        let mut enrich_input = Vec::new();
        let mut enrich_slots = Vec::new();
        for (index, mut analysis) in analyses.into_iter().enumerate() {
            analysis.enforce_conflict_zero();
            if analysis.total_score > 0.0 {
                enrich_slots.push(index);
                enrich_input.push(analysis);
                partners.push(None);
            } else {
                partners.push(Some(skipped_partner(analysis)));
            }
        }
        let enriched = enrich_companies(&self.profiles, enrich_input, industry, &options).await;
        for (slot, partner) in enrich_slots.into_iter().zip(enriched) {
            partners[slot] = Some(partner);
        }
        let partners: Vec<EnrichedPartner> = partners.into_iter().flatten().collect();

        self.tracker
            .update(SearchPhase::Enriching, "Saving potential partners...", 95)
            .await;
        let mut saved_count = 0;
        for partner in partners.iter().filter(|p| p.partnership_score > 0.0) {
            let record = PartnerRecord::from_enriched(partner, industry);
            if self.store.upsert_partner(&record).await {
                saved_count += 1;
            }
        }

        // Suitability is about conflicts only; a zero score alone does not
        // disqualify a company from the list.
        let suitable_partners: Vec<String> = partners
            .iter()
            .filter(|p| !p.analysis.competes_with_partners)
            .map(|p| p.analysis.name.clone())
            .collect();

        let found = partners.len();
        let report = self.build_report(industry, overview, partners, suitable_partners, saved_count);
        self.record_history(industry, found as u32).await;
        self.tracker
            .complete(
                format!("Analysis complete: {found} companies, {saved_count} saved"),
                report,
            )
            .await;
        Ok(())
    }

    fn build_report(
        &self,
        industry: &str,
        industry_overview: String,
        companies: Vec<EnrichedPartner>,
        suitable_partners: Vec<String>,
        saved_count: usize,
    ) -> IndustryReport {
        IndustryReport {
            industry: industry.to_string(),
            analysis: IndustryAnalysis {
                industry_overview,
                companies,
                suitable_partners,
            },
            scoring_criteria: self.rubric.clone(),
            max_total_score: self.rubric.max_total_score(),
            saved_count,
        }
    }

    fn empty_report(&self, industry: &str) -> IndustryReport {
        self.build_report(industry, String::new(), Vec::new(), Vec::new(), 0)
    }

    /// Append a history row. History failures are logged, not propagated; the
    /// run's results are already in hand.
    async fn record_history(&self, query: &str, results_count: u32) {
        let entry = SearchHistoryEntry {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            search_type: "industry".into(),
            query: query.to_string(),
            results_count,
        };
        if let Err(e) = self.storage.insert_history(&entry).await {
            warn!(error = %e, "failed to record search history");
        }
    }

    /// Wipe saved partners, the considered set, and search history.
    pub async fn reset_history(&self) -> Result<()> {
        self.storage.clear_all().await?;
        self.considered.invalidate().await;
        info!("search history and considered set cleared");
        Ok(())
    }
}

/// Report entry for a candidate excluded from enrichment.
fn skipped_partner(analysis: CompanyAnalysis) -> EnrichedPartner {
    EnrichedPartner {
        partnership_score: 0.0,
        enriched: false,
        logo_url: logo_url(&analysis.name),
        key_leadership: Vec::new(),
        key_products: Vec::new(),
        partnership_opportunities: Vec::new(),
        market_analysis: None,
        partnership_potential: None,
        hq_location: None,
        website: None,
        size_range: None,
        analysis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn temp_storage() -> Arc<Storage> {
        let path = std::env::temp_dir().join(format!("ps_test_{}.db", Uuid::now_v7()));
        Arc::new(Storage::open(&path).await.expect("open storage"))
    }

    /// Pipeline with every provider pointed at one mock server.
    async fn pipeline(server: &MockServer) -> Arc<Pipeline> {
        let storage = temp_storage().await;
        let store = PartnerStore::new(None, storage.clone()).unwrap();
        let defaults = DefaultsConfig {
            enrichment_delay_ms: 0,
            ..DefaultsConfig::default()
        };

        Arc::new(Pipeline::from_parts(
            defaults,
            SearchClient::new(&server.uri(), "k").unwrap(),
            Oracle::new(&server.uri(), "k", "gpt-4o-mini").unwrap(),
            ProfileClient::new(&server.uri(), "k").unwrap(),
            storage,
            store,
        ))
    }

    fn chat_reply(content: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content.to_string()}}]
        })
    }

    /// Mount search, oracle, and profile mocks for a two-company run.
    async fn mount_happy_path(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"title": "Top companies", "url": "https://a.example", "snippet": "Acme and RivalCo lead"}
                ]
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/content"))
            .respond_with(ResponseTemplate::new(404))
            .mount(server)
            .await;

        // Extraction, scoring, and overview hit the same endpoint; match on
        // prompt markers.
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("SEARCH RESULTS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
                serde_json::json!({"companies": ["Acme", "RivalCo"]}),
            )))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("analyze the following companies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
                serde_json::json!({"companies": [
                    {"name": "Acme", "description": "Analytics platform",
                     "competes_with_partners": false, "total_score": 8.0},
                    {"name": "RivalCo", "description": "Sports drinks",
                     "competes_with_partners": true, "competing_partners": ["Gatorade"],
                     "total_score": 6.0}
                ]}),
            )))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("brief overview"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
                serde_json::json!({"industry_overview": "A growing space."}),
            )))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/company/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "headquarters": "Toronto, Ontario",
                "website": "https://acme.example"
            })))
            .mount(server)
            .await;
    }

    async fn wait_for_completion(tracker: &StatusTracker) -> partnerscout_shared::SearchStatus {
        for _ in 0..400 {
            let status = tracker.snapshot().await;
            if status.completed {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run did not complete in time");
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let server = MockServer::start().await;
        let pipeline = pipeline(&server).await;

        let receipt = pipeline.start("   ").await;
        assert!(!receipt.accepted);
        assert!(!pipeline.tracker().is_running().await);
    }

    #[tokio::test]
    async fn full_run_scores_saves_and_records_history() {
        let server = MockServer::start().await;
        mount_happy_path(&server).await;
        let pipeline = pipeline(&server).await;

        let receipt = pipeline.start("sports tech").await;
        assert!(receipt.accepted);

        let status = wait_for_completion(&pipeline.tracker()).await;
        assert_eq!(status.phase, SearchPhase::Completed);
        let report = status.results.expect("report");
        assert_eq!(report.industry, "sports tech");
        assert_eq!(report.analysis.companies.len(), 2);
        assert_eq!(report.analysis.industry_overview, "A growing space.");
        // RivalCo conflicts with Gatorade, so only Acme is suitable and saved.
        assert_eq!(report.analysis.suitable_partners, vec!["Acme"]);
        assert_eq!(report.saved_count, 1);
        // The conflicting company skips profile enrichment entirely.
        assert_eq!(report.analysis.companies[1].partnership_score, 0.0);
        assert!(!report.analysis.companies[1].enriched);
        assert!(report.analysis.companies[1].market_analysis.is_none());

        let saved = pipeline.storage().get_partner("Acme").await.unwrap();
        assert!(saved.is_some());
        assert!(pipeline.storage().get_partner("RivalCo").await.unwrap().is_none());

        let history = pipeline.storage().list_history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "sports tech");
        assert_eq!(history[0].results_count, 2);
    }

    #[tokio::test]
    async fn start_while_running_is_rejected() {
        let server = MockServer::start().await;
        mount_happy_path(&server).await;
        let pipeline = pipeline(&server).await;

        let first = pipeline.start("sports tech").await;
        let second = pipeline.start("esports").await;
        assert!(first.accepted);
        assert!(!second.accepted);

        // The in-flight run is unaffected by the rejected start.
        let status = wait_for_completion(&pipeline.tracker()).await;
        assert_eq!(status.results.expect("report").industry, "sports tech");
    }

    #[tokio::test]
    async fn zero_score_company_is_suitable_but_not_saved() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"title": "t", "url": "https://a.example", "snippet": "s"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/content"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("SEARCH RESULTS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
                serde_json::json!({"companies": ["Acme", "Ghost Inc"]}),
            )))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("analyze the following companies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
                serde_json::json!({"companies": [
                    {"name": "Acme", "description": "Analytics platform",
                     "competes_with_partners": false, "total_score": 8.0},
                    {"name": "Ghost Inc", "description": "Thin public record",
                     "competes_with_partners": false, "total_score": 0.0}
                ]}),
            )))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("brief overview"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
                serde_json::json!({"industry_overview": "Overview."}),
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/company/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let pipeline = pipeline(&server).await;
        pipeline.start("sports tech").await;
        let status = wait_for_completion(&pipeline.tracker()).await;
        let report = status.results.expect("report");

        // Non-conflicting companies are suitable even at score zero, but only
        // positive scorers are persisted.
        assert_eq!(report.analysis.suitable_partners, vec!["Acme", "Ghost Inc"]);
        assert_eq!(report.saved_count, 1);
        assert!(pipeline.storage().get_partner("Ghost Inc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_run_finds_no_new_companies() {
        let server = MockServer::start().await;
        mount_happy_path(&server).await;
        let pipeline = pipeline(&server).await;

        pipeline.start("sports tech").await;
        wait_for_completion(&pipeline.tracker()).await;

        // Same extraction results; everything is now previously considered.
        pipeline.start("sports tech").await;
        let status = wait_for_completion(&pipeline.tracker()).await;

        assert_eq!(status.phase, SearchPhase::Completed);
        let report = status.results.expect("report");
        assert!(report.analysis.companies.is_empty());
        assert_eq!(report.saved_count, 0);

        let history = pipeline.storage().list_history(10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].results_count, 0);
    }

    #[tokio::test]
    async fn search_failure_fails_the_run() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let pipeline = pipeline(&server).await;

        pipeline.start("sports tech").await;
        let status = wait_for_completion(&pipeline.tracker()).await;

        assert_eq!(status.phase, SearchPhase::Error);
        assert!(status.error.is_some());
        assert!(status.results.is_none());
    }

    #[tokio::test]
    async fn reset_clears_considered_set_and_history() {
        let server = MockServer::start().await;
        mount_happy_path(&server).await;
        let pipeline = pipeline(&server).await;

        pipeline.start("sports tech").await;
        wait_for_completion(&pipeline.tracker()).await;
        pipeline.reset_history().await.unwrap();

        assert!(pipeline.storage().list_history(10).await.unwrap().is_empty());
        assert!(pipeline.storage().considered_keys().await.unwrap().is_empty());

        // The same candidates are scorable again.
        pipeline.start("sports tech").await;
        let status = wait_for_completion(&pipeline.tracker()).await;
        assert_eq!(status.results.expect("report").analysis.companies.len(), 2);
    }
}
