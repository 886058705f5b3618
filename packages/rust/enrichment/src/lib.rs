//! Profile enrichment for scored candidates.
//!
//! Each candidate gets a profile lookup plus derived insight fields. Profile
//! failures are tolerated per candidate: the record is kept with
//! `enriched = false` and whatever can be derived without a profile.

pub mod insights;
pub mod provider;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use partnerscout_shared::{CompanyAnalysis, EnrichedPartner};

pub use insights::{logo_url, partnership_potential, partnership_score};
pub use provider::{CompanyProfile, Executive, ProfileClient};

/// Tunables for the enrichment fan-out.
#[derive(Debug, Clone)]
pub struct EnrichmentOptions {
    /// Upper bound on concurrent profile calls.
    pub workers: usize,
    /// Delay before each profile call, to stay under provider rate limits.
    pub delay_ms: u64,
    /// Rubric denominator for the 0–10 rescale.
    pub max_total_score: f64,
}

/// Enrich all given analyses concurrently, preserving input order.
#[instrument(skip_all, fields(companies = analyses.len(), workers = options.workers))]
pub async fn enrich_companies(
    client: &ProfileClient,
    analyses: Vec<CompanyAnalysis>,
    industry: &str,
    options: &EnrichmentOptions,
) -> Vec<EnrichedPartner> {
    if analyses.is_empty() {
        return Vec::new();
    }

    let semaphore = Arc::new(Semaphore::new(options.workers.max(1)));
    let names: Vec<String> = analyses.iter().map(|a| a.name.clone()).collect();
    let mut handles = Vec::with_capacity(analyses.len());

    for (index, analysis) in analyses.into_iter().enumerate() {
        let client = client.clone();
        let sem = semaphore.clone();
        let industry = industry.to_string();
        let options = options.clone();

        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore closed");
            if options.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(options.delay_ms)).await;
            }
            let partner = enrich_one(&client, analysis, &industry, &options).await;
            (index, partner)
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await.ok());
    }

    let partners = merge_enriched(&names, outcomes);
    info!(
        enriched = partners.iter().filter(|p| p.enriched).count(),
        total = partners.len(),
        "enrichment complete"
    );
    partners
}

/// Merge per-candidate results back into input order.
///
/// A candidate whose task was lost (panicked or cancelled) gets a failed,
/// unenriched record, so the output always matches the input one to one.
fn merge_enriched(
    names: &[String],
    outcomes: Vec<Option<(usize, EnrichedPartner)>>,
) -> Vec<EnrichedPartner> {
    let mut indexed = Vec::with_capacity(names.len());
    for (slot, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Some(result) => indexed.push(result),
            None => {
                warn!(company = %names[slot], "enrichment task lost, using failed record");
                indexed.push((slot, failed_partner(&names[slot])));
            }
        }
    }
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, p)| p).collect()
}

/// Unenriched stand-in for a candidate whose enrichment never ran.
fn failed_partner(name: &str) -> EnrichedPartner {
    EnrichedPartner {
        analysis: CompanyAnalysis::failed(name),
        partnership_score: 0.0,
        enriched: false,
        logo_url: insights::logo_url(name),
        key_leadership: Vec::new(),
        key_products: Vec::new(),
        partnership_opportunities: Vec::new(),
        market_analysis: None,
        partnership_potential: None,
        hq_location: None,
        website: None,
        size_range: None,
    }
}

/// Enrich one analysis, degrading gracefully when the profile is unavailable.
async fn enrich_one(
    client: &ProfileClient,
    mut analysis: CompanyAnalysis,
    industry: &str,
    options: &EnrichmentOptions,
) -> EnrichedPartner {
    analysis.enforce_conflict_zero();
    let score = insights::partnership_score(&analysis, options.max_total_score);
    let logo = insights::logo_url(&analysis.name);

    let (profile, enriched) = match client.fetch_profile(&analysis.name).await {
        Ok(profile) => (profile, true),
        Err(e) => {
            warn!(company = %analysis.name, error = %e, "profile fetch failed");
            (CompanyProfile::default(), false)
        }
    };

    // Insight derivation only for viable candidates.
    let derive = !analysis.competes_with_partners && score > 0.0;

    EnrichedPartner {
        key_leadership: if derive { insights::key_leadership(&profile) } else { Vec::new() },
        key_products: if derive { insights::key_products(&profile) } else { Vec::new() },
        partnership_opportunities: if derive {
            insights::partnership_opportunities(&profile, score)
        } else {
            Vec::new()
        },
        market_analysis: derive.then(|| insights::market_analysis(&profile, industry, score)),
        partnership_potential: derive.then(|| insights::partnership_potential(score)),
        hq_location: profile.headquarters,
        website: profile.website,
        size_range: profile.size_range,
        partnership_score: score,
        enriched,
        logo_url: logo,
        analysis,
    }
}
