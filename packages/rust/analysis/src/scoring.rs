//! Batched, concurrent scoring of candidates against the rubric.
//!
//! Candidates are split into fixed-size batches, each batch becomes one
//! oracle request, and batches run concurrently under a semaphore. A batch
//! that fails in any way (HTTP, empty content, unparseable JSON) degrades to
//! one synthesized failed result per input name, never fewer or more. Results
//! come back in submission order regardless of completion order.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use partnerscout_shared::{CategoryScore, CompanyAnalysis, CurrentPartner, Rubric, roster_prompt_text};

use crate::oracle::Oracle;

/// Fallback overview used when the overview call fails.
fn default_overview(industry: &str) -> String {
    format!("The {industry} industry offers various partnership opportunities.")
}

/// Build the scoring prompt for one batch of company names.
pub fn build_scoring_prompt(
    names: &[String],
    industry: &str,
    roster_text: &str,
    rubric_text: &str,
) -> String {
    format!(
        "I need you to analyze the following companies in the {industry} industry:\n\
         {companies}\n\n\
         For each company, determine if they would compete with any of our current partners.\n\
         Carefully evaluate each company against ALL current partners, paying close attention \
         to each partner's category, description, inclusions, and exclusions.\n\n\
         A company competes with a partner if they offer similar products/services mentioned \
         in the partner's inclusions, or are specifically mentioned in a partner's exclusions \
         list. Be thorough and conservative.\n\n\
         IMPORTANT: If a company competes with ANY current partner, its total_score MUST be 0.\n\n\
         Our current partners are:\n{roster}\n\
         The scoring criteria are:\n{rubric}\n\
         Return a JSON object of the form:\n\
         {{\"companies\": [{{\"name\": \"...\", \"description\": \"...\", \
         \"products_services\": \"...\", \"market_position\": \"...\", \
         \"competes_with_partners\": false, \"competing_partners\": [], \
         \"competition_reasons\": \"...\", \
         \"scores\": {{\"<category key>\": {{\"score\": 0.0, \"max\": 0.0, \"explanation\": \"...\"}}}}, \
         \"total_score\": 0.0}}]}}\n\
         Include exactly one entry per company listed above, in the same order.",
        companies = names.join(", "),
        roster = roster_text,
        rubric = rubric_text,
    )
}

/// Score all candidates, preserving submission order.
#[instrument(skip_all, fields(candidates = names.len(), batch_size, worker_cap))]
pub async fn score_candidates(
    oracle: &Oracle,
    names: &[String],
    industry: &str,
    roster: &[CurrentPartner],
    rubric: &Rubric,
    batch_size: usize,
    worker_cap: usize,
) -> Vec<CompanyAnalysis> {
    if names.is_empty() {
        return Vec::new();
    }

    let roster_text = roster_prompt_text(roster);
    let rubric_text = rubric.prompt_text();

    let batches: Vec<Vec<String>> = names
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect();

    let workers = worker_cap.max(1).min(batches.len());
    let semaphore = Arc::new(Semaphore::new(workers));

    info!(batches = batches.len(), workers, "scoring candidates");

    let mut handles = Vec::with_capacity(batches.len());
    for (index, batch) in batches.iter().cloned().enumerate() {
        let oracle = oracle.clone();
        let sem = semaphore.clone();
        let prompt = build_scoring_prompt(&batch, industry, &roster_text, &rubric_text);

        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore closed");
            let analyses = score_batch(&oracle, &batch, &prompt).await;
            (index, analyses)
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await.ok());
    }
    merge_scored(&batches, outcomes)
}

/// Merge per-batch results back into submission order.
///
/// A batch whose task was lost (panicked or cancelled) contributes failed
/// defaults, so the output always carries one result per input name.
fn merge_scored(
    batches: &[Vec<String>],
    outcomes: Vec<Option<(usize, Vec<CompanyAnalysis>)>>,
) -> Vec<CompanyAnalysis> {
    let mut indexed: Vec<(usize, Vec<CompanyAnalysis>)> = Vec::with_capacity(batches.len());
    for (slot, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Some(result) => indexed.push(result),
            None => {
                warn!(batch = slot, "scoring task lost, synthesizing failed results");
                indexed.push((
                    slot,
                    batches[slot].iter().map(CompanyAnalysis::failed).collect(),
                ));
            }
        }
    }
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().flat_map(|(_, batch)| batch).collect()
}

/// Score one batch, degrading to failed defaults on any error.
async fn score_batch(oracle: &Oracle, names: &[String], prompt: &str) -> Vec<CompanyAnalysis> {
    match oracle.chat_json(prompt).await {
        Ok(content) => repair_batch(names, &content),
        Err(e) => {
            warn!(batch = ?names, error = %e, "batch scoring failed");
            names.iter().map(CompanyAnalysis::failed).collect()
        }
    }
}

/// Reconcile an oracle batch reply against the input names.
///
/// Guarantees exactly one fully-populated result per input name, in input
/// order: missing companies get failed defaults, extras are dropped, fields
/// with the wrong type fall back individually, and the conflict-zero
/// invariant is re-asserted on every result.
pub fn repair_batch(names: &[String], content: &str) -> Vec<CompanyAnalysis> {
    let replies: Vec<serde_json::Value> = serde_json::from_str::<serde_json::Value>(content)
        .ok()
        .and_then(|v| v.get("companies").and_then(|c| c.as_array()).cloned())
        .unwrap_or_default();

    let mut parsed: Vec<CompanyAnalysis> = replies.iter().map(company_from_value).collect();

    // Unnamed entries inherit the input name at their position.
    for (position, company) in parsed.iter_mut().enumerate() {
        if company.name.is_empty() {
            if let Some(name) = names.get(position) {
                company.name = name.clone();
                if company.description.is_empty() {
                    company.description = format!("No description available for {name}");
                }
            }
        }
    }

    let mut repaired = Vec::with_capacity(names.len());
    for name in names {
        let matched = parsed
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name));
        let mut company = match matched {
            Some(i) => parsed.swap_remove(i),
            None => {
                warn!(name = %name, "company missing from batch reply, using failed default");
                CompanyAnalysis::failed(name)
            }
        };
        company.enforce_conflict_zero();
        repaired.push(company);
    }

    if !parsed.is_empty() {
        warn!(extras = parsed.len(), "dropping unrequested companies from batch reply");
    }

    repaired
}

/// Field-by-field lenient decode of one company object.
fn company_from_value(value: &serde_json::Value) -> CompanyAnalysis {
    let str_field = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let scores = value
        .get("scores")
        .and_then(|v| v.as_object())
        .map(|map| {
            map.iter()
                .map(|(key, entry)| {
                    let score: CategoryScore =
                        serde_json::from_value(entry.clone()).unwrap_or_default();
                    (key.clone(), score)
                })
                .collect()
        })
        .unwrap_or_default();

    let competing_partners = value
        .get("competing_partners")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    CompanyAnalysis {
        name: str_field("name").unwrap_or_default(),
        description: str_field("description").unwrap_or_default(),
        products_services: str_field("products_services"),
        market_position: str_field("market_position"),
        competes_with_partners: value
            .get("competes_with_partners")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        competing_partners,
        competition_reasons: str_field("competition_reasons"),
        scores,
        total_score: value.get("total_score").and_then(|v| v.as_f64()).unwrap_or(0.0),
    }
}

/// Fetch a short industry overview, typically with a cheaper model than the
/// scoring calls.
///
/// Never fails: any error falls back to a static sentence.
#[instrument(skip_all, fields(industry = %industry, model = %model))]
pub async fn fetch_industry_overview(oracle: &Oracle, model: &str, industry: &str) -> String {
    let prompt = format!(
        "Provide a brief overview of the {industry} industry, focusing on its relevance to \
         sports and entertainment partnerships.\n\
         Return only a JSON object with the structure: {{\"industry_overview\": \"...\"}}"
    );

    match oracle.chat_json_with_model(model, &prompt).await {
        Ok(content) => serde_json::from_str::<serde_json::Value>(&content)
            .ok()
            .and_then(|v| v.get("industry_overview").and_then(|o| o.as_str()).map(str::to_string))
            .unwrap_or_else(|| default_overview(industry)),
        Err(e) => {
            warn!(error = %e, "industry overview call failed, using default");
            default_overview(industry)
        }
    }
}
