//! Core domain types for the partner discovery pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rubric::Rubric;

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A company name proposed for scoring in one pipeline run.
///
/// Identity is the exact `name` string (case-sensitive) for the lifetime of
/// the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Company name, whitespace-normalized, first-seen casing.
    pub name: String,
    /// The industry query that produced this candidate.
    pub industry: String,
}

impl Candidate {
    pub fn new(name: impl Into<String>, industry: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            industry: industry.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// A single result from the text search provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Full page text when the content fetch succeeded, otherwise the snippet.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub snippet: String,
}

// ---------------------------------------------------------------------------
// Analysis results
// ---------------------------------------------------------------------------

/// One scored category within a [`CompanyAnalysis`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub max: f64,
    #[serde(default)]
    pub explanation: String,
}

/// Per-candidate assessment produced by the scoring engine.
///
/// Always fully populated: malformed oracle output is repaired into safe
/// defaults before it crosses this boundary. Invariant: if
/// `competes_with_partners` is true, `total_score` is 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyAnalysis {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products_services: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_position: Option<String>,
    pub competes_with_partners: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub competing_partners: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition_reasons: Option<String>,
    /// Rubric sub-scores keyed by category.
    #[serde(default)]
    pub scores: BTreeMap<String, CategoryScore>,
    pub total_score: f64,
}

impl CompanyAnalysis {
    /// Synthesized result for a candidate whose analysis failed outright.
    pub fn failed(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: format!("Analysis could not be completed for {name}"),
            name,
            products_services: None,
            market_position: None,
            competes_with_partners: false,
            competing_partners: Vec::new(),
            competition_reasons: None,
            scores: BTreeMap::new(),
            total_score: 0.0,
        }
    }

    /// Re-assert the conflict invariant: a competing candidate scores zero.
    pub fn enforce_conflict_zero(&mut self) {
        if self.competes_with_partners && self.total_score != 0.0 {
            tracing::info!(
                name = %self.name,
                original = self.total_score,
                "forcing total_score to 0 due to partner conflict"
            );
            self.total_score = 0.0;
        }
    }
}

// ---------------------------------------------------------------------------
// Enrichment output
// ---------------------------------------------------------------------------

/// Deterministic partnership-potential assessment derived from the rescaled
/// score (see `partnerscout-enrichment`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnershipPotential {
    pub strategic_alignment: u8,
    pub audience_overlap: u8,
    pub technology_compatibility: u8,
    pub brand_alignment: u8,
    pub overall_recommendation: String,
}

/// Market analysis narrative for a non-conflicting candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub growth_trajectory: String,
    pub market_position: String,
    pub competitive_advantage: String,
    pub future_outlook: String,
}

/// A scored candidate augmented with profile data and derived insight fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedPartner {
    #[serde(flatten)]
    pub analysis: CompanyAnalysis,
    /// Rubric total rescaled to 0–10; 0 whenever the candidate conflicts.
    pub partnership_score: f64,
    /// Whether the profile provider call succeeded.
    pub enriched: bool,
    pub logo_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_leadership: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_products: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partnership_opportunities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_analysis: Option<MarketAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partnership_potential: Option<PartnershipPotential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hq_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_range: Option<String>,
}

// ---------------------------------------------------------------------------
// Persistence record
// ---------------------------------------------------------------------------

/// The row shape written to the `potential_partners` store.
///
/// Keyed by `name`; upserts overwrite every mutable field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerRecord {
    pub name: String,
    pub score: f64,
    pub industry: String,
    pub description: String,
    #[serde(default)]
    pub leadership: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_analysis: Option<MarketAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partnership_potential: Option<PartnershipPotential>,
    #[serde(default)]
    pub hq_location: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub size_range: String,
    #[serde(default)]
    pub logo: String,
}

impl PartnerRecord {
    /// Build a store record from an enriched partner.
    ///
    /// Descriptions are capped at 1000 characters to match the store column.
    pub fn from_enriched(partner: &EnrichedPartner, industry: &str) -> Self {
        let mut description = partner.analysis.description.clone();
        if description.len() > 1000 {
            description.truncate(1000);
        }
        Self {
            name: partner.analysis.name.clone(),
            score: partner.partnership_score,
            industry: industry.to_string(),
            description,
            leadership: partner.key_leadership.clone(),
            products: partner.key_products.clone(),
            opportunities: partner.partnership_opportunities.clone(),
            market_analysis: partner.market_analysis.clone(),
            partnership_potential: partner.partnership_potential.clone(),
            hq_location: partner.hq_location.clone().unwrap_or_default(),
            website: partner.website.clone().unwrap_or_default(),
            size_range: partner.size_range.clone().unwrap_or_default(),
            logo: partner.logo_url.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregated run output
// ---------------------------------------------------------------------------

/// The `analysis` section of the final payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryAnalysis {
    pub industry_overview: String,
    pub companies: Vec<EnrichedPartner>,
    /// Names of candidates that do not conflict with any current partner.
    pub suitable_partners: Vec<String>,
}

/// Final aggregated payload for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryReport {
    pub industry: String,
    pub analysis: IndustryAnalysis,
    pub scoring_criteria: Rubric,
    pub max_total_score: f64,
    /// Candidates successfully written to the store.
    pub saved_count: usize,
}

// ---------------------------------------------------------------------------
// Search status
// ---------------------------------------------------------------------------

/// Pipeline phase, in expected order. `Error` is reachable from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Idle,
    Starting,
    Searching,
    Extracting,
    Analyzing,
    Enriching,
    Completed,
    Error,
}

impl SearchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Searching => "searching",
            Self::Extracting => "extracting",
            Self::Analyzing => "analyzing",
            Self::Enriching => "enriching",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// The single process-wide progress record, overwritten in place during a
/// run. Only the most recent state is observable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStatus {
    pub phase: SearchPhase,
    pub message: String,
    /// 0–100, monotonically non-decreasing within a run.
    pub progress: u8,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<IndustryReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for SearchStatus {
    fn default() -> Self {
        Self {
            phase: SearchPhase::Idle,
            message: "Ready to search".into(),
            progress: 0,
            completed: false,
            results: None,
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Search history
// ---------------------------------------------------------------------------

/// Immutable append-only record of one completed pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub search_type: String,
    pub query: String,
    pub results_count: u32,
}
