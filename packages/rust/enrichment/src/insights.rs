//! Deterministic insight derivation from a profile and a scored analysis.
//!
//! Everything here is a pure function of the rescaled score and the profile
//! fields, so repeated runs over the same inputs produce identical records.

use std::sync::LazyLock;

use regex::Regex;

use partnerscout_shared::{CompanyAnalysis, MarketAnalysis, PartnershipPotential};

use crate::provider::CompanyProfile;

/// Rescale the rubric total to 0–10. Conflicting candidates are pinned to 0
/// regardless of what the oracle scored.
pub fn partnership_score(analysis: &CompanyAnalysis, max_total_score: f64) -> f64 {
    if analysis.competes_with_partners || max_total_score <= 0.0 {
        return 0.0;
    }
    (analysis.total_score / max_total_score * 10.0).round()
}

/// Placeholder logo URL from the company name: strip non-alphanumerics,
/// lowercase, treat as a `.com` domain.
pub fn logo_url(name: &str) -> String {
    static NON_ALNUM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9]").expect("valid regex"));

    let lowered = name.to_lowercase();
    let slug = NON_ALNUM_RE.replace_all(&lowered, "");
    if slug.is_empty() {
        "https://img.logo.dev/default.com?retina=true".into()
    } else {
        format!("https://img.logo.dev/{slug}.com?retina=true")
    }
}

/// Top three executives as "Name (Title)" summaries.
pub fn key_leadership(profile: &CompanyProfile) -> Vec<String> {
    profile
        .executives
        .iter()
        .filter(|e| !e.name.is_empty())
        .take(3)
        .map(|e| {
            if e.title.is_empty() {
                e.name.clone()
            } else {
                format!("{} ({})", e.name, e.title)
            }
        })
        .collect()
}

/// Top three products.
pub fn key_products(profile: &CompanyProfile) -> Vec<String> {
    profile.products.iter().take(3).cloned().collect()
}

/// Partnership opportunities derived from profile coverage.
pub fn partnership_opportunities(profile: &CompanyProfile, score: f64) -> Vec<String> {
    let mut opportunities = Vec::new();

    if !profile.customer_segments.is_empty() {
        let segments: Vec<&str> = profile
            .customer_segments
            .iter()
            .take(2)
            .map(String::as_str)
            .collect();
        opportunities.push(format!("Co-marketing to {} audiences", segments.join(", ")));
    }

    if let Some(product) = profile.products.first() {
        opportunities.push(format!("Technology integration with {product}"));
    }

    if score >= 5.0 {
        opportunities.push("Joint event sponsorship opportunities".into());
    }

    if let Some(audience) = &profile.target_audience {
        opportunities.push(format!("Content collaboration targeting {audience}"));
    }

    opportunities
}

/// Partnership-potential assessment bucketed on the rescaled score.
pub fn partnership_potential(score: f64) -> PartnershipPotential {
    let high = |threshold: f64| if score >= threshold { 8 } else { 6 };
    let recommendation = if score >= 7.0 {
        "Highly Recommended"
    } else if score >= 5.0 {
        "Recommended"
    } else {
        "Consider"
    };

    PartnershipPotential {
        strategic_alignment: high(7.0),
        audience_overlap: high(6.0),
        technology_compatibility: high(7.0),
        brand_alignment: high(6.0),
        overall_recommendation: recommendation.into(),
    }
}

/// Market-analysis narrative from the profile and score.
pub fn market_analysis(profile: &CompanyProfile, industry: &str, score: f64) -> MarketAnalysis {
    let sector = profile.industry.as_deref().unwrap_or(industry);

    let competitive_advantage = match profile.products.first() {
        Some(product) => format!("Differentiated offering in {product}"),
        None => "Strong brand recognition".into(),
    };

    let (market_position, future_outlook) = if score >= 7.0 {
        (
            "Leading player in their market segment",
            "Positioned for continued expansion",
        )
    } else if score >= 5.0 {
        (
            "Established player in their market segment",
            "Strong potential for market growth",
        )
    } else {
        (
            "Emerging player in their market segment",
            "Adapting to market trends",
        )
    };

    MarketAnalysis {
        growth_trajectory: format!("Steady growth in the {sector} sector"),
        market_position: market_position.into(),
        competitive_advantage,
        future_outlook: future_outlook.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Executive;

    fn profile() -> CompanyProfile {
        CompanyProfile {
            industry: Some("Sports Technology".into()),
            headquarters: Some("Toronto, Ontario".into()),
            website: Some("https://acme.example".into()),
            size_range: Some("201-500".into()),
            description: Some("Acme does sports analytics.".into()),
            executives: vec![
                Executive { name: "Jane Doe".into(), title: "CEO".into() },
                Executive { name: "Sam Lee".into(), title: "CTO".into() },
                Executive { name: "Ada Park".into(), title: "COO".into() },
                Executive { name: "Extra Exec".into(), title: "CFO".into() },
            ],
            products: vec!["TrackOne".into(), "FanGraph".into(), "GateIQ".into(), "Extra".into()],
            customer_segments: vec!["Enterprise".into(), "Sports teams".into(), "Leagues".into()],
            target_audience: Some("sports fans".into()),
        }
    }

    #[test]
    fn score_rescales_and_rounds() {
        let mut analysis = CompanyAnalysis::failed("Acme");
        analysis.total_score = 7.42;
        assert_eq!(partnership_score(&analysis, 10.6), 7.0);
    }

    #[test]
    fn conflict_pins_score_to_zero() {
        let mut analysis = CompanyAnalysis::failed("Acme");
        analysis.total_score = 9.0;
        analysis.competes_with_partners = true;
        assert_eq!(partnership_score(&analysis, 10.6), 0.0);
    }

    #[test]
    fn zero_denominator_is_safe() {
        let mut analysis = CompanyAnalysis::failed("Acme");
        analysis.total_score = 5.0;
        assert_eq!(partnership_score(&analysis, 0.0), 0.0);
    }

    #[test]
    fn logo_url_slugs_the_name() {
        assert_eq!(
            logo_url("Acme Sports, Inc."),
            "https://img.logo.dev/acmesportsinc.com?retina=true"
        );
        assert_eq!(logo_url("***"), "https://img.logo.dev/default.com?retina=true");
    }

    #[test]
    fn leadership_and_products_take_top_three() {
        let profile = profile();
        let leadership = key_leadership(&profile);
        assert_eq!(leadership, vec!["Jane Doe (CEO)", "Sam Lee (CTO)", "Ada Park (COO)"]);
        assert_eq!(key_products(&profile), vec!["TrackOne", "FanGraph", "GateIQ"]);
    }

    #[test]
    fn opportunities_cover_all_profile_signals() {
        let opportunities = partnership_opportunities(&profile(), 6.0);
        assert_eq!(opportunities.len(), 4);
        assert!(opportunities[0].contains("Enterprise, Sports teams"));
        assert!(opportunities[1].contains("TrackOne"));
        assert!(opportunities[2].contains("sponsorship"));
        assert!(opportunities[3].contains("sports fans"));
    }

    #[test]
    fn low_score_skips_sponsorship() {
        let opportunities = partnership_opportunities(&profile(), 3.0);
        assert!(!opportunities.iter().any(|o| o.contains("sponsorship")));
    }

    #[test]
    fn potential_buckets_by_score() {
        let high = partnership_potential(8.0);
        assert_eq!(high.overall_recommendation, "Highly Recommended");
        assert_eq!(high.strategic_alignment, 8);

        let mid = partnership_potential(5.5);
        assert_eq!(mid.overall_recommendation, "Recommended");
        assert_eq!(mid.strategic_alignment, 6);

        let low = partnership_potential(2.0);
        assert_eq!(low.overall_recommendation, "Consider");
    }

    #[test]
    fn market_analysis_is_deterministic() {
        let a = market_analysis(&profile(), "sports tech", 6.0);
        let b = market_analysis(&profile(), "sports tech", 6.0);
        assert_eq!(a, b);
        assert!(a.growth_trajectory.contains("Sports Technology"));
    }

    #[test]
    fn market_analysis_falls_back_to_query_industry() {
        let analysis = market_analysis(&CompanyProfile::default(), "esports", 6.0);
        assert!(analysis.growth_trajectory.contains("esports"));
        assert_eq!(analysis.competitive_advantage, "Strong brand recognition");
    }
}
