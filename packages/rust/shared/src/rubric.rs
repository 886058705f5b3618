//! The weighted scoring rubric used by the analysis oracle.
//!
//! Category keys are stable identifiers that appear in oracle responses and
//! persisted records; display names are for prompts and human output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One tier within a category, e.g. "Headquartered in Toronto" = 2.0 points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricTier {
    pub points: f64,
    pub description: String,
}

impl RubricTier {
    fn new(points: f64, description: &str) -> Self {
        Self {
            points,
            description: description.to_string(),
        }
    }
}

/// A scoring category with its point ceiling and award tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricCategory {
    pub name: String,
    pub max_points: f64,
    pub tiers: Vec<RubricTier>,
}

/// The full rubric, keyed by category identifier. Ordered map so prompt text
/// and serialized output are stable run to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rubric {
    pub categories: BTreeMap<String, RubricCategory>,
}

impl Rubric {
    /// The built-in ten-category partnership rubric.
    pub fn standard() -> Self {
        let mut categories = BTreeMap::new();

        let mut insert = |key: &str, name: &str, max_points: f64, tiers: Vec<RubricTier>| {
            categories.insert(
                key.to_string(),
                RubricCategory {
                    name: name.to_string(),
                    max_points,
                    tiers,
                },
            );
        };

        insert(
            "location",
            "Location-Based Presence",
            2.0,
            vec![
                RubricTier::new(2.0, "Headquartered in Toronto"),
                RubricTier::new(1.5, "Based in Ontario (outside Toronto)"),
                RubricTier::new(1.0, "Based in Canada (outside Ontario)"),
                RubricTier::new(0.5, "Based in North America (outside Canada)"),
                RubricTier::new(0.2, "International location"),
            ],
        );
        insert(
            "employee_size",
            "Employee Size & Organizational Scale",
            1.0,
            vec![
                RubricTier::new(0.2, "100+ employees"),
                RubricTier::new(0.5, "500+ employees"),
                RubricTier::new(1.0, "1,000+ employees"),
            ],
        );
        insert(
            "revenue",
            "Annual Revenue",
            1.0,
            vec![
                RubricTier::new(0.3, "Revenue > $1M/year"),
                RubricTier::new(0.6, "Revenue > $10M/year"),
                RubricTier::new(1.0, "Revenue > $50M/year"),
            ],
        );
        insert(
            "funding",
            "Funding & Capital Activity",
            1.0,
            vec![
                RubricTier::new(0.3, "Multiple funding rounds (2+)"),
                RubricTier::new(0.6, "5+ funding rounds"),
                RubricTier::new(1.0, "Total funding exceeds $50M+"),
            ],
        );
        insert(
            "talent",
            "Talent Acquisition & Hiring Trends",
            1.0,
            vec![
                RubricTier::new(0.4, "Actively hiring for Marketing/Brand roles"),
                RubricTier::new(0.3, "3 or more active job listings"),
                RubricTier::new(0.3, "10+ total open positions"),
            ],
        );
        insert(
            "industry",
            "Industry Relevance & Vertical Fit",
            1.2,
            vec![
                RubricTier::new(0.4, "Operates in Sports, Entertainment, or Events"),
                RubricTier::new(0.4, "Operates in Hospitality, Food & Beverage"),
                RubricTier::new(0.4, "Operates in Technology, Fintech, or AI"),
            ],
        );
        insert(
            "brand",
            "Brand Visibility & Market Influence",
            1.2,
            vec![
                RubricTier::new(0.4, "10,000+ LinkedIn followers"),
                RubricTier::new(0.4, "50,000+ total social media followers"),
                RubricTier::new(0.4, "Featured in prominent media outlets"),
            ],
        );
        insert(
            "sponsorship",
            "Sponsorship & Activation History",
            0.8,
            vec![
                RubricTier::new(0.4, "Proven history of sponsorships with sports, venues, or events"),
                RubricTier::new(0.4, "Has an active sponsorship/partnership program"),
            ],
        );
        insert(
            "b2b",
            "B2B Synergy & Relationship Fit",
            0.7,
            vec![
                RubricTier::new(0.3, "Existing relationship with major venue tenants"),
                RubricTier::new(0.4, "Past or current collaborations with affiliated brands"),
            ],
        );
        insert(
            "csr",
            "Corporate Social Responsibility & Impact",
            0.7,
            vec![
                RubricTier::new(0.3, "Active in community programs or philanthropic initiatives"),
                RubricTier::new(0.4, "Dedicated CSR program or foundation"),
            ],
        );

        Self { categories }
    }

    /// Sum of every category's `max_points`. Denominator for the 0–10 rescale.
    pub fn max_total_score(&self) -> f64 {
        self.categories.values().map(|c| c.max_points).sum()
    }

    /// Render the rubric for inclusion in an oracle prompt.
    pub fn prompt_text(&self) -> String {
        let mut out = String::new();
        for (key, category) in &self.categories {
            out.push_str(&format!(
                "- {} (key: \"{}\", max {} points):\n",
                category.name, key, category.max_points
            ));
            for tier in &category.tiers {
                out.push_str(&format!("    - {} points: {}\n", tier.points, tier.description));
            }
        }
        out
    }
}

impl Default for Rubric {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_rubric_has_ten_categories() {
        let rubric = Rubric::standard();
        assert_eq!(rubric.categories.len(), 10);
        assert!(rubric.categories.contains_key("location"));
        assert!(rubric.categories.contains_key("csr"));
    }

    #[test]
    fn max_total_score_sums_category_maxima() {
        let rubric = Rubric::standard();
        // 2 + 1 + 1 + 1 + 1 + 1.2 + 1.2 + 0.8 + 0.7 + 0.7
        assert!((rubric.max_total_score() - 10.6).abs() < 1e-9);
    }

    #[test]
    fn prompt_text_mentions_every_category_key() {
        let rubric = Rubric::standard();
        let text = rubric.prompt_text();
        for key in rubric.categories.keys() {
            assert!(text.contains(&format!("key: \"{key}\"")), "missing {key}");
        }
    }
}
