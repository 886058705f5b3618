//! Candidate exclusion filtering.
//!
//! Two exclusion passes run between extraction and scoring: current roster
//! partners (no point scoring an existing partner) and companies surfaced by
//! an earlier run. Both match case-insensitively on the exact name.

use std::collections::HashSet;

use tracing::{info, instrument};

use partnerscout_shared::{Candidate, CurrentPartner, Result};
use partnerscout_storage::ConsideredSet;

/// What the exclusion passes kept and dropped.
#[derive(Debug)]
pub struct FilterOutcome {
    /// Candidates that survived both passes, in input order.
    pub survivors: Vec<Candidate>,
    /// Dropped because the name matches a current roster partner.
    pub roster_excluded: usize,
    /// Dropped because a previous run already surfaced the name.
    pub already_considered: usize,
}

/// Apply both exclusion passes to the extracted candidates.
#[instrument(skip_all, fields(candidates = candidates.len()))]
pub async fn filter_candidates(
    candidates: Vec<Candidate>,
    roster: &[CurrentPartner],
    considered: &ConsideredSet,
) -> Result<FilterOutcome> {
    let roster_names: HashSet<String> = roster.iter().map(|p| p.name.to_lowercase()).collect();

    let mut survivors = Vec::with_capacity(candidates.len());
    let mut roster_excluded = 0;
    let mut already_considered = 0;

    for candidate in candidates {
        if roster_names.contains(&candidate.name.to_lowercase()) {
            roster_excluded += 1;
            continue;
        }
        if considered.contains(&candidate.name).await? {
            already_considered += 1;
            continue;
        }
        survivors.push(candidate);
    }

    info!(
        survivors = survivors.len(),
        roster_excluded, already_considered, "candidate filtering complete"
    );
    Ok(FilterOutcome {
        survivors,
        roster_excluded,
        already_considered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use partnerscout_shared::default_roster;
    use partnerscout_storage::Storage;
    use uuid::Uuid;

    async fn considered_set() -> ConsideredSet {
        let path = std::env::temp_dir().join(format!("ps_test_{}.db", Uuid::now_v7()));
        ConsideredSet::new(Arc::new(Storage::open(&path).await.expect("open storage")))
    }

    fn candidates(names: &[&str]) -> Vec<Candidate> {
        names
            .iter()
            .map(|n| Candidate::new(*n, "sports tech"))
            .collect()
    }

    #[tokio::test]
    async fn roster_partners_are_excluded_case_insensitively() {
        let considered = considered_set().await;
        let outcome = filter_candidates(
            candidates(&["Acme", "gatorade", "SCOTIABANK"]),
            &default_roster(),
            &considered,
        )
        .await
        .unwrap();

        assert_eq!(outcome.roster_excluded, 2);
        assert_eq!(outcome.survivors, candidates(&["Acme"]));
    }

    #[tokio::test]
    async fn previously_considered_names_are_excluded() {
        let considered = considered_set().await;
        considered.add_all(&["RivalCo".into()]).await.unwrap();

        let outcome = filter_candidates(
            candidates(&["Acme", "rivalco"]),
            &default_roster(),
            &considered,
        )
        .await
        .unwrap();

        assert_eq!(outcome.already_considered, 1);
        assert_eq!(outcome.survivors, candidates(&["Acme"]));
    }

    #[tokio::test]
    async fn survivors_keep_input_order() {
        let considered = considered_set().await;
        let outcome = filter_candidates(
            candidates(&["Zed Corp", "Acme", "Mid Inc"]),
            &[],
            &considered,
        )
        .await
        .unwrap();

        assert_eq!(outcome.survivors, candidates(&["Zed Corp", "Acme", "Mid Inc"]));
        assert_eq!(outcome.roster_excluded, 0);
        assert_eq!(outcome.already_considered, 0);
    }
}
