//! Shared run-status record.
//!
//! One record per process, overwritten whole on each transition so readers
//! never observe a half-updated phase/message/progress combination.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use partnerscout_shared::{IndustryReport, SearchPhase, SearchStatus};

/// Handle to the single mutable [`SearchStatus`] record.
///
/// Cheap to clone; all clones observe the same record.
#[derive(Clone, Default)]
pub struct StatusTracker {
    inner: Arc<RwLock<SearchStatus>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status, copied out whole.
    pub async fn snapshot(&self) -> SearchStatus {
        self.inner.read().await.clone()
    }

    /// Whether a run is in flight (started but not yet terminal).
    pub async fn is_running(&self) -> bool {
        let status = self.inner.read().await;
        status.phase != SearchPhase::Idle && !status.completed
    }

    /// Claim the record for a fresh run, resetting it to `Starting`.
    ///
    /// Check and claim happen under one write lock, so of two simultaneous
    /// callers exactly one wins. Returns false if a run is already in flight.
    pub async fn try_begin(&self, industry: &str) -> bool {
        let mut status = self.inner.write().await;
        if status.phase != SearchPhase::Idle && !status.completed {
            return false;
        }
        *status = SearchStatus {
            phase: SearchPhase::Starting,
            message: format!("Starting search for {industry}..."),
            progress: 0,
            completed: false,
            results: None,
            error: None,
        };
        true
    }

    /// Advance to a new phase. Progress never moves backwards within a run.
    pub async fn update(&self, phase: SearchPhase, message: impl Into<String>, progress: u8) {
        let mut status = self.inner.write().await;
        let progress = progress.max(status.progress).min(100);
        debug!(phase = phase.as_str(), progress, "status update");
        status.phase = phase;
        status.message = message.into();
        status.progress = progress;
    }

    /// Mark the run complete and attach the final report.
    pub async fn complete(&self, message: impl Into<String>, report: IndustryReport) {
        let mut status = self.inner.write().await;
        status.phase = SearchPhase::Completed;
        status.message = message.into();
        status.progress = 100;
        status.completed = true;
        status.results = Some(report);
        status.error = None;
    }

    /// Mark the run failed. Any partial results are discarded.
    pub async fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        let mut status = self.inner.write().await;
        status.phase = SearchPhase::Error;
        status.message = format!("Search failed: {message}");
        status.completed = true;
        status.results = None;
        status.error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partnerscout_shared::{IndustryAnalysis, Rubric};

    fn report() -> IndustryReport {
        let rubric = Rubric::standard();
        IndustryReport {
            industry: "sports tech".into(),
            analysis: IndustryAnalysis {
                industry_overview: String::new(),
                companies: vec![],
                suitable_partners: vec![],
            },
            max_total_score: rubric.max_total_score(),
            scoring_criteria: rubric,
            saved_count: 0,
        }
    }

    #[tokio::test]
    async fn begin_resets_previous_run() {
        let tracker = StatusTracker::new();
        tracker.fail("boom").await;

        assert!(tracker.try_begin("sports tech").await);
        let status = tracker.snapshot().await;
        assert_eq!(status.phase, SearchPhase::Starting);
        assert_eq!(status.progress, 0);
        assert!(!status.completed);
        assert!(status.error.is_none());
        assert!(tracker.is_running().await);
    }

    #[tokio::test]
    async fn only_one_claim_wins_while_running() {
        let tracker = StatusTracker::new();

        assert!(tracker.try_begin("sports tech").await);
        assert!(!tracker.try_begin("esports").await);
        // The losing claim left the record untouched.
        assert!(tracker.snapshot().await.message.contains("sports tech"));

        tracker.complete("done", report()).await;
        assert!(tracker.try_begin("esports").await);
    }

    #[tokio::test]
    async fn progress_is_monotonic() {
        let tracker = StatusTracker::new();
        assert!(tracker.try_begin("sports tech").await);
        tracker.update(SearchPhase::Analyzing, "analyzing", 60).await;
        tracker.update(SearchPhase::Analyzing, "still analyzing", 40).await;
        assert_eq!(tracker.snapshot().await.progress, 60);
    }

    #[tokio::test]
    async fn complete_attaches_results() {
        let tracker = StatusTracker::new();
        assert!(tracker.try_begin("sports tech").await);
        tracker.complete("done", report()).await;

        let status = tracker.snapshot().await;
        assert_eq!(status.phase, SearchPhase::Completed);
        assert_eq!(status.progress, 100);
        assert!(status.completed);
        assert!(status.results.is_some());
        assert!(!tracker.is_running().await);
    }

    #[tokio::test]
    async fn fail_records_error_and_terminates() {
        let tracker = StatusTracker::new();
        assert!(tracker.try_begin("sports tech").await);
        tracker.update(SearchPhase::Searching, "searching", 10).await;
        tracker.fail("provider unreachable").await;

        let status = tracker.snapshot().await;
        assert_eq!(status.phase, SearchPhase::Error);
        assert!(status.completed);
        assert_eq!(status.error.as_deref(), Some("provider unreachable"));
        assert!(status.results.is_none());
    }
}
