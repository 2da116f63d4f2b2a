//! Recommendation Metrics and Presentation Helpers
//!
//! Match percentages and result summaries for rendering recommendations,
//! plus timing and counters for monitoring the service.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::engine::Recommendation;
use super::selection::{RecommendationMode, Selection};

/// Share of the user's selected tags an item matched, per tag kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchBreakdown {
    pub id: i64,
    /// 0-100, rounded
    pub preference_percentage: u8,
    pub feature_percentage: u8,
}

impl MatchBreakdown {
    pub fn for_recommendation(rec: &Recommendation, selection: &Selection) -> Self {
        Self {
            id: rec.item.id,
            preference_percentage: percentage(
                rec.match_info.preference_matches,
                selection.selected_preferences.len(),
            ),
            feature_percentage: percentage(
                rec.match_info.feature_matches,
                selection.selected_features.len(),
            ),
        }
    }
}

fn percentage(matches: usize, selected: usize) -> u8 {
    if selected == 0 {
        return 0;
    }
    let pct = (matches as f64 / selected as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// One-line outcome of a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub count: usize,
    pub message: String,
    pub breakdowns: Vec<MatchBreakdown>,
}

impl ResultSummary {
    pub fn new(recommendations: &[Recommendation], selection: &Selection) -> Self {
        let count = recommendations.len();
        let message = match count {
            0 => "No products found matching the selected criteria.".to_string(),
            1 => "1 product found!".to_string(),
            n => format!("{} products found!", n),
        };

        Self {
            count,
            message,
            breakdowns: recommendations
                .iter()
                .map(|r| MatchBreakdown::for_recommendation(r, selection))
                .collect(),
        }
    }
}

/// Performance timer for tracking operation duration
pub struct PerformanceTimer {
    start: Instant,
    label: &'static str,
}

impl PerformanceTimer {
    pub fn new(label: &'static str) -> Self {
        Self {
            start: Instant::now(),
            label,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn log_if_slow(&self, threshold_ms: u64) {
        let elapsed = self.elapsed_ms();
        if elapsed > threshold_ms {
            tracing::warn!(
                "⚠️ Slow operation: {} took {}ms (threshold: {}ms)",
                self.label,
                elapsed,
                threshold_ms
            );
        }
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        tracing::debug!("⏱️ {} completed in {}ms", self.label, self.elapsed_ms());
    }
}

// ---- Counters ----

pub fn record_request(mode: Option<RecommendationMode>, returned: usize) {
    let mode = mode.map(|m| m.as_wire()).unwrap_or("none");
    metrics::counter!("recommendations_requests_total", "mode" => mode).increment(1);
    metrics::histogram!("recommendations_returned").record(returned as f64);
}

pub fn record_catalog_refresh(ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!("catalog_refresh_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::catalog::CatalogItem;
    use crate::recommendation::engine::MatchInfo;

    fn rec(id: i64, preference_matches: usize, feature_matches: usize) -> Recommendation {
        Recommendation {
            item: CatalogItem {
                id,
                name: format!("Item {}", id),
                category: String::new(),
                preferences: Vec::new(),
                features: Vec::new(),
            },
            match_info: MatchInfo {
                score: preference_matches + feature_matches,
                preference_matches,
                feature_matches,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_breakdown_percentages() {
        let selection = Selection::new(["a", "b", "c"], ["x", "y"], None);
        let breakdown = MatchBreakdown::for_recommendation(&rec(1, 2, 1), &selection);
        assert_eq!(breakdown.preference_percentage, 67);
        assert_eq!(breakdown.feature_percentage, 50);
    }

    #[test]
    fn test_breakdown_zero_when_nothing_selected() {
        let selection = Selection::new(["a"], Vec::<String>::new(), None);
        let breakdown = MatchBreakdown::for_recommendation(&rec(1, 1, 0), &selection);
        assert_eq!(breakdown.preference_percentage, 100);
        assert_eq!(breakdown.feature_percentage, 0);
    }

    #[test]
    fn test_summary_messages() {
        let selection = Selection::new(["a"], Vec::<String>::new(), None);
        assert_eq!(
            ResultSummary::new(&[], &selection).message,
            "No products found matching the selected criteria."
        );
        assert_eq!(ResultSummary::new(&[rec(1, 1, 0)], &selection).message, "1 product found!");

        let summary = ResultSummary::new(&[rec(1, 1, 0), rec(2, 1, 0)], &selection);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.message, "2 products found!");
        assert_eq!(summary.breakdowns.len(), 2);
    }

    #[test]
    fn test_timer_elapsed() {
        let timer = PerformanceTimer::new("test");
        assert!(timer.elapsed_ms() < 1000);
        timer.log_if_slow(10_000);
    }
}
