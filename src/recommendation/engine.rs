//! Recommendation Engine
//!
//! Core algorithm for matching catalog items against a user's selection.
//! Pure and synchronous: score → filter → sort → select-by-mode.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::catalog::CatalogItem;
use super::selection::{RecommendationMode, Selection};

/// How an item matched a selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    pub score: usize,
    pub preference_matches: usize,
    pub feature_matches: usize,
    /// In the item's own tag order
    pub matching_preferences: Vec<String>,
    pub matching_features: Vec<String>,
}

/// A catalog item annotated with its match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub match_info: MatchInfo,
}

impl Recommendation {
    pub fn score(&self) -> usize {
        self.match_info.score
    }
}

/// Selected tags as lookup sets, built once per request
struct TagSets<'a> {
    preferences: HashSet<&'a str>,
    features: HashSet<&'a str>,
}

impl<'a> TagSets<'a> {
    fn new(selection: &'a Selection) -> Self {
        Self {
            preferences: selection.selected_preferences.iter().map(String::as_str).collect(),
            features: selection.selected_features.iter().map(String::as_str).collect(),
        }
    }

    fn is_empty(&self) -> bool {
        self.preferences.is_empty() && self.features.is_empty()
    }

    fn is_eligible(&self, item: &CatalogItem) -> bool {
        let pref_hit = !self.preferences.is_empty()
            && item.preferences.iter().any(|t| self.preferences.contains(t.as_str()));
        let feat_hit = !self.features.is_empty()
            && item.features.iter().any(|t| self.features.contains(t.as_str()));
        pref_hit || feat_hit
    }

    fn score(&self, item: &CatalogItem) -> MatchInfo {
        let matching_preferences = matching(&item.preferences, &self.preferences);
        let matching_features = matching(&item.features, &self.features);
        let preference_matches = matching_preferences.len();
        let feature_matches = matching_features.len();

        MatchInfo {
            score: preference_matches + feature_matches,
            preference_matches,
            feature_matches,
            matching_preferences,
            matching_features,
        }
    }
}

fn matching(tags: &[String], selected: &HashSet<&str>) -> Vec<String> {
    tags.iter()
        .filter(|t| selected.contains(t.as_str()))
        .cloned()
        .collect()
}

// ---- Pipeline stages (pure functions) ----

/// Compute the match of one item against a selection
pub fn score_item(item: &CatalogItem, selection: &Selection) -> MatchInfo {
    TagSets::new(selection).score(item)
}

/// Items sharing at least one tag with the selection, in catalog order
pub fn filter_eligible<'c>(catalog: &'c [CatalogItem], selection: &Selection) -> Vec<&'c CatalogItem> {
    let sets = TagSets::new(selection);
    if sets.is_empty() {
        return Vec::new();
    }
    catalog.iter().filter(|item| sets.is_eligible(item)).collect()
}

/// Score each item and sort by score descending; equal scores keep input order
pub fn rank_by_score(items: &[&CatalogItem], selection: &Selection) -> Vec<Recommendation> {
    let sets = TagSets::new(selection);
    let mut ranked: Vec<Recommendation> = items
        .iter()
        .map(|item| Recommendation {
            item: (*item).clone(),
            match_info: sets.score(item),
        })
        .collect();

    // Vec::sort_by is stable
    ranked.sort_by(|a, b| b.score().cmp(&a.score()));
    ranked
}

/// Pick what a mode returns from an already ranked list.
///
/// `SingleItem` breaks a tie at the top score in favour of the item that
/// comes last in `catalog`.
pub fn select_for_mode(
    ranked: Vec<Recommendation>,
    catalog: &[CatalogItem],
    mode: RecommendationMode,
) -> Vec<Recommendation> {
    match mode {
        RecommendationMode::MultipleItems => ranked,
        RecommendationMode::SingleItem => select_single(ranked, catalog).into_iter().collect(),
    }
}

fn select_single(ranked: Vec<Recommendation>, catalog: &[CatalogItem]) -> Option<Recommendation> {
    let max_score = ranked.first()?.score();
    let tied = ranked.iter().take_while(|r| r.score() == max_score).count();

    if tied == 1 {
        return ranked.into_iter().next();
    }

    // Ranked items are catalog items, so the last catalog item with the top
    // score is one of the tied ones; reuse its already computed match.
    // Compared by value so entries sharing an id still resolve to the last.
    let mut tied: Vec<Recommendation> = ranked.into_iter().take(tied).collect();
    let winner = catalog
        .iter()
        .rev()
        .find_map(|item| tied.iter().rposition(|r| r.item == *item))?;
    Some(tied.swap_remove(winner))
}

/// Recommend items for a selection.
///
/// Degenerate input never fails: a missing selection, an empty catalog, a
/// selection with no tags or without a mode all yield an empty list.
pub fn recommend(selection: Option<&Selection>, catalog: &[CatalogItem]) -> Vec<Recommendation> {
    let Some(selection) = selection else {
        return Vec::new();
    };
    if catalog.is_empty() || !selection.has_tags() {
        return Vec::new();
    }
    let Some(mode) = selection.mode() else {
        return Vec::new();
    };

    let eligible = filter_eligible(catalog, selection);
    if eligible.is_empty() {
        return Vec::new();
    }

    let ranked = rank_by_score(&eligible, selection);
    let result = select_for_mode(ranked, catalog, mode);

    debug!(
        "Matched {}/{} catalog items, returning {} ({})",
        eligible.len(),
        catalog.len(),
        result.len(),
        mode
    );

    result
}
