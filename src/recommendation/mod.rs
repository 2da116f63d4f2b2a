//! Recommendation Module
//!
//! Recommends catalog products from the preference and feature tags a user
//! selected.
//!
//! ## Architecture
//!
//! 1. **Catalog** - Product items, the HTTP catalog client, the selectable tag vocabulary
//! 2. **Selection** - The user's tags and recommendation mode
//! 3. **Engine** - Score, filter, rank and select items for a selection
//! 4. **Metrics** - Match percentages, result summaries, counters
//!
//! ## Modes
//!
//! - **SingleProduct**: the single best item. A tie at the top score goes to
//!   the tied item that comes last in the catalog.
//! - **MultipleProducts**: every item sharing a tag with the selection,
//!   highest score first, ties in catalog order.
//!
//! ## Scoring
//!
//! One point per selected tag found on the item, preferences and features
//! alike. Tags compare by exact, case-sensitive equality.

pub mod catalog;
pub mod engine;
pub mod metrics;
pub mod selection;

pub use catalog::{CatalogClient, CatalogItem, TagVocabulary};
pub use engine::{recommend, MatchInfo, Recommendation};
pub use selection::{RecommendationMode, Selection};
