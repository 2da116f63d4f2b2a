//! User Selection
//!
//! The preference tags, feature tags and recommendation mode a user picked
//! for one matching request.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result, SelectionIssue};

/// How many items a request should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecommendationMode {
    /// Commit to exactly one item
    SingleItem,
    /// Every eligible item, best first
    MultipleItems,
}

impl RecommendationMode {
    pub const SINGLE_WIRE: &'static str = "SingleProduct";
    pub const MULTIPLE_WIRE: &'static str = "MultipleProducts";

    /// Parse the wire name. Anything unrecognised, including `""`, is no mode.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            Self::SINGLE_WIRE => Some(Self::SingleItem),
            Self::MULTIPLE_WIRE => Some(Self::MultipleItems),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::SingleItem => Self::SINGLE_WIRE,
            Self::MultipleItems => Self::MULTIPLE_WIRE,
        }
    }
}

impl std::fmt::Display for RecommendationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl Serialize for RecommendationMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

/// A user's selections for one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    pub selected_preferences: Vec<String>,
    #[serde(default)]
    pub selected_features: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_mode",
        serialize_with = "serialize_mode"
    )]
    pub selected_recommendation_type: Option<RecommendationMode>,
}

impl Selection {
    pub fn new<P, F>(preferences: P, features: F, mode: Option<RecommendationMode>) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            selected_preferences: preferences.into_iter().map(Into::into).collect(),
            selected_features: features.into_iter().map(Into::into).collect(),
            selected_recommendation_type: mode,
        }
    }

    /// Back to the blank form state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn mode(&self) -> Option<RecommendationMode> {
        self.selected_recommendation_type
    }

    pub fn has_tags(&self) -> bool {
        !self.selected_preferences.is_empty() || !self.selected_features.is_empty()
    }

    /// Form-level completeness checks, in the order a user sees them.
    ///
    /// The matcher does not need these: it answers an incomplete selection
    /// with an empty result. Callers that want to tell the user *why*
    /// nothing came back run this first.
    pub fn validate(&self) -> Result<RecommendationMode> {
        let mode = self.mode().ok_or(Error::InvalidSelection {
            reason: SelectionIssue::MissingMode,
        })?;

        if !self.has_tags() {
            return Err(Error::InvalidSelection {
                reason: SelectionIssue::NoTagsSelected,
            });
        }

        Ok(mode)
    }
}

fn deserialize_mode<'de, D>(deserializer: D) -> std::result::Result<Option<RecommendationMode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(RecommendationMode::from_wire))
}

fn serialize_mode<S>(mode: &Option<RecommendationMode>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(mode.map(|m| m.as_wire()).unwrap_or(""))
}
