#![allow(dead_code)]

use tagmatch::{CatalogItem, RecommendationMode, Selection};

pub fn item(id: i64, name: &str, category: &str, preferences: &[&str], features: &[&str]) -> CatalogItem {
    CatalogItem {
        id,
        name: name.to_string(),
        category: category.to_string(),
        preferences: preferences.iter().map(|s| s.to_string()).collect(),
        features: features.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn selection(prefs: &[&str], feats: &[&str], mode: Option<RecommendationMode>) -> Selection {
    Selection::new(prefs.iter().copied(), feats.iter().copied(), mode)
}

/// Small product catalog shaped like the real catalog service's response
pub fn products() -> Vec<CatalogItem> {
    vec![
        item(
            1,
            "RD Station CRM",
            "Sales",
            &[
                "Easy integration with email tools",
                "Sales funnel customization",
                "Team-wide sales management",
            ],
            &[
                "Customer interaction tracking",
                "Sales pipeline management",
                "Sales performance reports",
            ],
        ),
        item(
            2,
            "RD Station Marketing",
            "Marketing",
            &[
                "Easy integration with email tools",
                "Marketing automation",
                "Lead segmentation",
            ],
            &[
                "User behavior tracking",
                "Landing page builder",
                "Email campaign scheduling",
            ],
        ),
        item(
            3,
            "RD Conversas",
            "Omnichannel",
            &[
                "Chatbot integration",
                "Unified customer inbox",
                "WhatsApp support",
            ],
            &[
                "Live chat and automated messages",
                "Conversation history",
                "Team routing",
            ],
        ),
        item(
            4,
            "RD Mentor AI",
            "Artificial Intelligence",
            &[
                "AI-generated content",
                "Productivity boost",
                "Marketing insights",
            ],
            &[
                "Content generation",
                "Campaign ideas",
                "Performance analysis",
            ],
        ),
    ]
}

pub fn names(recs: &[tagmatch::Recommendation]) -> Vec<&str> {
    recs.iter().map(|r| r.item.name.as_str()).collect()
}
