//! Product Catalog
//!
//! The items the matcher ranks, the HTTP client that fetches them from the
//! catalog service, and the tag vocabulary offered to users for selection.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::CatalogConfig;
use crate::error::{Error, Result};

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    /// Display only, never matched on
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Ids must be unique within one catalog
pub fn validate_catalog(items: &[CatalogItem]) -> Result<()> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(item.id) {
            return Err(Error::InvalidCatalog {
                message: format!("duplicate item id {}", item.id).into(),
            });
        }
    }
    Ok(())
}

/// Distinct tags a user can pick from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagVocabulary {
    pub preferences: Vec<String>,
    pub features: Vec<String>,
}

impl TagVocabulary {
    /// Collect distinct tags in first-seen catalog order.
    ///
    /// With `per_item_limit`, only the first N tags of each item
    /// contribute to each list.
    pub fn from_catalog(items: &[CatalogItem], per_item_limit: Option<usize>) -> Self {
        let take = per_item_limit.unwrap_or(usize::MAX);
        Self {
            preferences: distinct(items.iter().flat_map(|i| i.preferences.iter().take(take))),
            features: distinct(items.iter().flat_map(|i| i.features.iter().take(take))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty() && self.features.is_empty()
    }
}

fn distinct<'a>(tags: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect()
}

/// HTTP client for the catalog service
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::catalog_with_source("failed to build HTTP client", e))?;

        Ok(Self {
            http,
            url: config.products_url(),
            timeout: config.timeout,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    /// Fetch the full catalog, retrying transient failures with exponential backoff
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>> {
        let attempts = self.max_retries + 1;
        let mut delay = self.retry_delay;

        for attempt in 1..=attempts {
            match self.fetch_once().await {
                Ok(items) => {
                    validate_catalog(&items)?;
                    info!("📦 Fetched {} catalog items", items.len());
                    return Ok(items);
                }
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        "Catalog fetch attempt {}/{} failed: {}; retrying in {:?}",
                        attempt, attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
                Err(e) if e.is_retryable() => {
                    warn!("Catalog fetch attempt {}/{} failed: {}", attempt, attempts, e);
                    return Err(Error::CatalogUnavailable { attempts });
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::CatalogUnavailable { attempts })
    }

    async fn fetch_once(&self) -> Result<Vec<CatalogItem>> {
        debug!("GET {}", self.url);

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::CatalogStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        // Undecodable bodies are a provider fault
        serde_json::from_slice(&body).map_err(|e| Error::InvalidCatalog {
            message: format!("malformed catalog body: {}", e).into(),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            Error::from(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, preferences: &[&str], features: &[&str]) -> CatalogItem {
        CatalogItem {
            id,
            name: format!("Item {}", id),
            category: "test".to_string(),
            preferences: preferences.iter().map(|s| s.to_string()).collect(),
            features: features.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_vocabulary_first_seen_order() {
        let items = vec![
            item(1, &["b", "a"], &["x"]),
            item(2, &["a", "c"], &["y", "x"]),
        ];
        let vocab = TagVocabulary::from_catalog(&items, None);
        assert_eq!(vocab.preferences, vec!["b", "a", "c"]);
        assert_eq!(vocab.features, vec!["x", "y"]);
    }

    #[test]
    fn test_vocabulary_per_item_limit() {
        let items = vec![item(1, &["a", "b", "c"], &["x", "y", "z"]), item(2, &["d"], &[])];
        let vocab = TagVocabulary::from_catalog(&items, Some(2));
        assert_eq!(vocab.preferences, vec!["a", "b", "d"]);
        assert_eq!(vocab.features, vec!["x", "y"]);
        assert!(TagVocabulary::from_catalog(&[], None).is_empty());
    }

    #[test]
    fn test_validate_catalog_rejects_duplicate_ids() {
        assert!(validate_catalog(&[item(1, &[], &[]), item(2, &[], &[])]).is_ok());
        assert!(matches!(
            validate_catalog(&[item(1, &[], &[]), item(1, &[], &[])]),
            Err(Error::InvalidCatalog { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeouts_report_configured_limit() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("[]")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = CatalogConfig {
            base_url: server.uri(),
            timeout: Duration::from_millis(50),
            ..CatalogConfig::default()
        };
        let client = CatalogClient::new(&config).unwrap();

        let err = client.fetch_once().await.unwrap_err();
        assert!(matches!(err, Error::Timeout { timeout_ms: 50 }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_undecodable_body_is_invalid_catalog() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\":"))
            .mount(&server)
            .await;

        let config = CatalogConfig {
            base_url: server.uri(),
            ..CatalogConfig::default()
        };
        let client = CatalogClient::new(&config).unwrap();

        let err = client.fetch_once().await.unwrap_err();
        assert!(matches!(err, Error::InvalidCatalog { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_item_ignores_unknown_fields() {
        let raw = r#"{"id":3,"name":"RD Conversas","category":"Omnichannel",
            "preferences":["p"],"features":["f"],"icon":"chat"}"#;
        let parsed: CatalogItem = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.id, 3);
        assert_eq!(parsed.preferences, vec!["p"]);
    }
}
