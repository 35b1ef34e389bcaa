use log::{error, info, warn};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::env;
use std::time::Duration;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Ranked results examined per query.
const MAX_RESULTS: usize = 3;

/// Credentials for the Google Custom Search JSON API. These are deployment
/// configuration, not pipeline state.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub engine_id: String,
}

impl SearchConfig {
    pub fn from_env() -> Result<Self, String> {
        let api_key = env::var("GOOGLE_API_KEY")
            .map_err(|_| "GOOGLE_API_KEY is not set".to_string())?;
        let engine_id = env::var("GOOGLE_SEARCH_ENGINE_ID")
            .map_err(|_| "GOOGLE_SEARCH_ENGINE_ID is not set".to_string())?;
        Ok(SearchConfig { api_key, engine_id })
    }
}

/// One ranked provider result, narrowed to the two fields the selection
/// policy reads.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub url: String,
    pub snippet: String,
}

/// Outcome of resolving an entity name to a candidate website.
/// `Failed` carries a diagnostic but is equivalent to `NotFound` for
/// crawling purposes.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Site(String),
    NotFound,
    Failed(String),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
    #[serde(default)]
    snippet: String,
}

pub struct SearchEngine {
    client: Client,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .expect("Failed to build search client");

        SearchEngine { client, config }
    }

    /// Issues exactly one ranked query for the entity name and applies the
    /// selection policy. Provider-side failures never escape this method.
    pub fn find_site(&self, name: &str) -> Selection {
        let query = format!("\"{}\" contact email site:.org OR site:.com", name);
        info!("Searching for: '{}'", query);

        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.engine_id.as_str()),
                ("q", &query),
                ("num", "3"),
            ])
            .send();

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                error!("Search request for '{}' failed: {}", name, e);
                return Selection::Failed(e.to_string());
            }
        };

        if !response.status().is_success() {
            warn!("Search for '{}' returned status {}", name, response.status());
            return Selection::Failed(format!("provider status {}", response.status()));
        }

        let body = match response.text() {
            Ok(t) => t,
            Err(e) => {
                error!("Failed to read search response for '{}': {}", name, e);
                return Selection::Failed(e.to_string());
            }
        };

        let parsed: SearchResponse = match serde_json::from_str(&body) {
            Ok(p) => p,
            Err(e) => {
                error!("Malformed search response for '{}': {}", name, e);
                return Selection::Failed(e.to_string());
            }
        };

        let hits: Vec<SearchHit> = parsed
            .items
            .into_iter()
            .take(MAX_RESULTS)
            .map(|item| SearchHit {
                url: item.link,
                snippet: item.snippet,
            })
            .collect();

        select_site(&hits)
    }
}

/// Greedy selection over provider-ranked hits: a URL containing "contact"
/// wins outright, then a snippet containing "email"; otherwise the
/// top-ranked result stands in as the fallback.
pub fn select_site(hits: &[SearchHit]) -> Selection {
    let mut fallback: Option<&str> = None;
    for hit in hits {
        if hit.url.to_lowercase().contains("contact") {
            info!("Selected {} (contact page URL)", hit.url);
            return Selection::Site(hit.url.clone());
        }
        if hit.snippet.to_lowercase().contains("email") {
            info!("Selected {} (email mentioned in snippet)", hit.url);
            return Selection::Site(hit.url.clone());
        }
        fallback.get_or_insert(&hit.url);
    }
    match fallback {
        Some(url) => {
            info!("No heuristic match; falling back to top result {}", url);
            Selection::Site(url.to_string())
        }
        None => {
            warn!("No search results to choose from");
            Selection::NotFound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(url: &str, snippet: &str) -> SearchHit {
        SearchHit {
            url: url.to_string(),
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn contact_url_wins_over_earlier_results() {
        let hits = [
            hit("https://one.com/about", "investor overview"),
            hit("https://two.com/Contact-Us", "reach the team"),
            hit("https://three.com/", "email us anytime"),
        ];
        assert_eq!(
            select_site(&hits),
            Selection::Site("https://two.com/Contact-Us".to_string())
        );
    }

    #[test]
    fn snippet_email_mention_selects_immediately() {
        let hits = [
            hit("https://one.com/about", "send an Email to our desk"),
            hit("https://two.com/contact", "reach us"),
        ];
        assert_eq!(
            select_site(&hits),
            Selection::Site("https://one.com/about".to_string())
        );
    }

    #[test]
    fn falls_back_to_top_result_when_nothing_matches() {
        let hits = [
            hit("https://one.com/", "annual report"),
            hit("https://two.com/", "holdings"),
            hit("https://three.com/", "filings"),
        ];
        assert_eq!(
            select_site(&hits),
            Selection::Site("https://one.com/".to_string())
        );
    }

    #[test]
    fn no_results_means_not_found() {
        assert_eq!(select_site(&[]), Selection::NotFound);
    }

    #[test]
    fn response_parsing_tolerates_missing_fields() {
        let body = r#"{"items": [{"link": "https://x.com/contact"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.items[0].link, "https://x.com/contact");
        assert!(parsed.items[0].snippet.is_empty());

        let empty: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.items.is_empty());
    }
}
