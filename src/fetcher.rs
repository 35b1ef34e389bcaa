use log::warn;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(12);

const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Fetches a single page per selected URL. Every failure mode degrades to
/// `None` so the batch keeps moving.
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client");

        PageFetcher { client }
    }

    fn random_user_agent(&self) -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())]
    }

    /// One bounded GET. Returns the body only for a plain 200; anything
    /// else (malformed URL, DNS, timeout, TLS, non-200, read error) is
    /// logged and mapped to no content.
    pub fn fetch(&self, url: &str) -> Option<String> {
        if Url::parse(url).is_err() {
            warn!("Skipping malformed URL: {}", url);
            return None;
        }

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, self.random_user_agent())
            .send();

        match response {
            Ok(resp) if resp.status() == StatusCode::OK => match resp.text() {
                Ok(body) => Some(body),
                Err(e) => {
                    warn!("Failed to read body from {}: {}", url, e);
                    None
                }
            },
            Ok(resp) => {
                warn!("Fetch of {} returned status {}", url, resp.status());
                None
            }
            Err(e) => {
                warn!("Fetch of {} failed: {}", url, e);
                None
            }
        }
    }
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_url_yields_no_content() {
        let fetcher = PageFetcher::new();
        assert!(fetcher.fetch("not a url").is_none());
        assert!(fetcher.fetch("").is_none());
    }
}
