use crate::extractor::EmailExtractor;
use crate::fetcher::PageFetcher;
use crate::input_loader::EntityRecord;
use crate::search::{SearchEngine, Selection};
use log::{info, warn};
use scraper::Html;
use std::thread;
use std::time::Duration;

/// Display marker for an absent website or an empty email set. Deliberately
/// the same marker for "no site found", "fetch failed" and "page had no
/// addresses".
pub const NOT_FOUND: &str = "Not found";

/// Spacing between entities, calibrated against provider rate limits for
/// strictly sequential calls.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1200);

/// Resolves an entity name to at most one candidate website.
pub trait SiteFinder {
    fn find_site(&self, name: &str) -> Selection;
}

impl SiteFinder for SearchEngine {
    fn find_site(&self, name: &str) -> Selection {
        SearchEngine::find_site(self, name)
    }
}

/// Retrieves the raw body of a selected URL, or nothing.
pub trait FetchPage {
    fn fetch(&self, url: &str) -> Option<String>;
}

impl FetchPage for PageFetcher {
    fn fetch(&self, url: &str) -> Option<String> {
        PageFetcher::fetch(self, url)
    }
}

/// One output row per input record, in input order. Passthrough fields are
/// echoed verbatim; `website`/`emails` carry the pipeline outcome.
#[derive(Debug, Clone)]
pub struct EntityResult {
    pub name: String,
    pub registration_no: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub emails: Vec<String>,
}

impl EntityResult {
    pub fn has_emails(&self) -> bool {
        !self.emails.is_empty()
    }

    pub fn website_display(&self) -> &str {
        self.website.as_deref().unwrap_or(NOT_FOUND)
    }

    pub fn emails_display(&self) -> String {
        if self.emails.is_empty() {
            NOT_FOUND.to_string()
        } else {
            self.emails.join(", ")
        }
    }
}

/// Flattens an HTML document to whitespace-separated visible text.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document.root_element().text().collect::<Vec<_>>().join(" ")
}

pub struct Pipeline<S, F> {
    finder: S,
    fetcher: F,
    extractor: EmailExtractor,
    pacing: Duration,
}

impl<S: SiteFinder, F: FetchPage> Pipeline<S, F> {
    /// `pacing` of `Duration::ZERO` disables inter-entity delays.
    pub fn new(finder: S, fetcher: F, pacing: Duration) -> Self {
        Pipeline {
            finder,
            fetcher,
            extractor: EmailExtractor::new(),
            pacing,
        }
    }

    /// Runs the batch strictly sequentially. Every per-entity failure
    /// degrades to sentinels; nothing here aborts the loop.
    pub fn run(&self, records: &[EntityRecord]) -> Vec<EntityResult> {
        let total = records.len();
        let mut results = Vec::with_capacity(total);

        for (i, record) in records.iter().enumerate() {
            if i > 0 && !self.pacing.is_zero() {
                thread::sleep(self.pacing);
            }
            info!("Processing {} / {}: {}", i + 1, total, record.name);

            let website = match self.finder.find_site(&record.name) {
                Selection::Site(url) => Some(url),
                Selection::NotFound => {
                    warn!("No website found for '{}'", record.name);
                    None
                }
                Selection::Failed(reason) => {
                    warn!("Search failed for '{}': {}", record.name, reason);
                    None
                }
            };

            let emails: Vec<String> = website
                .as_deref()
                .and_then(|url| self.fetcher.fetch(url))
                .map(|body| {
                    self.extractor
                        .extract(&html_to_text(&body))
                        .into_iter()
                        .collect()
                })
                .unwrap_or_default();

            if !emails.is_empty() {
                info!("Found {} address(es) for '{}'", emails.len(), record.name);
            }

            results.push(EntityResult {
                name: record.name.clone(),
                registration_no: record.registration_no.clone(),
                address: record.address.clone(),
                website,
                emails,
            });
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StubFinder(HashMap<&'static str, Selection>);

    impl SiteFinder for StubFinder {
        fn find_site(&self, name: &str) -> Selection {
            self.0.get(name).cloned().unwrap_or(Selection::NotFound)
        }
    }

    struct StubFetcher(HashMap<&'static str, &'static str>);

    impl FetchPage for StubFetcher {
        fn fetch(&self, url: &str) -> Option<String> {
            self.0.get(url).map(|body| body.to_string())
        }
    }

    fn record(name: &str) -> EntityRecord {
        EntityRecord {
            name: name.to_string(),
            registration_no: Some(format!("IN/{}", name)),
            address: None,
        }
    }

    fn pipeline(
        finder: StubFinder,
        fetcher: StubFetcher,
    ) -> Pipeline<StubFinder, StubFetcher> {
        Pipeline::new(finder, fetcher, Duration::ZERO)
    }

    #[test]
    fn output_order_matches_input_order_under_mixed_outcomes() {
        let finder = StubFinder(HashMap::from([
            ("Alpha Fund", Selection::Site("https://alpha.com/contact".to_string())),
            ("Beta Fund", Selection::NotFound),
            ("Gamma Fund", Selection::Failed("quota exhausted".to_string())),
            ("Delta Fund", Selection::Site("https://delta.com".to_string())),
        ]));
        let fetcher = StubFetcher(HashMap::from([
            ("https://alpha.com/contact", "<p>mail ir@alpha.com</p>"),
            ("https://delta.com", "<p>nothing to see</p>"),
        ]));

        let names = ["Alpha Fund", "Beta Fund", "Gamma Fund", "Delta Fund"];
        let records: Vec<EntityRecord> = names.iter().map(|n| record(n)).collect();
        let results = pipeline(finder, fetcher).run(&records);

        assert_eq!(results.len(), records.len());
        for (result, name) in results.iter().zip(names) {
            assert_eq!(result.name, name);
        }
        assert_eq!(results[0].emails, vec!["ir@alpha.com"]);
        assert_eq!(results[1].website, None);
        // A provider failure degrades the same way as a genuine miss.
        assert_eq!(results[2].website, None);
        assert!(results[3].website.is_some());
        assert!(results[3].emails.is_empty());
    }

    #[test]
    fn fetch_failure_is_isolated_to_its_entity() {
        let finder = StubFinder(HashMap::from([
            ("Dead Site", Selection::Site("https://dead.com".to_string())),
            ("Live Site", Selection::Site("https://live.com".to_string())),
        ]));
        // dead.com has no stubbed body, simulating a fetch failure.
        let fetcher = StubFetcher(HashMap::from([(
            "https://live.com",
            "reach us: desk [at] live.com",
        )]));

        let records = vec![record("Dead Site"), record("Live Site")];
        let results = pipeline(finder, fetcher).run(&records);

        assert!(results[0].emails.is_empty());
        assert_eq!(results[0].emails_display(), NOT_FOUND);
        assert_eq!(results[0].website_display(), "https://dead.com");
        assert_eq!(results[1].emails, vec!["desk@live.com"]);
    }

    #[test]
    fn passthrough_fields_are_echoed_verbatim() {
        let finder = StubFinder(HashMap::new());
        let fetcher = StubFetcher(HashMap::new());
        let records = vec![EntityRecord {
            name: "Solo".to_string(),
            registration_no: Some("REG-7".to_string()),
            address: Some("12 Harbor Road".to_string()),
        }];
        let results = pipeline(finder, fetcher).run(&records);

        assert_eq!(results[0].registration_no.as_deref(), Some("REG-7"));
        assert_eq!(results[0].address.as_deref(), Some("12 Harbor Road"));
        assert_eq!(results[0].website_display(), NOT_FOUND);
    }

    #[test]
    fn html_markup_is_stripped_before_extraction() {
        let text = html_to_text(
            "<html><body><div>write to <b>ir@fund.org</b></div><script>var x = 'no@script.png';</script></body></html>",
        );
        assert!(text.contains("ir@fund.org"));
    }
}
