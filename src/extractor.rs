use regex::Regex;
use std::collections::BTreeSet;

/// File extensions that produce email-shaped false positives
/// (e.g. `logo@2x.png` style asset names embedded in markup).
const MEDIA_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".svg", ".gif"];

const MIN_EMAIL_LEN: usize = 7;

pub struct EmailExtractor {
    email_regex: Regex,
    at_token_regex: Regex,
}

impl EmailExtractor {
    pub fn new() -> Self {
        EmailExtractor {
            // Canonical addresses plus the "[at]"-obfuscated variant,
            // with optional whitespace around the bracketed token.
            email_regex: Regex::new(
                r"(?i)[a-z0-9_.+-]+@[a-z0-9-]+\.[a-z0-9.-]+|[a-z0-9_.+-]+\s?\[\s?at\s?\]\s?[a-z0-9-]+\.[a-z0-9.-]+",
            )
            .unwrap(),
            at_token_regex: Regex::new(r"(?i)\s*\[\s*at\s*\]\s*").unwrap(),
        }
    }

    /// Pulls every plausible email address out of a block of plain text.
    /// Obfuscated matches are rewritten to canonical form first, so a page
    /// carrying both `jane@x.com` and `jane [at] x.com` yields one address.
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        let mut emails = BTreeSet::new();
        for m in self.email_regex.find_iter(text) {
            if let Some(email) = self.normalize(m.as_str()) {
                emails.insert(email);
            }
        }
        emails
    }

    fn normalize(&self, raw: &str) -> Option<String> {
        let email = self.at_token_regex.replace_all(raw, "@").replace(' ', "");
        // Sentence-boundary punctuation clings to matches in prose.
        let email = email
            .trim_matches(|c| ".,;:()[]<>".contains(c))
            .to_lowercase();

        if !email.contains('@') || email.len() < MIN_EMAIL_LEN {
            return None;
        }
        if MEDIA_EXTENSIONS.iter().any(|ext| email.ends_with(ext)) {
            return None;
        }
        // The domain part must carry at least one dot.
        let (_, domain) = email.split_once('@')?;
        if !domain.contains('.') {
            return None;
        }
        Some(email)
    }
}

impl Default for EmailExtractor {
    fn default() -> Self {
        Self::new()
    }
}
