//! Publisher attribution for evidence URLs.
//!
//! Publishers are derived from the URL host alone, so the same URL always
//! yields the same publisher regardless of which backend returned it.

use url::Url;

/// Publisher used when a URL cannot be parsed or has no host
pub const UNKNOWN_PUBLISHER: &str = "Unknown";

/// Known outlets, keyed by host with any leading `www.` removed
const PUBLISHERS: &[(&str, &str)] = &[
    ("bbc.com", "BBC"),
    ("bbc.co.uk", "BBC"),
    ("reuters.com", "Reuters"),
    ("apnews.com", "Associated Press"),
    ("snopes.com", "Snopes"),
    ("politifact.com", "PolitiFact"),
    ("factcheck.org", "FactCheck.org"),
    ("nytimes.com", "The New York Times"),
    ("washingtonpost.com", "The Washington Post"),
    ("theguardian.com", "The Guardian"),
    ("cnn.com", "CNN"),
    ("nbcnews.com", "NBC News"),
    ("abcnews.go.com", "ABC News"),
    ("who.int", "World Health Organization"),
    ("un.org", "United Nations"),
];

/// Domains the model is asked to prefer when choosing citations.
///
/// Entries without a dot (`gov`) match a top-level domain.
const PREFERRED_DOMAINS: &[&str] = &[
    "bbc.com",
    "bbc.co.uk",
    "reuters.com",
    "apnews.com",
    "snopes.com",
    "politifact.com",
    "factcheck.org",
    "gov.uk",
    "gov",
    "who.int",
    "un.org",
];

/// Resolve the publisher name for a URL.
///
/// Known domains map to their outlet name; anything else becomes the
/// title-cased first DNS label (`example-news.test` -> `Example-News`).
pub fn publisher_for_url(url: &str) -> String {
    let Some(domain) = domain_of(url) else {
        return UNKNOWN_PUBLISHER.to_string();
    };

    if let Some((_, name)) = PUBLISHERS.iter().find(|(d, _)| *d == domain) {
        return (*name).to_string();
    }

    let label = domain.split('.').next().unwrap_or_default();
    if label.is_empty() {
        return UNKNOWN_PUBLISHER.to_string();
    }
    title_case(label)
}

/// Check whether a URL belongs to one of the preferred fact-checking domains
pub fn is_preferred_domain(url: &str) -> bool {
    let Some(domain) = domain_of(url) else {
        return false;
    };

    PREFERRED_DOMAINS.iter().any(|preferred| {
        domain == *preferred || domain.ends_with(&format!(".{}", preferred))
    })
}

/// Lowercased host without a leading `www.`
fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.trim().to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// Uppercase every letter that follows a non-letter, lowercase the rest
fn title_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut prev_is_letter = false;
    for c in label.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
