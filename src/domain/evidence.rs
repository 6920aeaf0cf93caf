//! Evidence records and the bounded, URL-unique evidence set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::publisher::{is_preferred_domain, publisher_for_url};

/// Maximum number of records kept after merging search batches
pub const MAX_EVIDENCE: usize = 10;

/// Rendered evidence text when no records survived the merge
pub const NO_RESULTS: &str = "No search results found.";

/// One web search result with its attributed publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub publisher: String,
}

impl EvidenceRecord {
    /// Create a record, deriving the publisher from the URL
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        let url = url.into();
        let publisher = publisher_for_url(&url);
        Self {
            title: title.into(),
            url,
            snippet: snippet.into(),
            publisher,
        }
    }

    /// Whether the record comes from a preferred fact-checking domain
    pub fn is_preferred(&self) -> bool {
        is_preferred_domain(&self.url)
    }
}

/// Ordered evidence with unique URLs, at most [`MAX_EVIDENCE`] records.
///
/// Only [`EvidenceSet::merge`] builds a non-empty set, so both invariants
/// hold for every value of this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceSet {
    records: Vec<EvidenceRecord>,
}

impl EvidenceSet {
    /// An empty evidence set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge batches in the given order, keeping the first record seen for
    /// each URL and truncating to `max` (itself capped at [`MAX_EVIDENCE`]).
    /// Records with a blank URL are dropped.
    pub fn merge<I>(batches: I, max: usize) -> Self
    where
        I: IntoIterator<Item = Vec<EvidenceRecord>>,
    {
        let max = max.min(MAX_EVIDENCE);
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for record in batches.into_iter().flatten() {
            if records.len() >= max {
                break;
            }
            if record.url.trim().is_empty() {
                continue;
            }
            if seen.insert(record.url.clone()) {
                records.push(record);
            }
        }

        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvidenceRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[EvidenceRecord] {
        &self.records
    }

    /// Render the set into the fixed text form the model reads
    pub fn render(&self) -> String {
        if self.records.is_empty() {
            return NO_RESULTS.to_string();
        }

        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                format!(
                    "Result {}:\nTitle: {}\nURL: {}\nPublisher: {}\nSnippet: {}\n",
                    i + 1,
                    r.title,
                    r.url,
                    r.publisher,
                    r.snippet
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
