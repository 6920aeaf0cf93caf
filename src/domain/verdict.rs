//! The canonical verification outcome returned to callers.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximum number of citations in a verdict
pub const MAX_TRUSTED_SOURCES: usize = 5;

const INSUFFICIENT_EVIDENCE_SUMMARY: &str = "Unable to verify this claim due to insufficient search results. Please try rephrasing your query or check back later.";

const UNPARSABLE_SUMMARY: &str =
    "Unable to parse verification results. The claim could not be verified at this time.";

/// Verdict label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VerdictLabel {
    #[serde(rename = "REAL")]
    Real,
    #[serde(rename = "FAKE")]
    Fake,
    #[serde(rename = "PARTIALLY TRUE")]
    PartiallyTrue,
    #[default]
    #[serde(rename = "UNVERIFIED")]
    Unverified,
}

impl VerdictLabel {
    /// Parse a label as emitted by the model.
    ///
    /// Matching ignores case and treats `_`/`-` like spaces.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw
            .trim()
            .to_uppercase()
            .replace(['_', '-'], " ");
        match normalized.as_str() {
            "REAL" => Some(Self::Real),
            "FAKE" => Some(Self::Fake),
            "PARTIALLY TRUE" => Some(Self::PartiallyTrue),
            "UNVERIFIED" => Some(Self::Unverified),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Real => "REAL",
            Self::Fake => "FAKE",
            Self::PartiallyTrue => "PARTIALLY TRUE",
            Self::Unverified => "UNVERIFIED",
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cited source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedSource {
    pub title: String,
    pub url: String,
    pub publisher: String,
}

/// Structured verification outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub verdict: VerdictLabel,

    /// Always within [0, 1]
    pub confidence_score: f64,

    /// One-paragraph explanation
    pub summary: String,

    pub verified_facts: Vec<String>,

    pub incorrect_or_misleading_parts: Vec<String>,

    /// At most [`MAX_TRUSTED_SOURCES`] entries
    pub trusted_sources: Vec<TrustedSource>,

    /// Date the verdict was constructed, serialized as `YYYY-MM-DD`
    pub last_verified_date: NaiveDate,
}

impl Verdict {
    /// Build a verdict, clamping the confidence and truncating the sources
    pub fn new(
        verdict: VerdictLabel,
        confidence_score: f64,
        summary: String,
        verified_facts: Vec<String>,
        incorrect_or_misleading_parts: Vec<String>,
        mut trusted_sources: Vec<TrustedSource>,
        last_verified_date: NaiveDate,
    ) -> Self {
        trusted_sources.truncate(MAX_TRUSTED_SOURCES);
        Self {
            verdict,
            confidence_score: clamp_confidence(confidence_score),
            summary,
            verified_facts,
            incorrect_or_misleading_parts,
            trusted_sources,
            last_verified_date,
        }
    }

    /// UNVERIFIED with no facts or sources
    pub fn unverified(summary: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(
            VerdictLabel::Unverified,
            0.0,
            summary.into(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            date,
        )
    }

    /// Returned without a model call when the search found nothing
    pub fn insufficient_evidence(date: NaiveDate) -> Self {
        Self::unverified(INSUFFICIENT_EVIDENCE_SUMMARY, date)
    }

    /// Returned when the model output is not a JSON object
    pub fn unparsable(date: NaiveDate) -> Self {
        Self::unverified(UNPARSABLE_SUMMARY, date)
    }

    /// Returned when a stage recorded an error marker
    pub fn failed(error: &str, date: NaiveDate) -> Self {
        Self::unverified(
            format!("Verification could not be completed: {}", error),
            date,
        )
    }
}

/// Clamp into [0, 1]; NaN becomes 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
