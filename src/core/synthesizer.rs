//! Verdict synthesis.
//!
//! Two halves, run by separate pipeline stages:
//! - [`analyze`]: short-circuits on missing evidence, otherwise makes the one
//!   model call for the run
//! - [`finalize`]: turns the analysis into a [`Verdict`], extracting and
//!   repairing the model's JSON and backfilling citations from the evidence
//!
//! Finalizing never fails. Output that is not a JSON object becomes the fixed
//! "unable to parse" verdict.

use std::collections::HashSet;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::prompts::verification_messages;
use crate::adapters::{LanguageModel, ModelError};
use crate::domain::{
    publisher_for_url, Analysis, EvidenceSet, TrustedSource, Verdict, VerdictLabel,
    MAX_TRUSTED_SOURCES, NO_RESULTS,
};

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Whether rendered evidence gives the model anything to ground on
pub fn has_evidence(rendered: &str) -> bool {
    let rendered = rendered.trim();
    !rendered.is_empty() && rendered != NO_RESULTS
}

/// Run the analysis half: no model call without evidence, otherwise exactly
/// one call with no retry
pub async fn analyze(
    model: &dyn LanguageModel,
    claim: &str,
    rendered: &str,
    call_timeout: Duration,
) -> Result<Analysis, ModelError> {
    if !has_evidence(rendered) {
        debug!("No evidence to analyze, skipping model call");
        return Ok(Analysis::InsufficientEvidence);
    }

    let messages = verification_messages(claim, rendered);
    let text = model.complete(&messages, call_timeout).await?;
    debug!(model = model.name(), chars = text.len(), "Model responded");

    Ok(Analysis::ModelResponse(text))
}

/// Run the formatting half
pub fn finalize(analysis: &Analysis, evidence: &EvidenceSet, today: NaiveDate) -> Verdict {
    match analysis {
        Analysis::InsufficientEvidence => Verdict::insufficient_evidence(today),
        Analysis::ModelResponse(text) => build_verdict(text, evidence, today),
    }
}

/// Both halves back to back
pub async fn synthesize(
    model: &dyn LanguageModel,
    claim: &str,
    rendered: &str,
    evidence: &EvidenceSet,
    call_timeout: Duration,
    today: NaiveDate,
) -> Result<Verdict, ModelError> {
    let analysis = analyze(model, claim, rendered, call_timeout).await?;
    Ok(finalize(&analysis, evidence, today))
}

/// Build a verdict from raw model output
pub fn build_verdict(raw: &str, evidence: &EvidenceSet, today: NaiveDate) -> Verdict {
    let Some(parsed) = parse_model_output(raw) else {
        warn!(chars = raw.len(), "Model output is not a JSON object");
        return Verdict::unparsable(today);
    };

    let verdict = parsed
        .get("verdict")
        .and_then(Value::as_str)
        .and_then(VerdictLabel::parse)
        .unwrap_or_default();

    let confidence = parsed
        .get("confidence_score")
        .and_then(number)
        .unwrap_or(0.0);

    let summary = parsed
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut sources = parsed
        .get("trusted_sources")
        .map(trusted_sources)
        .unwrap_or_default();
    backfill_sources(&mut sources, evidence);

    Verdict::new(
        verdict,
        confidence,
        summary,
        string_list(parsed.get("verified_facts")),
        string_list(parsed.get("incorrect_or_misleading_parts")),
        sources,
        today,
    )
}

/// Parse model output into a JSON object.
///
/// Reasoning blocks are removed first. The first balanced `{...}` region is
/// parsed, or the whole text when there is none.
pub fn parse_model_output(raw: &str) -> Option<Map<String, Value>> {
    let text = strip_reasoning(raw);
    let candidate = extract_json_object(&text).unwrap_or(text.trim());

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "Failed to parse model output");
            None
        }
    }
}

/// Remove `<think>...</think>` blocks emitted by reasoning models
pub fn strip_reasoning(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find(THINK_OPEN) {
        let after_open = &rest[open + THINK_OPEN.len()..];
        let Some(close) = after_open.find(THINK_CLOSE) else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = &after_open[close + THINK_CLOSE.len()..];
    }

    out.push_str(rest);
    out
}

/// Find the first balanced `{...}` region.
///
/// Braces inside JSON strings are ignored. A `{` that never closes is skipped
/// and the scan resumes at the next one.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();

    for (start, _) in text.match_indices('{') {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (offset, &b) in bytes[start..].iter().enumerate() {
            if in_string {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }

            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[start..=start + offset]);
                    }
                }
                _ => {}
            }
        }
    }

    None
}

/// Read a number, or a string holding one
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a list of strings, dropping anything that is not a string
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Read model-cited sources. Entries without a URL are dropped and a
/// repeated URL keeps its first entry.
fn trusted_sources(value: &Value) -> Vec<TrustedSource> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| {
            let url = item.get("url").and_then(Value::as_str)?.trim();
            if url.is_empty() || !seen.insert(url) {
                return None;
            }

            let title = item
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let publisher = item
                .get("publisher")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| publisher_for_url(url));

            Some(TrustedSource {
                title,
                url: url.to_string(),
                publisher,
            })
        })
        .collect()
}

/// Top up sources from the evidence, in order, skipping URLs already cited
fn backfill_sources(sources: &mut Vec<TrustedSource>, evidence: &EvidenceSet) {
    if sources.len() >= MAX_TRUSTED_SOURCES {
        return;
    }

    let mut cited: HashSet<String> = sources.iter().map(|s| s.url.clone()).collect();
    let before = sources.len();

    for record in evidence.iter() {
        if sources.len() >= MAX_TRUSTED_SOURCES {
            break;
        }
        if cited.insert(record.url.clone()) {
            sources.push(TrustedSource {
                title: record.title.clone(),
                url: record.url.clone(),
                publisher: record.publisher.clone(),
            });
        }
    }

    if sources.len() > before {
        debug!(added = sources.len() - before, "Backfilled sources from evidence");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EvidenceRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn evidence(n: usize) -> EvidenceSet {
        let records = (0..n)
            .map(|i| {
                EvidenceRecord::new(
                    format!("Evidence {}", i),
                    format!("https://www.bbc.com/news/{}", i),
                    "snippet",
                )
            })
            .collect();
        EvidenceSet::merge([records], 10)
    }

    #[test]
    fn test_extract_first_balanced_object() {
        let text = r#"Here you go: {"a": {"b": "}"}, "c": 1} and {"d": 2}"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"a": {"b": "}"}, "c": 1}"#)
        );
    }

    #[test]
    fn test_extract_skips_unclosed_brace() {
        assert_eq!(extract_json_object(r#"{ oops {"x": 1}"#), Some(r#"{"x": 1}"#));
        assert_eq!(extract_json_object("no braces"), None);
        assert_eq!(extract_json_object(r#"{"s": "\"{"}"#), Some(r#"{"s": "\"{"}"#));
    }

    #[test]
    fn test_strip_reasoning() {
        assert_eq!(
            strip_reasoning("<think>maybe {x}</think>{\"verdict\": \"REAL\"}"),
            "{\"verdict\": \"REAL\"}"
        );
        assert_eq!(strip_reasoning("<think>unterminated"), "<think>unterminated");
    }

    #[test]
    fn test_unparsable_output() {
        let verdict = build_verdict("I cannot comply.", &evidence(3), today());
        assert_eq!(verdict, Verdict::unparsable(today()));
        assert!(verdict.trusted_sources.is_empty());

        let array = build_verdict("[1, 2]", &evidence(3), today());
        assert_eq!(array.verdict, VerdictLabel::Unverified);
        assert!(array.trusted_sources.is_empty());
    }

    #[test]
    fn test_repair_defaults() {
        let verdict = build_verdict(r#"{"verdict": "maybe"}"#, &EvidenceSet::empty(), today());
        assert_eq!(verdict.verdict, VerdictLabel::Unverified);
        assert_eq!(verdict.confidence_score, 0.0);
        assert_eq!(verdict.summary, "");
        assert!(verdict.verified_facts.is_empty());
        assert!(verdict.trusted_sources.is_empty());
        assert_eq!(verdict.last_verified_date, today());
    }

    #[test]
    fn test_repair_coerces_fields() {
        let raw = r#"{
            "verdict": "partially_true",
            "confidence_score": "0.4",
            "verified_facts": ["one", 2, "three"],
            "trusted_sources": [
                {"title": "No url"},
                {"url": "https://www.reuters.com/x"}
            ]
        }"#;
        let verdict = build_verdict(raw, &EvidenceSet::empty(), today());

        assert_eq!(verdict.verdict, VerdictLabel::PartiallyTrue);
        assert_eq!(verdict.confidence_score, 0.4);
        assert_eq!(verdict.verified_facts, ["one", "three"]);
        assert_eq!(verdict.trusted_sources.len(), 1);
        assert_eq!(verdict.trusted_sources[0].publisher, "Reuters");
        assert_eq!(verdict.trusted_sources[0].title, "");
    }

    #[test]
    fn test_confidence_clamped() {
        let high = build_verdict(r#"{"confidence_score": 1.5}"#, &EvidenceSet::empty(), today());
        assert_eq!(high.confidence_score, 1.0);

        let low = build_verdict(r#"{"confidence_score": -0.2}"#, &EvidenceSet::empty(), today());
        assert_eq!(low.confidence_score, 0.0);
    }

    #[test]
    fn test_backfill_skips_cited_urls() {
        let raw = r#"{"verdict": "REAL", "trusted_sources": [
            {"title": "Cited", "url": "https://www.bbc.com/news/1", "publisher": "BBC"}
        ]}"#;
        let verdict = build_verdict(raw, &evidence(8), today());

        let urls: Vec<_> = verdict.trusted_sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://www.bbc.com/news/1",
                "https://www.bbc.com/news/0",
                "https://www.bbc.com/news/2",
                "https://www.bbc.com/news/3",
                "https://www.bbc.com/news/4",
            ]
        );
    }

    #[test]
    fn test_model_sources_truncated() {
        let sources: Vec<_> = (0..7)
            .map(|i| format!(r#"{{"title": "t", "url": "https://apnews.com/{}"}}"#, i))
            .collect();
        let raw = format!(r#"{{"trusted_sources": [{}]}}"#, sources.join(","));
        let verdict = build_verdict(&raw, &evidence(3), today());
        assert_eq!(verdict.trusted_sources.len(), MAX_TRUSTED_SOURCES);
        assert!(verdict.trusted_sources.iter().all(|s| s.publisher == "Associated Press"));
    }

    #[test]
    fn test_repeated_model_sources_do_not_block_backfill() {
        let repeated = vec![r#"{"title": "Same", "url": "https://www.reuters.com/same"}"#; 5];
        let raw = format!(r#"{{"verdict": "REAL", "trusted_sources": [{}]}}"#, repeated.join(","));
        let verdict = build_verdict(&raw, &evidence(8), today());

        let urls: Vec<_> = verdict.trusted_sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://www.reuters.com/same",
                "https://www.bbc.com/news/0",
                "https://www.bbc.com/news/1",
                "https://www.bbc.com/news/2",
                "https://www.bbc.com/news/3",
            ]
        );
    }

    struct Canned {
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl Canned {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(
            &self,
            messages: &[crate::adapters::ChatMessage],
            _timeout: Duration,
        ) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(messages[1].content.contains("The moon landing was faked"));
            Ok(self.reply.to_string())
        }
    }

    #[tokio::test]
    async fn test_synthesize_without_evidence_skips_model() {
        let model = Canned::new(r#"{"verdict": "REAL"}"#);
        let empty = EvidenceSet::empty();

        let verdict = synthesize(
            &model,
            "The moon landing was faked",
            &empty.render(),
            &empty,
            Duration::from_secs(1),
            today(),
        )
        .await
        .unwrap();

        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(verdict, Verdict::insufficient_evidence(today()));
    }

    #[tokio::test]
    async fn test_synthesize_with_evidence() {
        let model = Canned::new(
            r#"Sure. {"verdict": "FAKE", "confidence_score": 0.85, "summary": "Debunked.", "trusted_sources": [
                {"title": "Evidence 2", "url": "https://www.bbc.com/news/2", "publisher": "BBC"}
            ]}"#,
        );
        let evidence = evidence(3);

        let verdict = synthesize(
            &model,
            "The moon landing was faked",
            &evidence.render(),
            &evidence,
            Duration::from_secs(1),
            today(),
        )
        .await
        .unwrap();

        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(verdict.verdict, VerdictLabel::Fake);
        assert_eq!(verdict.confidence_score, 0.85);
        assert_eq!(verdict.summary, "Debunked.");
        let urls: Vec<_> = verdict.trusted_sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://www.bbc.com/news/2",
                "https://www.bbc.com/news/0",
                "https://www.bbc.com/news/1",
            ]
        );
        assert_eq!(verdict.last_verified_date, today());
    }

    #[test]
    fn test_finalize_insufficient_evidence() {
        let verdict = finalize(&Analysis::InsufficientEvidence, &EvidenceSet::empty(), today());
        assert_eq!(verdict, Verdict::insufficient_evidence(today()));
    }

    #[test]
    fn test_has_evidence() {
        assert!(!has_evidence(""));
        assert!(!has_evidence(NO_RESULTS));
        assert!(has_evidence("Result 1:\nTitle: x"));
    }
}
