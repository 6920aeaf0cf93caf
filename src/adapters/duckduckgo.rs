//! DuckDuckGo HTML adapter (keyless fallback evidence backend).
//!
//! Endpoint: POST https://html.duckduckgo.com/html/ with form field `q`
//!
//! The HTML endpoint has no structured output, so results are pulled out of
//! the markup: `result__a` anchors give title and URL, `result__snippet`
//! elements give the snippet, paired by position. Markup that matches
//! nothing yields an empty result list, never an error.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use super::{EvidenceSource, SearchError, BROWSER_USER_AGENT, MAX_RESULTS_PER_CALL};
use crate::domain::EvidenceRecord;

/// Default HTML search endpoint
pub const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

const RESULT_CLASS: &str = "result__a";
const SNIPPET_CLASS: &str = "result__snippet";

/// DuckDuckGo HTML search client
pub struct DuckDuckGoSearch {
    endpoint: String,
    client: reqwest::Client,
}

impl Default for DuckDuckGoSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDuckGoSearch {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn fetch(&self, query: &str) -> Result<String, SearchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .form(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl EvidenceSource for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        call_timeout: Duration,
    ) -> Result<Vec<EvidenceRecord>, SearchError> {
        let limit = limit.min(MAX_RESULTS_PER_CALL);
        debug!(query, limit, "Querying DuckDuckGo HTML search");

        let html = timeout(call_timeout, self.fetch(query))
            .await
            .map_err(|_| SearchError::Timeout(call_timeout))??;

        Ok(parse_results(&html, limit))
    }
}

/// Extract up to `limit` records from a results page
pub fn parse_results(html: &str, limit: usize) -> Vec<EvidenceRecord> {
    let anchors = elements_with_class(html, RESULT_CLASS);
    let snippets = elements_with_class(html, SNIPPET_CLASS);

    anchors
        .into_iter()
        .enumerate()
        .filter_map(|(i, anchor)| {
            let url = anchor.href.as_deref().and_then(resolve_href)?;
            let snippet = snippets.get(i).map(|s| s.text.clone()).unwrap_or_default();
            Some(EvidenceRecord::new(anchor.text, url, snippet))
        })
        .take(limit)
        .collect()
}

/// An element found in the markup
#[derive(Debug)]
struct Element {
    href: Option<String>,
    text: String,
}

/// Find every element whose `class` attribute contains `class_name`
fn elements_with_class(html: &str, class_name: &str) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = html[cursor..].find('<') {
        let start = cursor + offset;
        let Some(tag_len) = html[start..].find('>') else {
            break;
        };
        let tag = &html[start..=start + tag_len];
        cursor = start + tag_len + 1;

        if tag.starts_with("</") || tag.starts_with("<!") || !has_class(tag, class_name) {
            continue;
        }

        let close = format!("</{}", tag_name(tag));
        let inner_end = html[cursor..]
            .find(&close)
            .map(|i| cursor + i)
            .unwrap_or(html.len());

        elements.push(Element {
            href: attribute(tag, "href").map(|h| decode_entities(&h)),
            text: clean_text(&html[cursor..inner_end]),
        });
        cursor = inner_end;
    }

    elements
}

fn tag_name(tag: &str) -> &str {
    let body = tag.trim_start_matches('<');
    let end = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    &body[..end]
}

fn has_class(tag: &str, class_name: &str) -> bool {
    attribute(tag, "class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

/// Read an attribute value from an opening tag
fn attribute(tag: &str, name: &str) -> Option<String> {
    let mut rest = tag;

    while let Some(pos) = rest.find(name) {
        let preceded_by_space = rest[..pos]
            .chars()
            .last()
            .map(char::is_whitespace)
            .unwrap_or(false);
        let after = rest[pos + name.len()..].trim_start();

        if preceded_by_space {
            if let Some(value) = after.strip_prefix('=') {
                let value = value.trim_start();
                return match value.chars().next()? {
                    quote @ ('"' | '\'') => {
                        let inner = &value[1..];
                        let end = inner.find(quote)?;
                        Some(inner[..end].to_string())
                    }
                    _ => {
                        let end = value
                            .find(|c: char| c.is_whitespace() || c == '>')
                            .unwrap_or(value.len());
                        Some(value[..end].to_string())
                    }
                };
            }
        }

        rest = &rest[pos + name.len()..];
    }

    None
}

/// Turn a result href into the destination URL.
///
/// Redirect links (`//duckduckgo.com/l/?uddg=...`) are unwrapped; ad links
/// (`/y.js`) are dropped.
fn resolve_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    let Ok(parsed) = Url::parse(&absolute) else {
        return Some(absolute);
    };

    let on_ddg = parsed
        .host_str()
        .map(|h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"))
        .unwrap_or(false);
    if on_ddg {
        if parsed.path() == "/y.js" {
            return None;
        }
        if parsed.path().starts_with("/l/") {
            return parsed
                .query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned());
        }
    }

    Some(absolute)
}

/// Strip inner tags, decode entities and collapse whitespace
fn clean_text(fragment: &str) -> String {
    let mut stripped = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => stripped.push(c),
            _ => {}
        }
    }

    decode_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let numeric = entity.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
<div class="result results_links results_links_deep web-result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.reuters.com%2Ffact-check%2Fmoon&amp;rut=abc">Fact Check: <b>Moon landing</b> was real</a>
  </h2>
  <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">NASA&#x27;s Apollo 11 <b>landed</b> in 1969 &amp; returned samples.</a>
</div>
<div class="result results_links web-result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="https://example-news.test/story">Example story</a>
  </h2>
  <a class="result__snippet" href="https://example-news.test/story">Second   snippet</a>
</div>
"#;

    #[test]
    fn test_parse_results() {
        let records = parse_results(RESULTS_PAGE, 10);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].title, "Fact Check: Moon landing was real");
        assert_eq!(records[0].url, "https://www.reuters.com/fact-check/moon");
        assert_eq!(records[0].publisher, "Reuters");
        assert_eq!(
            records[0].snippet,
            "NASA's Apollo 11 landed in 1969 & returned samples."
        );

        assert_eq!(records[1].url, "https://example-news.test/story");
        assert_eq!(records[1].publisher, "Example-News");
        assert_eq!(records[1].snippet, "Second snippet");
    }

    #[test]
    fn test_parse_respects_limit() {
        assert_eq!(parse_results(RESULTS_PAGE, 1).len(), 1);
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(parse_results("<html><body>No results.</body></html>", 10).is_empty());
        assert!(parse_results("", 10).is_empty());
        assert!(parse_results("<a class=\"result__a\"", 10).is_empty());
    }

    #[test]
    fn test_missing_snippet_defaults_to_empty() {
        let html = r#"<a class="result__a" href="https://www.bbc.com/news/1">BBC story</a>"#;
        let records = parse_results(html, 10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].snippet, "");
        assert_eq!(records[0].publisher, "BBC");
    }

    #[test]
    fn test_ad_links_are_dropped() {
        assert_eq!(resolve_href("https://duckduckgo.com/y.js?ad_provider=x"), None);
        assert_eq!(
            resolve_href("https://apnews.com/article/1"),
            Some("https://apnews.com/article/1".to_string())
        );
    }

    #[test]
    fn test_attribute_lookup() {
        let tag = r#"<a data-class="nope" class='result__a extra' href=plain>"#;
        assert_eq!(attribute(tag, "class"), Some("result__a extra".to_string()));
        assert_eq!(attribute(tag, "href"), Some("plain".to_string()));
        assert_eq!(attribute(tag, "id"), None);
    }

    #[test]
    fn test_entity_decoding() {
        assert_eq!(decode_entities("a &amp; b &#39;c&#39; &unknown; &"), "a & b 'c' &unknown; &");
    }
}
