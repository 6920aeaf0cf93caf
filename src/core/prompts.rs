//! Prompts sent to the language model.

use crate::adapters::ChatMessage;

/// Role, labels and grounding rules
pub const SYSTEM_PROMPT: &str = "You are a fact-checking assistant that verifies news claims.

Decide whether the statement you are given is:
- REAL
- FAKE
- PARTIALLY TRUE
- UNVERIFIED

Base every conclusion strictly on the search results you are given.
Do not assume facts and do not invent sources.

RULES:
- Never fabricate links
- Never fabricate facts
- If the reliable evidence is insufficient, the verdict MUST be \"UNVERIFIED\"
- The confidence score must be between 0.00 and 1.00
- Stay neutral, without opinions or emotional language
";

const RESPONSE_FORMAT: &str = r#"{
  "verdict": "REAL | FAKE | PARTIALLY TRUE | UNVERIFIED",
  "confidence_score": 0.00,
  "summary": "One-paragraph explanation in simple language",
  "verified_facts": [
    "Fact 1",
    "Fact 2"
  ],
  "incorrect_or_misleading_parts": [
    "Misleading claim 1"
  ],
  "trusted_sources": [
    {
      "title": "Source title",
      "url": "https://example.com",
      "publisher": "Publisher name"
    }
  ]
}"#;

/// Build the user prompt embedding the claim and rendered evidence
pub fn verification_prompt(claim: &str, search_results: &str) -> String {
    format!(
        "Assess the claim below against the search results and decide whether it holds.

CLAIM TO VERIFY:
{claim}

SEARCH RESULTS:
{search_results}

Respond with ONLY a valid JSON object in exactly this format:
{RESPONSE_FORMAT}

IMPORTANT:
- Return EXACTLY 5 trusted sources taken from the search results
- Prefer reputable outlets (BBC, Reuters, AP News, government sites, fact-checkers)
- If there are not enough reliable sources, set the verdict to \"UNVERIFIED\"
- Only use URLs that appear in the search results
- Respond with the JSON only, no other text
"
    )
}

/// System and user messages for one verification call
pub fn verification_messages(claim: &str, search_results: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(verification_prompt(claim, search_results)),
    ]
}
