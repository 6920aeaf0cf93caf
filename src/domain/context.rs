//! Workflow context threaded through the verification stages.
//!
//! The context is owned by a single run and passed to each stage by
//! exclusive reference. A stage only writes the fields it owns; fields set
//! by an earlier stage are read, never rewritten.

use serde::Serialize;

use super::events::StageEvent;
use super::evidence::EvidenceSet;
use super::verdict::Verdict;

/// What the analysis stage produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "text")]
pub enum Analysis {
    /// No usable evidence, the model was not called
    InsufficientEvidence,

    /// Raw text returned by the model
    ModelResponse(String),
}

/// Mutable state for one verification run
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowContext {
    /// The claim being verified
    pub claim: String,

    /// Claim plus verification keywords (PREPARE_SEARCH)
    pub search_query: String,

    /// The verbatim claim query (PREPARE_SEARCH)
    pub secondary_query: String,

    /// Evidence rendered for the model (WEB_SEARCH)
    pub search_results: String,

    /// Merged evidence (WEB_SEARCH)
    pub raw_results: EvidenceSet,

    /// Model output or short-circuit marker (ANALYZE_AND_VERIFY)
    pub analysis: Option<Analysis>,

    /// Set by the first stage that fails; later stages pass through
    pub error: Option<String>,

    /// Terminal verdict (FORMAT_RESPONSE)
    pub final_response: Option<Verdict>,

    /// One event per executed stage
    pub trace: Vec<StageEvent>,
}

impl WorkflowContext {
    /// Seed a context for a claim
    pub fn new(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            search_query: String::new(),
            secondary_query: String::new(),
            search_results: String::new(),
            raw_results: EvidenceSet::empty(),
            analysis: None,
            error: None,
            final_response: None,
            trace: Vec::new(),
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn record(&mut self, event: StageEvent) {
        self.trace.push(event);
    }
}
