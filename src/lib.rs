//! factcheck - Evidence-grounded claim verification
//!
//! Verifies a natural-language claim by searching the web for evidence and
//! asking a language model for a verdict grounded in that evidence.
//!
//! # Architecture
//!
//! A fixed four-stage pipeline runs over one workflow context per claim:
//! - PREPARE_SEARCH derives an augmented and a verbatim query
//! - WEB_SEARCH gathers, deduplicates and renders up to 10 evidence records
//! - ANALYZE_AND_VERIFY makes one model call (skipped without evidence)
//! - FORMAT_RESPONSE repairs the model output into a [`Verdict`]
//!
//! Stage failures become an error marker on the context; every run ends
//! with a well-formed verdict.
//!
//! # Modules
//!
//! - `adapters`: Search backends (Google CSE, DuckDuckGo HTML) and the LLM client
//! - `core`: Planner, aggregator, synthesizer and the pipeline driver
//! - `domain`: Data structures (EvidenceRecord, Verdict, WorkflowContext)
//! - `config`: Environment and YAML configuration
//! - `server`: HTTP API
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Verify a claim
//! factcheck verify "The moon landing was faked"
//!
//! # Inspect the evidence for a query
//! factcheck search "moon landing fact check" --limit 5
//!
//! # Serve the HTTP API
//! factcheck serve --address 127.0.0.1:8000
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;

// Re-export main types at crate root for convenience
pub use adapters::{EvidenceSource, LanguageModel, ModelError, SearchError};
pub use crate::core::{PipelineLimits, Verifier};
pub use domain::{EvidenceRecord, EvidenceSet, Verdict, VerdictLabel, WorkflowContext};
