//! Core verification logic.
//!
//! This module contains:
//! - Planner: search queries derived from a claim
//! - Aggregator: merged, deduplicated, rendered evidence
//! - Synthesizer: model prompt, output repair and citation backfill
//! - Limits: per-call timeout and claim bounds
//! - Orchestrator: the four-stage verification driver

pub mod aggregator;
pub mod limits;
pub mod orchestrator;
pub mod planner;
pub mod prompts;
pub mod synthesizer;

// Re-export commonly used types
pub use aggregator::{aggregate, Aggregated};
pub use limits::{ClaimViolation, PipelineLimits};
pub use orchestrator::Verifier;
pub use planner::{plan, QueryPlan};
pub use synthesizer::{analyze, build_verdict, finalize, synthesize};
