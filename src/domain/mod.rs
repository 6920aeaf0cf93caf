//! Domain types for the verification pipeline.
//!
//! This module contains the core data structures:
//! - Evidence: search results and the merged evidence set
//! - Publisher: URL to outlet attribution
//! - Verdict: the canonical verification outcome
//! - Context/Events: per-run workflow state and stage trace

pub mod context;
pub mod events;
pub mod evidence;
pub mod publisher;
pub mod verdict;

// Re-export commonly used types
pub use context::{Analysis, WorkflowContext};
pub use events::{Stage, StageEvent, StageStatus};
pub use evidence::{EvidenceRecord, EvidenceSet, MAX_EVIDENCE, NO_RESULTS};
pub use publisher::{is_preferred_domain, publisher_for_url, UNKNOWN_PUBLISHER};
pub use verdict::{clamp_confidence, TrustedSource, Verdict, VerdictLabel, MAX_TRUSTED_SOURCES};
