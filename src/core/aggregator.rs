//! Evidence aggregation.
//!
//! Runs both planned queries through an evidence source, merges the batches
//! with primary-query precedence, and renders the result for the model.

use std::time::Duration;

use tracing::{debug, info};

use super::planner::QueryPlan;
use crate::adapters::{EvidenceSource, SearchError};
use crate::domain::{EvidenceSet, MAX_EVIDENCE};

/// Result cap for the augmented query
pub const PRIMARY_QUERY_LIMIT: usize = 10;

/// Result cap for the verbatim query
pub const SECONDARY_QUERY_LIMIT: usize = 5;

/// Merged evidence plus its rendered text
#[derive(Debug, Clone)]
pub struct Aggregated {
    pub rendered: String,
    pub evidence: EvidenceSet,
}

/// Gather evidence for both queries.
///
/// The queries run concurrently. The primary batch is always merged first,
/// whichever request finishes first.
pub async fn aggregate(
    source: &dyn EvidenceSource,
    plan: &QueryPlan,
    call_timeout: Duration,
) -> Result<Aggregated, SearchError> {
    let (primary, secondary) = tokio::join!(
        source.search(&plan.primary, PRIMARY_QUERY_LIMIT, call_timeout),
        source.search(&plan.secondary, SECONDARY_QUERY_LIMIT, call_timeout),
    );
    let primary = primary?;
    let secondary = secondary?;

    debug!(
        primary = primary.len(),
        secondary = secondary.len(),
        "Search batches received"
    );

    let evidence = EvidenceSet::merge([primary, secondary], MAX_EVIDENCE);
    let preferred = evidence.iter().filter(|r| r.is_preferred()).count();
    info!(count = evidence.len(), preferred, "Evidence aggregated");

    Ok(Aggregated {
        rendered: evidence.render(),
        evidence,
    })
}
