//! Limits applied around a verification run.
//!
//! Bounds every outbound call with a timeout and rejects claims that are too
//! short or too long before any pipeline work starts.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Limits for a verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineLimits {
    /// Per outbound call timeout in seconds (default: 30)
    #[serde(default = "default_call_timeout")]
    pub call_timeout_seconds: u64,

    /// Minimum claim length in characters, after trimming (default: 5)
    #[serde(default = "default_min_claim_chars")]
    pub min_claim_chars: usize,

    /// Maximum claim length in characters (default: 5000)
    #[serde(default = "default_max_claim_chars")]
    pub max_claim_chars: usize,
}

fn default_call_timeout() -> u64 {
    30
}
fn default_min_claim_chars() -> usize {
    5
}
fn default_max_claim_chars() -> usize {
    5000
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            call_timeout_seconds: default_call_timeout(),
            min_claim_chars: default_min_claim_chars(),
            max_claim_chars: default_max_claim_chars(),
        }
    }
}

impl PipelineLimits {
    /// Timeout applied to each search or model call
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }

    /// Validate a claim at the request boundary
    pub fn validate_claim(&self, claim: &str) -> Result<(), ClaimViolation> {
        let trimmed = claim.trim();
        if trimmed.is_empty() {
            return Err(ClaimViolation::Empty);
        }

        let chars = trimmed.chars().count();
        if chars < self.min_claim_chars {
            return Err(ClaimViolation::TooShort {
                actual: chars,
                min: self.min_claim_chars,
            });
        }
        if chars > self.max_claim_chars {
            return Err(ClaimViolation::TooLong {
                actual: chars,
                max: self.max_claim_chars,
            });
        }

        Ok(())
    }
}

/// Claim validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimViolation {
    #[error("Claim is empty")]
    Empty,

    #[error("Claim is too short: {actual} < {min} characters")]
    TooShort { actual: usize, min: usize },

    #[error("Claim is too long: {actual} > {max} characters")]
    TooLong { actual: usize, max: usize },
}
