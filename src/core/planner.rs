//! Search query planning.

/// Keywords appended to the claim to bias results toward fact-checking outlets
pub const VERIFICATION_KEYWORDS: &str = "fact check verification";

/// The two queries issued for a claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Claim plus verification keywords, takes precedence on duplicates
    pub primary: String,
    /// The claim verbatim
    pub secondary: String,
}

/// Derive the search queries for a claim
pub fn plan(claim: &str) -> QueryPlan {
    QueryPlan {
        primary: format!("{} {}", claim, VERIFICATION_KEYWORDS),
        secondary: claim.to_string(),
    }
}
