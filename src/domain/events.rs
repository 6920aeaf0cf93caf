//! Stage events recorded while a verification runs.
//!
//! Every stage transition appends one event to the workflow context, so the
//! full path a claim took through the pipeline can be inspected afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed stages of a verification run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    PrepareSearch,
    WebSearch,
    AnalyzeAndVerify,
    FormatResponse,
    Done,
}

impl Stage {
    /// The stage that follows this one. `Done` is terminal.
    pub fn next(self) -> Self {
        match self {
            Self::PrepareSearch => Self::WebSearch,
            Self::WebSearch => Self::AnalyzeAndVerify,
            Self::AnalyzeAndVerify => Self::FormatResponse,
            Self::FormatResponse | Self::Done => Self::Done,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrepareSearch => "prepare_search",
            Self::WebSearch => "web_search",
            Self::AnalyzeAndVerify => "analyze_and_verify",
            Self::FormatResponse => "format_response",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// The stage did its work
    Completed,

    /// An earlier error marker made the stage pass through
    Skipped,

    /// The stage recorded an error marker
    Failed,
}

/// A single entry in the stage trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    pub stage: Stage,

    pub status: StageStatus,

    /// When the stage finished
    pub timestamp: DateTime<Utc>,

    /// Time spent in the stage
    pub duration_ms: Option<u64>,

    /// Error marker text if the stage failed
    pub error: Option<String>,
}

impl StageEvent {
    pub fn new(stage: Stage, status: StageStatus) -> Self {
        Self {
            stage,
            status,
            timestamp: Utc::now(),
            duration_ms: None,
            error: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_linear() {
        let mut stage = Stage::PrepareSearch;
        let mut visited = vec![stage];
        while !stage.is_terminal() {
            stage = stage.next();
            visited.push(stage);
        }

        assert_eq!(
            visited,
            [
                Stage::PrepareSearch,
                Stage::WebSearch,
                Stage::AnalyzeAndVerify,
                Stage::FormatResponse,
                Stage::Done,
            ]
        );
        assert_eq!(Stage::Done.next(), Stage::Done);
    }

    #[test]
    fn test_event_serialization() {
        let event = StageEvent::new(Stage::WebSearch, StageStatus::Failed)
            .with_duration(12)
            .with_error("Search failed: boom".to_string());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["stage"], "WEB_SEARCH");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["duration_ms"], 12);
    }
}
