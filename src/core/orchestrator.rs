//! Verification pipeline driver.
//!
//! Runs the four stages strictly in order over one [`WorkflowContext`]:
//! PREPARE_SEARCH, WEB_SEARCH, ANALYZE_AND_VERIFY, FORMAT_RESPONSE.
//! Stage failures are recorded as an error marker on the context and never
//! propagate; every run ends with a verdict.

use std::time::Instant;

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::aggregator::aggregate;
use super::limits::PipelineLimits;
use super::planner::{plan, QueryPlan};
use super::synthesizer::{analyze, finalize};
use crate::adapters::{EvidenceSource, FallbackSearch, LanguageModel, OpenRouterModel};
use crate::config::ResolvedConfig;
use crate::domain::{
    Analysis, EvidenceSet, Stage, StageEvent, StageStatus, Verdict, WorkflowContext,
};

/// Claim verifier holding the evidence source and language model
pub struct Verifier {
    search: Box<dyn EvidenceSource>,
    model: Box<dyn LanguageModel>,
    limits: PipelineLimits,
    clock: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl Verifier {
    pub fn new(
        search: Box<dyn EvidenceSource>,
        model: Box<dyn LanguageModel>,
        limits: PipelineLimits,
    ) -> Self {
        Self {
            search,
            model,
            limits,
            clock: local_today,
        }
    }

    /// Build the production verifier from resolved configuration
    pub fn from_config(config: &ResolvedConfig) -> Self {
        let search = FallbackSearch::from_settings(&config.search);
        if !search.has_primary() {
            info!("Search API credentials not set, using fallback search only");
        }
        if config.model.api_key.is_none() {
            warn!("OPENROUTER_API_KEY is not set, model calls will fail");
        }

        Self::new(
            Box::new(search),
            Box::new(OpenRouterModel::from_settings(&config.model)),
            config.limits.clone(),
        )
    }

    /// Replace the date source used to stamp verdicts
    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    pub fn limits(&self) -> &PipelineLimits {
        &self.limits
    }

    /// Verify a claim and return the verdict
    pub async fn verify(&self, claim: &str) -> Verdict {
        let ctx = self.run(claim).await;
        match ctx.final_response {
            Some(verdict) => verdict,
            None => Verdict::failed("no verdict was produced", (self.clock)()),
        }
    }

    /// Verify a claim and return the whole workflow context
    #[instrument(skip(self, claim), fields(run_id = %Uuid::new_v4(), claim_chars = claim.len()))]
    pub async fn run(&self, claim: &str) -> WorkflowContext {
        info!("Starting verification");
        let started = Instant::now();

        let mut ctx = WorkflowContext::new(claim);
        let mut stage = Stage::PrepareSearch;

        while !stage.is_terminal() {
            let stage_start = Instant::now();
            let status = self.execute_stage(stage, &mut ctx).await;
            let duration_ms = stage_start.elapsed().as_millis() as u64;

            debug!(%stage, ?status, duration_ms, "Stage finished");

            let mut event = StageEvent::new(stage, status).with_duration(duration_ms);
            if status == StageStatus::Failed {
                if let Some(marker) = &ctx.error {
                    event = event.with_error(marker.clone());
                }
            }
            ctx.record(event);

            stage = stage.next();
        }

        if let Some(verdict) = &ctx.final_response {
            info!(
                verdict = %verdict.verdict,
                confidence = verdict.confidence_score,
                sources = verdict.trusted_sources.len(),
                duration_ms = started.elapsed().as_millis() as u64,
                "Verification finished"
            );
        }

        ctx
    }

    async fn execute_stage(&self, stage: Stage, ctx: &mut WorkflowContext) -> StageStatus {
        match stage {
            Stage::PrepareSearch => self.prepare_search(ctx),
            Stage::WebSearch => self.web_search(ctx).await,
            Stage::AnalyzeAndVerify => self.analyze_and_verify(ctx).await,
            Stage::FormatResponse => self.format_response(ctx),
            Stage::Done => StageStatus::Completed,
        }
    }

    fn prepare_search(&self, ctx: &mut WorkflowContext) -> StageStatus {
        let queries = plan(&ctx.claim);
        ctx.search_query = queries.primary;
        ctx.secondary_query = queries.secondary;
        StageStatus::Completed
    }

    async fn web_search(&self, ctx: &mut WorkflowContext) -> StageStatus {
        let queries = QueryPlan {
            primary: ctx.search_query.clone(),
            secondary: ctx.secondary_query.clone(),
        };
        let result = aggregate(self.search.as_ref(), &queries, self.limits.call_timeout()).await;

        match result {
            Ok(aggregated) => {
                ctx.search_results = aggregated.rendered;
                ctx.raw_results = aggregated.evidence;
                StageStatus::Completed
            }
            Err(e) => {
                error!(backend = self.search.name(), error = %e, "Search failed");
                ctx.error = Some(format!("Search failed: {}", e));
                ctx.search_results = String::new();
                ctx.raw_results = EvidenceSet::empty();
                StageStatus::Failed
            }
        }
    }

    async fn analyze_and_verify(&self, ctx: &mut WorkflowContext) -> StageStatus {
        if ctx.has_error() {
            return StageStatus::Skipped;
        }

        let result = analyze(
            self.model.as_ref(),
            &ctx.claim,
            &ctx.search_results,
            self.limits.call_timeout(),
        )
        .await;

        match result {
            Ok(analysis) => {
                ctx.analysis = Some(analysis);
                StageStatus::Completed
            }
            Err(e) => {
                error!(model = self.model.name(), error = %e, "LLM analysis failed");
                ctx.error = Some(format!("LLM analysis failed: {}", e));
                StageStatus::Failed
            }
        }
    }

    fn format_response(&self, ctx: &mut WorkflowContext) -> StageStatus {
        let today = (self.clock)();

        let verdict = match (&ctx.error, &ctx.analysis) {
            (Some(marker), _) => Verdict::failed(marker, today),
            (None, Some(analysis)) => finalize(analysis, &ctx.raw_results, today),
            (None, None) => finalize(&Analysis::InsufficientEvidence, &ctx.raw_results, today),
        };

        ctx.final_response = Some(verdict);
        StageStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ChatMessage, ModelError, SearchError};
    use crate::domain::{EvidenceRecord, VerdictLabel};
    use async_trait::async_trait;
    use std::time::Duration;

    struct OneResult;

    #[async_trait]
    impl EvidenceSource for OneResult {
        fn name(&self) -> &str {
            "one"
        }

        async fn search(
            &self,
            _query: &str,
            _limit: usize,
            _timeout: Duration,
        ) -> Result<Vec<EvidenceRecord>, SearchError> {
            Ok(vec![EvidenceRecord::new(
                "Apollo 11",
                "https://www.bbc.com/news/apollo",
                "Humans walked on the moon in 1969.",
            )])
        }
    }

    struct Echo(&'static str);

    #[async_trait]
    impl LanguageModel for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _timeout: Duration,
        ) -> Result<String, ModelError> {
            Ok(self.0.to_string())
        }
    }

    fn fixed_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 20).unwrap()
    }

    #[tokio::test]
    async fn test_run_records_every_stage() {
        let verifier = Verifier::new(
            Box::new(OneResult),
            Box::new(Echo(r#"{"verdict": "REAL", "confidence_score": 0.9}"#)),
            PipelineLimits::default(),
        )
        .with_clock(fixed_day);

        let ctx = verifier.run("Humans landed on the moon").await;

        let stages: Vec<_> = ctx.trace.iter().map(|e| e.stage).collect();
        assert_eq!(
            stages,
            [
                Stage::PrepareSearch,
                Stage::WebSearch,
                Stage::AnalyzeAndVerify,
                Stage::FormatResponse
            ]
        );
        assert!(ctx.trace.iter().all(|e| e.status == StageStatus::Completed));
        assert_eq!(
            ctx.search_query,
            "Humans landed on the moon fact check verification"
        );
        assert_eq!(ctx.secondary_query, "Humans landed on the moon");

        let verdict = ctx.final_response.unwrap();
        assert_eq!(verdict.verdict, VerdictLabel::Real);
        assert_eq!(verdict.trusted_sources.len(), 1);
        assert_eq!(verdict.last_verified_date, fixed_day());
    }
}
