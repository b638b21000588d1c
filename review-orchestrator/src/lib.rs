//! Review Orchestrator (C8): drives the 9-phase health review pipeline and
//! persists its results. Two modes, both sharing the persistence path
//! (base spec §4.8): real mode runs fact extraction → rule engine →
//! verification → LLM enrichment → scoring; demo mode
//! (`USE_MOCK_LLM_ANALYZER`) short-circuits straight to a deterministic
//! mock analyzer plus the mock SLI generator.

mod config;
mod enrichment;
mod error;
mod mock_analyzer;
mod persist;
mod ports;
mod request;

use std::sync::Arc;

use chrono::Utc;
use domain::{DetectedProblem, ParsedFile, ReviewSchedule, ReviewStatus, Service, ServiceReview};
use llm_budget::{Budget, BudgetConfig};
use llm_port::LlmPort;
use observability_collector::Collector;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub use config::{OrchestratorConfig, MAX_FACT_EXTRACTION_FILES};
pub use error::ReviewError;
pub use ports::{
    CodebaseSyncPort, CodebaseSyncResult, ObservabilityContextResolver, ReviewStore, ScheduleStore, ServiceStore,
};
pub use request::{ReviewGenerationRequest, ReviewGenerationResult};

pub struct ReviewOrchestrator {
    llm: Arc<dyn LlmPort>,
    collector: Arc<Collector>,
    context_resolver: Arc<dyn ObservabilityContextResolver>,
    service_store: Arc<dyn ServiceStore>,
    review_store: Arc<dyn ReviewStore>,
    schedule_store: Arc<dyn ScheduleStore>,
    codebase_sync: Arc<dyn CodebaseSyncPort>,
    context_store: Arc<dyn codebase_context_store::CodebaseContextStore>,
    config: OrchestratorConfig,
}

impl ReviewOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        llm: Arc<dyn LlmPort>,
        collector: Arc<Collector>,
        context_resolver: Arc<dyn ObservabilityContextResolver>,
        service_store: Arc<dyn ServiceStore>,
        review_store: Arc<dyn ReviewStore>,
        schedule_store: Arc<dyn ScheduleStore>,
        codebase_sync: Arc<dyn CodebaseSyncPort>,
        context_store: Arc<dyn codebase_context_store::CodebaseContextStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            llm,
            collector,
            context_resolver,
            service_store,
            review_store,
            schedule_store,
            codebase_sync,
            context_store,
            config,
        }
    }

    pub async fn generate(
        &self,
        request: ReviewGenerationRequest,
        cancellation: CancellationToken,
    ) -> Result<ReviewGenerationResult, ReviewError> {
        let start = Utc::now();

        let mut review = self
            .review_store
            .load(request.review_id)
            .await?
            .ok_or(ReviewError::ReviewNotFound(request.review_id))?;
        let service = self
            .service_store
            .load(request.service_id)
            .await?
            .ok_or(ReviewError::ServiceNotFound(request.service_id))?;
        let previous_review = self
            .review_store
            .load_previous_completed(request.service_id, request.review_id)
            .await?;

        review.status = ReviewStatus::Generating;
        self.review_store.persist(&review).await?;

        tracing::info!(review_id = %request.review_id, "Phase 1 complete: review marked generating");

        match self.run_pipeline(&request, &service, previous_review.as_ref(), &cancellation).await {
            Ok(mut filled) => {
                let duration = (Utc::now() - start).num_seconds().max(0) as u64;
                filled.status = ReviewStatus::Completed;
                filled.generation_duration_seconds = Some(duration);
                self.review_store.persist(&filled).await?;
                self.update_schedule_success(request.service_id, &filled).await?;

                tracing::info!(review_id = %request.review_id, duration, "review completed");
                Ok(ReviewGenerationResult {
                    success: true,
                    review_id: request.review_id,
                    generation_duration_seconds: Some(duration),
                    error_message: None,
                })
            }
            Err(err) => {
                tracing::warn!(review_id = %request.review_id, error = %err, "review generation failed");

                review.status = ReviewStatus::Failed;
                review.error_message = Some(err.to_string());
                self.review_store.persist(&review).await?;
                self.update_schedule_failure(request.service_id, request.review_id).await?;

                Ok(ReviewGenerationResult {
                    success: false,
                    review_id: request.review_id,
                    generation_duration_seconds: None,
                    error_message: Some(err.to_string()),
                })
            }
        }
    }

    async fn run_pipeline(
        &self,
        request: &ReviewGenerationRequest,
        service: &Service,
        previous_review: Option<&ServiceReview>,
        cancellation: &CancellationToken,
    ) -> Result<ServiceReview, ReviewError> {
        let repo = service.repository.as_ref().ok_or(ReviewError::NoParsedRepository)?;
        let repo_full_name = repo.full_name();

        if cancellation.is_cancelled() {
            return Err(ReviewError::Cancelled);
        }

        let sync = self.codebase_sync.ensure_synced(request.workspace_id, &repo_full_name).await?;
        tracing::info!(repo_full_name = %repo_full_name, changed = sync.codebase_changed, "Phase 1: codebase synced");

        let exec_context = self.context_resolver.resolve(request.workspace_id, service).await;
        let collected_data = self
            .collector
            .collect(request.workspace_id, &service.name, request.week_start, request.week_end, &exec_context)
            .await;
        tracing::info!(
            service = %service.name,
            logs = collected_data.log_count,
            errors = collected_data.errors.len(),
            "Phase 2 complete: data gathering"
        );

        if cancellation.is_cancelled() {
            return Err(ReviewError::Cancelled);
        }

        let budget = Arc::new(Budget::new(BudgetConfig::from_env()));
        let previous_slis: &[domain::ReviewSli] = previous_review.map(|r| r.slis.as_slice()).unwrap_or(&[]);

        let (logging_gaps, metrics_gaps, health_scores, slis, summary, recommendations) = if self
            .config
            .use_mock_llm_analyzer
        {
            self.run_mock_pipeline(request, service, &collected_data, previous_slis)
        } else {
            self.run_real_pipeline(request, service, &repo_full_name, &sync, &collected_data, previous_slis, &budget)
                .await?
        };

        let errors = collected_data.errors.iter().map(|e| persist::error_record(request.review_id, e)).collect();

        Ok(ServiceReview {
            id: request.review_id,
            service_id: request.service_id,
            workspace_id: request.workspace_id,
            week_start: request.week_start,
            week_end: request.week_end,
            analyzed_commit_sha: Some(sync.parsed_repository.commit_sha.clone()),
            codebase_changed: sync.codebase_changed,
            status: ReviewStatus::Generating,
            overall_health_score: Some(health_scores.overall),
            summary: Some(summary),
            recommendations: Some(recommendations),
            generation_duration_seconds: None,
            error_count_analyzed: collected_data.errors.len() as u64,
            log_volume_analyzed: collected_data.log_count as u64,
            metric_count_analyzed: collected_data.metric_count as u64,
            error_message: None,
            logging_gaps,
            metrics_gaps,
            slis,
            errors,
        })
    }

    fn run_mock_pipeline(
        &self,
        request: &ReviewGenerationRequest,
        service: &Service,
        collected_data: &observability_collector::CollectedData,
        previous_slis: &[domain::ReviewSli],
    ) -> (
        Vec<domain::ReviewLoggingGap>,
        Vec<domain::ReviewMetricsGap>,
        health_scorer::HealthScores,
        Vec<domain::ReviewSli>,
        String,
        String,
    ) {
        tracing::info!(service = %service.name, "running mock pipeline (USE_MOCK_LLM_ANALYZER)");
        let analysis = mock_analyzer::analyze(&service.name, collected_data);
        let gaps_count = analysis.logging_gaps.len() + analysis.metrics_gaps.len();

        let health_scores = health_scorer::calculate_health_scores(&collected_data.metrics, gaps_count);
        let slis = health_scorer::generate_mock_slis(request.review_id, &service.name, previous_slis);

        let logging_gaps =
            analysis.logging_gaps.iter().map(|g| persist::mock_logging_gap(request.review_id, g)).collect();
        let metrics_gaps =
            analysis.metrics_gaps.iter().map(|g| persist::mock_metrics_gap(request.review_id, g)).collect();

        (logging_gaps, metrics_gaps, health_scores, slis, analysis.summary, analysis.recommendations)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_real_pipeline(
        &self,
        request: &ReviewGenerationRequest,
        service: &Service,
        repo_full_name: &str,
        sync: &CodebaseSyncResult,
        collected_data: &observability_collector::CollectedData,
        previous_slis: &[domain::ReviewSli],
        budget: &Arc<Budget>,
    ) -> Result<
        (
            Vec<domain::ReviewLoggingGap>,
            Vec<domain::ReviewMetricsGap>,
            health_scorer::HealthScores,
            Vec<domain::ReviewSli>,
            String,
            String,
        ),
        ReviewError,
    > {
        tracing::info!(service = %service.name, "running real pipeline");

        let files: Vec<ParsedFile> = sync
            .parsed_repository
            .files
            .iter()
            .filter(|f| !f.content.is_empty())
            .take(config::MAX_FACT_EXTRACTION_FILES)
            .cloned()
            .collect();
        tracing::info!(files = files.len(), "Phase 3 complete: fact extraction");

        let rule_result = rule_engine::evaluate(&files);
        tracing::info!(
            logging_gaps = rule_result.logging_gaps.len(),
            metrics_gaps = rule_result.metrics_gaps.len(),
            "Phase 4 complete: rule engine"
        );

        let verification = verification_agent::verify(
            Arc::clone(&self.llm),
            Arc::clone(budget),
            self.context_store.as_ref(),
            request.workspace_id,
            repo_full_name,
            &sync.parsed_repository.commit_sha,
            &sync.changed_files,
            &files,
            rule_result,
        )
        .await?;
        tracing::info!(
            used_fast_path = verification.used_fast_path,
            "Phase 5 complete: previous context lookup + verification routing"
        );

        let surviving: Vec<DetectedProblem> =
            verification.all_gaps().map(|g| g.problem.clone()).collect();
        let enrichment_result = enrichment::enrich(self.llm.as_ref(), budget, &service.name, &surviving).await?;
        tracing::info!(gaps = surviving.len(), "Phase 6 complete: enrichment");

        let gaps_count = verification.logging_gaps.len() + verification.metrics_gaps.len();
        let health_scores = health_scorer::calculate_health_scores(&collected_data.metrics, gaps_count);
        let slis = health_scorer::calculate_slis(
            request.review_id,
            &collected_data.metrics,
            &health_scorer::previous_scores(previous_slis),
        );
        tracing::info!(overall = health_scores.overall, "Phase 7 complete: scoring");

        let mut enrichment_cursor = 0usize;
        let logging_gaps = verification
            .logging_gaps
            .iter()
            .map(|g| {
                let fingerprint = rule_engine::fingerprint(&g.problem);
                let e = enrichment_result.per_gap.get(enrichment_cursor);
                enrichment_cursor += 1;
                persist::logging_gap_from_problem(
                    request.review_id,
                    &g.problem.title,
                    &g.problem.category,
                    g.problem.severity,
                    g.problem.affected_files.clone(),
                    g.problem.affected_functions.clone(),
                    g.problem.evidence.clone(),
                    fingerprint,
                    g.verdict,
                    e,
                )
            })
            .collect();

        let metrics_gaps = verification
            .metrics_gaps
            .iter()
            .map(|g| {
                let fingerprint = rule_engine::fingerprint(&g.problem);
                let e = enrichment_result.per_gap.get(enrichment_cursor);
                enrichment_cursor += 1;
                persist::metrics_gap_from_problem(
                    request.review_id,
                    &g.problem.title,
                    &g.problem.category,
                    g.problem.severity,
                    g.problem.affected_files.clone(),
                    g.problem.affected_functions.clone(),
                    g.problem.evidence.clone(),
                    g.problem.metric_type,
                    g.problem.suggested_metric_names.clone(),
                    fingerprint,
                    g.verdict,
                    e,
                )
            })
            .collect();

        Ok((
            logging_gaps,
            metrics_gaps,
            health_scores,
            slis,
            enrichment_result.summary,
            enrichment_result.recommendations,
        ))
    }

    async fn update_schedule_success(&self, service_id: Uuid, review: &ServiceReview) -> Result<(), ReviewError> {
        let mut schedule = self.schedule_store.load(service_id).await?.unwrap_or(ReviewSchedule {
            service_id,
            next_due: Utc::now(),
            last_review_id: None,
            last_status: None,
            consecutive_failures: 0,
        });
        schedule.record_success(review.id, Utc::now());
        self.schedule_store.save(&schedule).await
    }

    async fn update_schedule_failure(&self, service_id: Uuid, review_id: Uuid) -> Result<(), ReviewError> {
        let mut schedule = self.schedule_store.load(service_id).await?.unwrap_or(ReviewSchedule {
            service_id,
            next_due: Utc::now(),
            last_review_id: None,
            last_status: None,
            consecutive_failures: 0,
        });
        schedule.record_failure(review_id);
        self.schedule_store.save(&schedule).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use domain::{CodebaseContext, ParsedRepository, RepoStatus, RepositoryReference};
    use llm_port::{LlmCompletion, LlmPortError};
    use observability_collector::ProviderSet;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeServiceStore(HashMap<Uuid, Service>);

    #[async_trait]
    impl ServiceStore for FakeServiceStore {
        async fn load(&self, service_id: Uuid) -> Result<Option<Service>, ReviewError> {
            Ok(self.0.get(&service_id).cloned())
        }
    }

    #[derive(Default)]
    struct FakeReviewStore {
        rows: Mutex<HashMap<Uuid, ServiceReview>>,
    }

    #[async_trait]
    impl ReviewStore for FakeReviewStore {
        async fn load(&self, review_id: Uuid) -> Result<Option<ServiceReview>, ReviewError> {
            Ok(self.rows.lock().unwrap().get(&review_id).cloned())
        }

        async fn load_previous_completed(
            &self,
            _service_id: Uuid,
            _excluding_review_id: Uuid,
        ) -> Result<Option<ServiceReview>, ReviewError> {
            Ok(None)
        }

        async fn persist(&self, review: &ServiceReview) -> Result<(), ReviewError> {
            self.rows.lock().unwrap().insert(review.id, review.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeScheduleStore {
        rows: Mutex<HashMap<Uuid, ReviewSchedule>>,
    }

    #[async_trait]
    impl ScheduleStore for FakeScheduleStore {
        async fn load(&self, service_id: Uuid) -> Result<Option<ReviewSchedule>, ReviewError> {
            Ok(self.rows.lock().unwrap().get(&service_id).cloned())
        }

        async fn save(&self, schedule: &ReviewSchedule) -> Result<(), ReviewError> {
            self.rows.lock().unwrap().insert(schedule.service_id, schedule.clone());
            Ok(())
        }
    }

    struct FakeCodebaseSync {
        files: Vec<ParsedFile>,
        changed_files: Vec<String>,
    }

    #[async_trait]
    impl CodebaseSyncPort for FakeCodebaseSync {
        async fn ensure_synced(
            &self,
            workspace_id: Uuid,
            repo_full_name: &str,
        ) -> Result<CodebaseSyncResult, ReviewError> {
            Ok(CodebaseSyncResult {
                parsed_repository: ParsedRepository {
                    workspace_id,
                    repo_full_name: repo_full_name.to_string(),
                    commit_sha: "deadbeef".to_string(),
                    status: RepoStatus::Completed,
                    files: self.files.clone(),
                },
                changed_files: self.changed_files.clone(),
                codebase_changed: !self.changed_files.is_empty(),
            })
        }
    }

    struct FakeContextResolver;

    #[async_trait]
    impl ObservabilityContextResolver for FakeContextResolver {
        async fn resolve(&self, _workspace_id: Uuid, _service: &Service) -> observability_collector::ExecutionContext {
            observability_collector::ExecutionContext::new(std::iter::empty())
        }
    }

    #[derive(Default)]
    struct FakeContextStore {
        rows: Mutex<Vec<CodebaseContext>>,
    }

    #[async_trait]
    impl codebase_context_store::CodebaseContextStore for FakeContextStore {
        async fn load_most_recent(
            &self,
            workspace_id: Uuid,
            repo_full_name: &str,
        ) -> Result<Option<CodebaseContext>, codebase_context_store::CodebaseContextStoreError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.workspace_id == workspace_id && c.repo_full_name == repo_full_name)
                .max_by_key(|c| c.created_at)
                .cloned())
        }

        async fn save(&self, context: &CodebaseContext) -> Result<(), codebase_context_store::CodebaseContextStoreError> {
            self.rows.lock().unwrap().push(context.clone());
            Ok(())
        }
    }

    /// Never invoked in these tests — panics loudly if a scenario
    /// unexpectedly reaches an LLM call, which would mean the "zero gaps"
    /// short-circuit assumptions below no longer hold.
    struct UnusedLlm;

    #[async_trait]
    impl LlmPort for UnusedLlm {
        async fn invoke(&self, _: llm_port::Profile, _: &str, _: &str) -> Result<LlmCompletion, LlmPortError> {
            panic!("FakeLlm should not be invoked in this scenario");
        }
    }

    fn service(service_id: Uuid, workspace_id: Uuid, with_repo: bool) -> Service {
        Service {
            id: service_id,
            workspace_id,
            name: "billing".to_string(),
            repository: with_repo.then(|| RepositoryReference { owner: "acme".to_string(), name: "billing".to_string() }),
            metrics_provider_tag: None,
        }
    }

    fn pending_review(review_id: Uuid, service_id: Uuid, workspace_id: Uuid) -> ServiceReview {
        let now = Utc::now();
        ServiceReview {
            id: review_id,
            service_id,
            workspace_id,
            week_start: now - chrono::Duration::days(7),
            week_end: now,
            analyzed_commit_sha: None,
            codebase_changed: false,
            status: ReviewStatus::Pending,
            overall_health_score: None,
            summary: None,
            recommendations: None,
            generation_duration_seconds: None,
            error_count_analyzed: 0,
            log_volume_analyzed: 0,
            metric_count_analyzed: 0,
            error_message: None,
            logging_gaps: Vec::new(),
            metrics_gaps: Vec::new(),
            slis: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn orchestrator(
        use_mock: bool,
        files: Vec<ParsedFile>,
        service_id: Uuid,
        workspace_id: Uuid,
    ) -> (ReviewOrchestrator, Arc<FakeReviewStore>) {
        let review_store = Arc::new(FakeReviewStore::default());
        let orchestrator = ReviewOrchestrator::new(
            Arc::new(UnusedLlm),
            Arc::new(Collector::new(ProviderSet::default())),
            Arc::new(FakeContextResolver),
            Arc::new(FakeServiceStore(HashMap::from([(service_id, service(service_id, workspace_id, true))]))),
            Arc::clone(&review_store) as Arc<dyn ReviewStore>,
            Arc::new(FakeScheduleStore::default()),
            Arc::new(FakeCodebaseSync { files, changed_files: Vec::new() }),
            Arc::new(FakeContextStore::default()),
            OrchestratorConfig { use_mock_llm_analyzer: use_mock },
        );
        (orchestrator, review_store)
    }

    #[tokio::test]
    async fn mock_pipeline_completes_and_persists_a_full_review() {
        let service_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();
        let review_id = Uuid::new_v4();
        let (orchestrator, review_store) = orchestrator(true, Vec::new(), service_id, workspace_id);
        review_store.rows.lock().unwrap().insert(review_id, pending_review(review_id, service_id, workspace_id));

        let now = Utc::now();
        let request = ReviewGenerationRequest {
            review_id,
            service_id,
            workspace_id,
            week_start: now - chrono::Duration::days(7),
            week_end: now,
        };

        let result = orchestrator.generate(request, CancellationToken::new()).await.unwrap();
        assert!(result.success);

        let persisted = review_store.rows.lock().unwrap().get(&review_id).unwrap().clone();
        assert_eq!(persisted.status, ReviewStatus::Completed);
        assert_eq!(persisted.slis.len(), 6);
        assert!(persisted.overall_health_score.is_some());
    }

    #[tokio::test]
    async fn real_pipeline_with_no_files_produces_zero_gaps_without_an_llm_call() {
        let service_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();
        let review_id = Uuid::new_v4();
        let (orchestrator, review_store) = orchestrator(false, Vec::new(), service_id, workspace_id);
        review_store.rows.lock().unwrap().insert(review_id, pending_review(review_id, service_id, workspace_id));

        let now = Utc::now();
        let request = ReviewGenerationRequest {
            review_id,
            service_id,
            workspace_id,
            week_start: now - chrono::Duration::days(7),
            week_end: now,
        };

        let result = orchestrator.generate(request, CancellationToken::new()).await.unwrap();
        assert!(result.success, "{:?}", result.error_message);

        let persisted = review_store.rows.lock().unwrap().get(&review_id).unwrap().clone();
        assert_eq!(persisted.status, ReviewStatus::Completed);
        assert!(persisted.logging_gaps.is_empty());
        assert!(persisted.metrics_gaps.is_empty());
        assert_eq!(persisted.slis.len(), 4);
    }

    #[tokio::test]
    async fn missing_repository_fails_the_review_without_panicking() {
        let service_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();
        let review_id = Uuid::new_v4();

        let review_store = Arc::new(FakeReviewStore::default());
        review_store.rows.lock().unwrap().insert(review_id, pending_review(review_id, service_id, workspace_id));

        let orchestrator = ReviewOrchestrator::new(
            Arc::new(UnusedLlm),
            Arc::new(Collector::new(ProviderSet::default())),
            Arc::new(FakeContextResolver),
            Arc::new(FakeServiceStore(HashMap::from([(service_id, service(service_id, workspace_id, false))]))),
            Arc::clone(&review_store) as Arc<dyn ReviewStore>,
            Arc::new(FakeScheduleStore::default()),
            Arc::new(FakeCodebaseSync { files: Vec::new(), changed_files: Vec::new() }),
            Arc::new(FakeContextStore::default()),
            OrchestratorConfig { use_mock_llm_analyzer: false },
        );

        let now = Utc::now();
        let request = ReviewGenerationRequest {
            review_id,
            service_id,
            workspace_id,
            week_start: now - chrono::Duration::days(7),
            week_end: now,
        };

        let result = orchestrator.generate(request, CancellationToken::new()).await.unwrap();
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("no_parsed_repository"));

        let persisted = review_store.rows.lock().unwrap().get(&review_id).unwrap().clone();
        assert_eq!(persisted.status, ReviewStatus::Failed);
    }

    #[tokio::test]
    async fn cancellation_before_sync_fails_the_review_as_cancelled() {
        let service_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();
        let review_id = Uuid::new_v4();
        let (orchestrator, review_store) = orchestrator(false, Vec::new(), service_id, workspace_id);
        review_store.rows.lock().unwrap().insert(review_id, pending_review(review_id, service_id, workspace_id));

        let token = CancellationToken::new();
        token.cancel();

        let now = Utc::now();
        let request = ReviewGenerationRequest {
            review_id,
            service_id,
            workspace_id,
            week_start: now - chrono::Duration::days(7),
            week_end: now,
        };

        let result = orchestrator.generate(request, token).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("review generation cancelled"));
    }
}
