// src/generation/mod.rs
//! Resume generation orchestrator.
//!
//! A design request is persisted as a `processing` version and answered
//! immediately; the stage pipeline runs on a spawned task:
//!
//!   processing  -> gather profile data and keywords
//!   optimizing  -> tailor content through the content service
//!   finalizing  -> render LaTeX, compile, store the PDF
//!
//! Each transition is pushed to subscribers; any stage failure moves the
//! version to `failed` with the stage named in the error detail. Once a
//! version is complete its LaTeX can be edited and recompiled without
//! re-running the pipeline.

pub mod keywords;
pub mod latex;

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::clients::compiler::{CompileError, LatexCompiler};
use crate::clients::content::{ContentProvider, OptimizeRequest};
use crate::clients::profile::ProfileSource;
use crate::environment::TimeoutConfig;
use crate::error::PipelineError;
use crate::events::{StatusEvent, StatusHub, KIND_RESUME_VERSION};
use crate::models::{GenerationStatus, PersonalInfo, PostingStatus, ResumeVersion};
use crate::repository::{PostingRepository, VersionRepository};
use crate::storage::ArtifactStore;

use keywords::KeywordAnalyzer;

/// An accepted design request, after HTTP-level deserialization.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub user_id: String,
    pub personal_info: PersonalInfo,
    /// Either a fetched posting to pull job data from, or the job fields
    /// spelled out inline.
    pub job_posting_id: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub job_description: Option<String>,
    pub linked_application_id: Option<String>,
    /// Caller-supplied keyword override; absent means local analysis.
    pub keywords: Option<Vec<String>>,
    /// Output language hint forwarded to the content service.
    pub locale: Option<String>,
}

#[derive(Debug, Clone)]
struct ResolvedJob {
    title: String,
    company: String,
    description: String,
}

#[derive(Clone)]
pub struct ResumeGenerator {
    pool: SqlitePool,
    hub: Arc<StatusHub>,
    content: Arc<dyn ContentProvider>,
    compiler: Arc<dyn LatexCompiler>,
    profiles: Arc<dyn ProfileSource>,
    store: ArtifactStore,
    timeouts: TimeoutConfig,
    analyzer: Arc<KeywordAnalyzer>,
}

impl ResumeGenerator {
    pub fn new(
        pool: SqlitePool,
        hub: Arc<StatusHub>,
        content: Arc<dyn ContentProvider>,
        compiler: Arc<dyn LatexCompiler>,
        profiles: Arc<dyn ProfileSource>,
        store: ArtifactStore,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            pool,
            hub,
            content,
            compiler,
            profiles,
            store,
            timeouts,
            analyzer: Arc::new(KeywordAnalyzer::default()),
        }
    }

    /// Accept a design request: persist the version in `processing` and
    /// spawn the stage pipeline. Returns the version immediately.
    pub async fn submit(&self, request: GenerationRequest) -> Result<ResumeVersion, PipelineError> {
        let job = self.resolve_job(&request).await?;

        let repo = VersionRepository::new(&self.pool);
        let version = repo
            .create(
                &request.personal_info,
                &job.title,
                &job.company,
                request.job_posting_id.as_deref(),
                request.linked_application_id.as_deref(),
            )
            .await?;

        let generator = self.clone();
        let version_id = version.id.clone();
        tokio::spawn(async move {
            if let Err(e) = generator.run_pipeline(&version_id, &request, &job).await {
                error!("Generation task for version {} errored: {}", version_id, e);
            }
        });

        Ok(version)
    }

    async fn resolve_job(&self, request: &GenerationRequest) -> Result<ResolvedJob, PipelineError> {
        if let Some(posting_id) = &request.job_posting_id {
            let posting = PostingRepository::new(&self.pool)
                .find_by_id(posting_id)
                .await?
                .ok_or_else(|| {
                    PipelineError::NotFound(format!("job posting {}", posting_id))
                })?;

            match posting.status {
                PostingStatus::Fetched => {}
                PostingStatus::Failed => {
                    return Err(PipelineError::ExtractionFailed(format!(
                        "job posting {} could not be extracted",
                        posting_id
                    )));
                }
                PostingStatus::Pending => {
                    return Err(PipelineError::InvalidState(format!(
                        "job posting {} is still pending extraction",
                        posting_id
                    )));
                }
            }

            return Ok(ResolvedJob {
                title: posting.title,
                company: posting.company,
                description: posting.description,
            });
        }

        match (&request.job_title, &request.company, &request.job_description) {
            (Some(title), Some(company), Some(description))
                if !title.is_empty() && !description.is_empty() =>
            {
                Ok(ResolvedJob {
                    title: title.clone(),
                    company: company.clone(),
                    description: description.clone(),
                })
            }
            _ => Err(PipelineError::Validation(
                "either job_posting_id or job_title, company and job_description are required"
                    .to_string(),
            )),
        }
    }

    async fn run_pipeline(
        &self,
        version_id: &str,
        request: &GenerationRequest,
        job: &ResolvedJob,
    ) -> Result<()> {
        let repo = VersionRepository::new(&self.pool);
        self.push_status(version_id, "processing", None);

        // Stage: processing. Profile data plus keywords for the optimizer.
        let profile = match self.profiles.fetch_profile(&request.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                return self
                    .fail_version(&repo, version_id, "processing", &e.to_string())
                    .await;
            }
        };

        let keyword_list: Vec<String> = match &request.keywords {
            Some(provided) => provided.clone(),
            None => self
                .analyzer
                .analyze(&job.description)
                .into_iter()
                .map(|entry| entry.keyword)
                .collect(),
        };

        if !repo
            .advance(
                version_id,
                GenerationStatus::Processing,
                GenerationStatus::Optimizing,
            )
            .await?
        {
            warn!("Version {} left processing concurrently; stopping", version_id);
            return Ok(());
        }
        self.push_status(version_id, "optimizing", None);

        // Stage: optimizing. Content service tailors the resume body.
        let optimize_request = OptimizeRequest {
            personal_info: &request.personal_info,
            profile: &profile,
            job_title: &job.title,
            company: &job.company,
            job_description: &job.description,
            keywords: &keyword_list,
            locale: request.locale.as_deref(),
        };
        let optimized = match timeout(
            self.timeouts.content_service,
            self.content.optimize(optimize_request),
        )
        .await
        {
            Ok(Ok(optimized)) => optimized,
            Ok(Err(e)) => {
                return self
                    .fail_version(&repo, version_id, "optimizing", &e.to_string())
                    .await;
            }
            Err(_) => {
                return self
                    .fail_version(
                        &repo,
                        version_id,
                        "optimizing",
                        &format!(
                            "content service timed out after {:?}",
                            self.timeouts.content_service
                        ),
                    )
                    .await;
            }
        };

        if !repo
            .advance(
                version_id,
                GenerationStatus::Optimizing,
                GenerationStatus::Finalizing,
            )
            .await?
        {
            warn!("Version {} left optimizing concurrently; stopping", version_id);
            return Ok(());
        }
        self.push_status(version_id, "finalizing", None);

        // Stage: finalizing. Render, compile, store, complete.
        let latex_source = latex::render_resume(&request.personal_info, &job.title, &optimized);

        let pdf_bytes = match timeout(
            self.timeouts.compiler_service,
            self.compiler.compile(&latex_source),
        )
        .await
        {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                return self
                    .fail_version(&repo, version_id, "finalizing", &e.to_string())
                    .await;
            }
            Err(_) => {
                return self
                    .fail_version(
                        &repo,
                        version_id,
                        "finalizing",
                        &format!(
                            "compiler service timed out after {:?}",
                            self.timeouts.compiler_service
                        ),
                    )
                    .await;
            }
        };

        let pdf_key = match self.store.put(&pdf_bytes).await {
            Ok(key) => key,
            Err(e) => {
                return self
                    .fail_version(&repo, version_id, "finalizing", &e.to_string())
                    .await;
            }
        };

        if repo.complete(version_id, &latex_source, &pdf_key).await? {
            info!("Resume version {} complete (pdf {})", version_id, pdf_key);
            self.hub.publish(
                KIND_RESUME_VERSION,
                StatusEvent::new(KIND_RESUME_VERSION, version_id, "complete", None)
                    .with_data(serde_json::json!({ "pdf_key": pdf_key })),
            );
        } else {
            // Lost the race to a concurrent terminal write; the stored
            // artifact is orphaned and reclaimed here.
            warn!("Version {} no longer finalizing; dropping artifact", version_id);
            self.store.remove(&pdf_key).await;
        }

        Ok(())
    }

    async fn fail_version(
        &self,
        repo: &VersionRepository<'_>,
        version_id: &str,
        stage: &str,
        cause: &str,
    ) -> Result<()> {
        let detail = PipelineError::StageFailed {
            stage: stage.to_string(),
            cause: cause.to_string(),
        }
        .to_string();

        warn!("Version {} failed: {}", version_id, detail);
        repo.fail(version_id, &detail).await?;
        self.push_status(version_id, "failed", Some(detail));
        Ok(())
    }

    fn push_status(&self, version_id: &str, status: &str, message: Option<String>) {
        self.hub.publish(
            KIND_RESUME_VERSION,
            StatusEvent::new(KIND_RESUME_VERSION, version_id, status, message),
        );
    }

    /// Serve the compiled PDF for a version. Not-yet-terminal versions
    /// surface as a transient condition the HTTP layer maps to 202.
    pub async fn fetch_pdf(&self, version_id: &str) -> Result<Vec<u8>, PipelineError> {
        let version = self.load_version(version_id).await?;

        match version.status {
            GenerationStatus::Complete => {
                let key = version.pdf_key.ok_or_else(|| {
                    PipelineError::Internal(anyhow::anyhow!(
                        "complete version {} has no artifact key",
                        version_id
                    ))
                })?;
                Ok(self.store.get(&key).await?)
            }
            GenerationStatus::Failed => Err(PipelineError::InvalidState(format!(
                "resume generation failed: {}",
                version.error_detail.unwrap_or_else(|| "unknown".to_string())
            ))),
            status => Err(PipelineError::StillInProgress(status.as_str().to_string())),
        }
    }

    /// Current LaTeX source of a complete version, for the edit loop.
    pub async fn latex_source(&self, version_id: &str) -> Result<String, PipelineError> {
        let version = self.load_version(version_id).await?;

        match version.status {
            GenerationStatus::Complete => version.latex_source.ok_or_else(|| {
                PipelineError::Internal(anyhow::anyhow!(
                    "complete version {} has no LaTeX source",
                    version_id
                ))
            }),
            GenerationStatus::Failed => Err(PipelineError::InvalidState(
                "resume generation failed; no source to edit".to_string(),
            )),
            status => Err(PipelineError::StillInProgress(status.as_str().to_string())),
        }
    }

    /// Edit loop: recompile user-edited LaTeX and swap the artifact. On a
    /// compile failure the stored source and PDF are left untouched, so a
    /// bad edit never destroys the last good artifact.
    pub async fn recompile(
        &self,
        version_id: &str,
        new_source: &str,
    ) -> Result<ResumeVersion, PipelineError> {
        let version = self.load_version(version_id).await?;

        if version.status != GenerationStatus::Complete {
            return Err(PipelineError::InvalidState(format!(
                "version {} is {}, only complete versions can be recompiled",
                version_id,
                version.status.as_str()
            )));
        }

        let pdf_bytes = match self.compiler.compile(new_source).await {
            Ok(bytes) => bytes,
            Err(CompileError::Diagnostics { message, log }) => {
                return Err(PipelineError::Compilation { message, log });
            }
            Err(CompileError::Service(e)) => return Err(PipelineError::Internal(e)),
        };

        let new_key = self.store.put(&pdf_bytes).await?;
        let repo = VersionRepository::new(&self.pool);

        if !repo.replace_artifact(version_id, new_source, &new_key).await? {
            self.store.remove(&new_key).await;
            return Err(PipelineError::InvalidState(format!(
                "version {} left complete during recompile",
                version_id
            )));
        }

        if let Some(old_key) = &version.pdf_key {
            self.store.remove(old_key).await;
        }

        info!("Recompiled version {} (pdf {})", version_id, new_key);
        self.load_version(version_id).await
    }

    async fn load_version(&self, version_id: &str) -> Result<ResumeVersion, PipelineError> {
        VersionRepository::new(&self.pool)
            .find_by_id(version_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("resume version {}", version_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::content::{ExtractedPosting, OptimizedContent, OptimizedExperience};
    use crate::clients::profile::ProfileData;
    use crate::database::test_pool;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct MockContent {
        fail_optimize: bool,
    }

    #[async_trait]
    impl ContentProvider for MockContent {
        async fn optimize(&self, request: OptimizeRequest<'_>) -> Result<OptimizedContent> {
            if self.fail_optimize {
                anyhow::bail!("content service unavailable")
            }
            Ok(OptimizedContent {
                summary: format!("Tailored for {}", request.job_title),
                experiences: vec![OptimizedExperience {
                    role: "Engineer".to_string(),
                    company: "Acme".to_string(),
                    period: "2020 - present".to_string(),
                    bullets: vec!["Shipped things".to_string()],
                }],
                highlighted_skills: vec!["Rust".to_string()],
            })
        }

        async fn extract_posting(&self, _text: &str, _url: &str) -> Result<ExtractedPosting> {
            anyhow::bail!("not used")
        }
    }

    struct MockCompiler {
        diagnostics: Option<(String, String)>,
    }

    #[async_trait]
    impl LatexCompiler for MockCompiler {
        async fn compile(&self, _source: &str) -> Result<Vec<u8>, CompileError> {
            match &self.diagnostics {
                Some((message, log)) => Err(CompileError::Diagnostics {
                    message: message.clone(),
                    log: log.clone(),
                }),
                None => Ok(b"%PDF-1.5 mock".to_vec()),
            }
        }
    }

    struct MockProfiles;

    #[async_trait]
    impl ProfileSource for MockProfiles {
        async fn fetch_profile(&self, _user_id: &str) -> Result<ProfileData> {
            Ok(ProfileData {
                skills: vec!["Rust".to_string(), "SQL".to_string()],
                ..ProfileData::default()
            })
        }
    }

    fn personal_info() -> PersonalInfo {
        PersonalInfo {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            location: None,
            links: vec![],
        }
    }

    fn inline_request() -> GenerationRequest {
        GenerationRequest {
            user_id: "user-1".to_string(),
            personal_info: personal_info(),
            job_posting_id: None,
            job_title: Some("Platform Engineer".to_string()),
            company: Some("Acme".to_string()),
            job_description: Some("Rust services on Kubernetes with PostgreSQL".to_string()),
            linked_application_id: None,
            keywords: None,
            locale: None,
        }
    }

    async fn generator(
        pool: &SqlitePool,
        fail_optimize: bool,
        diagnostics: Option<(String, String)>,
    ) -> (ResumeGenerator, Arc<StatusHub>) {
        let hub = Arc::new(StatusHub::new());
        let store = ArtifactStore::new(
            std::env::temp_dir().join(format!("resume-artifacts-{}", Uuid::new_v4())),
        );
        let generator = ResumeGenerator::new(
            pool.clone(),
            hub.clone(),
            Arc::new(MockContent { fail_optimize }),
            Arc::new(MockCompiler { diagnostics }),
            Arc::new(MockProfiles),
            store,
            TimeoutConfig::default(),
        );
        (generator, hub)
    }

    async fn drive(generator: &ResumeGenerator, request: &GenerationRequest) -> (String, Vec<String>) {
        let job = generator.resolve_job(request).await.unwrap();
        let version = VersionRepository::new(&generator.pool)
            .create(
                &request.personal_info,
                &job.title,
                &job.company,
                None,
                None,
            )
            .await
            .unwrap();

        let mut rx = generator.hub.subscribe(KIND_RESUME_VERSION, &version.id);
        generator
            .run_pipeline(&version.id, request, &job)
            .await
            .unwrap();

        let mut statuses = Vec::new();
        while let Ok(event) = rx.try_recv() {
            statuses.push(event.status);
        }
        (version.id, statuses)
    }

    #[tokio::test]
    async fn test_pipeline_emits_each_transition_in_order() {
        let pool = test_pool().await;
        let (generator, _hub) = generator(&pool, false, None).await;

        let (version_id, statuses) = drive(&generator, &inline_request()).await;
        assert_eq!(
            statuses,
            vec!["processing", "optimizing", "finalizing", "complete"]
        );

        let version = generator.load_version(&version_id).await.unwrap();
        assert_eq!(version.status, GenerationStatus::Complete);
        assert!(version.artifact_invariant_holds());
        assert!(version.latex_source.unwrap().contains("Platform Engineer"));

        let pdf = generator.fetch_pdf(&version_id).await.unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_optimize_failure_moves_to_failed_without_artifact() {
        let pool = test_pool().await;
        let (generator, _hub) = generator(&pool, true, None).await;

        let (version_id, statuses) = drive(&generator, &inline_request()).await;
        assert_eq!(statuses, vec!["processing", "optimizing", "failed"]);

        let version = generator.load_version(&version_id).await.unwrap();
        assert_eq!(version.status, GenerationStatus::Failed);
        assert!(version.pdf_key.is_none());
        assert!(version
            .error_detail
            .as_deref()
            .unwrap()
            .contains("optimizing stage failed"));

        match generator.fetch_pdf(&version_id).await {
            Err(PipelineError::InvalidState(_)) => {}
            other => panic!("expected InvalidState, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_compile_failure_fails_the_finalizing_stage() {
        let pool = test_pool().await;
        let (generator, _hub) = generator(
            &pool,
            false,
            Some(("undefined control sequence".to_string(), "l.12".to_string())),
        )
        .await;

        let (version_id, statuses) = drive(&generator, &inline_request()).await;
        assert_eq!(statuses, vec!["processing", "optimizing", "finalizing", "failed"]);

        let version = generator.load_version(&version_id).await.unwrap();
        assert!(version
            .error_detail
            .as_deref()
            .unwrap()
            .contains("finalizing stage failed"));
    }

    #[tokio::test]
    async fn test_pdf_fetch_before_terminal_reports_in_progress() {
        let pool = test_pool().await;
        let (generator, _hub) = generator(&pool, false, None).await;

        let version = VersionRepository::new(&pool)
            .create(&personal_info(), "Engineer", "Acme", None, None)
            .await
            .unwrap();

        match generator.fetch_pdf(&version.id).await {
            Err(PipelineError::StillInProgress(status)) => assert_eq!(status, "processing"),
            other => panic!("expected StillInProgress, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_submit_requires_job_fields_or_posting() {
        let pool = test_pool().await;
        let (generator, _hub) = generator(&pool, false, None).await;

        let mut request = inline_request();
        request.job_description = None;
        match generator.submit(request).await {
            Err(PipelineError::Validation(_)) => {}
            other => panic!("expected Validation, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_submit_rejects_unfetched_posting() {
        let pool = test_pool().await;
        let (generator, _hub) = generator(&pool, false, None).await;

        let posting = PostingRepository::new(&pool)
            .create_pending("https://jobs.example.com/1", "jobs.example.com")
            .await
            .unwrap();

        let mut request = inline_request();
        request.job_posting_id = Some(posting.id);
        match generator.submit(request).await {
            Err(PipelineError::InvalidState(_)) => {}
            other => panic!("expected InvalidState, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_submit_surfaces_extraction_failure_on_failed_posting() {
        let pool = test_pool().await;
        let (generator, _hub) = generator(&pool, false, None).await;

        let repo = PostingRepository::new(&pool);
        let posting = repo
            .create_pending("https://jobs.example.com/2", "jobs.example.com")
            .await
            .unwrap();
        repo.mark_failed(&posting.id).await.unwrap();

        let mut request = inline_request();
        request.job_posting_id = Some(posting.id);
        match generator.submit(request).await {
            Err(PipelineError::ExtractionFailed(_)) => {}
            other => panic!("expected ExtractionFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_recompile_swaps_artifact_and_keeps_state_on_bad_edit() {
        let pool = test_pool().await;
        let (generator, _hub) = generator(&pool, false, None).await;

        let (version_id, _) = drive(&generator, &inline_request()).await;
        let original = generator.latex_source(&version_id).await.unwrap();

        let edited = format!("{}\n% tightened spacing", original);
        let version = generator.recompile(&version_id, &edited).await.unwrap();
        assert_eq!(version.status, GenerationStatus::Complete);
        assert_eq!(version.latex_source.as_deref(), Some(edited.as_str()));

        // A failing edit leaves the stored source and artifact untouched.
        let failing = ResumeGenerator {
            compiler: Arc::new(MockCompiler {
                diagnostics: Some(("missing brace".to_string(), "l.3".to_string())),
            }),
            ..generator.clone()
        };
        match failing.recompile(&version_id, "\\broken{").await {
            Err(PipelineError::Compilation { message, .. }) => {
                assert_eq!(message, "missing brace")
            }
            other => panic!("expected Compilation, got {:?}", other.map(|_| ())),
        }

        let unchanged = generator.load_version(&version_id).await.unwrap();
        assert_eq!(unchanged.latex_source.as_deref(), Some(edited.as_str()));
        assert_eq!(unchanged.pdf_key, version.pdf_key);
    }
}
