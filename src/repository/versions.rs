// src/repository/versions.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::models::{GenerationStatus, PersonalInfo, ResumeVersion};

#[derive(sqlx::FromRow)]
struct VersionRow {
    id: String,
    job_posting_id: Option<String>,
    linked_application_id: Option<String>,
    personal_info: String,
    job_title: String,
    company: String,
    status: String,
    latex_source: Option<String>,
    pdf_key: Option<String>,
    error_detail: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VersionRow {
    fn into_version(self) -> Result<ResumeVersion> {
        let status = GenerationStatus::parse(&self.status)
            .ok_or_else(|| anyhow::anyhow!("Unknown generation status: {}", self.status))?;
        let personal_info: PersonalInfo = serde_json::from_str(&self.personal_info)
            .with_context(|| format!("Corrupt personal info snapshot for version {}", self.id))?;

        Ok(ResumeVersion {
            id: self.id,
            job_posting_id: self.job_posting_id,
            linked_application_id: self.linked_application_id,
            personal_info,
            job_title: self.job_title,
            company: self.company,
            status,
            latex_source: self.latex_source,
            pdf_key: self.pdf_key,
            error_detail: self.error_detail,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_VERSION: &str = r#"
    SELECT id, job_posting_id, linked_application_id, personal_info,
           job_title, company, status, latex_source, pdf_key, error_detail,
           created_at, updated_at
    FROM resume_versions
"#;

pub struct VersionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VersionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist an accepted generation request in `processing` state
    pub async fn create(
        &self,
        personal_info: &PersonalInfo,
        job_title: &str,
        company: &str,
        job_posting_id: Option<&str>,
        linked_application_id: Option<&str>,
    ) -> Result<ResumeVersion> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let snapshot =
            serde_json::to_string(personal_info).context("Failed to serialize personal info")?;

        sqlx::query(
            r#"
            INSERT INTO resume_versions
                (id, job_posting_id, linked_application_id, personal_info,
                 job_title, company, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 'processing', ?, ?)
            "#,
        )
        .bind(&id)
        .bind(job_posting_id)
        .bind(linked_application_id)
        .bind(snapshot)
        .bind(job_title)
        .bind(company)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        info!("Created resume version {} in processing state", id);
        self.find_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Version {} vanished after insert", id))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<ResumeVersion>> {
        let row = sqlx::query_as::<_, VersionRow>(&format!("{} WHERE id = ?", SELECT_VERSION))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(VersionRow::into_version).transpose()
    }

    /// Advance one stage. The guard on the current status makes the
    /// transition monotonic even under concurrent writers: an illegal or
    /// repeated advance simply affects zero rows.
    pub async fn advance(
        &self,
        id: &str,
        from: GenerationStatus,
        to: GenerationStatus,
    ) -> Result<bool> {
        if !from.can_transition(to) {
            anyhow::bail!(
                "Illegal status transition {} -> {} for version {}",
                from.as_str(),
                to.as_str(),
                id
            );
        }

        let result = sqlx::query(
            r#"
            UPDATE resume_versions
            SET status = ?, updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(to.as_str())
        .bind(Utc::now())
        .bind(id)
        .bind(from.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Terminal success: LaTeX source and PDF key land in one UPDATE so
    /// the artifact-iff-complete invariant never has a visible gap.
    pub async fn complete(&self, id: &str, latex_source: &str, pdf_key: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE resume_versions
            SET status = 'complete', latex_source = ?, pdf_key = ?,
                error_detail = NULL, updated_at = ?
            WHERE id = ? AND status = 'finalizing'
            "#,
        )
        .bind(latex_source)
        .bind(pdf_key)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Terminal failure from any non-terminal state. No partial artifact
    /// is retained.
    pub async fn fail(&self, id: &str, error_detail: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE resume_versions
            SET status = 'failed', error_detail = ?, latex_source = NULL,
                pdf_key = NULL, updated_at = ?
            WHERE id = ? AND status NOT IN ('complete', 'failed')
            "#,
        )
        .bind(error_detail)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Edit loop: swap LaTeX and artifact on an already-complete version.
    /// Status stays `complete`; any other state is rejected by the guard.
    pub async fn replace_artifact(&self, id: &str, latex_source: &str, pdf_key: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE resume_versions
            SET latex_source = ?, pdf_key = ?, updated_at = ?
            WHERE id = ? AND status = 'complete'
            "#,
        )
        .bind(latex_source)
        .bind(pdf_key)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn personal_info() -> PersonalInfo {
        PersonalInfo {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            location: Some("London".to_string()),
            links: vec!["https://github.com/ada".to_string()],
        }
    }

    async fn create_version(pool: &SqlitePool) -> ResumeVersion {
        VersionRepository::new(pool)
            .create(&personal_info(), "Engineer", "Acme", None, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_version_starts_processing_without_artifact() {
        let pool = test_pool().await;
        let version = create_version(&pool).await;

        assert_eq!(version.status, GenerationStatus::Processing);
        assert!(version.pdf_key.is_none());
        assert!(version.artifact_invariant_holds());
        assert_eq!(version.personal_info.name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_full_stage_sequence_reaches_complete() {
        let pool = test_pool().await;
        let repo = VersionRepository::new(&pool);
        let version = create_version(&pool).await;

        use GenerationStatus::*;
        assert!(repo.advance(&version.id, Processing, Optimizing).await.unwrap());
        assert!(repo.advance(&version.id, Optimizing, Finalizing).await.unwrap());
        assert!(repo.complete(&version.id, "\\documentclass{article}", "key-1").await.unwrap());

        let done = repo.find_by_id(&version.id).await.unwrap().unwrap();
        assert_eq!(done.status, Complete);
        assert_eq!(done.pdf_key.as_deref(), Some("key-1"));
        assert!(done.artifact_invariant_holds());
    }

    #[tokio::test]
    async fn test_skipping_a_stage_is_rejected() {
        let pool = test_pool().await;
        let repo = VersionRepository::new(&pool);
        let version = create_version(&pool).await;

        use GenerationStatus::*;
        assert!(repo.advance(&version.id, Processing, Finalizing).await.is_err());
        // A guarded advance from the wrong current state affects no rows.
        assert!(!repo.advance(&version.id, Optimizing, Finalizing).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_is_terminal_and_clears_partial_state() {
        let pool = test_pool().await;
        let repo = VersionRepository::new(&pool);
        let version = create_version(&pool).await;

        use GenerationStatus::*;
        repo.advance(&version.id, Processing, Optimizing).await.unwrap();
        assert!(repo.fail(&version.id, "content service timed out").await.unwrap());

        let failed = repo.find_by_id(&version.id).await.unwrap().unwrap();
        assert_eq!(failed.status, Failed);
        assert!(failed.pdf_key.is_none());
        assert_eq!(failed.error_detail.as_deref(), Some("content service timed out"));
        assert!(failed.artifact_invariant_holds());

        // No further transitions once failed.
        assert!(!repo.advance(&version.id, Optimizing, Finalizing).await.unwrap());
        assert!(!repo.fail(&version.id, "again").await.unwrap());
    }

    #[tokio::test]
    async fn test_complete_version_cannot_fail_or_advance() {
        let pool = test_pool().await;
        let repo = VersionRepository::new(&pool);
        let version = create_version(&pool).await;

        use GenerationStatus::*;
        repo.advance(&version.id, Processing, Optimizing).await.unwrap();
        repo.advance(&version.id, Optimizing, Finalizing).await.unwrap();
        repo.complete(&version.id, "src", "key-1").await.unwrap();

        assert!(!repo.fail(&version.id, "late failure").await.unwrap());
        assert!(!repo.complete(&version.id, "src2", "key-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_artifact_requires_complete() {
        let pool = test_pool().await;
        let repo = VersionRepository::new(&pool);
        let version = create_version(&pool).await;

        // Not complete yet: rejected.
        assert!(!repo.replace_artifact(&version.id, "edited", "key-2").await.unwrap());

        use GenerationStatus::*;
        repo.advance(&version.id, Processing, Optimizing).await.unwrap();
        repo.advance(&version.id, Optimizing, Finalizing).await.unwrap();
        repo.complete(&version.id, "original", "key-1").await.unwrap();

        assert!(repo.replace_artifact(&version.id, "edited", "key-2").await.unwrap());
        let edited = repo.find_by_id(&version.id).await.unwrap().unwrap();
        assert_eq!(edited.status, Complete);
        assert_eq!(edited.latex_source.as_deref(), Some("edited"));
        assert_eq!(edited.pdf_key.as_deref(), Some("key-2"));
    }
}
