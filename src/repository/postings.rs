// src/repository/postings.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::models::{ExtractionMethod, FetchAttempt, JobPosting, PostingStatus, Provenance};

/// Flat row shape; provenance columns are nullable and folded into the
/// `Provenance` sub-structure on read.
#[derive(sqlx::FromRow)]
struct PostingRow {
    id: String,
    url: Option<String>,
    domain: Option<String>,
    title: String,
    company: String,
    description: String,
    status: String,
    provenance_method: Option<String>,
    provenance_extractor: Option<String>,
    provenance_confidence: Option<f64>,
    provenance_excerpt: Option<String>,
    provenance_extracted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostingRow {
    fn into_posting(self) -> Result<JobPosting> {
        let status = PostingStatus::parse(&self.status)
            .ok_or_else(|| anyhow::anyhow!("Unknown posting status: {}", self.status))?;

        let provenance = match (
            self.provenance_method,
            self.provenance_extractor,
            self.provenance_confidence,
            self.provenance_extracted_at,
        ) {
            (Some(method), Some(extractor), Some(confidence), Some(extracted_at)) => {
                let method = ExtractionMethod::parse(&method)
                    .ok_or_else(|| anyhow::anyhow!("Unknown extraction method: {}", method))?;
                Some(Provenance {
                    method,
                    extractor,
                    confidence,
                    excerpt: self.provenance_excerpt,
                    extracted_at,
                })
            }
            _ => None,
        };

        Ok(JobPosting {
            id: self.id,
            url: self.url,
            domain: self.domain,
            title: self.title,
            company: self.company,
            description: self.description,
            status,
            provenance,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_POSTING: &str = r#"
    SELECT id, url, domain, title, company, description, status,
           provenance_method, provenance_extractor, provenance_confidence,
           provenance_excerpt, provenance_extracted_at,
           created_at, updated_at
    FROM job_postings
"#;

pub struct PostingRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PostingRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a pending posting for a fetch request
    pub async fn create_pending(&self, url: &str, domain: &str) -> Result<JobPosting> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO job_postings (id, url, domain, status, created_at, updated_at)
            VALUES (?, ?, ?, 'pending', ?, ?)
            "#,
        )
        .bind(&id)
        .bind(url)
        .bind(domain)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        info!("Created pending posting {} for {}", id, url);
        self.find_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Posting {} vanished after insert", id))
    }

    /// Manual entry bypasses the extraction engine entirely: the posting
    /// is born `fetched` with method `manual` and confidence 1.0.
    pub async fn create_manual(
        &self,
        title: &str,
        company: &str,
        description: &str,
        url: Option<&str>,
        domain: Option<&str>,
    ) -> Result<JobPosting> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO job_postings
                (id, url, domain, title, company, description, status,
                 provenance_method, provenance_extractor, provenance_confidence,
                 provenance_extracted_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 'fetched', 'manual', 'user', 1.0, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(url)
        .bind(domain)
        .bind(title)
        .bind(company)
        .bind(description)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Posting {} vanished after insert", id))
    }

    /// Promote a pending posting to `fetched` with the winning strategy's
    /// provenance. Guarded so a posting is only ever mutated while pending.
    pub async fn mark_fetched(
        &self,
        id: &str,
        title: &str,
        company: &str,
        description: &str,
        provenance: &Provenance,
    ) -> Result<bool> {
        // The fetched invariant: all three fields present, always.
        if title.trim().is_empty() || company.trim().is_empty() || description.trim().is_empty() {
            anyhow::bail!(
                "Refusing to mark posting {} fetched with an empty title, company or description",
                id
            );
        }

        let result = sqlx::query(
            r#"
            UPDATE job_postings
            SET title = ?, company = ?, description = ?, status = 'fetched',
                provenance_method = ?, provenance_extractor = ?,
                provenance_confidence = ?, provenance_excerpt = ?,
                provenance_extracted_at = ?, updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(title)
        .bind(company)
        .bind(description)
        .bind(provenance.method.as_str())
        .bind(&provenance.extractor)
        .bind(provenance.confidence)
        .bind(&provenance.excerpt)
        .bind(provenance.extracted_at)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a pending posting as failed after all strategies are exhausted
    pub async fn mark_failed(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE job_postings
            SET status = 'failed', updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<JobPosting>> {
        let row = sqlx::query_as::<_, PostingRow>(&format!("{} WHERE id = ?", SELECT_POSTING))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(PostingRow::into_posting).transpose()
    }

    /// Append one attempt row. Append-only by design; there is no update
    /// or delete path for this table.
    pub async fn record_attempt(
        &self,
        job_posting_id: &str,
        method: ExtractionMethod,
        http_status: Option<i64>,
        duration_ms: i64,
        note: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO fetch_attempts (job_posting_id, method, http_status, duration_ms, note, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job_posting_id)
        .bind(method.as_str())
        .bind(http_status)
        .bind(duration_ms)
        .bind(note)
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .context("Failed to record fetch attempt")?;

        Ok(())
    }

    /// Attempts for a posting in chronological order
    pub async fn attempts_for(&self, job_posting_id: &str) -> Result<Vec<FetchAttempt>> {
        let attempts = sqlx::query_as::<_, FetchAttempt>(
            r#"
            SELECT id, job_posting_id, method, http_status, duration_ms, note, created_at
            FROM fetch_attempts
            WHERE job_posting_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(job_posting_id)
        .fetch_all(self.pool)
        .await?;

        Ok(attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn provenance(method: ExtractionMethod, confidence: f64) -> Provenance {
        Provenance {
            method,
            extractor: "test".to_string(),
            confidence,
            excerpt: Some("We are hiring".to_string()),
            extracted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_pending_posting_promotes_to_fetched_once() {
        let pool = test_pool().await;
        let repo = PostingRepository::new(&pool);

        let posting = repo
            .create_pending("https://jobs.example.com/42", "jobs.example.com")
            .await
            .unwrap();
        assert_eq!(posting.status, PostingStatus::Pending);
        assert!(posting.provenance.is_none());

        let updated = repo
            .mark_fetched(
                &posting.id,
                "Senior Engineer",
                "Example Corp",
                "Build things",
                &provenance(ExtractionMethod::Heuristic, 0.6),
            )
            .await
            .unwrap();
        assert!(updated);

        let fetched = repo.find_by_id(&posting.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, PostingStatus::Fetched);
        assert_eq!(fetched.title, "Senior Engineer");
        let prov = fetched.provenance.unwrap();
        assert_eq!(prov.method, ExtractionMethod::Heuristic);
        assert!((prov.confidence - 0.6).abs() < f64::EPSILON);

        // Fetched postings are immutable; a second promotion is a no-op.
        let second = repo
            .mark_fetched(
                &posting.id,
                "Other",
                "Other",
                "Other",
                &provenance(ExtractionMethod::Ai, 0.5),
            )
            .await
            .unwrap();
        assert!(!second);
    }

    #[tokio::test]
    async fn test_mark_fetched_rejects_empty_company() {
        let pool = test_pool().await;
        let repo = PostingRepository::new(&pool);

        let posting = repo
            .create_pending("https://jobs.example.com/11", "jobs.example.com")
            .await
            .unwrap();

        let result = repo
            .mark_fetched(
                &posting.id,
                "Senior Engineer",
                "",
                "Build things",
                &provenance(ExtractionMethod::Heuristic, 0.6),
            )
            .await;
        assert!(result.is_err());

        let unchanged = repo.find_by_id(&posting.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, PostingStatus::Pending);
    }

    #[tokio::test]
    async fn test_mark_failed_only_applies_to_pending() {
        let pool = test_pool().await;
        let repo = PostingRepository::new(&pool);

        let posting = repo
            .create_pending("https://jobs.example.com/7", "jobs.example.com")
            .await
            .unwrap();
        assert!(repo.mark_failed(&posting.id).await.unwrap());
        assert!(!repo.mark_failed(&posting.id).await.unwrap());

        let failed = repo.find_by_id(&posting.id).await.unwrap().unwrap();
        assert_eq!(failed.status, PostingStatus::Failed);
    }

    #[tokio::test]
    async fn test_manual_posting_is_fetched_with_full_confidence() {
        let pool = test_pool().await;
        let repo = PostingRepository::new(&pool);

        let posting = repo
            .create_manual("Staff Engineer", "Acme", "Do staff things", None, None)
            .await
            .unwrap();

        assert_eq!(posting.status, PostingStatus::Fetched);
        let prov = posting.provenance.unwrap();
        assert_eq!(prov.method, ExtractionMethod::Manual);
        assert!((prov.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_attempts_are_append_only_and_ordered() {
        let pool = test_pool().await;
        let repo = PostingRepository::new(&pool);

        let posting = repo
            .create_pending("https://jobs.example.com/9", "jobs.example.com")
            .await
            .unwrap();

        repo.record_attempt(
            &posting.id,
            ExtractionMethod::DomainSelector,
            None,
            3,
            Some("no cached selector for domain"),
        )
        .await
        .unwrap();
        repo.record_attempt(&posting.id, ExtractionMethod::Heuristic, Some(200), 120, None)
            .await
            .unwrap();
        repo.record_attempt(&posting.id, ExtractionMethod::Ai, Some(200), 900, None)
            .await
            .unwrap();

        let attempts = repo.attempts_for(&posting.id).await.unwrap();
        assert_eq!(attempts.len(), 3);
        assert_eq!(attempts[0].method, "domain_selector");
        assert_eq!(attempts[0].http_status, None);
        assert_eq!(attempts[1].method, "heuristic");
        assert_eq!(attempts[2].method, "ai");
    }
}
