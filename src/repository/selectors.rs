// src/repository/selectors.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::models::{DomainSelector, SelectorMap};

#[derive(sqlx::FromRow)]
struct SelectorRow {
    domain: String,
    selectors: String,
    last_success: DateTime<Utc>,
}

impl SelectorRow {
    fn into_selector(self) -> Result<DomainSelector> {
        let selectors: SelectorMap = serde_json::from_str(&self.selectors)
            .with_context(|| format!("Corrupt selector entry for domain {}", self.domain))?;
        Ok(DomainSelector {
            domain: self.domain,
            selectors,
            last_success: self.last_success,
        })
    }
}

pub struct SelectorRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SelectorRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_domain(&self, domain: &str) -> Result<Option<DomainSelector>> {
        let row = sqlx::query_as::<_, SelectorRow>(
            r#"
            SELECT domain, selectors, last_success
            FROM domain_selectors
            WHERE domain = ?
            "#,
        )
        .bind(domain)
        .fetch_optional(self.pool)
        .await?;

        row.map(SelectorRow::into_selector).transpose()
    }

    /// Upsert by domain; concurrent writers both succeed and the later
    /// write wins. Staleness is acceptable since selectors are advisory.
    pub async fn upsert(&self, domain: &str, selectors: &SelectorMap) -> Result<()> {
        let payload = serde_json::to_string(selectors).context("Failed to serialize selectors")?;

        sqlx::query(
            r#"
            INSERT INTO domain_selectors (domain, selectors, last_success)
            VALUES (?, ?, ?)
            ON CONFLICT(domain) DO UPDATE SET
                selectors = excluded.selectors,
                last_success = excluded.last_success
            "#,
        )
        .bind(domain)
        .bind(payload)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        info!("Upserted domain selector for {}", domain);
        Ok(())
    }

    /// All cached selectors, newest success first (administrative view)
    pub async fn list(&self) -> Result<Vec<DomainSelector>> {
        let rows = sqlx::query_as::<_, SelectorRow>(
            r#"
            SELECT domain, selectors, last_success
            FROM domain_selectors
            ORDER BY last_success DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(SelectorRow::into_selector).collect()
    }
}
