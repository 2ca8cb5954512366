// src/extraction/mod.rs
//! Job-posting extraction engine.
//!
//! A fetch request returns immediately with a pending posting; the
//! strategy chain runs on a spawned task. Strategies are tried in fixed
//! priority order — cached domain selector, heuristic structural parse,
//! AI-assisted extraction — each bounded by a per-strategy timeout under
//! an overall request deadline. Every strategy considered leaves one
//! audit row in `fetch_attempts`.

pub mod heuristic;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::clients::ContentProvider;
use crate::environment::TimeoutConfig;
use crate::error::PipelineError;
use crate::events::{StatusEvent, StatusHub, KIND_JOB_POSTING};
use crate::models::{ExtractionMethod, JobPosting, Provenance, SelectorMap};
use crate::repository::{PostingRepository, SelectorRepository};
use crate::utils::{clean_text, domain_from_url, excerpt};

use heuristic::ExtractedFields;

const DOMAIN_SELECTOR_CONFIDENCE: f64 = 0.9;
const HEURISTIC_CONFIDENCE: f64 = 0.6;
const AI_DEFAULT_CONFIDENCE: f64 = 0.5;
const EXCERPT_CHARS: usize = 200;

/// Outcome of the fetched page shared by all strategies in one request
pub enum PageResult {
    Ok {
        html: String,
        text: String,
        http_status: i64,
    },
    Failed {
        note: String,
        http_status: Option<i64>,
    },
}

/// One audit row, recorded whether the strategy succeeded or not
#[derive(Debug)]
pub struct AttemptRecord {
    pub method: ExtractionMethod,
    pub http_status: Option<i64>,
    pub duration_ms: i64,
    pub note: Option<String>,
}

/// The first strategy producing a usable parse
pub struct Winner {
    pub fields: ExtractedFields,
    pub method: ExtractionMethod,
    pub extractor: String,
    pub confidence: f64,
    /// Selectors worth caching for this domain, when the method can
    /// generalize them.
    pub selectors: Option<SelectorMap>,
}

#[derive(Clone)]
pub struct ExtractionEngine {
    pool: SqlitePool,
    hub: Arc<StatusHub>,
    content: Arc<dyn ContentProvider>,
    timeouts: TimeoutConfig,
    http: reqwest::Client,
}

impl ExtractionEngine {
    pub fn new(
        pool: SqlitePool,
        hub: Arc<StatusHub>,
        content: Arc<dyn ContentProvider>,
        timeouts: TimeoutConfig,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .timeout(timeouts.page_fetch)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            pool,
            hub,
            content,
            timeouts,
            http,
        })
    }

    /// Accept a fetch request: persist a pending posting, spawn the
    /// strategy chain, return the posting immediately.
    pub async fn fetch(&self, url: &str) -> Result<JobPosting, PipelineError> {
        let domain =
            domain_from_url(url).map_err(|e| PipelineError::Validation(e.to_string()))?;

        let repo = PostingRepository::new(&self.pool);
        let posting = repo.create_pending(url, &domain).await?;

        let engine = self.clone();
        let posting_id = posting.id.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            if let Err(e) = engine.run_extraction(&posting_id, &url, &domain).await {
                error!("Extraction task for posting {} errored: {}", posting_id, e);
            }
        });

        Ok(posting)
    }

    async fn run_extraction(&self, posting_id: &str, url: &str, domain: &str) -> Result<()> {
        let repo = PostingRepository::new(&self.pool);
        let selector_repo = SelectorRepository::new(&self.pool);

        let cached = selector_repo
            .find_by_domain(domain)
            .await
            .unwrap_or_else(|e| {
                warn!("Selector lookup failed for {}: {}", domain, e);
                None
            })
            .map(|entry| entry.selectors);

        let page = self.fetch_page(url).await;
        let (attempts, winner) = self.run_strategies(&page, cached.as_ref(), url).await;

        for attempt in &attempts {
            repo.record_attempt(
                posting_id,
                attempt.method,
                attempt.http_status,
                attempt.duration_ms,
                attempt.note.as_deref(),
            )
            .await?;
        }

        match winner {
            Some(winner) => {
                let provenance = Provenance {
                    method: winner.method,
                    extractor: winner.extractor,
                    confidence: winner.confidence,
                    excerpt: Some(excerpt(&winner.fields.description, EXCERPT_CHARS)),
                    extracted_at: Utc::now(),
                };

                repo.mark_fetched(
                    posting_id,
                    &winner.fields.title,
                    &winner.fields.company,
                    &winner.fields.description,
                    &provenance,
                )
                .await?;

                if let Some(selectors) = &winner.selectors {
                    selector_repo.upsert(domain, selectors).await?;
                }

                info!(
                    "Posting {} fetched via {} ({} at {})",
                    posting_id,
                    winner.method.as_str(),
                    winner.fields.title,
                    winner.fields.company
                );

                self.hub.publish(
                    KIND_JOB_POSTING,
                    StatusEvent::new(KIND_JOB_POSTING, posting_id, "fetched", None).with_data(
                        serde_json::json!({
                            "title": winner.fields.title,
                            "company": winner.fields.company,
                            "method": winner.method.as_str(),
                        }),
                    ),
                );
            }
            None => {
                repo.mark_failed(posting_id).await?;
                warn!("Posting {} failed: all strategies exhausted", posting_id);

                self.hub.publish(
                    KIND_JOB_POSTING,
                    StatusEvent::new(
                        KIND_JOB_POSTING,
                        posting_id,
                        "failed",
                        Some("All extraction strategies exhausted".to_string()),
                    ),
                );
            }
        }

        Ok(())
    }

    async fn fetch_page(&self, url: &str) -> PageResult {
        match self.http.get(url).send().await {
            Ok(response) => {
                let http_status = response.status().as_u16() as i64;
                if !response.status().is_success() {
                    return PageResult::Failed {
                        note: format!("HTTP error: {}", http_status),
                        http_status: Some(http_status),
                    };
                }
                match response.text().await {
                    Ok(html) => {
                        let text = clean_text(&html_to_text(&html));
                        PageResult::Ok {
                            html,
                            text,
                            http_status,
                        }
                    }
                    Err(e) => PageResult::Failed {
                        note: format!("Failed to read response body: {}", e),
                        http_status: Some(http_status),
                    },
                }
            }
            Err(e) => PageResult::Failed {
                note: format!("Page fetch failed: {}", e),
                http_status: None,
            },
        }
    }

    /// Run the strategy chain over an already-fetched page. Separated
    /// from the persistence plumbing so the chain is testable with
    /// fixture pages and a mock content provider.
    pub async fn run_strategies(
        &self,
        page: &PageResult,
        cached: Option<&SelectorMap>,
        url: &str,
    ) -> (Vec<AttemptRecord>, Option<Winner>) {
        let deadline = Instant::now() + self.timeouts.overall_extraction;
        let mut attempts = Vec::new();

        // 1. Cached domain selector. The skip is recorded too, so the
        // audit trail always shows the full chain that was considered.
        let started = Instant::now();
        match (cached, page) {
            (None, _) => {
                attempts.push(AttemptRecord {
                    method: ExtractionMethod::DomainSelector,
                    http_status: None,
                    duration_ms: elapsed_ms(started),
                    note: Some("no cached selector for domain".to_string()),
                });
            }
            (Some(_), PageResult::Failed { note, http_status }) => {
                attempts.push(AttemptRecord {
                    method: ExtractionMethod::DomainSelector,
                    http_status: *http_status,
                    duration_ms: elapsed_ms(started),
                    note: Some(note.clone()),
                });
            }
            (Some(map), PageResult::Ok { html, http_status, .. }) => {
                match heuristic::parse_with_selector_map(html, map) {
                    Some(fields) if fields.is_usable() => {
                        attempts.push(AttemptRecord {
                            method: ExtractionMethod::DomainSelector,
                            http_status: Some(*http_status),
                            duration_ms: elapsed_ms(started),
                            note: None,
                        });
                        return (
                            attempts,
                            Some(Winner {
                                fields,
                                method: ExtractionMethod::DomainSelector,
                                extractor: "domain_selector_cache".to_string(),
                                confidence: DOMAIN_SELECTOR_CONFIDENCE,
                                selectors: Some(map.clone()),
                            }),
                        );
                    }
                    _ => {
                        attempts.push(AttemptRecord {
                            method: ExtractionMethod::DomainSelector,
                            http_status: Some(*http_status),
                            duration_ms: elapsed_ms(started),
                            note: Some("cached selectors no longer match page".to_string()),
                        });
                    }
                }
            }
        }

        // 2. Heuristic structural parse.
        if Instant::now() >= deadline {
            warn!("Extraction deadline exceeded before heuristic strategy");
            return (attempts, None);
        }
        let started = Instant::now();
        match page {
            PageResult::Failed { note, http_status } => {
                attempts.push(AttemptRecord {
                    method: ExtractionMethod::Heuristic,
                    http_status: *http_status,
                    duration_ms: elapsed_ms(started),
                    note: Some(note.clone()),
                });
            }
            PageResult::Ok { html, http_status, .. } => {
                let parsed = heuristic::parse_heuristic(html).map(|(mut fields, selectors)| {
                    let defaulted = company_or_domain(&mut fields, url);
                    (fields, selectors, defaulted)
                });
                match parsed {
                    Some((fields, selectors, defaulted)) if fields.is_usable() => {
                        attempts.push(AttemptRecord {
                            method: ExtractionMethod::Heuristic,
                            http_status: Some(*http_status),
                            duration_ms: elapsed_ms(started),
                            note: defaulted
                                .then(|| "company defaulted to posting domain".to_string()),
                        });
                        // A selector map whose company selector never
                        // matched would only poison the cache.
                        return (
                            attempts,
                            Some(Winner {
                                fields,
                                method: ExtractionMethod::Heuristic,
                                extractor: "heuristic_parser".to_string(),
                                confidence: HEURISTIC_CONFIDENCE,
                                selectors: (!defaulted).then_some(selectors),
                            }),
                        );
                    }
                    _ => {
                        attempts.push(AttemptRecord {
                            method: ExtractionMethod::Heuristic,
                            http_status: Some(*http_status),
                            duration_ms: elapsed_ms(started),
                            note: Some("structural parse found no usable fields".to_string()),
                        });
                    }
                }
            }
        }

        // 3. AI-assisted extraction over the cleaned page text.
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            warn!("Extraction deadline exceeded before AI strategy");
            return (attempts, None);
        }
        let started = Instant::now();
        match page {
            PageResult::Failed { note, http_status } => {
                attempts.push(AttemptRecord {
                    method: ExtractionMethod::Ai,
                    http_status: *http_status,
                    duration_ms: elapsed_ms(started),
                    note: Some(note.clone()),
                });
            }
            PageResult::Ok { text, .. } => {
                let budget = self.timeouts.per_strategy.min(remaining);
                match timeout(budget, self.content.extract_posting(text, url)).await {
                    Ok(Ok(extracted)) => {
                        let confidence = extracted.confidence.unwrap_or(AI_DEFAULT_CONFIDENCE);
                        let mut fields = ExtractedFields {
                            title: extracted.title,
                            company: extracted.company,
                            description: extracted.description,
                        };
                        let defaulted = company_or_domain(&mut fields, url);
                        if fields.is_usable() {
                            attempts.push(AttemptRecord {
                                method: ExtractionMethod::Ai,
                                http_status: None,
                                duration_ms: elapsed_ms(started),
                                note: defaulted
                                    .then(|| "company defaulted to posting domain".to_string()),
                            });
                            return (
                                attempts,
                                Some(Winner {
                                    fields,
                                    method: ExtractionMethod::Ai,
                                    extractor: "content_service".to_string(),
                                    confidence,
                                    selectors: None,
                                }),
                            );
                        }
                        attempts.push(AttemptRecord {
                            method: ExtractionMethod::Ai,
                            http_status: None,
                            duration_ms: elapsed_ms(started),
                            note: Some("AI extraction returned empty fields".to_string()),
                        });
                    }
                    Ok(Err(e)) => {
                        attempts.push(AttemptRecord {
                            method: ExtractionMethod::Ai,
                            http_status: None,
                            duration_ms: elapsed_ms(started),
                            note: Some(format!("AI extraction failed: {}", e)),
                        });
                    }
                    Err(_) => {
                        attempts.push(AttemptRecord {
                            method: ExtractionMethod::Ai,
                            http_status: None,
                            duration_ms: elapsed_ms(started),
                            note: Some(format!("AI extraction timed out after {:?}", budget)),
                        });
                    }
                }
            }
        }

        (attempts, None)
    }
}

fn elapsed_ms(started: Instant) -> i64 {
    started.elapsed().as_millis() as i64
}

/// A fetched posting always names a company. When neither the page nor
/// the AI found one, the posting domain stands in.
fn company_or_domain(fields: &mut ExtractedFields, url: &str) -> bool {
    if !fields.company.is_empty() {
        return false;
    }
    if let Ok(domain) = domain_from_url(url) {
        fields.company = domain;
        return true;
    }
    false
}

/// Strip markup for the AI fallback without holding the non-Send
/// document across an await point.
fn html_to_text(html: &str) -> String {
    let document = scraper::Html::parse_document(html);
    document.root_element().text().collect::<Vec<_>>().join(" ")
}
