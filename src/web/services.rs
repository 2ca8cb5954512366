// src/web/services.rs
//! Construction of the service graph the handlers run against.

use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::clients::{CompilerClient, ContentClient, ProfileClient};
use crate::environment::{EnvironmentConfig, TimeoutConfig};
use crate::events::StatusHub;
use crate::extraction::ExtractionEngine;
use crate::generation::keywords::KeywordAnalyzer;
use crate::generation::ResumeGenerator;
use crate::storage::ArtifactStore;

pub struct AppServices {
    pub pool: SqlitePool,
    pub hub: Arc<StatusHub>,
    pub engine: ExtractionEngine,
    pub generator: ResumeGenerator,
    pub analyzer: KeywordAnalyzer,
}

impl AppServices {
    pub fn build(
        environment: &EnvironmentConfig,
        timeouts: TimeoutConfig,
        pool: SqlitePool,
    ) -> Result<Self> {
        let hub = Arc::new(StatusHub::new());

        let content = Arc::new(ContentClient::new(
            environment.content_service_url.clone(),
            timeouts.content_service,
        )?);
        let compiler = Arc::new(CompilerClient::new(
            environment.compiler_service_url.clone(),
            timeouts.compiler_service,
        )?);
        let profiles = Arc::new(ProfileClient::new(
            environment.profile_service_url.clone(),
            timeouts.profile_service,
        )?);
        let store = ArtifactStore::new(environment.artifacts_path.clone());

        let engine = ExtractionEngine::new(
            pool.clone(),
            hub.clone(),
            content.clone(),
            timeouts.clone(),
        )?;

        let generator = ResumeGenerator::new(
            pool.clone(),
            hub.clone(),
            content,
            compiler,
            profiles,
            store,
            timeouts,
        );

        Ok(Self {
            pool,
            hub,
            engine,
            generator,
            analyzer: KeywordAnalyzer::default(),
        })
    }
}
