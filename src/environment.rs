// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub database_path: PathBuf,
    pub artifacts_path: PathBuf,
    pub content_service_url: String,
    pub compiler_service_url: String,
    pub profile_service_url: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

/// Timeouts for the extraction strategy chain and collaborator calls.
/// The original behavior was config-driven, so every value can be
/// overridden through the environment.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub page_fetch: Duration,
    pub per_strategy: Duration,
    pub overall_extraction: Duration,
    pub content_service: Duration,
    pub compiler_service: Duration,
    pub profile_service: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            page_fetch: Duration::from_secs(10),
            per_strategy: Duration::from_secs(10),
            overall_extraction: Duration::from_secs(30),
            content_service: Duration::from_secs(120),
            compiler_service: Duration::from_secs(60),
            profile_service: Duration::from_secs(20),
        }
    }
}

impl TimeoutConfig {
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env_secs("PAGE_FETCH_TIMEOUT_SECS") {
            config.page_fetch = secs;
        }
        if let Some(secs) = env_secs("EXTRACTION_STRATEGY_TIMEOUT_SECS") {
            config.per_strategy = secs;
        }
        if let Some(secs) = env_secs("EXTRACTION_OVERALL_TIMEOUT_SECS") {
            config.overall_extraction = secs;
        }
        if let Some(secs) = env_secs("CONTENT_SERVICE_TIMEOUT_SECS") {
            config.content_service = secs;
        }
        if let Some(secs) = env_secs("COMPILER_SERVICE_TIMEOUT_SECS") {
            config.compiler_service = secs;
        }
        if let Some(secs) = env_secs("PROFILE_SERVICE_TIMEOUT_SECS") {
            config.profile_service = secs;
        }
        config
    }
}

fn env_secs(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl EnvironmentConfig {
    /// Load configuration based on environment
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let mut config = Self::load_from_file(&environment)?;

        // Service URLs are overridable without editing config.yaml
        if let Ok(url) = std::env::var("CONTENT_SERVICE_URL") {
            config.content_service_url = url;
        }
        if let Ok(url) = std::env::var("COMPILER_SERVICE_URL") {
            config.compiler_service_url = url;
        }
        if let Ok(url) = std::env::var("PROFILE_SERVICE_URL") {
            config.profile_service_url = url;
        }

        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("RESUMEFORGE_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn load_from_file(environment: &str) -> Result<Self> {
        let config_path = PathBuf::from("config.yaml");
        if !config_path.exists() {
            anyhow::bail!("config.yaml not found in current directory. Server cannot start without configuration.");
        }

        let config_content =
            std::fs::read_to_string(&config_path).context("Failed to read config.yaml")?;

        let config_file: ConfigFile =
            serde_yaml::from_str(&config_content).context("Failed to parse config.yaml")?;

        let env_config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };

        Ok(Self {
            database_path: Self::resolve_path(&env_config.database_path)?,
            artifacts_path: Self::resolve_path(&env_config.artifacts_path)?,
            ..env_config
        })
    }

    fn resolve_path(path: &PathBuf) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.clone())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    /// Ensure all configured directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.artifacts_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to create artifacts directory: {}",
                    self.artifacts_path.display()
                )
            })?;

        if let Some(db_parent) = self.database_path.parent() {
            tokio::fs::create_dir_all(db_parent)
                .await
                .with_context(|| {
                    format!(
                        "Failed to create database directory: {}",
                        db_parent.display()
                    )
                })?;
        }

        info!("All configured directories ensured to exist");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_env_overrides_apply() {
        std::env::set_var("PAGE_FETCH_TIMEOUT_SECS", "3");
        std::env::set_var("PROFILE_SERVICE_TIMEOUT_SECS", "7");

        let config = TimeoutConfig::load();
        assert_eq!(config.page_fetch, Duration::from_secs(3));
        assert_eq!(config.profile_service, Duration::from_secs(7));
        // Untouched values keep their defaults.
        assert_eq!(config.overall_extraction, Duration::from_secs(30));

        std::env::remove_var("PAGE_FETCH_TIMEOUT_SECS");
        std::env::remove_var("PROFILE_SERVICE_TIMEOUT_SECS");
    }

    #[test]
    fn test_unparseable_timeout_falls_back_to_default() {
        std::env::set_var("COMPILER_SERVICE_TIMEOUT_SECS", "soon");
        let config = TimeoutConfig::load();
        assert_eq!(config.compiler_service, Duration::from_secs(60));
        std::env::remove_var("COMPILER_SERVICE_TIMEOUT_SECS");
    }
}
