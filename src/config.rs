// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::{FileStorage, ServiceClient};
use crate::session::SessionStore;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_STORAGE_DIR: &str = ".resume-scorer";
const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub environment: String,
    pub api_url: String,
    /// Scope of the persisted session. Defaults to the API URL.
    pub origin: String,
    pub storage_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    /// Transport timeout. `None` leaves the HTTP client default in place.
    pub timeout_seconds: Option<u64>,
}

/// One environment section of `config.yaml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct EnvironmentSection {
    api_url: Option<String>,
    origin: Option<String>,
    storage_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: EnvironmentSection,
    #[serde(default)]
    production: EnvironmentSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: "local".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            origin: DEFAULT_API_URL.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            log_file: None,
            timeout_seconds: None,
        }
    }
}

impl ClientConfig {
    /// Load `config.yaml` from the working directory if present, then apply
    /// environment variable overrides.
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        let config_path = std::env::var("RESUME_SCORER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE));

        let section = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            Self::section_from_yaml(&content, &environment)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            EnvironmentSection::default()
        };

        let mut config = Self::from_section(environment, section);
        config.apply_env_overrides()?;
        config.storage_dir = Self::resolve_path(&config.storage_dir)?;
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("RESUME_SCORER_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn section_from_yaml(content: &str, environment: &str) -> Result<EnvironmentSection> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        Ok(match environment {
            "production" => file.production,
            _ => file.local,
        })
    }

    fn from_section(environment: String, section: EnvironmentSection) -> Self {
        let defaults = Self::default();
        let api_url = section.api_url.unwrap_or(defaults.api_url);
        let origin = section.origin.unwrap_or_else(|| api_url.clone());

        Self {
            environment,
            api_url,
            origin,
            storage_dir: section.storage_dir.unwrap_or(defaults.storage_dir),
            log_file: section.log_file,
            timeout_seconds: section.timeout_seconds,
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("RESUME_SCORER_API_URL") {
            self.with_api_url(url);
        }
        if let Ok(origin) = std::env::var("RESUME_SCORER_ORIGIN") {
            self.origin = origin;
        }
        if let Ok(dir) = std::env::var("RESUME_SCORER_STORAGE_DIR") {
            self.storage_dir = PathBuf::from(dir);
        }
        if let Ok(file) = std::env::var("RESUME_SCORER_LOG_FILE") {
            self.log_file = Some(PathBuf::from(file));
        }
        if let Ok(secs) = std::env::var("RESUME_SCORER_TIMEOUT_SECS") {
            self.timeout_seconds = Some(
                secs.parse::<u64>()
                    .context("RESUME_SCORER_TIMEOUT_SECS must be a number of seconds")?,
            );
        }
        Ok(())
    }

    /// Point at another API. The origin follows unless it was set separately.
    pub fn with_api_url(&mut self, url: String) -> &mut Self {
        if self.origin == self.api_url {
            self.origin = url.clone();
        }
        self.api_url = url;
        self
    }

    /// One-line description for the startup log. Logged by the binary once
    /// the subscriber is installed.
    pub fn summary(&self) -> String {
        format!(
            "environment={} api_url={} origin={} storage_dir={}",
            self.environment,
            self.api_url,
            self.origin,
            self.storage_dir.display()
        )
    }

    fn resolve_path(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            let current_dir = std::env::current_dir().context("Failed to get current directory")?;
            Ok(current_dir.join(path))
        }
    }

    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(Arc::new(FileStorage::for_origin(
            &self.storage_dir,
            &self.origin,
        )))
    }

    pub fn service_client(&self) -> Result<ServiceClient> {
        ServiceClient::new(self.api_url.clone(), self.timeout_seconds)
    }
}
