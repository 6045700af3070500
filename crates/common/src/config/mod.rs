//! Configuration management for Pulse tooling
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use crate::auth::CredentialScheme;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Insights API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Meeting bot configuration
    #[serde(default)]
    pub bot: BotConfig,

    /// Organization directory configuration
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Memories history configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Meeting summary submitter configuration
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the insights API
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Timeout applied to every remote call, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BotConfig {
    /// Base URL of the meeting-bot service (defaults to the API base URL)
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectoryConfig {
    /// How supplied passwords are compared with stored credentials
    #[serde(default)]
    pub credential_scheme: CredentialScheme,

    /// Postgres URL of the directory; unset means use `organizations`
    pub database_url: Option<String>,

    /// Maximum number of directory connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Organizations served from memory when no database is configured
    #[serde(default)]
    pub organizations: Vec<OrganizationSeed>,
}

/// One organization entry of the in-memory directory
#[derive(Clone, Deserialize, Serialize)]
pub struct OrganizationSeed {
    pub id: String,
    pub org_name: String,
    pub password: String,
    pub tenant_id: Option<String>,
}

impl std::fmt::Debug for OrganizationSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrganizationSeed")
            .field("id", &self.id)
            .field("org_name", &self.org_name)
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// Default number of memories per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Body format used by the meeting summary submitter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryContentType {
    #[default]
    Json,
    Text,
}

impl SummaryContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            SummaryContentType::Json => "application/json",
            SummaryContentType::Text => "text/plain",
        }
    }
}

#[derive(Clone, Default, Deserialize, Serialize)]
pub struct SummaryConfig {
    /// Endpoint receiving meeting summaries
    pub endpoint_url: Option<String>,

    /// Sent verbatim as the Authorization header when set
    pub auth_token: Option<String>,

    #[serde(default)]
    pub content_type: SummaryContentType,
}

impl std::fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("content_type", &self.content_type)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. "info", "pulse_intake=debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,

    /// Service name reported in logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_api_base_url() -> String { crate::DEFAULT_API_BASE_URL.to_string() }
fn default_timeout() -> u64 { crate::DEFAULT_TIMEOUT_SECS }
fn default_max_connections() -> u32 { 5 }
fn default_connect_timeout() -> u64 { 10 }
fn default_page_size() -> u32 { 5 }
fn default_log_level() -> String { "info".to_string() }
fn default_service_name() -> String { "pulse".to_string() }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            credential_scheme: CredentialScheme::default(),
            database_url: None,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
            organizations: Vec::new(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__API__BASE_URL=https://staging.example.com
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific config file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the remote call timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Meeting-bot base URL (falls back to the API base URL)
    pub fn bot_base_url(&self) -> &str {
        self.bot.base_url.as_deref().unwrap_or(&self.api.base_url)
    }
}
