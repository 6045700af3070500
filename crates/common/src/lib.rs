//! Pulse Common Library
//!
//! Shared code for the Pulse intake tooling including:
//! - Configuration management
//! - Error types and classification
//! - Organization directory lookups and credential checks
//! - Session store (identity, intake lifecycle state, last query)
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod session;

// Re-export commonly used types
pub use auth::{Authenticator, OrganizationDirectory};
pub use config::AppConfig;
pub use errors::{ApiError, AppError, AuthError, Result};
pub use session::{Identity, IntakePhase, IntakeSession, QueryResult, SessionStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default insights API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://dev.pulse-api.getpulseinsights.ai";

/// Default timeout applied to every remote call
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
