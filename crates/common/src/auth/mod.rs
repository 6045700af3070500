//! Organization directory and credential checks
//!
//! Provides:
//! - The `OrganizationDirectory` lookup abstraction
//! - An in-memory directory (seeded from configuration or tests)
//! - Credential comparison schemes (plaintext, argon2)
//! - `Authenticator`, which turns a name/password pair into an `Identity`

use crate::config::{DirectoryConfig, OrganizationSeed};
use crate::db::PgDirectory;
use crate::errors::AuthError;
use crate::session::Identity;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Directory row for an organization
#[derive(Clone, PartialEq, Eq)]
pub struct OrganizationRecord {
    pub id: String,
    pub org_name: String,
    /// Stored credential; plaintext or an argon2 PHC string depending on scheme
    pub password: String,
}

impl std::fmt::Debug for OrganizationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrganizationRecord")
            .field("id", &self.id)
            .field("org_name", &self.org_name)
            .finish_non_exhaustive()
    }
}

/// Lookup interface for the organization directory
#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    /// Find an organization by its display name
    async fn find_by_name(&self, org_name: &str) -> Result<Option<OrganizationRecord>, AuthError>;

    /// Resolve the tenant id for an organization id
    async fn tenant_for(&self, org_id: &str) -> Result<Option<String>, AuthError>;
}

/// Directory held entirely in memory
#[derive(Debug, Default, Clone)]
pub struct InMemoryDirectory {
    organizations: HashMap<String, OrganizationRecord>,
    tenants: HashMap<String, String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an organization (builder style)
    pub fn with_organization(
        mut self,
        id: &str,
        org_name: &str,
        password: &str,
        tenant_id: Option<&str>,
    ) -> Self {
        self.organizations.insert(
            org_name.to_string(),
            OrganizationRecord {
                id: id.to_string(),
                org_name: org_name.to_string(),
                password: password.to_string(),
            },
        );
        if let Some(tenant_id) = tenant_id {
            self.tenants.insert(id.to_string(), tenant_id.to_string());
        }
        self
    }

    pub fn from_seeds(seeds: &[OrganizationSeed]) -> Self {
        seeds.iter().fold(Self::new(), |directory, seed| {
            directory.with_organization(
                &seed.id,
                &seed.org_name,
                &seed.password,
                seed.tenant_id.as_deref(),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.organizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
    }
}

#[async_trait]
impl OrganizationDirectory for InMemoryDirectory {
    async fn find_by_name(&self, org_name: &str) -> Result<Option<OrganizationRecord>, AuthError> {
        Ok(self.organizations.get(org_name).cloned())
    }

    async fn tenant_for(&self, org_id: &str) -> Result<Option<String>, AuthError> {
        Ok(self.tenants.get(org_id).cloned())
    }
}

/// How a supplied password is compared with the stored credential
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialScheme {
    /// Direct string equality against a plaintext column
    #[default]
    Plaintext,
    /// Stored value is an argon2 PHC hash
    Argon2,
}

impl CredentialScheme {
    pub fn verify(&self, supplied: &str, stored: &str) -> bool {
        match self {
            CredentialScheme::Plaintext => supplied == stored,
            CredentialScheme::Argon2 => match PasswordHash::new(stored) {
                Ok(parsed) => Argon2::default()
                    .verify_password(supplied.as_bytes(), &parsed)
                    .is_ok(),
                Err(e) => {
                    tracing::warn!(error = %e, "Stored credential is not a valid argon2 hash");
                    false
                }
            },
        }
    }
}

/// Hash a password with a random salt for storage under `CredentialScheme::Argon2`
pub fn hash_credential(password: &str) -> Result<String, AuthError> {
    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Directory {
        message: format!("Failed to encode salt: {}", e),
    })?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Directory {
            message: format!("Failed to hash credential: {}", e),
        })
}

/// Resolves organization credentials into an `Identity`
#[derive(Clone)]
pub struct Authenticator {
    directory: Arc<dyn OrganizationDirectory>,
    scheme: CredentialScheme,
}

impl Authenticator {
    pub fn new(directory: Arc<dyn OrganizationDirectory>, scheme: CredentialScheme) -> Self {
        Self { directory, scheme }
    }

    pub async fn authenticate(&self, org_name: &str, password: &str) -> Result<Identity, AuthError> {
        let record = self
            .directory
            .find_by_name(org_name)
            .await?
            .ok_or_else(|| {
                tracing::warn!(org_name = %org_name, "Organization not found");
                AuthError::NotFound {
                    org_name: org_name.to_string(),
                }
            })?;

        if !self.scheme.verify(password, &record.password) {
            tracing::warn!(organization_id = %record.id, "Credential rejected");
            return Err(AuthError::InvalidCredential);
        }

        let tenant_id = self.directory.tenant_for(&record.id).await?;
        if tenant_id.is_none() {
            tracing::debug!(organization_id = %record.id, "No tenant mapped for organization");
        }

        tracing::info!(
            organization_id = %record.id,
            tenant_id = tenant_id.as_deref().unwrap_or("-"),
            "Authenticated"
        );

        Ok(Identity::new(record.id, tenant_id, password))
    }
}

/// Create a directory based on configuration.
///
/// A configured database URL selects the Postgres directory; otherwise the
/// organizations listed in configuration are served from memory.
pub async fn create_directory(
    config: &DirectoryConfig,
) -> Result<Arc<dyn OrganizationDirectory>, AuthError> {
    match config.database_url.as_deref() {
        Some(url) => {
            let directory = PgDirectory::connect(url, config).await?;
            Ok(Arc::new(directory))
        }
        None => {
            if config.organizations.is_empty() {
                tracing::warn!("No directory database or seeded organizations configured");
            }
            Ok(Arc::new(InMemoryDirectory::from_seeds(&config.organizations)))
        }
    }
}
