//! Database layer for the organization directory
//!
//! Provides:
//! - SeaORM entity models for organizations and tenant mappings
//! - `PgDirectory`, the Postgres-backed `OrganizationDirectory`

pub mod models;

use crate::auth::{OrganizationDirectory, OrganizationRecord};
use crate::config::DirectoryConfig;
use crate::errors::AuthError;
use async_trait::async_trait;
use models::*;
use sea_orm::{ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, QueryFilter};
use std::time::Duration;
use tracing::info;

/// Organization directory stored in Postgres
pub struct PgDirectory {
    conn: DatabaseConnection,
}

impl PgDirectory {
    /// Wrap an existing connection
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Connect using the directory configuration
    pub async fn connect(url: &str, config: &DirectoryConfig) -> Result<Self, AuthError> {
        info!("Connecting to directory database...");

        let mut opts = ConnectOptions::new(url);
        opts.max_connections(config.max_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AuthError::Directory {
                message: format!("Failed to connect to directory: {}", e),
            })?;

        info!("Directory connection established");
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl OrganizationDirectory for PgDirectory {
    async fn find_by_name(&self, org_name: &str) -> Result<Option<OrganizationRecord>, AuthError> {
        let organization = OrganizationEntity::find()
            .filter(OrganizationColumn::OrgName.eq(org_name))
            .one(&self.conn)
            .await?;

        Ok(organization.map(Into::into))
    }

    async fn tenant_for(&self, org_id: &str) -> Result<Option<String>, AuthError> {
        let mapping = OrganizationTenantEntity::find_by_id(org_id.to_string())
            .one(&self.conn)
            .await?;

        Ok(mapping.map(|m| m.tenant_id))
    }
}
