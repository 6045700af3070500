//! Session store for one authenticated operator
//!
//! Holds the identity resolved at login, the state of the single active
//! intake, and the last query result. A store is created at login and
//! cleared at logout; operations receive it explicitly by reference.

mod intake;
mod query;

pub use intake::{IntakePhase, IntakeSession};
pub use query::{QueryResult, DISPLAY_KEYS};

use crate::auth::Authenticator;
use crate::errors::{AppError, AuthError, Result};
use std::fmt;
use uuid::Uuid;

/// Authenticated organization identity
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    organization_id: String,
    tenant_id: Option<String>,
    credential: String,
}

impl Identity {
    pub fn new(
        organization_id: impl Into<String>,
        tenant_id: Option<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            tenant_id,
            credential: credential.into(),
        }
    }

    /// Value sent as `x-org-id`
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("organization_id", &self.organization_id)
            .field("tenant_id", &self.tenant_id)
            .field("credential", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    identity: Option<Identity>,
    intake: IntakeSession,
    last_query: Option<QueryResult>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate against the directory and start a fresh session.
    ///
    /// On failure the store is left untouched.
    pub async fn authenticate(
        &mut self,
        authenticator: &Authenticator,
        org_name: &str,
        password: &str,
    ) -> std::result::Result<&Identity, AuthError> {
        let identity = authenticator.authenticate(org_name, password).await?;
        Ok(self.login(identity))
    }

    /// Install an identity, discarding any previous intake and query
    pub fn login(&mut self, identity: Identity) -> &Identity {
        self.intake.reset();
        self.last_query = None;
        self.identity.insert(identity)
    }

    pub fn logout(&mut self) {
        if let Some(identity) = self.identity.take() {
            tracing::info!(organization_id = %identity.organization_id(), "Logged out");
        }
        self.intake.reset();
        self.last_query = None;
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Identity, or `NotAuthenticated` before login
    pub fn require_identity(&self) -> Result<&Identity> {
        self.identity.as_ref().ok_or(AppError::NotAuthenticated)
    }

    pub fn intake(&self) -> &IntakeSession {
        &self.intake
    }

    /// Key to attach to the next mutating intake call
    pub fn get_or_create_idempotency_key(&mut self) -> Uuid {
        self.intake.key_or_create()
    }

    /// Force a distinct key on the next mutating call
    pub fn rotate_idempotency_key(&mut self) {
        self.intake.rotate_key();
    }

    pub fn mark_initialized(&mut self, intake_id: impl Into<String>) {
        self.intake.initialize(intake_id.into());
    }

    pub fn mark_finalized(&mut self) {
        self.intake.finalize();
    }

    /// Forget the active intake locally
    pub fn reset_intake(&mut self) {
        self.intake.reset();
    }

    pub fn record_query(&mut self, result: QueryResult) -> &QueryResult {
        self.last_query.insert(result)
    }

    pub fn last_query(&self) -> Option<&QueryResult> {
        self.last_query.as_ref()
    }

    pub fn clear_last_query(&mut self) {
        self.last_query = None;
    }
}
