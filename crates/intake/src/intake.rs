//! Intake lifecycle client
//!
//! Drives `Uninitialized -> Initialized -> Finalized` against the insights
//! API. Every operation checks identity and phase before touching the
//! network, and only mutates the session after a successful response.

use crate::api::{BotRequest, InsightsApi, QueryRequest, RemoteAck};
use crate::upload::UploadFile;
use pulse_common::errors::{AppError, Result};
use pulse_common::metrics::{record_transition, record_upload};
use pulse_common::{IntakePhase, QueryResult, SessionStore};
use validator::Validate;

/// Intake, query and meeting-bot operations for one session
#[derive(Clone)]
pub struct IntakeClient {
    api: InsightsApi,
}

impl IntakeClient {
    pub fn new(api: InsightsApi) -> Self {
        Self { api }
    }

    /// Start a new intake. Only valid while `Uninitialized`.
    ///
    /// The pending idempotency key survives a failure so a retry reuses it.
    pub async fn init(&self, session: &mut SessionStore) -> Result<String> {
        let org_id = session.require_identity()?.organization_id().to_string();
        require_phase(session, "init", IntakePhase::Uninitialized)?;

        let key = session.get_or_create_idempotency_key();
        let intake_id = self.api.init_intake(&org_id, key).await?;

        session.mark_initialized(intake_id.clone());
        record_transition(IntakePhase::Initialized);
        tracing::info!(organization_id = %org_id, intake_id = %intake_id, "Intake initialized");

        Ok(intake_id)
    }

    /// Upload a file to the active intake
    pub async fn upload_file(&self, session: &mut SessionStore, file: &UploadFile) -> Result<RemoteAck> {
        let org_id = session.require_identity()?.organization_id().to_string();
        let intake_id = active_intake(session, "upload file")?;

        let key = session.get_or_create_idempotency_key();
        let ack = self.api.upload_file(&org_id, key, &intake_id, file).await?;

        session.rotate_idempotency_key();
        record_upload("file");
        tracing::info!(
            intake_id = %intake_id,
            file_name = %file.file_name(),
            size = file.len(),
            "File uploaded"
        );

        Ok(ack)
    }

    /// Upload free text to the active intake
    pub async fn upload_text(&self, session: &mut SessionStore, text: &str) -> Result<RemoteAck> {
        let org_id = session.require_identity()?.organization_id().to_string();
        let intake_id = active_intake(session, "upload text")?;
        if text.trim().is_empty() {
            return Err(AppError::validation("text_content", "text must not be blank"));
        }

        let key = session.get_or_create_idempotency_key();
        let ack = self.api.upload_text(&org_id, key, &intake_id, text).await?;

        session.rotate_idempotency_key();
        record_upload("text");
        tracing::info!(intake_id = %intake_id, chars = text.chars().count(), "Text uploaded");

        Ok(ack)
    }

    /// Fetch the remote status of the active intake
    pub async fn status(&self, session: &SessionStore) -> Result<serde_json::Value> {
        let org_id = session.require_identity()?.organization_id();
        let intake_id = active_intake(session, "check status")?;

        Ok(self.api.intake_status(org_id, &intake_id).await?)
    }

    /// Close the active intake; state is unchanged on failure
    pub async fn finalize(&self, session: &mut SessionStore) -> Result<RemoteAck> {
        let org_id = session.require_identity()?.organization_id().to_string();
        let intake_id = active_intake(session, "finalize")?;

        let ack = self.api.finalize_intake(&org_id, &intake_id).await?;

        session.mark_finalized();
        record_transition(IntakePhase::Finalized);
        tracing::info!(intake_id = %intake_id, "Intake finalized");

        Ok(ack)
    }

    /// Forget the active intake locally. Always succeeds.
    pub fn reset(&self, session: &mut SessionStore) {
        let previous = session.intake().phase();
        session.reset_intake();
        record_transition(IntakePhase::Uninitialized);
        tracing::info!(previous_phase = %previous, "Intake reset");
    }

    /// Ask a natural-language question; the result becomes the last query
    pub async fn query(&self, session: &mut SessionStore, question: &str) -> Result<QueryResult> {
        let org_id = session.require_identity()?.organization_id().to_string();
        let request = QueryRequest {
            question: question.trim().to_string(),
        };
        request.validate()?;

        let payload = self.api.query(&org_id, &request).await?;
        let result = QueryResult::new(request.question, payload);
        Ok(session.record_query(result).clone())
    }

    /// Ask the meeting bot to join and transcribe a meeting
    pub async fn add_bot_to_meeting(&self, session: &SessionStore, meeting_url: &str) -> Result<RemoteAck> {
        let identity = session.require_identity()?;
        let request = BotRequest::new(meeting_url, identity.organization_id(), identity.tenant_id());
        request.validate()?;
        if !(request.meeting_url.starts_with("http://") || request.meeting_url.starts_with("https://")) {
            return Err(AppError::validation("meeting_url", "meeting URL must use http or https"));
        }

        let ack = self.api.add_bot(&request).await?;
        tracing::info!(organization_id = %identity.organization_id(), "Meeting bot requested");
        Ok(ack)
    }
}

fn require_phase(session: &SessionStore, operation: &'static str, expected: IntakePhase) -> Result<()> {
    let phase = session.intake().phase();
    if phase != expected {
        tracing::debug!(operation, phase = %phase, "Rejected by phase guard");
        return Err(AppError::InvalidPhase { operation, phase });
    }
    Ok(())
}

/// Intake id of an `Initialized` intake
fn active_intake(session: &SessionStore, operation: &'static str) -> Result<String> {
    require_phase(session, operation, IntakePhase::Initialized)?;
    session
        .intake()
        .intake_id()
        .map(String::from)
        .ok_or(AppError::InvalidPhase {
            operation,
            phase: session.intake().phase(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{IDEMPOTENCY_KEY_HEADER, ORG_ID_HEADER};
    use pulse_common::errors::ApiError;
    use pulse_common::Identity;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> IntakeClient {
        let api = InsightsApi::new(&server.uri(), &server.uri(), Duration::from_secs(5)).unwrap();
        IntakeClient::new(api)
    }

    fn logged_in() -> SessionStore {
        let mut store = SessionStore::new();
        store.login(Identity::new("org-1", Some("tenant-9".into()), "pw"));
        store
    }

    async fn mount_init(server: &MockServer, intake_id: &str) {
        Mock::given(method("POST"))
            .and(path("/api/intakes/init"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"intake_id": intake_id})))
            .mount(server)
            .await;
    }

    fn key_header(request: &wiremock::Request) -> String {
        request
            .headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_init_transitions_to_initialized() {
        let server = MockServer::start().await;
        mount_init(&server, "abc-123").await;

        let client = client_for(&server);
        let mut store = logged_in();
        let intake_id = tokio_test::assert_ok!(client.init(&mut store).await);

        assert_eq!(intake_id, "abc-123");
        assert_eq!(store.intake().phase(), IntakePhase::Initialized);
        assert_eq!(store.intake().intake_id(), Some("abc-123"));
        assert!(store.intake().idempotency_key().is_some());
    }

    #[tokio::test]
    async fn test_init_failure_keeps_pending_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/intakes/init"))
            .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut store = logged_in();

        let err = client.init(&mut store).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Api(ApiError::Remote { status: 500, ref body }) if body == "server error"
        ));
        assert_eq!(store.intake().phase(), IntakePhase::Uninitialized);

        let _ = client.init(&mut store).await.unwrap_err();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(key_header(&requests[0]), key_header(&requests[1]));
        assert_eq!(
            store.intake().idempotency_key().map(|k| k.to_string()),
            Some(key_header(&requests[0]))
        );
    }

    #[tokio::test]
    async fn test_init_twice_is_invalid_phase() {
        let server = MockServer::start().await;
        mount_init(&server, "abc-123").await;

        let client = client_for(&server);
        let mut store = logged_in();
        client.init(&mut store).await.unwrap();

        let err = client.init(&mut store).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidPhase { operation: "init", phase: IntakePhase::Initialized }
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_before_init_never_reaches_network() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        let mut store = logged_in();

        let err = client.upload_text(&mut store, "hello").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPhase { phase: IntakePhase::Uninitialized, .. }));

        let file = UploadFile::guessed(b"data".to_vec(), "a.txt").unwrap();
        let err = client.upload_file(&mut store, &file).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPhase { operation: "upload file", .. }));

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unauthenticated_operations_rejected() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        let mut store = SessionStore::new();

        assert!(matches!(client.init(&mut store).await, Err(AppError::NotAuthenticated)));
        assert!(matches!(client.query(&mut store, "hi").await, Err(AppError::NotAuthenticated)));
        assert!(matches!(
            client.add_bot_to_meeting(&store, "https://meet.example.com/x").await,
            Err(AppError::NotAuthenticated)
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_lifecycle_rotates_keys() {
        let server = MockServer::start().await;
        mount_init(&server, "abc-123").await;
        Mock::given(method("POST"))
            .and(path("/api/upload/text/abc-123"))
            .and(header(ORG_ID_HEADER, "org-1"))
            .and(body_string_contains("text_content="))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/upload/file/abc-123"))
            .and(body_string_contains("name=\"file\""))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/intakes/abc-123/finalize"))
            .respond_with(ResponseTemplate::new(200).set_body_string("finalized"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut store = logged_in();

        client.init(&mut store).await.unwrap();
        let init_key = store.intake().idempotency_key();

        client.upload_text(&mut store, "first note").await.unwrap();
        let after_first = store.intake().idempotency_key();
        assert_ne!(after_first, init_key);

        let file = UploadFile::guessed(b"hello".to_vec(), "notes.txt").unwrap();
        client.upload_file(&mut store, &file).await.unwrap();
        client.upload_text(&mut store, "second note").await.unwrap();

        let ack = client.finalize(&mut store).await.unwrap();
        assert_eq!(ack.body, "finalized");
        assert_eq!(store.intake().phase(), IntakePhase::Finalized);
        assert_eq!(store.intake().intake_id(), Some("abc-123"));
        assert!(store.intake().idempotency_key().is_none());

        let requests = server.received_requests().await.unwrap();
        let keys: Vec<String> = requests[..4].iter().map(key_header).collect();
        assert_eq!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_ne!(keys[2], keys[3]);
        assert!(key_header(&requests[4]).is_empty());
    }

    #[tokio::test]
    async fn test_failed_upload_does_not_rotate() {
        let server = MockServer::start().await;
        mount_init(&server, "abc-123").await;
        Mock::given(method("POST"))
            .and(path("/api/upload/text/abc-123"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut store = logged_in();
        client.init(&mut store).await.unwrap();
        let key = store.intake().idempotency_key();

        let err = client.upload_text(&mut store, "note").await.unwrap_err();
        assert_eq!(err.remote_status(), Some(503));
        assert_eq!(store.intake().idempotency_key(), key);
        assert_eq!(store.intake().phase(), IntakePhase::Initialized);
    }

    #[tokio::test]
    async fn test_blank_text_rejected_locally() {
        let server = MockServer::start().await;
        mount_init(&server, "abc-123").await;

        let client = client_for(&server);
        let mut store = logged_in();
        client.init(&mut store).await.unwrap();

        let err = client.upload_text(&mut store, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_finalize_failure_allows_retry() {
        let server = MockServer::start().await;
        mount_init(&server, "abc-123").await;
        Mock::given(method("POST"))
            .and(path("/api/intakes/abc-123/finalize"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/intakes/abc-123/finalize"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut store = logged_in();
        client.init(&mut store).await.unwrap();

        assert!(client.finalize(&mut store).await.is_err());
        assert_eq!(store.intake().phase(), IntakePhase::Initialized);

        client.finalize(&mut store).await.unwrap();
        assert_eq!(store.intake().phase(), IntakePhase::Finalized);

        let err = client.status(&store).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPhase { phase: IntakePhase::Finalized, .. }));
    }

    #[tokio::test]
    async fn test_status_returns_opaque_payload() {
        let server = MockServer::start().await;
        mount_init(&server, "abc-123").await;
        Mock::given(method("GET"))
            .and(path("/api/intakes/abc-123"))
            .and(header(ORG_ID_HEADER, "org-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": 2, "state": "open"})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut store = logged_in();
        client.init(&mut store).await.unwrap();

        let status = client.status(&store).await.unwrap();
        assert_eq!(status["files"], 2);
        assert_eq!(store.intake().phase(), IntakePhase::Initialized);
    }

    #[tokio::test]
    async fn test_reset_then_init_again() {
        let server = MockServer::start().await;
        mount_init(&server, "abc-123").await;

        let client = client_for(&server);
        let mut store = logged_in();
        client.init(&mut store).await.unwrap();
        let first_key = store.intake().idempotency_key();

        client.reset(&mut store);
        assert_eq!(store.intake().phase(), IntakePhase::Uninitialized);
        assert!(store.intake().intake_id().is_none());
        assert!(store.intake().idempotency_key().is_none());

        client.init(&mut store).await.unwrap();
        assert_ne!(store.intake().idempotency_key(), first_key);
    }

    #[tokio::test]
    async fn test_query_caches_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/query"))
            .and(header(ORG_ID_HEADER, "org-1"))
            .and(body_json(json!({"question": "What changed?"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "X"})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut store = logged_in();
        let result = client.query(&mut store, "  What changed?  ").await.unwrap();

        assert_eq!(result.display_text(), "X");
        assert_eq!(store.last_query().map(|q| q.question.as_str()), Some("What changed?"));
    }

    #[tokio::test]
    async fn test_long_query_is_sent() {
        let server = MockServer::start().await;
        let question = "why ".repeat(1_500).trim_end().to_string();
        Mock::given(method("POST"))
            .and(path("/api/query"))
            .and(body_json(json!({"question": question})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"insights": "long"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut store = logged_in();
        let result = client.query(&mut store, &question).await.unwrap();
        assert_eq!(result.display_text(), "long");
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        let mut store = logged_in();

        let err = client.query(&mut store, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_bot_sends_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/add_scooby"))
            .and(body_json(json!({
                "meeting_url": "https://meet.example.com/abc",
                "x_org_id": "org-1",
                "tenant_id": "tenant-9",
                "isTranscript": true,
                "saveTranscript": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("joined"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let store = logged_in();
        let ack = client
            .add_bot_to_meeting(&store, "https://meet.example.com/abc")
            .await
            .unwrap();
        assert_eq!(ack.body, "joined");
    }

    #[tokio::test]
    async fn test_add_bot_rejects_bad_url() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        let store = logged_in();

        let err = client.add_bot_to_meeting(&store, "not a url").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = client.add_bot_to_meeting(&store, "ftp://meet.example.com/x").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
