//! Insights API transport
//!
//! One method per remote endpoint. Every call carries the organization
//! header, runs under the configured timeout, and is classified into
//! `ApiError::{Remote, Transport, Parse}` before it reaches the caller.

use crate::history::MemoryPage;
use crate::upload::UploadFile;
use pulse_common::errors::{ApiError, AppError, Result};
use pulse_common::metrics::{CallOutcome, RemoteCallMetrics};
use pulse_common::AppConfig;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

/// Organization header sent on every insights API call
pub const ORG_ID_HEADER: &str = "x-org-id";

/// Deduplication token header for mutating intake calls
pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

/// Successful response whose body the client does not interpret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAck {
    pub status: u16,
    pub body: String,
}

impl RemoteAck {
    /// Body parsed as JSON, when it is JSON
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

#[derive(Deserialize)]
struct InitResponse {
    intake_id: String,
}

/// Natural-language query request
#[derive(Debug, Serialize, Validate)]
pub struct QueryRequest {
    #[validate(length(min = 1))]
    pub question: String,
}

/// Meeting bot join request
#[derive(Debug, Serialize, Validate)]
pub struct BotRequest {
    #[validate(url)]
    pub meeting_url: String,

    pub x_org_id: String,

    pub tenant_id: Option<String>,

    #[serde(rename = "isTranscript")]
    pub is_transcript: bool,

    #[serde(rename = "saveTranscript")]
    pub save_transcript: bool,
}

impl BotRequest {
    /// Request with both capture flags set
    pub fn new(meeting_url: &str, org_id: &str, tenant_id: Option<&str>) -> Self {
        Self {
            meeting_url: meeting_url.trim().to_string(),
            x_org_id: org_id.to_string(),
            tenant_id: tenant_id.map(String::from),
            is_transcript: true,
            save_transcript: true,
        }
    }
}

/// HTTP client for the insights API and the meeting bot service
#[derive(Clone)]
pub struct InsightsApi {
    client: reqwest::Client,
    base_url: String,
    bot_base_url: String,
}

impl InsightsApi {
    /// Create a client with a uniform per-request timeout
    pub fn new(base_url: &str, bot_base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_base_url: bot_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.api.base_url, config.bot_base_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /api/intakes/init`
    pub async fn init_intake(&self, org_id: &str, key: Uuid) -> std::result::Result<String, ApiError> {
        let request = self
            .client
            .post(self.url("/api/intakes/init"))
            .header(ORG_ID_HEADER, org_id)
            .header(IDEMPOTENCY_KEY_HEADER, key.to_string());

        let response: InitResponse = self.execute_json("intake_init", request).await?;
        Ok(response.intake_id)
    }

    /// `POST /api/upload/file/{intake_id}` as multipart field `file`
    pub async fn upload_file(
        &self,
        org_id: &str,
        key: Uuid,
        intake_id: &str,
        file: &UploadFile,
    ) -> std::result::Result<RemoteAck, ApiError> {
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.file_name().to_string())
            .mime_str(file.mime_type().as_ref())?;
        let form = Form::new().part("file", part);

        let request = self
            .client
            .post(self.url(&format!("/api/upload/file/{}", intake_id)))
            .header(ORG_ID_HEADER, org_id)
            .header(IDEMPOTENCY_KEY_HEADER, key.to_string())
            .multipart(form);

        self.execute("upload_file", request).await
    }

    /// `POST /api/upload/text/{intake_id}` as form field `text_content`
    pub async fn upload_text(
        &self,
        org_id: &str,
        key: Uuid,
        intake_id: &str,
        text: &str,
    ) -> std::result::Result<RemoteAck, ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/api/upload/text/{}", intake_id)))
            .header(ORG_ID_HEADER, org_id)
            .header(IDEMPOTENCY_KEY_HEADER, key.to_string())
            .form(&[("text_content", text)]);

        self.execute("upload_text", request).await
    }

    /// `GET /api/intakes/{intake_id}`
    pub async fn intake_status(
        &self,
        org_id: &str,
        intake_id: &str,
    ) -> std::result::Result<serde_json::Value, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/api/intakes/{}", intake_id)))
            .header(ORG_ID_HEADER, org_id);

        self.execute_json("intake_status", request).await
    }

    /// `POST /api/intakes/{intake_id}/finalize`
    pub async fn finalize_intake(
        &self,
        org_id: &str,
        intake_id: &str,
    ) -> std::result::Result<RemoteAck, ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/api/intakes/{}/finalize", intake_id)))
            .header(ORG_ID_HEADER, org_id);

        self.execute("intake_finalize", request).await
    }

    /// `POST /api/query`; the body is returned verbatim
    pub async fn query(
        &self,
        org_id: &str,
        request: &QueryRequest,
    ) -> std::result::Result<serde_json::Value, ApiError> {
        let request = self
            .client
            .post(self.url("/api/query"))
            .header(ORG_ID_HEADER, org_id)
            .json(request);

        self.execute_json("query", request).await
    }

    /// `POST {bot_base_url}/add_scooby`
    pub async fn add_bot(&self, request: &BotRequest) -> std::result::Result<RemoteAck, ApiError> {
        let request = self
            .client
            .post(format!("{}/add_scooby", self.bot_base_url))
            .json(request);

        self.execute("add_bot", request).await
    }

    /// `GET /api/memories?page=&page_size=`
    pub async fn list_memories(
        &self,
        org_id: &str,
        page: u32,
        page_size: u32,
    ) -> std::result::Result<MemoryPage, ApiError> {
        let request = self
            .client
            .get(self.url("/api/memories"))
            .header(ORG_ID_HEADER, org_id)
            .query(&[("page", page), ("page_size", page_size)]);

        self.execute_json("list_memories", request).await
    }

    /// Send a request whose success body is not interpreted
    pub(crate) async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> std::result::Result<RemoteAck, ApiError> {
        let metrics = RemoteCallMetrics::start(operation);
        let result = send(operation, request).await;
        metrics.finish(outcome(&result));
        result
    }

    /// Send a request whose success body must be JSON of type `T`
    async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> std::result::Result<T, ApiError> {
        let metrics = RemoteCallMetrics::start(operation);
        let result = send(operation, request)
            .await
            .and_then(|ack| parse_json(operation, &ack.body));
        metrics.finish(outcome(&result));
        result
    }
}

/// Issue one request and classify the response by status
pub(crate) async fn send(
    operation: &'static str,
    request: RequestBuilder,
) -> std::result::Result<RemoteAck, ApiError> {
    tracing::debug!(operation, "Sending request");

    let response = request.send().await.map_err(|e| {
        let err = ApiError::from(e);
        tracing::warn!(operation, error = %err, "Remote call did not complete");
        err
    })?;

    let status = response.status();
    let body = response.text().await.map_err(ApiError::from)?;

    if status.is_success() {
        tracing::debug!(operation, status = status.as_u16(), "Remote call succeeded");
        Ok(RemoteAck {
            status: status.as_u16(),
            body,
        })
    } else {
        tracing::warn!(operation, status = status.as_u16(), body = %body, "Remote call rejected");
        Err(ApiError::Remote {
            status: status.as_u16(),
            body,
        })
    }
}

fn parse_json<T: DeserializeOwned>(operation: &'static str, raw: &str) -> std::result::Result<T, ApiError> {
    serde_json::from_str(raw).map_err(|e| {
        tracing::warn!(operation, error = %e, "Response body did not match expected JSON");
        ApiError::Parse {
            raw: raw.to_string(),
        }
    })
}

pub(crate) fn outcome<T>(result: &std::result::Result<T, ApiError>) -> CallOutcome {
    match result {
        Ok(_) => CallOutcome::Success,
        Err(ApiError::Remote { .. }) => CallOutcome::Remote,
        Err(ApiError::Transport { .. }) => CallOutcome::Transport,
        Err(ApiError::Parse { .. }) => CallOutcome::Parse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_common::errors::TransportKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> InsightsApi {
        InsightsApi::new(&server.uri(), &server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_init_extracts_intake_id() {
        let server = MockServer::start().await;
        let key = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/api/intakes/init"))
            .and(header(ORG_ID_HEADER, "org-1"))
            .and(header(IDEMPOTENCY_KEY_HEADER, key.to_string().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"intake_id": "abc-123"})))
            .expect(1)
            .mount(&server)
            .await;

        let intake_id = api_for(&server).init_intake("org-1", key).await.unwrap();
        assert_eq!(intake_id, "abc-123");
    }

    #[tokio::test]
    async fn test_init_without_intake_id_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/intakes/init"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let err = api_for(&server).init_intake("org-1", Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err, ApiError::Parse { raw: "<html>ok</html>".into() });
    }

    #[tokio::test]
    async fn test_remote_error_keeps_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/intakes/abc-123"))
            .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
            .mount(&server)
            .await;

        let err = api_for(&server).intake_status("org-1", "abc-123").await.unwrap_err();
        assert_eq!(err, ApiError::Remote { status: 500, body: "server error".into() });
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let api = InsightsApi::new(&uri, &uri, Duration::from_secs(5)).unwrap();
        let err = api.intake_status("org-1", "abc-123").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { kind: TransportKind::Connect, .. }));
    }

    #[tokio::test]
    async fn test_slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/query"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"answer": "late"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let api = InsightsApi::new(&server.uri(), &server.uri(), Duration::from_millis(200)).unwrap();
        let request = QueryRequest { question: "anything?".into() };
        let err = api.query("org-1", &request).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_memories_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/memories"))
            .and(header(ORG_ID_HEADER, "org-1"))
            .and(query_param("page", "2"))
            .and(query_param("page_size", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "memories": [{"title": "Weekly sync"}],
                "pagination": {"total_count": 11, "page": 2, "total_pages": 2, "has_next": false, "has_prev": true}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = api_for(&server).list_memories("org-1", 2, 10).await.unwrap();
        assert_eq!(page.memories.len(), 1);
        assert_eq!(page.pagination.total_count, 11);
        assert!(page.pagination.has_prev);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = InsightsApi::new("http://localhost:9000/", "http://bot/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:9000");
        assert_eq!(api.url("/api/query"), "http://localhost:9000/api/query");
    }

    #[test]
    fn test_bot_request_shape() {
        let request = BotRequest::new(" https://meet.example.com/abc ", "org-1", Some("tenant-9"));
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "meeting_url": "https://meet.example.com/abc",
                "x_org_id": "org-1",
                "tenant_id": "tenant-9",
                "isTranscript": true,
                "saveTranscript": true
            })
        );
    }

    #[test]
    fn test_ack_json() {
        let ack = RemoteAck { status: 200, body: "{\"ok\":true}".into() };
        assert_eq!(ack.json(), Some(json!({"ok": true})));
        let ack = RemoteAck { status: 200, body: "done".into() };
        assert!(ack.json().is_none());
    }
}
