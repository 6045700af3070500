//! Meeting summary submitter

use crate::api::{outcome, send, RemoteAck};
use chrono::{DateTime, Utc};
use pulse_common::config::{SummaryConfig, SummaryContentType};
use pulse_common::errors::{ApiError, AppError, Result};
use pulse_common::metrics::RemoteCallMetrics;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;

/// A meeting summary as entered by the operator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingSummary {
    pub title: Option<String>,
    pub date: Option<String>,
    pub summary: String,
    pub attendees: Vec<String>,
    pub action_items: Vec<String>,
}

impl MeetingSummary {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = non_blank(title.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = non_blank(date.into());
        self
    }

    /// Attendees from a comma-separated list
    pub fn with_attendees(mut self, raw: &str) -> Self {
        self.attendees = parse_attendees(raw);
        self
    }

    /// Action items, one per line
    pub fn with_action_items(mut self, raw: &str) -> Self {
        self.action_items = parse_action_items(raw);
        self
    }

    fn payload(&self, timestamp: DateTime<Utc>) -> SummaryPayload<'_> {
        SummaryPayload {
            title: self.title.as_deref(),
            date: self.date.as_deref(),
            summary: &self.summary,
            attendees: &self.attendees,
            action_items: &self.action_items,
            timestamp: timestamp.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct SummaryPayload<'a> {
    title: Option<&'a str>,
    date: Option<&'a str>,
    summary: &'a str,
    attendees: &'a [String],
    action_items: &'a [String],
    timestamp: String,
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn parse_attendees(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// One item per `\n`-separated line, kept as typed
pub fn parse_action_items(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split('\n').map(String::from).collect()
}

/// Posts meeting summaries to an operator-configured endpoint
#[derive(Clone)]
pub struct SummarySubmitter {
    client: reqwest::Client,
    config: SummaryConfig,
}

impl SummarySubmitter {
    pub fn new(config: SummaryConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    pub async fn submit(&self, summary: &MeetingSummary) -> Result<RemoteAck> {
        self.submit_at(summary, Utc::now()).await
    }

    /// Submit with an explicit timestamp for the JSON payload
    pub async fn submit_at(&self, summary: &MeetingSummary, timestamp: DateTime<Utc>) -> Result<RemoteAck> {
        let endpoint = self
            .config
            .endpoint_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: "summary.endpoint_url is not set".to_string(),
            })?;
        if summary.summary.trim().is_empty() {
            return Err(AppError::validation("summary", "summary must not be blank"));
        }

        let content_type = self.config.content_type;
        let mut request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, content_type.mime());
        if let Some(token) = self.config.auth_token.as_deref() {
            request = request.header(AUTHORIZATION, token);
        }
        request = match content_type {
            SummaryContentType::Json => {
                let body = serde_json::to_string(&summary.payload(timestamp)).map_err(|e| AppError::Configuration {
                    message: format!("Failed to encode summary: {}", e),
                })?;
                request.body(body)
            }
            SummaryContentType::Text => request.body(summary.summary.clone()),
        };

        let metrics = RemoteCallMetrics::start("submit_summary");
        let result = send("submit_summary", request).await.and_then(|ack| match ack.status {
            200 | 201 => Ok(ack),
            status => Err(ApiError::Remote { status, body: ack.body }),
        });
        metrics.finish(outcome(&result));

        let ack = result?;
        tracing::info!(status = ack.status, content_type = content_type.mime(), "Meeting summary submitted");
        Ok(ack)
    }
}
