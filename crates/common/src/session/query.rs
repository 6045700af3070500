//! Last-query cache entry

use serde::{Deserialize, Serialize};

/// Keys checked, in order, for a human-readable answer
pub const DISPLAY_KEYS: [&str; 3] = ["answer", "insights", "response"];

/// A question and the verbatim JSON the query endpoint returned
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub question: String,
    pub payload: serde_json::Value,
}

impl QueryResult {
    pub fn new(question: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            question: question.into(),
            payload,
        }
    }

    /// The first non-blank recognized answer field
    pub fn answer(&self) -> Option<&str> {
        DISPLAY_KEYS
            .iter()
            .filter_map(|key| self.payload.get(key).and_then(|v| v.as_str()))
            .find(|answer| !answer.trim().is_empty())
    }

    /// Text to show the operator: a recognized answer field, or the whole
    /// payload pretty-printed.
    pub fn display_text(&self) -> String {
        match self.answer() {
            Some(answer) => answer.to_string(),
            None => serde_json::to_string_pretty(&self.payload)
                .unwrap_or_else(|_| self.payload.to_string()),
        }
    }
}
