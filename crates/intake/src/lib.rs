//! Pulse Intake Client
//!
//! Remote-facing half of the Pulse tooling:
//! - `InsightsApi`: HTTP transport and response classification
//! - `IntakeClient`: intake lifecycle, queries and meeting-bot requests
//! - `HistoryClient`: paged memories listing
//! - `SummarySubmitter`: meeting summary delivery

pub mod api;
pub mod history;
pub mod intake;
pub mod summary;
pub mod upload;

pub use api::{BotRequest, InsightsApi, QueryRequest, RemoteAck};
pub use history::{format_relative, HistoryClient, Memory, MemoryKind, MemoryPage, Pagination};
pub use intake::IntakeClient;
pub use summary::{MeetingSummary, SummarySubmitter};
pub use upload::UploadFile;
