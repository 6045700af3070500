//! Subcommand handlers

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use pulse_common::{AppConfig, SessionStore};
use pulse_intake::{
    HistoryClient, InsightsApi, IntakeClient, MeetingSummary, SummarySubmitter, UploadFile,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct IntakeArgs {
    /// File to upload (repeatable)
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Text to upload (repeatable)
    #[arg(long = "text", value_name = "TEXT")]
    pub texts: Vec<String>,

    /// Print the intake status after uploading
    #[arg(long)]
    pub status: bool,

    /// Finalize the intake after uploading
    #[arg(long)]
    pub finalize: bool,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// One of 5, 10, 15, 25 (defaults to history.page_size)
    #[arg(long)]
    pub page_size: Option<u32>,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[arg(long)]
    pub summary: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub date: Option<String>,

    /// Comma-separated attendee names
    #[arg(long)]
    pub attendees: Option<String>,

    /// Action items, one per line
    #[arg(long)]
    pub action_items: Option<String>,
}

pub async fn intake(config: &AppConfig, session: &mut SessionStore, args: IntakeArgs) -> Result<()> {
    let client = IntakeClient::new(InsightsApi::from_config(config)?);

    let intake_id = client.init(session).await?;
    println!("Intake initialized: {}", intake_id);

    for path in &args.files {
        let file = UploadFile::from_path(path).await?;
        client.upload_file(session, &file).await?;
        println!("Uploaded file {} ({})", file.file_name(), file.mime_type());
    }

    for text in &args.texts {
        client.upload_text(session, text).await?;
        println!("Uploaded text ({} chars)", text.chars().count());
    }

    if args.status {
        let status = client.status(session).await?;
        println!("{}", pretty_json(&status));
    }

    if args.finalize {
        client.finalize(session).await?;
        println!("Intake {} finalized", intake_id);
    }

    Ok(())
}

pub async fn query(config: &AppConfig, session: &mut SessionStore, question: &str) -> Result<()> {
    let client = IntakeClient::new(InsightsApi::from_config(config)?);
    let result = client.query(session, question).await?;
    println!("{}", result.display_text());
    Ok(())
}

pub async fn bot(config: &AppConfig, session: &SessionStore, meeting_url: &str) -> Result<()> {
    let client = IntakeClient::new(InsightsApi::from_config(config)?);
    client.add_bot_to_meeting(session, meeting_url).await?;
    println!("Meeting bot requested for {}", meeting_url.trim());
    Ok(())
}

pub async fn history(config: &AppConfig, session: &SessionStore, args: HistoryArgs) -> Result<()> {
    let client = HistoryClient::new(InsightsApi::from_config(config)?);
    let page_size = args.page_size.unwrap_or(config.history.page_size);
    let page = client.list_memories(session, args.page, page_size).await?;

    if page.memories.is_empty() {
        println!("No memories found");
    }

    let now = Utc::now();
    for memory in &page.memories {
        println!(
            "[{}] {} ({})\n    {}",
            memory.kind(),
            memory.title(),
            memory.relative_time(now),
            memory.summary()
        );
    }

    let pagination = &page.pagination;
    println!(
        "Page {} of {} ({} total)",
        pagination.page, pagination.total_pages, pagination.total_count
    );
    if let Some(next) = pagination.next_page() {
        println!("Next: --page {}", next);
    }

    Ok(())
}

pub async fn summary(config: &AppConfig, args: SummaryArgs) -> Result<()> {
    let submitter = SummarySubmitter::new(config.summary.clone(), config.request_timeout())?;

    let mut summary = MeetingSummary::new(args.summary);
    if let Some(title) = args.title {
        summary = summary.with_title(title);
    }
    if let Some(date) = args.date {
        summary = summary.with_date(date);
    }
    if let Some(attendees) = args.attendees.as_deref() {
        summary = summary.with_attendees(attendees);
    }
    if let Some(items) = args.action_items.as_deref() {
        summary = summary.with_action_items(items);
    }

    let ack = submitter.submit(&summary).await?;
    println!("Summary submitted ({})", ack.status);
    Ok(())
}

fn pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
