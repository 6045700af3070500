//! Pulse Operator Console
//!
//! Command-line front end for the intake tooling. Every subcommand
//! authenticates against the organization directory first, then runs
//! against a fresh session store.

mod commands;
mod report;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pulse_common::{auth, config::AppConfig, metrics, Authenticator, SessionStore, VERSION};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pulse", version = VERSION)]
#[command(about = "Pulse intake console", long_about = None)]
struct Cli {
    /// Organization name
    #[arg(long, global = true, env = "PULSE_ORG")]
    org: Option<String>,

    /// Organization password
    #[arg(long, global = true, env = "PULSE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Load configuration from this file instead of config/
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an intake, upload content and optionally finalize it
    Intake(commands::IntakeArgs),
    /// Ask a natural-language question
    Query {
        question: String,
    },
    /// Send the meeting bot to a meeting
    Bot {
        meeting_url: String,
    },
    /// List stored memories
    History(commands::HistoryArgs),
    /// Submit a meeting summary
    Summary(commands::SummaryArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config);
    metrics::register_metrics();
    info!("Starting {} console v{}", config.observability.service_name, VERSION);

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report::failure(&e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    };
    config.context("Failed to load configuration")
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.observability.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let org = cli.org.context("--org (or PULSE_ORG) is required")?;
    let password = cli.password.context("--password (or PULSE_PASSWORD) is required")?;

    let directory = auth::create_directory(&config.directory).await?;
    let authenticator = Authenticator::new(directory, config.directory.credential_scheme);

    let mut session = SessionStore::new();
    session.authenticate(&authenticator, &org, &password).await?;

    let result = match cli.command {
        Commands::Intake(args) => commands::intake(config, &mut session, args).await,
        Commands::Query { question } => commands::query(config, &mut session, &question).await,
        Commands::Bot { meeting_url } => commands::bot(config, &session, &meeting_url).await,
        Commands::History(args) => commands::history(config, &session, args).await,
        Commands::Summary(args) => commands::summary(config, args).await,
    };

    session.logout();
    result
}
