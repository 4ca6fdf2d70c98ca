//! checkdesk CLI: operator interface to the verification desk.
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use checkdesk::config::Config;
use checkdesk::db::Db;
use checkdesk::engine::Desk;
use checkdesk::model::OperatorId;
use checkdesk::model::session::SessionId;
use checkdesk::model::validation::ValidationUpdate;
use checkdesk::telemetry::{TelemetryConfig, init_telemetry};
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "checkdesk", about = "Provider record verification desk")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Check database connectivity
    Health,
    /// Claim a provider to verify, or resume the one already held
    Assign {
        #[arg(long)]
        operator: i64,
    },
    /// Record address/phone verdicts
    Validate {
        /// Session id
        session: i64,
        #[arg(long)]
        operator: i64,
        /// JSON validation update, or @path to read it from a file
        payload: String,
    },
    /// Record a call attempt (1 or 2)
    Call {
        /// Session id
        session: i64,
        #[arg(long)]
        operator: i64,
        #[arg(long)]
        attempt: i64,
    },
    /// Complete a fully validated session
    Complete {
        /// Session id
        session: i64,
        #[arg(long)]
        operator: i64,
    },
    /// Show what still blocks completion
    Preview {
        /// Session id
        session: i64,
        #[arg(long)]
        operator: i64,
    },
    /// Desk counters for an operator
    Stats {
        #[arg(long)]
        operator: i64,
    },
    /// Show a session's recorded history
    History {
        /// Session id
        session: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "checkdesk".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let db = Db::connect_with(config.database_url.expose_secret(), config.store.clone()).await?;
    let desk = Desk::new(Arc::new(db)).with_scoring(config.scoring);

    match cli.command {
        Command::Migrate => {
            desk.db().migrate().await?;
            eprintln!("Migrations applied.");
            Ok(())
        }
        Command::Health => {
            desk.db().health_check().await?;
            eprintln!("Database reachable.");
            Ok(())
        }
        Command::Assign { operator } => print_json(&desk.assign(OperatorId(operator)).await?),
        Command::Validate {
            session,
            operator,
            payload,
        } => {
            let update = read_update(&payload)?;
            if update.is_empty() {
                anyhow::bail!("validation payload contains no decisions or new records");
            }
            desk.record_validation(SessionId(session), OperatorId(operator), update)
                .await?;
            print_json(&desk.preview(SessionId(session), OperatorId(operator)).await?)
        }
        Command::Call {
            session,
            operator,
            attempt,
        } => {
            desk.record_call_attempt(SessionId(session), OperatorId(operator), attempt)
                .await?;
            eprintln!("Call attempt {attempt} recorded for session {session}.");
            Ok(())
        }
        Command::Complete { session, operator } => {
            print_json(&desk.complete(SessionId(session), OperatorId(operator)).await?)
        }
        Command::Preview { session, operator } => {
            print_json(&desk.preview(SessionId(session), OperatorId(operator)).await?)
        }
        Command::Stats { operator } => print_json(&desk.stats(OperatorId(operator)).await?),
        Command::History { session } => print_json(&desk.history(SessionId(session)).await?),
    }
}

/// Parse a validation update given inline or as `@path`.
fn read_update(payload: &str) -> anyhow::Result<ValidationUpdate> {
    let json = match payload.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read payload file {path}: {e}"))?,
        None => payload.to_string(),
    };
    Ok(serde_json::from_str(&json)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
