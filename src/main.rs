//! Grievance: agent complaint engine CLI
//!
//! Usage:
//!   grievance log --agent agent-001 --type cognitive_stress --severity high \
//!       --description "overloaded" --context complexity=9
//!   grievance list --agent agent-001
//!   grievance escalate <id> --reason "needs human eyes" --to "Ethics Board"
//!   grievance report --agent agent-001 --hours 24
//!   grievance export --anonymize --format table
//!   grievance simulate

mod simulate;

use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use grievance_core::{ComplaintStatus, ComplaintType, CtxValue, NewComplaint, Severity};
use grievance_engine::{
    ComplaintEngine, EngineConfig, ExportFormat, ExportOptions, Filters, Page, SortOrder,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "grievance", about = "Agent complaint engine")]
struct Cli {
    /// Complaint snapshot file
    #[arg(long, default_value = "complaints.json")]
    store: PathBuf,

    /// Path to engine config (TOML). Default: <store dir>/grievance.toml
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log a complaint (auto-escalates high/critical severities)
    Log {
        #[arg(long)]
        agent: String,
        /// Complaint type (e.g. cognitive_stress, contradiction)
        #[arg(long = "type")]
        kind: String,
        /// Severity: low, medium, high, critical
        #[arg(long)]
        severity: String,
        #[arg(long)]
        description: String,
        /// Context entries as key=value (repeatable)
        #[arg(long = "context")]
        context: Vec<String>,
        /// Metadata entries as key=value (repeatable)
        #[arg(long = "metadata")]
        metadata: Vec<String>,
    },
    /// Show a complaint by id
    Show {
        id: Uuid,
        /// Print the summary projection instead of the full record
        #[arg(long)]
        summary: bool,
    },
    /// List complaints with filters
    List {
        #[arg(long)]
        agent: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        severity: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Oldest first instead of the default newest first
        #[arg(long)]
        oldest: bool,
    },
    /// Escalate a complaint to an authority
    Escalate {
        id: Uuid,
        #[arg(long)]
        reason: String,
        #[arg(long = "to")]
        escalated_to: String,
        #[arg(long, default_value = "high")]
        priority: String,
    },
    /// Apply a status transition (under_review, resolved, archived)
    Status { id: Uuid, new_status: String },
    /// Re-run self-evaluation on a complaint
    Reevaluate { id: Uuid },
    /// System-wide pattern report
    Report {
        #[arg(long)]
        agent: Option<String>,
        /// Lookback window in hours (default: unbounded)
        #[arg(long)]
        hours: Option<i64>,
    },
    /// Export an audit snapshot
    Export {
        #[arg(long)]
        agent: Option<String>,
        /// RFC 3339 window start
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// RFC 3339 window end
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        #[arg(long)]
        include_resolved: bool,
        #[arg(long)]
        anonymize: bool,
        /// Output shape: json or table
        #[arg(long, default_value = "json")]
        format: String,
        /// Write to file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Drive stress scenarios through the engine
    Simulate {
        #[arg(long, default_value = "sim-agent")]
        agent: String,
    },
    /// Dump the default config as TOML and exit
    DumpConfig,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grievance=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Command::DumpConfig) {
        println!("{}", EngineConfig::default().to_toml());
        return Ok(());
    }

    let config_path = cli.config.clone().unwrap_or_else(|| {
        cli.store
            .parent()
            .map(|d| d.join("grievance.toml"))
            .unwrap_or_else(|| PathBuf::from("grievance.toml"))
    });
    let config = EngineConfig::load(&config_path);
    let engine = ComplaintEngine::open(&cli.store, config)
        .with_context(|| format!("opening complaint store {}", cli.store.display()))?;

    match cli.command {
        Command::DumpConfig => unreachable!("handled above"),
        Command::Log {
            agent,
            kind,
            severity,
            description,
            context,
            metadata,
        } => {
            let mut new = NewComplaint::new(
                agent,
                kind.parse::<ComplaintType>()?,
                severity.parse::<Severity>()?,
                description,
            );
            for entry in &context {
                let (key, value) = parse_kv(entry)?;
                new.context.insert(key, value);
            }
            for entry in &metadata {
                let (key, value) = parse_kv(entry)?;
                new.metadata.insert(key, value);
            }
            let outcome = engine.submit(new)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            engine.flush()?;
        }
        Command::Show { id, summary } => {
            if summary {
                println!("{}", serde_json::to_string_pretty(&engine.summary(id)?)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&engine.get(id)?)?);
            }
        }
        Command::List {
            agent,
            kind,
            severity,
            status,
            page,
            limit,
            oldest,
        } => {
            let filters = Filters {
                agent_id: agent,
                kind: kind.map(|k| k.parse()).transpose()?,
                severity: severity.map(|s| s.parse()).transpose()?,
                status: status.map(|s| s.parse()).transpose()?,
                from: None,
                to: None,
            };
            let sort = if oldest {
                SortOrder::OldestFirst
            } else {
                SortOrder::NewestFirst
            };
            let result = engine.list(&filters, Page { page, limit }, sort);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Escalate {
            id,
            reason,
            escalated_to,
            priority,
        } => {
            let event = engine.escalate(id, reason, escalated_to, priority.parse::<Severity>()?)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
            engine.flush()?;
        }
        Command::Status { id, new_status } => {
            engine.update_status(id, new_status.parse::<ComplaintStatus>()?)?;
            println!("{}", serde_json::to_string_pretty(&engine.summary(id)?)?);
            engine.flush()?;
        }
        Command::Reevaluate { id } => {
            let evaluation = engine.reevaluate(id, None)?;
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
            engine.flush()?;
        }
        Command::Report { agent, hours } => {
            let from = hours.map(|h| Utc::now() - Duration::hours(h));
            let report = engine.report(agent.as_deref(), from, None);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Export {
            agent,
            from,
            to,
            include_resolved,
            anonymize,
            format,
            output,
        } => {
            let format = match format.as_str() {
                "json" => ExportFormat::Structured,
                "table" => ExportFormat::Tabular,
                other => anyhow::bail!("unknown export format: {other} (expected json or table)"),
            };
            let report = engine.export(&ExportOptions {
                agent_id: agent,
                from,
                to,
                include_resolved,
                anonymize,
            });
            let rendered = report.render(format)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("audit export written to {}", path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Command::Simulate { agent } => {
            simulate::run_all(&engine, &agent)?;
            engine.flush()?;
        }
    }

    Ok(())
}

/// Parse `key=value`, inferring the value kind: bool, number, then
/// free text.
fn parse_kv(entry: &str) -> anyhow::Result<(String, CtxValue)> {
    let (key, raw) = entry
        .split_once('=')
        .with_context(|| format!("expected key=value, got {entry:?}"))?;
    let value = if let Ok(flag) = raw.parse::<bool>() {
        CtxValue::Flag(flag)
    } else if let Ok(num) = raw.parse::<f64>() {
        CtxValue::Number(num)
    } else {
        CtxValue::text(raw)
    };
    Ok((key.to_string(), value))
}
