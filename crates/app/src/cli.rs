use std::{future::Future, sync::Arc};

use alert_ingest::{
    AlertBackend, HttpBackend, LedgerViewer, PassTrigger, ResolutionController, SnapshotFetcher,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use incident_core::{LedgerCard, render_chain};

use crate::dashboard::{self, BackendArgs, DashboardCliArgs, DashboardConfig, TelemetryOptions};

#[derive(Parser, Debug)]
#[command(name = "incident-dashboard", version, about = "Live tourist-safety incident dashboard")]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the backend and serve the live dashboard.
    Serve(DashboardCliArgs),
    /// Print the ledger chain and its validity verdict.
    Ledger(LedgerArgs),
    /// Resolve one incident and exit.
    Resolve(ResolveArgs),
}

#[derive(Args, Debug)]
struct LedgerArgs {
    #[command(flatten)]
    backend: BackendArgs,
    /// Print only the block with this index.
    #[arg(long)]
    block: Option<u64>,
    /// Emit JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    #[command(flatten)]
    backend: BackendArgs,
    /// Incident identifier.
    id: String,
    /// Resolver identity recorded by the backend.
    #[arg(long = "by", env = "DASHBOARD_RESOLVER", default_value = "")]
    resolved_by: String,
}

pub(crate) fn handle_commands(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve(args) => dashboard::run(DashboardConfig::try_from(args)?),
        Command::Ledger(args) => one_shot(print_ledger(args)),
        Command::Resolve(args) => one_shot(resolve_once(args)),
    }
}

fn one_shot<F>(task: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let _telemetry = dashboard::telemetry::install(&TelemetryOptions::default())?;
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?
        .block_on(task)
}

fn connect(args: &BackendArgs) -> Result<Arc<dyn AlertBackend>> {
    let config = args.backend_config()?;
    let backend = HttpBackend::new(&config).context("invalid backend configuration")?;
    Ok(Arc::new(backend))
}

async fn print_ledger(args: LedgerArgs) -> Result<()> {
    let backend = connect(&args.backend)?;
    let viewer = LedgerViewer::new(backend.clone());

    if let Some(index) = args.block {
        let card = viewer
            .fetch_block(index)
            .await
            .with_context(|| format!("failed to fetch ledger block {index}"))?
            .render();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&card)?);
        } else {
            print_card(&card);
        }
        return Ok(());
    }

    let fetcher = SnapshotFetcher::new(backend);
    let (verdict, blocks) = tokio::join!(fetcher.fetch_verdict(), viewer.fetch_ledger());
    let cards = render_chain(&blocks.context("failed to fetch ledger")?);

    if args.json {
        let verdict = verdict.ok();
        let body = serde_json::json!({ "verdict": verdict, "blocks": cards });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    match verdict {
        Ok(verdict) => println!("{}", verdict.summary()),
        Err(err) => println!("Ledger status unavailable: {err}"),
    }
    println!("{} block(s)", cards.len());
    for card in &cards {
        println!();
        print_card(card);
    }
    Ok(())
}

fn print_card(card: &LedgerCard) {
    println!("#{}  {}", card.index, card.timestamp);
    println!("  hash      {}", card.hash);
    println!("  prev_hash {}", card.previous_hash);
    for line in card.data.lines() {
        println!("  | {line}");
    }
}

async fn resolve_once(args: ResolveArgs) -> Result<()> {
    let backend = connect(&args.backend)?;
    let controller = ResolutionController::new(backend, PassTrigger::new());
    let record = controller
        .resolve_incident(&args.id, &args.resolved_by)
        .await
        .with_context(|| format!("failed to resolve incident {:?}", args.id))?;
    println!(
        "Resolved {} by {}{}",
        record.incident_id.as_deref().unwrap_or(&args.id),
        record
            .resolved_by
            .as_deref()
            .unwrap_or(args.resolved_by.trim()),
        record
            .resolved_at
            .map(|at| format!(" at {at}"))
            .unwrap_or_default()
    );
    Ok(())
}
