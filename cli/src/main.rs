//! busync - assign applications to business units by naming convention.
//!
//! Walks every application in the tenant, derives a unit key from the
//! `AAAA-` name prefix, ensures the unit exists, and reconciles the
//! assignment. With `--dry-run` no remote state is mutated and the decisions
//! land in `dry_run_bu_assignments.csv` for review.
//!
//! Exit code 0 on completion, even when individual applications errored
//! (their count appears in the summary); non-zero only on fatal startup
//! errors such as missing credentials or an unreachable listing.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use busync_client::{ApiCredentials, RestClient};
use busync_engine::{report, run};
use busync_types::{Action, RunMode};

/// Assign applications to business units from their `AAAA-` name prefix.
#[derive(Debug, Parser)]
#[command(name = "busync", version, about)]
struct Cli {
    /// Compute and report decisions without mutating the tenant.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    if let Err(e) = run_cli(Cli::parse()).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_cli(cli: Cli) -> Result<()> {
    let mode = if cli.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Live
    };

    let credentials = ApiCredentials::load().context("loading API credentials")?;
    let client = RestClient::new(credentials).context("building API client")?;

    let outcome = run::execute(&client, mode)
        .await
        .context("listing applications")?;

    if mode.is_dry_run() {
        let path = Path::new(report::REPORT_FILE_NAME);
        report::write_report(path, &outcome.decisions)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            rows = outcome.decisions.len(),
            "dry-run report written"
        );
    }

    println!("{}", outcome.summary);
    let errored = outcome.summary.count(Action::Errored);
    if errored > 0 {
        tracing::warn!(errored, "some applications could not be reconciled");
    }

    Ok(())
}
