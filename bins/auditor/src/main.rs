//! Cambio ledger auditor
//!
//! Loads a ledger snapshot file into memory and runs reports,
//! reconciliation, postings and the duplicate repair tool against it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cambio_core::accounts::AccountRegistry;
use cambio_core::currency::RateSnapshot;
use cambio_core::ledger::DateRange;
use cambio_core::posting::{ManualSubmission, PostingEngine};
use cambio_core::reconciliation::ReconciliationStatus;
use cambio_core::reports::ReportService;
use cambio_core::store::LedgerStore;
use cambio_shared::AppConfig;
use cambio_shared::config::LoggingConfig;
use cambio_shared::types::{AccountId, ClientId, TransactionId};
use cambio_store::{MemoryStore, SnapshotFile};

#[derive(Parser, Debug)]
#[command(name = "cambio-auditor")]
#[command(about = "Ledger reports, reconciliation and repair over a snapshot file")]
struct Cli {
    /// Ledger snapshot file (also read from `CAMBIO_SNAPSHOT`).
    #[arg(long, env = "CAMBIO_SNAPSHOT")]
    snapshot: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the chart of accounts.
    Accounts,
    /// Trial balance as of a date.
    TrialBalance {
        /// Cut-off date (inclusive).
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Movement per account, grouped by classification.
    Balances(Period),
    /// Income statement.
    Income(Period),
    /// Cash flow statement.
    CashFlow(Period),
    /// Running balance of one account.
    Account {
        /// Account code.
        id: String,
        #[command(flatten)]
        period: Period,
    },
    /// Verify the postings of a transaction.
    Reconcile {
        /// Transaction id.
        transaction: String,
        /// Also cross-check this client's balance.
        #[arg(long)]
        client: Option<String>,
    },
    /// Remove exact duplicate entries of a transaction.
    Cleanup {
        /// Transaction id.
        transaction: String,
        #[command(flatten)]
        write: WriteBack,
    },
    /// Post a confirmed transaction.
    Post {
        /// Transaction id.
        transaction: String,
        #[command(flatten)]
        write: WriteBack,
    },
    /// Post a manual submission read from a JSON file.
    PostManual {
        /// Submission file.
        file: PathBuf,
        #[command(flatten)]
        write: WriteBack,
    },
}

#[derive(Args, Debug, Clone, Copy)]
struct Period {
    /// First day (inclusive).
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day (inclusive).
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl Period {
    fn range(self) -> anyhow::Result<Option<DateRange>> {
        if self.from.is_none() && self.to.is_none() {
            return Ok(None);
        }
        let from = self.from.unwrap_or(NaiveDate::MIN);
        let to = self.to.unwrap_or(NaiveDate::MAX);
        Ok(Some(ReportService::date_range(from, to)?))
    }
}

#[derive(Args, Debug)]
struct WriteBack {
    /// Apply the change and save the snapshot; without it nothing is saved.
    #[arg(long)]
    write: bool,
    /// Save to this file instead of overwriting the input snapshot.
    #[arg(long, requires = "write")]
    out: Option<PathBuf>,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn save(
    store: &LedgerStore<MemoryStore>,
    rates: Option<RateSnapshot>,
    write: &WriteBack,
    input: &Path,
) -> anyhow::Result<()> {
    if !write.write {
        info!("dry run, snapshot not saved");
        return Ok(());
    }
    let target = write.out.as_deref().unwrap_or(input);
    SnapshotFile::export(store, rates)
        .await?
        .write(target)
        .with_context(|| format!("saving snapshot to {}", target.display()))?;
    info!(path = %target.display(), "snapshot saved");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.logging);

    let cli = Cli::parse();

    let file = SnapshotFile::read(&cli.snapshot)?;
    let store = LedgerStore::from_config(Arc::new(MemoryStore::new()), &config.store);
    file.load_into(&store).await?;
    let rates = file.rates.clone();

    match cli.command {
        Command::Accounts => {
            let accounts = AccountRegistry::new(store.clone()).list_accounts().await?;
            print_json(&accounts)?;
        }
        Command::TrialBalance { as_of } => {
            let snapshot = store.snapshot().await?;
            let report = ReportService::trial_balance(&snapshot, as_of);
            print_json(&report)?;
            if !report.is_balanced {
                return Ok(ExitCode::from(2));
            }
        }
        Command::Balances(period) => {
            let snapshot = store.snapshot().await?;
            print_json(&ReportService::account_balances(&snapshot, period.range()?.as_ref()))?;
        }
        Command::Income(period) => {
            let snapshot = store.snapshot().await?;
            print_json(&ReportService::income_statement(&snapshot, period.range()?.as_ref()))?;
        }
        Command::CashFlow(period) => {
            let snapshot = store.snapshot().await?;
            print_json(&ReportService::cash_flow(&snapshot, period.range()?.as_ref()))?;
        }
        Command::Account { id, period } => {
            let snapshot = store.snapshot().await?;
            let report = ReportService::account_transactions(
                &snapshot,
                &AccountId::from(id),
                period.range()?.as_ref(),
            )?;
            print_json(&report)?;
        }
        Command::Reconcile { transaction, client } => {
            let engine = PostingEngine::new(store.clone(), &config.posting);
            let client = client.map(ClientId::from);
            if client.is_some() && !config.posting.post_principal {
                warn!("principal posting is disabled, client balance is not checked");
            }
            let report = engine
                .guard()
                .reconcile_transaction_posting(&TransactionId::from(transaction), client.as_ref())
                .await;
            print_json(&report)?;
            if report.status != ReconciliationStatus::Verified {
                return Ok(ExitCode::from(2));
            }
        }
        Command::Cleanup { transaction, write } => {
            let engine = PostingEngine::new(store.clone(), &config.posting);
            let transaction = TransactionId::from(transaction);
            if write.write {
                let report = engine.guard().cleanup_duplicate_journal_entries(&transaction).await?;
                print_json(&report)?;
                save(&store, rates, &write, &cli.snapshot).await?;
            } else {
                let plan = engine.guard().plan_cleanup(&transaction).await?;
                warn!(duplicates = plan.removed_entry_ids.len(), "dry run, pass --write to delete");
                print_json(&plan)?;
            }
        }
        Command::Post { transaction, write } => {
            let engine = PostingEngine::new(store.clone(), &config.posting);
            let outcome = engine.post_transaction(&TransactionId::from(transaction)).await?;
            print_json(&outcome)?;
            save(&store, rates, &write, &cli.snapshot).await?;
        }
        Command::PostManual { file, write } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let submission: ManualSubmission = serde_json::from_str(&raw)?;
            let provider = rates.clone().unwrap_or_default();

            let engine = PostingEngine::new(store.clone(), &config.posting);
            let ids = engine.post_manual_entries(&submission, &provider).await?;
            print_json(&ids)?;
            save(&store, rates, &write, &cli.snapshot).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
