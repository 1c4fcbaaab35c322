use clap::Parser;
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use upline::application::coordinator::TransactionCoordinator;
use upline::domain::package::Package;
use upline::domain::ports::{Ledger, LedgerBox};
use upline::domain::purchase::{Purchase, PurchaseId};
use upline::domain::user::User;
use upline::infrastructure::collaborators::NoopCollaborators;
use upline::infrastructure::in_memory::InMemoryLedger;
use upline::interfaces::csv::command_reader::CommandReader;
use upline::interfaces::csv::summary_writer::SummaryWriter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed file (JSON) with users, packages and checkout-created purchases
    seed: PathBuf,

    /// Operator commands CSV file
    commands: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[derive(Deserialize)]
struct Seed {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    packages: Vec<Package>,
    #[serde(default)]
    purchases: Vec<Purchase>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let seed_file = File::open(&cli.seed).into_diagnostic()?;
    let seed: Seed = serde_json::from_reader(seed_file).into_diagnostic()?;
    let purchase_ids: Vec<PurchaseId> = seed.purchases.iter().map(|p| p.id).collect();

    let ledger = open_ledger(cli.db_path, seed).await?;

    let collaborators = Arc::new(NoopCollaborators);
    let coordinator = TransactionCoordinator::new(
        ledger.clone(),
        collaborators.clone(),
        collaborators.clone(),
        collaborators,
    );

    let stdout = io::stdout();
    let mut writer = SummaryWriter::new(stdout.lock());

    let commands_file = File::open(&cli.commands).into_diagnostic()?;
    for command in CommandReader::new(commands_file).commands() {
        match command {
            Ok(command) => match coordinator.execute(&command).await {
                Ok(receipt) => writer.write_receipt(&receipt).into_diagnostic()?,
                Err(e) => eprintln!("error [{}]: {}", e.code(), e),
            },
            Err(e) => eprintln!("error reading command: {e}"),
        }
    }

    for id in purchase_ids {
        if let Some(purchase) = ledger.purchase(id).await.into_diagnostic()? {
            writer.write_purchase(&purchase).into_diagnostic()?;
        }
        for commission in ledger.commissions_for(id).await.into_diagnostic()? {
            writer.write_commission(&commission).into_diagnostic()?;
        }
    }
    writer.flush().into_diagnostic()?;

    Ok(())
}

async fn open_ledger(db_path: Option<PathBuf>, seed: Seed) -> Result<LedgerBox> {
    match db_path {
        Some(path) => open_rocksdb(path, seed),
        None => {
            let store = InMemoryLedger::new();
            for user in seed.users {
                store.seed_user(user).await;
            }
            for package in seed.packages {
                store.seed_package(package).await;
            }
            for purchase in seed.purchases {
                store.seed_purchase(purchase).await;
            }
            Ok(Arc::new(store))
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_rocksdb(path: PathBuf, seed: Seed) -> Result<LedgerBox> {
    use upline::infrastructure::rocksdb::RocksDbLedger;

    let store = RocksDbLedger::open(path).into_diagnostic()?;
    for user in &seed.users {
        store.seed_user(user).into_diagnostic()?;
    }
    for package in &seed.packages {
        store.seed_package(package).into_diagnostic()?;
    }
    for purchase in &seed.purchases {
        store.seed_purchase(purchase).into_diagnostic()?;
    }
    Ok(Arc::new(store))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_rocksdb(_path: PathBuf, _seed: Seed) -> Result<LedgerBox> {
    Err(miette::miette!(
        "persistent storage requires the storage-rocksdb feature"
    ))
}
