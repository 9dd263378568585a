//! ARIES Recovery CLI
//!
//! Runs crash recovery over a WAL and page store on disk.

use std::path::PathBuf;
use std::process;

use aries_recovery::config::{WalFormat, WalSyncStrategy};
use aries_recovery::wal::{jsonl, WalLoader, WalWriter};
use aries_recovery::{Config, RecoveryManager, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

/// ARIES crash recovery
#[derive(Parser, Debug)]
#[command(name = "aries-recover")]
#[command(about = "Restore a page store to the committed state recorded in its WAL")]
#[command(version)]
struct Args {
    /// Data directory holding wal.log and pages.json
    #[arg(short, long, default_value = "./aries_data")]
    data_dir: PathBuf,

    /// WAL location (overrides --data-dir)
    #[arg(long)]
    wal: Option<PathBuf>,

    /// Page store location (overrides --data-dir)
    #[arg(long)]
    pages: Option<PathBuf>,

    /// WAL encoding
    #[arg(short, long, value_enum, default_value_t = Format::Binary)]
    format: Format,

    /// fsync the WAL after this many CLRs (0 = after every CLR)
    #[arg(long, default_value = "0")]
    sync_every: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Binary,
    Jsonl,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run Analysis, Redo and Undo and persist the result
    Recover {
        /// Compute and print the report without touching any file
        #[arg(long)]
        dry_run: bool,
    },

    /// Print winners, losers and the rebuilt tables
    Analyze,

    /// Check a binary WAL for torn or corrupt records
    VerifyWal,

    /// Convert a JSON-lines log into a binary WAL at --wal
    ImportJsonl {
        /// JSON-lines log to read
        source: PathBuf,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,aries_recovery=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::info!("aries-recover v{}", aries_recovery::VERSION);

    if let Err(e) = run(args) {
        tracing::error!("recovery failed: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut builder = Config::builder()
        .data_dir(&args.data_dir)
        .wal_format(match args.format {
            Format::Binary => WalFormat::Binary,
            Format::Jsonl => WalFormat::JsonLines,
        })
        .wal_sync_strategy(match args.sync_every {
            0 => WalSyncStrategy::EveryWrite,
            count => WalSyncStrategy::EveryNEntries { count },
        });
    if let Some(wal) = &args.wal {
        builder = builder.wal_path(wal);
    }
    if let Some(pages) = &args.pages {
        builder = builder.page_store_path(pages);
    }

    match args.command {
        Commands::Recover { dry_run } => {
            let manager = RecoveryManager::new(builder.persist(!dry_run).build())?;
            let report = manager.recover()?;
            print!("{}", report);
        }
        Commands::Analyze => {
            let manager = RecoveryManager::new(builder.build())?;
            print!("{}", manager.analyze()?);
        }
        Commands::VerifyWal => {
            let config = builder.build();
            let stats = WalLoader::verify(&config.wal_path)?;
            println!("records:   {}", stats.records_loaded);
            println!("corrupted: {}", stats.records_corrupted);
            println!("discarded: {} bytes", stats.bytes_discarded);
            println!("last LSN:  {}", stats.last_lsn);
        }
        Commands::ImportJsonl { source } => {
            let config = builder.build();
            let log = jsonl::read_log(&source)?;
            WalWriter::open(&config.wal_path, config.wal_sync_strategy)?
                .append_all(log.records())?;
            println!(
                "imported {} records into {}",
                log.len(),
                config.wal_path.display()
            );
        }
    }
    Ok(())
}
