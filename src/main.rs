use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use ledger_cli::cli::{
    handle_encrypt_command, handle_report_command, handle_transaction_command, open_session,
    EncryptCommands, ReportCommands, TransactionCommands,
};
use ledger_cli::config::{LedgerPaths, Settings, StorageEngine};
use ledger_cli::session::Session;

#[derive(Parser)]
#[command(
    name = "ledger",
    author = "Kaylee Beyene",
    version,
    about = "Terminal-based personal finance ledger",
    long_about = "LedgerCLI records income, expenses and investments by month and \
                  summarizes them as profit and loss. Transactions are stored in a \
                  JSON file or a SQLite database, optionally encrypted at rest."
)]
struct Cli {
    /// Log verbosity; RUST_LOG takes precedence when set
    #[arg(long, default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Transaction(TransactionCommands),

    /// Profit and loss reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Copy the JSON history into the SQLite database
    Migrate,

    /// Encryption management commands
    #[command(subcommand)]
    Encrypt(EncryptCommands),

    /// Show current configuration and paths
    Config {
        /// Persist a new storage engine (json or sqlite)
        #[arg(long)]
        engine: Option<StorageEngine>,
    },

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    let paths = LedgerPaths::new()?;
    let settings = Settings::resolve(&paths)?;
    debug!(engine = %settings.storage_engine, encrypted = settings.encryption_enabled, "settings resolved");

    let Some(command) = cli.command else {
        println!("LedgerCLI - Terminal-based personal finance ledger");
        println!();
        println!("Run 'ledger --help' for usage information.");
        return Ok(());
    };

    match command {
        Commands::Encrypt(cmd) => handle_encrypt_command(&paths, &settings, cmd)?,
        Commands::Config { engine } => show_config(&paths, &settings, engine)?,
        Commands::Audit { limit } => {
            let session = open_session(&paths, &settings)?;
            print_audit(&session, limit)?;
            session.close()?;
        }
        Commands::Transaction(cmd) => {
            let mut session = open_session(&paths, &settings)?;
            handle_transaction_command(&mut session, cmd)?;
            session.close()?;
        }
        Commands::Report(cmd) => {
            let session = open_session(&paths, &settings)?;
            handle_report_command(&session, cmd)?;
            session.close()?;
        }
        Commands::Migrate => {
            let mut session = open_session(&paths, &settings)?;
            let report = session.migrate_to_sqlite()?;
            println!(
                "Migrated {} transaction(s) into {}",
                report.migrated,
                settings.database_path(&paths).display()
            );
            session.close()?;
        }
    }

    Ok(())
}

/// Logs go to stderr so command output stays clean
fn init_logger(level: LevelFilter) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(format!(
            "{}={},{}={}",
            env!("CARGO_CRATE_NAME"),
            level,
            env!("CARGO_BIN_NAME"),
            level
        ))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn show_config(
    paths: &LedgerPaths,
    settings: &Settings,
    engine: Option<StorageEngine>,
) -> ledger_cli::LedgerResult<()> {
    if let Some(engine) = engine {
        let mut stored = Settings::load_or_create(paths)?;
        stored.storage_engine = engine;
        stored.save(paths)?;
        println!("Storage engine set to {}", engine);
        return Ok(());
    }

    println!("LedgerCLI Configuration");
    println!("=======================");
    println!("Config file:       {}", paths.settings_file().display());
    println!("Data directory:    {}", paths.data_dir().display());
    println!("Audit log:         {}", paths.audit_log().display());
    println!();
    println!("Settings:");
    println!("  Storage engine:     {}", settings.storage_engine);
    println!("  Transactions file:  {}", settings.transactions_path(paths).display());
    println!("  Database:           {}", settings.database_path(paths).display());
    println!("  Encryption enabled: {}", settings.encryption_enabled);
    Ok(())
}

fn print_audit(session: &Session, limit: usize) -> ledger_cli::LedgerResult<()> {
    let entries = session.audit().read_recent(limit)?;
    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }
    for entry in entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
