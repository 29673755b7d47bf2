//! SheetLedger command-line entry point.
//!
//! # Responsibility
//! - Drive the API envelopes against a local SQLite ledger and sequence file.
//! - Print every response as pretty JSON on stdout.
//!
//! Paths default to the `SHEETLEDGER_*` environment variables, then the
//! temp dir; flags override both.

use clap::{Parser, Subcommand};
use log::debug;
use serde::Serialize;
use sheetledger_api::{
    list_directory_at, peek_next_sequence_at, process_order_at, query_records_at,
    resume_order_at, LedgerPaths,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "sheetledger", version, about = "Schema-less tabular ledger tools")]
struct Cli {
    /// SQLite database holding the tables
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON file holding the sequence counters
    #[arg(long, global = true)]
    seq: Option<PathBuf>,

    /// LedgerConfig JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Absolute directory for rolling log files; stderr when omitted
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a table into active and history records
    Query { table: String },
    /// Distribute a JSON array of orders
    Process {
        payload: PathBuf,
        /// Active user; PREWORK_ORDER generates work-order folios
        #[arg(long)]
        user: String,
    },
    /// Finish a pending plan saved from a partial write
    Resume { plan: PathBuf },
    /// Show the next sequence value without allocating it
    NextSeq { key: Option<String> },
    /// List the staff directory
    Directory,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logging = match &cli.log_dir {
        Some(log_dir) => sheetledger_core::init_logging(&cli.log_level, log_dir),
        None => sheetledger_core::init_stderr_logging(&cli.log_level),
    };
    if let Err(err) = logging {
        eprintln!("logging setup failed: {err}");
        return ExitCode::FAILURE;
    }

    let mut paths = LedgerPaths::from_env();
    if let Some(db) = cli.db {
        paths.db_path = db;
    }
    if let Some(seq) = cli.seq {
        paths.sequence_path = seq;
    }
    if let Some(config) = cli.config {
        paths.config_path = Some(config);
    }

    debug!(
        "event=cli_start module=cli status=start command={:?} db={}",
        cli.command,
        paths.db_path.display()
    );
    match cli.command {
        Command::Query { table } => {
            let response = query_records_at(&paths, &table);
            print_json(&response, response.success)
        }
        Command::Process { payload, user } => {
            let Some(json) = read_input(&payload) else {
                return ExitCode::FAILURE;
            };
            let response = process_order_at(&paths, &json, &user);
            print_json(&response, response.success)
        }
        Command::Resume { plan } => {
            let Some(json) = read_input(&plan) else {
                return ExitCode::FAILURE;
            };
            let response = resume_order_at(&paths, &json);
            print_json(&response, response.success)
        }
        Command::NextSeq { key } => {
            let next = peek_next_sequence_at(&paths, key.as_deref());
            let ok = !next.is_empty();
            print_json(&serde_json::json!({ "next": next }), ok)
        }
        Command::Directory => {
            let response = list_directory_at(&paths);
            print_json(&response, response.success)
        }
    }
}

fn read_input(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) => {
            eprintln!("cannot read `{}`: {err}", path.display());
            None
        }
    }
}

fn print_json<T: Serialize>(value: &T, ok: bool) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => {
            eprintln!("cannot encode response: {err}");
            return ExitCode::FAILURE;
        }
    }
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
