//! isa-docs - ISA Documentation Service
//!
//! CLI entry point: run a transport, or query the snapshot directly.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use isa_docs::server::stdio;
use isa_docs::{DataStore, HttpServer, IsaDocsConfig, IsaService, MemoryStore};
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "isa-docs")]
#[command(version)]
#[command(about = "Instruction set architecture documentation service", long_about = None)]
struct Cli {
    /// Config file (default: isa-docs.toml in this or a parent directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot path, overrides [store] path
    #[arg(long, global = true, value_name = "PATH")]
    db_path: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the snapshot and print a per-architecture summary
    Check,

    /// Compare a mnemonic across architectures
    Compare {
        /// Instruction mnemonic
        mnemonic: String,

        /// Architecture to include (repeatable; default: all)
        #[arg(short, long = "arch")]
        arch: Vec<String>,
    },

    /// Read one resource and print it
    Read {
        /// Resource URI, e.g. isa://architecture/x86_64
        uri: String,
    },

    /// Search instructions
    Search {
        /// Free-text query
        query: String,

        /// Restrict to one architecture
        #[arg(short, long)]
        arch: Option<String>,
    },

    /// Serve over HTTP
    Serve {
        /// Listen address, overrides [server] bind
        #[arg(long)]
        bind: Option<String>,

        /// Worker threads, overrides [server] workers
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Serve JSON-RPC on stdin/stdout
    Stdio,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(path) = cli.db_path {
        config.store.path = path;
    }

    match cli.command {
        Commands::Check => cmd_check(&config),
        Commands::Compare { mnemonic, arch } => cmd_compare(&config, &mnemonic, arch),
        Commands::Read { uri } => cmd_read(&config, &uri),
        Commands::Search { query, arch } => cmd_search(&config, &query, arch),
        Commands::Serve { bind, workers } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(workers) = workers {
                config.server.workers = workers;
            }
            cmd_serve(&config)
        }
        Commands::Stdio => cmd_stdio(&config),
    }
}

/// Logs go to stderr; stdout carries responses.
fn init_tracing(verbose: bool) {
    let default = if verbose { "isa_docs=debug" } else { "isa_docs=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<IsaDocsConfig> {
    match path {
        Some(path) => IsaDocsConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => IsaDocsConfig::load_from_cwd().context("Failed to load isa-docs.toml"),
    }
}

fn open_service(config: &IsaDocsConfig) -> Result<IsaService> {
    IsaService::from_config(config)
        .with_context(|| format!("Cannot open ISA snapshot at {}", config.store.path.display()))
}

/// Print a reply; failures exit non-zero after printing the message.
fn print_reply(reply: isa_docs::Reply) -> Result<()> {
    println!("{}", reply.text);
    match reply.error {
        None => Ok(()),
        Some(kind) => bail!("request failed ({:?})", kind),
    }
}

fn cmd_check(config: &IsaDocsConfig) -> Result<()> {
    let start = Instant::now();
    let store = MemoryStore::open(&config.store.path).with_context(|| {
        format!("Snapshot {} failed validation", config.store.path.display())
    })?;

    println!("Snapshot: {}", config.store.path.display());
    println!("Instructions: {}", store.len());
    for name in store.architecture_names()? {
        let count = store.instruction_count(&name)?;
        let registers = store
            .architecture(&name)?
            .map(|a| a.registers.len())
            .unwrap_or(0);
        println!("  {:<12} {:>6} instructions {:>4} registers", name, count, registers);
    }
    println!("Validated in {:.2?}", start.elapsed());
    Ok(())
}

fn cmd_compare(config: &IsaDocsConfig, mnemonic: &str, arch: Vec<String>) -> Result<()> {
    let service = open_service(config)?;
    let mut arguments = serde_json::json!({ "mnemonic": mnemonic });
    if !arch.is_empty() {
        arguments["architectures"] = serde_json::json!(arch);
    }
    print_reply(service.call("compare_instructions", arguments))
}

fn cmd_read(config: &IsaDocsConfig, uri: &str) -> Result<()> {
    let service = open_service(config)?;
    print_reply(service.read(uri))
}

fn cmd_search(config: &IsaDocsConfig, query: &str, arch: Option<String>) -> Result<()> {
    let service = open_service(config)?;
    let arguments = serde_json::json!({ "query": query, "architecture": arch });
    print_reply(service.call("search_instructions", arguments))
}

fn cmd_serve(config: &IsaDocsConfig) -> Result<()> {
    let service = open_service(config)?;
    let server = HttpServer::bind(&config.server.bind, service, config.server.workers)
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    server.run().context("HTTP server failed")
}

fn cmd_stdio(config: &IsaDocsConfig) -> Result<()> {
    let service = open_service(config)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    stdio::serve(&service, stdin.lock(), stdout.lock()).context("stdio transport failed")
}
