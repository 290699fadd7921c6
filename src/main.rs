//! Person CRUD service entry point.

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};

use pessoas_api::api::{create_router, AppState};
use pessoas_api::config::Config;
use pessoas_api::logging;
use pessoas_api::metrics;
use pessoas_api::person::{seed, PersonRepository};
use pessoas_api::utils::shutdown_signal;

/// CRUD HTTP service for person records.
#[derive(Parser, Debug)]
#[command(name = "pessoas-api")]
#[command(about = "CRUD HTTP service for person records backed by SQLite")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the table and fill it with generated sample people.
    Seed {
        /// Number of people to generate (overrides SEED_COUNT).
        #[arg(short, long)]
        count: Option<usize>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Seed { count }) => cmd_seed(count, args.verbose).await,
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port), args.verbose).await,
        None => cmd_serve(args.port, args.verbose).await,
    }
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("PESSOAS API - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Database: {}", config.database_path.display());
    println!("  Log File: {}", config.log_file.display());
    println!("  Bind: {}:{}", config.host, config.port);
    println!("  Log Level: {}", config.rust_log);
    println!("  Seed Count: {}", config.seed_count);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Create the schema and insert sample rows.
async fn cmd_seed(count: Option<usize>, verbose: bool) -> anyhow::Result<()> {
    let config = Config::load_validated()?;
    let log_guard = logging::init(&config, verbose)?;

    let count = count.unwrap_or(config.seed_count);
    let repo = PersonRepository::new(&config.database_path);

    info!("Seeding {} with {} people...", config.database_path.display(), count);
    let inserted = tokio::task::spawn_blocking(move || seed::seed(&repo, count)).await??;
    info!("Inserted {} people", inserted);

    log_guard.flush()?;
    Ok(())
}

/// Serve the HTTP API until a shutdown signal arrives.
async fn cmd_serve(port_override: Option<u16>, verbose: bool) -> anyhow::Result<()> {
    let mut config = Config::load_validated()?;

    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
    }

    let log_guard = logging::init(&config, verbose)?;
    info!("Configuration loaded successfully");

    // Initialize metrics
    let handle = metrics::install()?;

    let repo = PersonRepository::new(&config.database_path);
    let schema_repo = repo.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || schema_repo.ensure_schema()).await? {
        error!("Failed to prepare database {}: {}", config.database_path.display(), e);
        return Err(e.into());
    }
    info!("Database: {}", config.database_path.display());

    let app_state = AppState::new(repo, handle);

    // Start HTTP server
    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    log_guard.flush()?;
    Ok(())
}
