//! Campus ledger HTTP server.
//!
//! Opens the configured store, seeds the default catalog, and serves the API
//! until interrupted.

use anyhow::{Context, Error};
use campus_ledger::Campus;
use campus_ledger::directory::{NewUser, Role};
use campus_ledger::store::{FileStore, KeyValueStore, MemoryStore, PgStore};
use campus_server::{
    api,
    chat::ChatClient,
    config::{AdminCredentials, ServerConfig, StoreBackend},
    logging, metrics,
};
use pico_args::Arguments;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const HELP: &str = "\
Run the campus fee and payment ledger server

USAGE:
  campus_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --data-file  PATH        Keep data in a JSON file (selects the file backend)
  --db-url     URL         Keep data in PostgreSQL (selects the postgres backend)

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  STORE_BACKEND            memory | file | postgres  [default: memory]
  DATA_FILE                Data file for the file backend
  DATABASE_URL             PostgreSQL connection string
  SEED_DEFAULTS            Seed the default fee catalog  [default: true]
  ADMIN_USERNAME           Admin account created at startup when missing
  ADMIN_PASSWORD           Password for ADMIN_USERNAME
  CHAT_PROVIDER            mock | upstream  [default: mock]
  CHAT_PROVIDER_URL        Upstream chat endpoint
  CHAT_API_KEY             Bearer token for the upstream endpoint
  CHAT_MODEL               Model name sent upstream
  METRICS_BIND             Prometheus scrape address (e.g., 127.0.0.1:9090)
  (See .env file for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    data_file: Option<PathBuf>,
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        data_file: pargs.opt_value_from_str("--data-file")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.data_file, args.database_url)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(Error::msg)?;
        info!("Prometheus metrics exposed at http://{addr}/metrics");
    }

    let store = open_store(&config.store).await?;
    let campus = Campus::new(store);

    if config.seed_defaults {
        campus
            .initialize()
            .await
            .context("Failed to seed the default catalog")?;
    }
    if let Some(admin) = &config.bootstrap_admin {
        ensure_admin(&campus, admin).await?;
    }

    let state = api::AppState::new(campus, ChatClient::new(config.chat.clone()));
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

async fn open_store(backend: &StoreBackend) -> Result<Arc<dyn KeyValueStore>, Error> {
    let store: Arc<dyn KeyValueStore> = match backend {
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::File(path) => {
            info!("Using file store at {}", path.display());
            let store = FileStore::open(path)
                .await
                .with_context(|| format!("Failed to open data file {}", path.display()))?;
            Arc::new(store)
        }
        StoreBackend::Postgres(db) => {
            info!("Connecting to PostgreSQL");
            let store = PgStore::connect(db)
                .await
                .context("Failed to connect to database")?;
            info!("Database connected successfully");
            Arc::new(store)
        }
    };
    Ok(store)
}

async fn ensure_admin(campus: &Campus, admin: &AdminCredentials) -> Result<(), Error> {
    if campus.users.find_by_username(&admin.username).await?.is_some() {
        return Ok(());
    }

    campus
        .create_user(NewUser::new(
            admin.username.as_str(),
            admin.password.as_str(),
            Role::Admin,
        ))
        .await?;
    info!("Created admin account {}", admin.username);
    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
