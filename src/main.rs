use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;

use silkify_license::config::Config;
use silkify_license::db::{DbPool, create_pool, init_db, queries};
use silkify_license::handlers;
use silkify_license::keygen::OsKeyGenerator;
use silkify_license::ledger::LicenseLedger;
use silkify_license::shopify::sample_order;
use silkify_license::state::AppState;
use silkify_license::store::SqliteStore;

#[derive(Parser, Debug)]
#[command(name = "silkify-license")]
#[command(about = "License issuance and store binding for the Silkify Shopify theme")]
struct Cli {
    /// Release the store binding of a license key, then exit
    #[arg(long, value_name = "KEY")]
    release: Option<String>,

    /// Seed the database with three sample licenses (dev mode only)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Issues three licenses for the sample order when the database is empty.
fn seed_dev_data(ledger: &LicenseLedger, pool: &DbPool, currency: &str) {
    let conn = pool.get().expect("Failed to get db connection for seeding");
    let count = queries::count_licenses(&conn).expect("Failed to count licenses");
    if count > 0 {
        tracing::info!("Database already has licenses, skipping seed");
        return;
    }
    drop(conn);

    let provenance = sample_order().provenance(currency);
    let keys = ledger
        .issue(3, &provenance)
        .expect("Failed to issue seed licenses");

    tracing::info!("============================================");
    tracing::info!("DEV LICENSES SEEDED (order {})", provenance.order_reference);
    tracing::info!("============================================");

    println!();
    println!("--- COPY FROM HERE ---");
    for key in &keys {
        println!("  {}", key);
    }
    println!("--- END COPY ---");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "silkify_license=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let ledger = Arc::new(LicenseLedger::new(
        Arc::new(SqliteStore::new(db_pool.clone())),
        Arc::new(OsKeyGenerator),
    ));

    // Administrative release runs instead of the server
    if let Some(key) = cli.release {
        match ledger.release(&key) {
            Ok(outcome) if outcome.cleared => {
                println!("Released {}", key);
                return;
            }
            Ok(_) => {
                eprintln!("License not found: {}", key);
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Failed to release {}: {}", key, e);
                std::process::exit(1);
            }
        }
    }

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set LICENSE_ENV=dev)");
        } else {
            seed_dev_data(&ledger, &db_pool, &config.default_currency);
        }
    }

    let state = AppState {
        ledger,
        catalog: Arc::new(config.catalog.clone()),
        default_currency: config.default_currency.clone(),
        max_licenses_per_order: config.max_licenses_per_order,
    };

    if config.dev_mode {
        tracing::info!("DEV endpoints enabled: POST /api/webhook-test");
    }

    let app = Router::new()
        .merge(handlers::router(config.dev_mode))
        .layer(handlers::cors_layer(config.cors_max_age_secs))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("License server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        // Release pooled connections before removing the file
        drop(db_pool);
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
