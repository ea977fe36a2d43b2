//! mongo-console binary
//!
//! Runs shell-style MongoDB commands against saved connections.
//!
//! # Usage
//!
//! ```bash
//! # One command
//! mongo-console exec -C local 'db.users.find({"active": true}).limit(5)'
//!
//! # Line loop over stdin
//! mongo-console shell -C local -d shop
//! ```

use std::sync::Arc;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use mongo_console::cli::CliInterface;
use mongo_console::connection::ConnectionPool;
use mongo_console::error::Result;

/// Application entry point
#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Start the idle sweeper and signal listener
/// 4. Run the subcommand, then close every pooled client
///
/// # Returns
/// * `Result<bool>` - Whether the subcommand succeeded
async fn run() -> Result<bool> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    let pool = Arc::new(ConnectionPool::new(cli.store(), cli.config().pool.clone()));
    let shutdown = CancellationToken::new();
    let sweeper = pool.spawn_idle_sweeper(shutdown.child_token());

    let signal_token = shutdown.clone();
    let signal_listener = tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    let outcome = tokio::select! {
        outcome = cli.run(pool.clone(), shutdown.clone()) => outcome,
        _ = shutdown.cancelled() => Ok(false),
    };

    shutdown.cancel();
    signal_listener.abort();
    let _ = sweeper.await;
    pool.close_all_connections().await;

    outcome
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            eprintln!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, closing connections");
}

/// Initialize logging from the effective configuration
///
/// Logs go to stderr so command output on stdout stays parseable.
///
/// # Arguments
/// * `cli` - CLI interface with the merged configuration
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
