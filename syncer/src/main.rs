use std::sync::Arc;

use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;

use wallet_syncer::application::{
    Deposit, FallBack, InternalDispatcher, Shutdown, Supervisor,
};
use wallet_syncer::config::AppConfig;
use wallet_syncer::infrastructure::node::WalletNodeClient;
use wallet_syncer::infrastructure::persistence::Store;
use wallet_syncer::infrastructure::web::WebService;
use wallet_syncer::utils::logging;

#[derive(Parser)]
#[command(name = "wallet-syncer")]
#[command(about = "An exchange wallet scanner service with an rpc api server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show project version
    Version,
    /// Run database migrations
    Migrate,
    /// Run the sync workers and the rpc service
    Rpc,
}

#[tokio::main]
async fn main() {
    logging::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Command::Version => {
            println!("wallet-syncer {}", env!("CARGO_PKG_VERSION"));
        }
        Command::Migrate => {
            if let Err(e) = run_migrations().await {
                logging::log_error(&format!("migrations failed: {}", e));
                std::process::exit(1);
            }
        }
        Command::Rpc => {
            if let Err(e) = run_service().await {
                logging::log_error(&format!("service failed: {}", e));
                std::process::exit(1);
            }
        }
    }
}

async fn run_migrations() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    logging::log_info("running migrations...");
    let connection = Database::connect(&config.database.url).await?;
    Migrator::up(&connection, None).await?;
    logging::log_info("migrations completed");
    Ok(())
}

async fn run_service() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    let shutdown = Shutdown::new();

    let store = Store::connect(&config.database).await?;
    let rpc = Arc::new(WalletNodeClient::new(&config.node));

    let deposit = Deposit::new(&config.chain, store.clone(), rpc.clone(), shutdown.clone()).await?;
    let dispatcher =
        InternalDispatcher::new(&config.chain, store.clone(), rpc.clone(), shutdown.clone());
    let fallback = FallBack::new(&config.chain, store.clone(), rpc.clone(), shutdown.clone());
    let web = WebService::new(
        &config.server,
        &config.node,
        store,
        rpc,
        shutdown.clone(),
    );

    let mut supervisor = Supervisor::new(shutdown.clone());
    supervisor.register(Box::new(deposit));
    supervisor.register(Box::new(dispatcher));
    supervisor.register(Box::new(fallback));
    supervisor.register(Box::new(web));

    supervisor.start_all()?;

    wait_for_shutdown(&shutdown).await;
    supervisor.stop_all().await;

    if let Some(cause) = shutdown.cause() {
        return Err(cause.to_string().into());
    }
    Ok(())
}

/// Block until ctrl-c, SIGTERM, or a critical error cancels the root
async fn wait_for_shutdown(shutdown: &Shutdown) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut stream = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        stream.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => logging::log_info("shutdown signal received"),
        _ = terminate => logging::log_info("terminate signal received"),
        _ = shutdown.cancelled() => {}
    }
}
