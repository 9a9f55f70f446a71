// region:    --- Imports
use auction_store::auction::AuctionLifecycle;
use auction_store::clock::{Clock, SystemClock};
use auction_store::config::StoreConfig;
use auction_store::database::DatabaseManager;
use auction_store::scheduler::LifecycleScheduler;
use auction_store::schema::Schema;
use auction_store::store::{PgStore, Store};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
// endregion: --- Imports

// region:    --- Cli
/// Settings come from the environment (`DATABASE_URL`, `DB_MAX_CONNECTIONS`,
/// `AUCTION_INTERVAL`, `MAX_BID_RETRIES`, `SWEEP_INTERVAL`); flags override them.
#[derive(Debug, Parser)]
#[command(name = "auction-store", version, about = "Auction storage core")]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long)]
    database_url: Option<String>,

    #[arg(long)]
    max_connections: Option<u32>,

    /// Default auction duration, e.g. `5m`
    #[arg(long, value_parser = humantime::parse_duration)]
    auction_interval: Option<Duration>,

    #[arg(long)]
    max_bid_retries: Option<u32>,

    /// Lifecycle scheduler period, e.g. `1s`
    #[arg(long, value_parser = humantime::parse_duration)]
    sweep_interval: Option<Duration>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create missing tables and indexes
    Provision {
        /// Also insert the sample users, auction and bids
        #[arg(long)]
        seed: bool,
    },
    /// Apply due status transitions once and print them as JSON lines
    Sweep,
    /// Provision, then run the lifecycle scheduler until interrupted
    Run {
        #[arg(long)]
        seed: bool,
    },
}

impl Cli {
    fn config(&self, mut config: StoreConfig) -> StoreConfig {
        let positive = |d: Option<Duration>| d.filter(|d| !d.is_zero());
        if let Some(url) = &self.database_url {
            config.database_url = Some(url.clone());
        }
        if let Some(n) = self.max_connections.filter(|n| *n > 0) {
            config.max_connections = n;
        }
        if let Some(d) = positive(self.auction_interval) {
            config.auction_interval = d;
        }
        if let Some(n) = self.max_bid_retries {
            config.max_bid_retries = n;
        }
        if let Some(d) = positive(self.sweep_interval) {
            config.sweep_interval = d;
        }
        config
    }
}
// endregion: --- Cli

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("auction_store=info")),
        )
        .without_time()
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.config(StoreConfig::from_env());
    info!(
        "{:<12} --> max_connections={}, auction_interval={:?}, max_bid_retries={}, sweep_interval={:?}",
        "Config", config.max_connections, config.auction_interval, config.max_bid_retries, config.sweep_interval
    );

    let Some(database_url) = config.database_url.as_deref() else {
        error!("{:<12} --> DATABASE_URL is not set", "Main");
        return Err("DATABASE_URL is not set (env or --database-url)".into());
    };
    let db = DatabaseManager::connect(database_url, config.max_connections).await?;
    let store = Arc::new(PgStore::new(Arc::new(db)));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let lifecycle = Arc::new(AuctionLifecycle::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        config.auction_interval,
    ));

    match cli.command {
        Command::Provision { seed } => {
            provision(store.as_ref(), clock.as_ref(), &config, seed).await?;
        }
        Command::Sweep => {
            for event in lifecycle.sweep().await? {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
        Command::Run { seed } => {
            provision(store.as_ref(), clock.as_ref(), &config, seed).await?;
            let scheduler = LifecycleScheduler::new(Arc::clone(&lifecycle), config.sweep_interval);
            let handle = scheduler.start();

            tokio::signal::ctrl_c().await?;
            info!("{:<12} --> interrupted, stopping scheduler", "Main");
            if let Err(e) = handle.stop().await {
                error!("{:<12} --> scheduler task failed: {:?}", "Main", e);
            }
        }
    }
    Ok(())
}

async fn provision(
    store: &PgStore,
    clock: &dyn Clock,
    config: &StoreConfig,
    seed: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = Schema::declared();
    if let Err(e) = store.ensure_schema(&schema).await {
        error!("{:<12} --> provisioning failed: {:?}", "Main", e);
        return Err(e.into());
    }
    let description = store.describe_schema(&schema).await?;
    info!(
        "{:<12} --> provisioned collections={:?}, indexes={}",
        "Main",
        description.collections,
        description.indexes.len()
    );

    if seed {
        let report = auction_store::seed::seed(store, clock, config.auction_interval).await?;
        info!("{:<12} --> seeded: {:?}", "Main", report);
    }
    Ok(())
}
// endregion: --- Main
