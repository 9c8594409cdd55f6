use anyhow::Context;
use clap::Parser;
use powchain_core::{constants::DEFAULT_DIFFICULTY, Ledger, LedgerConfig};
use powchain_node::{
    build_router,
    constants::{DEFAULT_LISTEN, DEFAULT_LOG_FILTER},
    AppState,
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "powchain-node")]
#[command(about = "HTTP node serving an in-memory proof-of-work ledger")]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Leading zero hex digits required of every mined block hash
    #[arg(long, default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: u32,

    /// Give up a mining attempt after this many nonces
    #[arg(long)]
    max_mining_attempts: Option<u64>,

    /// Only accept Ed25519-signed transactions
    #[arg(long)]
    require_signatures: bool,
}

impl Args {
    fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            difficulty: self.difficulty,
            max_mining_attempts: self.max_mining_attempts,
            require_signatures: self.require_signatures,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let ledger = Ledger::new(args.ledger_config()).context("invalid ledger configuration")?;
    info!(
        difficulty = ledger.difficulty(),
        policy = ?ledger.policy(),
        "ledger ready"
    );

    let app = build_router(AppState::new(ledger));

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {}", args.listen))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("powchain-node listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("powchain-node stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
