mod keys;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use powchain_core::{auth::Keypair, Payload};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "powchain-cli")]
#[command(about = "CLI client for the powchain node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction payload (any JSON value)
    Submit {
        /// Payload as JSON, e.g. '{"sender":"A","recipient":"B","value":10}'
        #[arg(long)]
        payload: String,
        /// Sign with the key seed stored at this path
        #[arg(long)]
        key: Option<PathBuf>,
    },
    /// Mine all pending transactions into a block
    Mine,
    /// Print the full chain
    Chain,
    /// Print pending transactions
    Pending,
    /// Verify the chain
    Verify,
    /// Generate a signing key and print its identity
    Keygen {
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let node = cli.node.trim_end_matches('/');

    let request = match cli.cmd {
        Command::Submit { payload, key } => {
            let payload: Payload =
                serde_json::from_str(&payload).context("payload is not valid JSON")?;
            match key {
                Some(path) => {
                    let keys = keys::load_key(&path)?;
                    let signed = keys.sign(payload);
                    debug!(identity = %signed.identity, "submitting signed transaction");
                    client
                        .post(format!("{node}/transactions/signed"))
                        .json(&signed)
                }
                None => client.post(format!("{node}/transactions")).json(&payload),
            }
        }
        Command::Mine => client.post(format!("{node}/mine")),
        Command::Chain => client.get(format!("{node}/chain")),
        Command::Pending => client.get(format!("{node}/transactions")),
        Command::Verify => client.get(format!("{node}/verify")),
        Command::Keygen { out } => {
            let keys = Keypair::generate();
            keys::save_key(&out, &keys)?;
            println!("identity: {}", keys.identity());
            println!("seed written to {}", out.display());
            return Ok(());
        }
    };

    let res = request.send().await.context("node unreachable")?;
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
