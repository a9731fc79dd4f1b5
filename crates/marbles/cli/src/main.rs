mod host;

use chrono::{DateTime, Utc};
use clap::Parser;
use host::{load_config, Invocation, Peer};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "marbles",
    version,
    about = "Run one marbles chaincode invocation against a local ledger snapshot"
)]
struct Cli {
    /// Ledger snapshot file. Created on the first committed write.
    #[arg(long, default_value = "marbles-ledger.json", env = "MARBLES_LEDGER")]
    ledger: PathBuf,
    /// TOML chaincode configuration.
    #[arg(long, env = "MARBLES_CONFIG")]
    config: Option<PathBuf>,
    /// Transaction id. A random UUID when omitted.
    #[arg(long)]
    tx_id: Option<String>,
    /// Transaction timestamp (RFC 3339). The current time when omitted.
    #[arg(long)]
    timestamp: Option<DateTime<Utc>>,
    /// Chaincode function, e.g. init_owner or review_marble.
    function: String,
    /// Function arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("marbles=info,marbles_chaincode=info,marbles_ledger=warn")
            }),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let peer = Peer::new(config, cli.ledger)?;
    let invocation = Invocation {
        tx_id: cli
            .tx_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        timestamp: cli.timestamp.unwrap_or_else(Utc::now),
        function: cli.function,
        args: cli.args,
    };

    let payload = peer.execute(&invocation)?;
    if !payload.is_empty() {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&payload)?;
        stdout.write_all(b"\n")?;
    }
    Ok(())
}
