//! threadline binary: `serve` runs the gateway, `client` the terminal
//! client, `status` a one-shot health probe.

use anyhow::Result;
use clap::{Parser, Subcommand};

use threadline::client::ApiClient;
use threadline::config::Config;

#[derive(Parser)]
#[command(name = "threadline", version, about = "Messaging behind signup/login")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the interactive client shell
    Client {
        /// Gateway base URL
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        base_url: String,
    },
    /// Probe gateway health and exit
    Status {
        /// Gateway base URL
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        base_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            threadline::gateway::run_gateway(&host, port, config).await
        }
        Command::Client { base_url } => threadline::client::shell::run_client(&base_url).await,
        Command::Status { base_url } => {
            let api = ApiClient::new(base_url);
            match api.health().await {
                Ok(health) => {
                    println!(
                        "status={} database={} users={}",
                        health.status, health.database, health.users
                    );
                    Ok(())
                }
                Err(e) => {
                    println!("unreachable: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
