//! httpdump CLI

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use httpdump::config::Config;
use httpdump::server::Server;
use httpdump::store::RecordStore;

/// Capture arbitrary HTTP requests into buckets and inspect them later
#[derive(Parser, Debug)]
#[command(name = "httpdump")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Directory with the bundled UI (overrides the config file)
    #[arg(long)]
    ui_dir: Option<PathBuf>,

    /// Default log level; `RUST_LOG` takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match self.config {
            Some(ref path) => Config::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if self.ui_dir.is_some() {
            config.ui_dir = self.ui_dir;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("httpdump={default_level}")));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.into_config()?;
    let store = Arc::new(RecordStore::new());

    let server = Server::bind(&config, store)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;

    if let Some(ref dir) = config.ui_dir {
        info!("Serving UI from {}", dir.display());
    }

    server
        .run(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received SIGINT, shutting down"),
                Err(e) => {
                    error!("Cannot listen for SIGINT: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    Ok(())
}
