//! linechat - line-oriented multi-client chat relay.
//!
//! `serve` runs a relay, `connect` joins one from the terminal, and `host`
//! does both in one process.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use linechat::config::{self, Config, LogConfig};
use linechat::{ChatClient, Server, telemetry};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "linechat", version, about = "Line-oriented chat relay")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a relay server until Ctrl-C.
    Serve(ServerArgs),
    /// Join a server; stdin lines are sent, received lines printed.
    Connect {
        /// Server address (host:port).
        addr: String,
        /// Write logs to this file instead of stderr.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Start a server and join it from this terminal.
    Host(ServerArgs),
}

#[derive(Debug, Args)]
struct ServerArgs {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Listen address, overrides the configuration.
    #[arg(short, long)]
    listen: Option<SocketAddr>,
    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Connect { addr, log } => {
            telemetry::init(&LogConfig {
                file: log,
                ..LogConfig::default()
            })?;
            connect(addr).await
        }
        Command::Host(args) => host(args).await,
    }
}

/// Load the configuration, apply CLI overrides, init tracing and validate.
fn load_config(args: &ServerArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(log) = &args.log {
        config.log.file = Some(log.clone());
    }

    telemetry::init(&config.log)?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }
    Ok(config)
}

async fn serve(args: ServerArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    info!(listen = %config.server.listen, "Starting linechat");

    Server::new(&config)
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
            }
        })
        .await?;
    Ok(())
}

async fn connect(addr: String) -> anyhow::Result<()> {
    let mut client = ChatClient::new(addr).on_line(|line| println!("{line}"));
    client.enter().await?;
    let result = pump_stdin(&mut client).await;
    client.leave().await?;
    result
}

async fn host(args: ServerArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let mut server = Server::new(&config);
    let addr = server.start().await?;
    println!("server [{addr}] is listening.");

    let local = if addr.ip().is_unspecified() {
        SocketAddr::from(([127, 0, 0, 1], addr.port()))
    } else {
        addr
    };
    let mut client = ChatClient::new(local.to_string()).on_line(|line| println!("{line}"));
    let result = match client.enter().await {
        Ok(()) => {
            let pumped = pump_stdin(&mut client).await;
            client.leave().await?;
            pumped
        }
        Err(e) => Err(e.into()),
    };

    server.shutdown().await;
    result
}

/// Send stdin lines until EOF or Ctrl-C.
async fn pump_stdin(client: &mut ChatClient) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => client.send(&line).await?,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
