mod address;
mod config;
mod controller;
mod network;
mod post;
mod view;
mod wallet;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use config::{Config, DEFAULT_CONFIG_FILE};
use controller::{Command, SyncController};
use ethers::{
    providers::{Http, Provider},
    types::{Address, U256},
};
use log::{error, info, warn};
use network::contract::ContractGateway;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{mpsc, watch},
};
use view::Surface;
use wallet::Wallet;

#[derive(Parser, Debug)]
#[command(name = "chirp", version, about = "Post and like short messages stored in a contract")]
struct Cli {
    /// Config file (defaults to ./chirp.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the wallet
    #[arg(long)]
    rpc_url: Option<String>,

    /// Address of the posts contract
    #[arg(long)]
    contract: Option<String>,

    /// JSON interface descriptor of the contract
    #[arg(long)]
    abi: Option<PathBuf>,

    /// Write the rendered page to this file after every change
    #[arg(long)]
    html_out: Option<PathBuf>,

    /// Connect the wallet right away
    #[arg(long)]
    connect: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.rpc_url {
            config.rpc_url = Some(url.clone());
        }
        if let Some(contract) = &self.contract {
            config.contract_address = contract.clone();
        }
        if let Some(abi) = &self.abi {
            config.abi_path = Some(abi.clone());
        }
        if let Some(out) = &self.html_out {
            config.html_out = Some(out.clone());
        }
    }
}

enum Input {
    Command(Command),
    Quit,
    Empty,
}

/// Parses one line typed by the user:
/// `connect`, `refresh`, `post <text>`, `like <author> <id>`, `quit`
fn parse_input(line: &str) -> Result<Input> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "" => return Ok(Input::Empty),
        "quit" | "exit" => return Ok(Input::Quit),
        "connect" => Command::Connect,
        "refresh" => Command::Refresh,
        "post" => Command::SubmitPost(rest.to_owned()),
        "like" => {
            let mut args = rest.split_whitespace();
            let (author, id) = match (args.next(), args.next(), args.next()) {
                (Some(author), Some(id), None) => (author, id),
                _ => return Err(anyhow!("usage: like <author> <id>")),
            };
            let author: Address = author
                .parse()
                .with_context(|| format!("invalid author address {:?}", author))?;
            let id = U256::from_dec_str(id).with_context(|| format!("invalid post id {:?}", id))?;
            Command::LikePost { author, id }
        }
        other => return Err(anyhow!("unknown command {:?}", other)),
    };
    Ok(Input::Command(command))
}

async fn read_commands(sender: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                return;
            }
        };

        match parse_input(&line) {
            Ok(Input::Command(command)) => {
                if sender.send(command).await.is_err() {
                    return;
                }
            }
            Ok(Input::Quit) => return,
            Ok(Input::Empty) => {}
            Err(e) => warn!("{}", e),
        }
    }
}

/// Prints every new surface and mirrors it to `html_out`
async fn present(mut surface: watch::Receiver<Surface>, html_out: Option<PathBuf>) {
    while surface.changed().await.is_ok() {
        let current = surface.borrow_and_update().clone();
        println!("{}", current);

        if let Some(path) = &html_out {
            if let Err(e) = tokio::fs::write(path, current.to_html()).await {
                error!("Failed to write {}: {}", path.display(), e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_from(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    cli.apply(&mut config);

    let provider = match &config.rpc_url {
        Some(url) => {
            let mut provider = Provider::<Http>::try_from(url.as_str())
                .with_context(|| format!("invalid rpc url {:?}", url))?;
            if let Some(ms) = config.poll_interval_ms {
                provider = provider.interval(Duration::from_millis(ms));
            }
            info!("Using wallet endpoint {}", url);
            Some(Arc::new(provider))
        }
        None => {
            warn!("No rpc_url configured, wallet calls will fail");
            None
        }
    };

    let gateway = ContractGateway::new(
        Wallet::new(provider),
        config.contract_address()?,
        config.abi()?,
    )
    .confirmations(config.confirmations)
    .legacy(config.legacy_transactions);
    let controller = SyncController::new(Arc::new(gateway), config.renderer());

    let presenter = tokio::spawn(present(controller.subscribe(), config.html_out.clone()));

    let (sender, receiver) = mpsc::channel(16);
    if cli.connect {
        sender.send(Command::Connect).await?;
    }
    tokio::spawn(read_commands(sender));

    controller.run(receiver).await;
    if let Err(e) = presenter.await {
        error!("Presenter stopped: {}", e);
    }
    Ok(())
}
