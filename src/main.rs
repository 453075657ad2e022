//! Coin Vault command line
//!
//! Headless front end: list an owner's collection, add or remove coins,
//! and move a coin through the reorder engine.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use coin_vault::config::{AppConfig, Backend};
use coin_vault::domain::{Coin, CoinDisplay};
use coin_vault::repository::{CoinRankingOperations, Repository};
use coin_vault::reorder::{CollectionView, ReorderOutcome};
use coin_vault::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Collection owner (email or account id)
    #[arg(long)]
    owner: String,

    /// Override the configured backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the collection in display order
    List,
    /// Add a coin at the end of the collection
    Add {
        name: String,
        #[arg(long)]
        front: Option<String>,
        #[arg(long)]
        back: Option<String>,
        #[arg(long)]
        public: bool,
    },
    /// Delete a coin by id
    Remove { id: u32 },
    /// Move the coin at position FROM to position TO (1-based)
    Move { from: usize, to: usize },
    /// Close rank gaps left by deletions
    Reindex,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    let logger = rolling_logger::LoggerConfig::new(&config.log_dir, "CoinVault")
        .with_level(config.log_level.clone());
    if let Err(e) = rolling_logger::init_with_config(logger) {
        eprintln!("logging disabled: {}", e);
    }

    let state = AppState::open(config).await.context("opening collection store")?;
    let result = run(&state, &cli.owner, cli.command).await;
    state.close().await;
    result
}

async fn run(state: &AppState, owner: &str, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List => {
            let engine = state.engine(owner);
            engine.load().await?;
            print_view(&engine.view(), state.config.reorder.page_size);
        }
        Command::Add { name, front, back, public } => {
            let repo = local_repo(state)?;
            let display = CoinDisplay {
                name,
                front_image: front,
                back_image: back,
                is_public: public,
                is_nft: false,
            };
            let coin = repo.create(&Coin::new(owner, display)).await?;
            println!("added #{} \"{}\" at position {}", coin.id, coin.display.name, coin.rank);
        }
        Command::Remove { id } => {
            let repo = local_repo(state)?;
            match repo.find_by_id(id).await? {
                Some(coin) if coin.owner_key == owner => repo.delete(id).await?,
                _ => bail!("{} has no coin #{}", owner, id),
            }
            println!("removed #{}", id);
        }
        Command::Move { from, to } => {
            if from == 0 || to == 0 {
                bail!("positions are 1-based");
            }
            let engine = state.engine(owner);
            let mut notes = engine.notifications();
            engine.load().await?;

            if !engine.begin_drag(from - 1) {
                bail!("no coin at position {}", from);
            }
            let outcome = engine.end_drag(Some(to - 1)).await;
            while let Ok(note) = notes.try_recv() {
                eprintln!("{} ({})", note.message(), note.reason());
            }

            match outcome {
                ReorderOutcome::Committed => print_view(&engine.view(), state.config.reorder.page_size),
                ReorderOutcome::Cancelled => println!("nothing to move"),
                ReorderOutcome::Ignored => bail!("reorder did not start"),
                ReorderOutcome::Restored { error } => bail!("order not saved: {}", error),
                ReorderOutcome::OutOfSync { error, fetch_error } => {
                    bail!("order not saved ({}) and reload failed ({})", error, fetch_error)
                }
            }
        }
        Command::Reindex => {
            let repo = local_repo(state)?;
            let written = repo.reindex_ranks(owner).await?;
            println!("reindexed {} coins", written.len());
        }
    }
    Ok(())
}

fn local_repo(state: &AppState) -> anyhow::Result<&coin_vault::repository::CoinRepository> {
    match state.coin_repo() {
        Some(repo) => Ok(repo),
        None => bail!("this command needs the sqlite backend"),
    }
}

fn print_view(view: &CollectionView, page_size: u32) {
    if view.coins.is_empty() {
        println!("(empty collection)");
        return;
    }
    for coin in view.coins.iter().take(page_size as usize) {
        let flags = match (coin.display.is_public, coin.display.is_nft) {
            (true, true) => " [public, nft]",
            (true, false) => " [public]",
            (false, true) => " [nft]",
            (false, false) => "",
        };
        println!("{:>3}. {} (#{}){}", coin.rank, coin.display.name, coin.id, flags);
    }
    if view.total as usize > page_size as usize {
        println!("... {} more", view.total as usize - page_size as usize);
    }
}
