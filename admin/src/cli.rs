use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use types::WhitelistEntry;

#[derive(Parser, Debug)]
#[command(name = "registry-admin", about = "Inspect and maintain the player registry and whitelist")]
pub struct Params {
    /// Database URL or file path; overrides DATABASE_URL and the config file.
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// YAML config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(subcommand)]
    Players(PlayersCommand),
    #[command(subcommand)]
    Whitelist(WhitelistCommand),
}

#[derive(Subcommand, Debug)]
pub enum PlayersCommand {
    List,
    Get {
        player_uid: String,
    },
    /// Synchronize the registry with a JSON array of full player records.
    ImportRoster {
        file: PathBuf,
    },
    /// Apply a JSON array of online-player snapshots.
    ApplyOnline {
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum WhitelistCommand {
    List,
    Add(EntryArgs),
    Remove(EntryArgs),
    /// Replace the whitelist with a JSON array of entries.
    Replace {
        file: PathBuf,
    },
    /// Print the online players (JSON array file) the whitelist does not admit.
    Check {
        file: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct EntryArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub steam_id: String,
    #[arg(long, default_value = "")]
    pub player_uid: String,
}

impl From<EntryArgs> for WhitelistEntry {
    fn from(value: EntryArgs) -> Self {
        Self {
            name: value.name,
            steam_id: value.steam_id,
            player_uid: value.player_uid,
        }
    }
}
