use std::path::Path;

use database::{PlayerRepository, Store, WhitelistRepository};
use serde::de::DeserializeOwned;
use serde::Serialize;
use types::{unlisted_players, OnlinePlayer, PlayerRecord, WhitelistEntry};

use crate::cli::{Command, Params, PlayersCommand, WhitelistCommand};
use crate::config::FileConfig;
use crate::AdminError;

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AdminError> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&contents)?)
}

fn pretty<T: Serialize>(value: &T) -> Result<String, AdminError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Opens the store the parameters point at and runs the command, returning
/// what should be printed.
pub async fn run(params: Params) -> Result<String, AdminError> {
    let file_config = match &params.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = file_config.database_config(params.database);
    log::debug!("Using database {}", config.url);

    let store = Store::connect(&config).await?;
    execute(&store, params.command).await
}

pub async fn execute(store: &Store, command: Command) -> Result<String, AdminError> {
    match command {
        Command::Players(command) => players(PlayerRepository::new(store.clone()), command).await,
        Command::Whitelist(command) => {
            whitelist(WhitelistRepository::new(store.clone()), command).await
        }
    }
}

async fn players(repo: PlayerRepository, command: PlayersCommand) -> Result<String, AdminError> {
    match command {
        PlayersCommand::List => pretty(&repo.list_players().await?),
        PlayersCommand::Get { player_uid } => pretty(&repo.get_player(&player_uid).await?),
        PlayersCommand::ImportRoster { file } => {
            let roster: Vec<PlayerRecord> = read_json(&file).await?;
            repo.replace_roster(&roster).await?;
            log::info!("Imported roster from {}", file.display());
            Ok(format!("synchronized {} players", roster.len()))
        }
        PlayersCommand::ApplyOnline { file } => {
            let online: Vec<OnlinePlayer> = read_json(&file).await?;
            repo.apply_online(&online).await?;
            Ok(format!("updated {} online players", online.len()))
        }
    }
}

async fn whitelist(
    repo: WhitelistRepository,
    command: WhitelistCommand,
) -> Result<String, AdminError> {
    match command {
        WhitelistCommand::List => pretty(&repo.list().await?),
        WhitelistCommand::Add(args) => {
            let entry = WhitelistEntry::from(args);
            repo.add_or_update(&entry).await?;
            Ok(format!("whitelisted {entry}"))
        }
        WhitelistCommand::Remove(args) => {
            let entry = WhitelistEntry::from(args);
            repo.remove(&entry).await?;
            Ok(format!("removed {entry}"))
        }
        WhitelistCommand::Replace { file } => {
            let entries: Vec<WhitelistEntry> = read_json(&file).await?;
            repo.replace_all(&entries).await?;
            Ok(format!("whitelist now has {} entries", repo.list().await?.len()))
        }
        WhitelistCommand::Check { file } => {
            let online: Vec<OnlinePlayer> = read_json(&file).await?;
            let entries = repo.list().await?;
            let unlisted = unlisted_players(&online, &entries);
            if !unlisted.is_empty() {
                log::warn!("{} online players are not whitelisted", unlisted.len());
            }
            pretty(&unlisted)
        }
    }
}
