pub mod cli;
pub mod commands;
pub mod config;

use thiserror::Error;

pub use cli::{Command, EntryArgs, Params, PlayersCommand, WhitelistCommand};
pub use commands::{execute, run};
pub use config::FileConfig;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] database::DatabaseError),
}
