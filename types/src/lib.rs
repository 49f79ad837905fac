pub mod player;
pub mod whitelist;

pub use player::{is_placeholder_id, OnlinePlayer, PlayerRecord, TersePlayer, PLACEHOLDER_RUN};
pub use whitelist::{unlisted_players, WhitelistEntry};
