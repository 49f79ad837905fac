pub mod config;
pub mod error;
pub mod players;
pub mod store;
pub mod whitelist;


pub use config::DatabaseConfig;
pub use error::DatabaseError;
pub use players::PlayerRepository;
pub use store::{Store, Txn, PLAYERS_BUCKET, WHITELIST_BUCKET};
pub use whitelist::WhitelistRepository;
