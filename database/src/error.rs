use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Query execution error: {0}")]
    Query(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Player not found in whitelist: {0}")]
    WhitelistEntryNotFound(String),

    #[error("Bucket does not exist: {0}")]
    BucketMissing(String),

    #[error("Invalid player record: {0}")]
    InvalidRecord(String),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
}

impl DatabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DatabaseError::PlayerNotFound(_) | DatabaseError::WhitelistEntryNotFound(_)
        )
    }
}
