use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub const DEFAULT_URL: &str = "sqlite::memory:";
pub const DEFAULT_POOL_SIZE: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl DatabaseConfig {
    pub fn from_cli_or_env_or_yaml(cli_arg: Option<String>, yaml_config: Option<String>) -> Self {
        let url = if let Some(arg) = cli_arg {
            arg
        } else if let Ok(env) = std::env::var("DATABASE_URL") {
            env
        } else if let Some(yaml) = yaml_config {
            yaml
        } else {
            DEFAULT_URL.to_string()
        };

        Self {
            url,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        let options = if self.url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(&self.url)?
        } else {
            SqliteConnectOptions::new().filename(&self.url)
        };
        let options = options
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        if self.is_memory() {
            Ok(options)
        } else {
            Ok(options.journal_mode(SqliteJournalMode::Wal))
        }
    }

    pub async fn create_pool(&self) -> Result<sqlx::SqlitePool, sqlx::Error> {
        let options = self.connect_options()?;

        // Every connection to `:memory:` opens its own empty database, so an
        // in-memory store lives on exactly one connection that never expires.
        let pool_options = if self.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(self.pool_size.max(1) as u32)
        };

        pool_options.connect_with(options).await
    }
}
