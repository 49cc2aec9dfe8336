use std::env;
use std::path::PathBuf;

/// Runtime configuration, resolved from the environment (a `.env` file is
/// honored when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let database_path = env::var("INDICATOR_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/indicators.db"));

        Config { database_path }
    }
}
