//! Process configuration read from the environment and an optional `.env`
//! file. Variables already set in the process win over the file.

use std::collections::HashMap;
use std::num::ParseIntError;

use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATABASE_URL: &str = "memory://";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid PORT {value:?}: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("reading .env: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
}

impl Config {
    /// Read `HOST`, `PORT` and `DATABASE_URL` from the process environment,
    /// falling back to a `.env` file found in the working directory or one
    /// of its parents. A missing `.env` is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match dotenvy::dotenv_iter() {
            Ok(iter) => iter.collect::<Result<HashMap<_, _>, _>>()?,
            Err(e) if e.not_found() => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        if !file.is_empty() {
            tracing::debug!(keys = file.len(), "loaded .env");
        }
        Self::layered(&file, |key| std::env::var(key).ok())
    }

    fn layered(
        file: &HashMap<String, String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env(key).or_else(|| file.get(key).cloned()))
    }

    /// `MONGO_URI` is honoured when `DATABASE_URL` is unset.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database_url: lookup("DATABASE_URL")
                .or_else(|| lookup("MONGO_URI"))
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}
