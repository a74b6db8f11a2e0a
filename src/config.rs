use anyhow::{Context, Result};

use crate::document::DEFAULT_SOURCE_URL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub source_url: String,
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let port = var("PORT", "8080");
        let port = port
            .parse()
            .with_context(|| format!("Invalid PORT {port:?}"))?;

        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}:{}/{}?sslmode=disable",
                var("DB_USER", "postgres"),
                var("DB_PASSWORD", "postgres"),
                var("DB_HOST", "localhost"),
                var("DB_PORT", "5432"),
                var("DB_NAME", "currencies"),
            ),
        };

        Ok(Self {
            port,
            source_url: var("SOURCE_URL", DEFAULT_SOURCE_URL),
            database_url,
        })
    }
}
