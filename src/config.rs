use std::{env, path::PathBuf};

use anyhow::{Context, Result};

use crate::cors::{AllowList, DEFAULT_ALLOWED_ORIGINS};

pub const DEFAULT_PORT: u16 = 54321;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: AllowList,
    /// Bundled seed data is used when unset.
    pub seed_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("APP_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("APP_PORT/PORT must be a valid u16, got '{raw}'"))?,
            None => DEFAULT_PORT,
        };

        let allowed_origins = match lookup("ALLOWED_ORIGINS") {
            Some(raw) => parse_origins(&raw)?,
            None => AllowList::new(DEFAULT_ALLOWED_ORIGINS),
        };

        let seed_path = lookup("MOVIES_SEED_PATH")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            allowed_origins,
            seed_path,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origins(raw: &str) -> Result<AllowList> {
    let origins = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        anyhow::bail!("ALLOWED_ORIGINS must list at least one origin");
    }

    Ok(AllowList::new(origins))
}
