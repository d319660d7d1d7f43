//! Runtime configuration read from the environment
//!
//! Values may come from a `.env` file (loaded by `main` through dotenvy) or
//! from the process environment. Unset or unparsable values fall back to
//! the defaults below.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (`PORT`, default 8080)
    pub port: u16,

    /// Path to the database file (`DATABASE_URL`, default "data.db")
    pub database_url: String,

    /// Public origin used to build share links (`BASE_URL`, default "http://localhost")
    pub base_url: String,

    /// Length of generated join codes (`TRIP_CODE_LENGTH`, default 6)
    pub code_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: "data.db".to_string(),
            base_url: "http://localhost".to_string(),
            code_length: 6,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let code_length = env::var("TRIP_CODE_LENGTH")
            .ok()
            .and_then(|len| len.parse::<usize>().ok())
            .filter(|len| *len > 0)
            .unwrap_or(defaults.code_length);

        Self {
            port,
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            base_url: env::var("BASE_URL").unwrap_or(defaults.base_url),
            code_length,
        }
    }

    /// Origin including the port, e.g. "http://localhost:8080"
    pub fn public_origin(&self) -> String {
        format!("{}:{}", self.base_url.trim_end_matches('/'), self.port)
    }

    pub fn share_url(&self, code: &str) -> String {
        format!("{}/trip/{}", self.public_origin(), code)
    }
}
