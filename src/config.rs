use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: String,

    // Uploads
    pub max_upload_bytes: usize,
    pub session_ttl_secs: u64,
    pub session_capacity: u64,

    // Rate limiting
    pub rate_upload_per_min: u32,
    pub rate_query_per_min: u32,

    // Dashboard
    pub demo_employees: usize,
    pub demo_seed: Option<u64>,
    pub preview_row_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            api_prefix: "/api/v1".to_string(),
            log_dir: "logs".to_string(),
            max_upload_bytes: 25 * 1024 * 1024,
            session_ttl_secs: 3600,
            session_capacity: 64,
            rate_upload_per_min: 30,
            rate_query_per_min: 600,
            demo_employees: 50,
            demo_seed: None,
            preview_row_limit: 200,
        }
    }
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Self::default();

        let demo_seed = match env::var("DEMO_SEED") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse()
                    .with_context(|| format!("DEMO_SEED has an invalid value: {raw:?}"))?,
            ),
            _ => None,
        };

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or(defaults.server_addr),
            api_prefix: env::var("API_PREFIX").unwrap_or(defaults.api_prefix),
            log_dir: env::var("LOG_DIR").unwrap_or(defaults.log_dir),

            max_upload_bytes: var_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            session_ttl_secs: var_or("SESSION_TTL_SECS", defaults.session_ttl_secs)?,
            session_capacity: var_or("SESSION_CAPACITY", defaults.session_capacity)?,

            rate_upload_per_min: var_or("RATE_UPLOAD_PER_MIN", defaults.rate_upload_per_min)?,
            rate_query_per_min: var_or("RATE_QUERY_PER_MIN", defaults.rate_query_per_min)?,

            demo_employees: var_or("DEMO_EMPLOYEES", defaults.demo_employees)?,
            demo_seed,
            preview_row_limit: var_or("PREVIEW_ROW_LIMIT", defaults.preview_row_limit)?,
        })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
