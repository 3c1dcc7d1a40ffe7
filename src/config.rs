use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use tracing::warn;
use url::Url;

use crate::prompt::DEFAULT_BUDGET;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_dir: PathBuf,
    pub prompt_budget: usize,
    pub api_base_url: String,
    pub http_timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub catalog_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub remember_key: bool,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_u64(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Ignoring invalid {}='{}'; using {}", name, value, default);
                default
            }
        },
        Err(_) => default,
    }
}

pub fn parse_budget(raw: Option<&str>) -> Result<usize> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(DEFAULT_BUDGET);
    };

    let value = raw
        .parse::<f64>()
        .map_err(|_| anyhow!("WF_PROMPT_BUDGET must be a number, got '{raw}'"))?;
    if !value.is_finite() || value <= 0.0 || value.fract() != 0.0 || value > usize::MAX as f64 {
        return Err(anyhow!(
            "WF_PROMPT_BUDGET must be a positive whole number of characters, got '{raw}'"
        ));
    }
    Ok(value as usize)
}

fn normalize_base_url(value: String) -> Result<String> {
    let parsed = Url::parse(&value).map_err(|err| anyhow!("Invalid WF_API_BASE_URL '{value}': {err}"))?;
    if parsed.cannot_be_a_base() {
        return Err(anyhow!("WF_API_BASE_URL '{value}' cannot be used as a base URL"));
    }
    Ok(value.trim_end_matches('/').to_string())
}

impl Config {
    pub fn load() -> Result<Self> {
        let prompt_budget = parse_budget(env_optional("WF_PROMPT_BUDGET").as_deref())?;
        let api_base_url =
            normalize_base_url(env_string("WF_API_BASE_URL", "http://127.0.0.1:8069"))?;

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            log_dir: PathBuf::from(env_string("LOG_DIR", "logs")),
            prompt_budget,
            api_base_url,
            http_timeout_seconds: env_u64("WF_HTTP_TIMEOUT_SECONDS", 300),
            connect_timeout_seconds: env_u64("WF_CONNECT_TIMEOUT_SECONDS", 10),
            catalog_path: env_optional("WF_CATALOG_PATH").map(PathBuf::from),
            api_key: env_optional("WF_API_KEY"),
            remember_key: env_bool("WF_REMEMBER_KEY", true),
        })
    }
}
