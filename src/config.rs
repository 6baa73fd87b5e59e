use std::env;
use std::fs;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};

use crate::model::Sampling;

pub const DEFAULT_API_URL: &str = "https://api.cerebras.ai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama3.1-8b";
pub const DEFAULT_ORIGINS: [&str; 3] = [
    "https://dibinxavier.github.io",
    "http://localhost:5500",
    "https://bodha-zeta.vercel.app",
];
const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../prompts/bodha.txt");

/// Startup configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub port: u16,
    pub api_url: String,
    pub sampling: Sampling,
    pub history_limit: usize,
    pub system_prompt: String,
    pub allowed_origins: Vec<String>,
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = match get("CEREBRAS_API_KEY") {
            Some(key) => key,
            None => bail!("Missing CEREBRAS_API_KEY environment variable"),
        };

        let system_prompt = match get("SYSTEM_PROMPT_FILE") {
            Some(path) => fs::read_to_string(&path)
                .with_context(|| format!("Failed to read system prompt from {}", path))?,
            None => DEFAULT_SYSTEM_PROMPT.to_string(),
        };

        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            api_key,
            port: parse_or(&get, "PORT", 8080)?,
            api_url: get("CEREBRAS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            sampling: Sampling {
                model: get("CEREBRAS_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                temperature: parse_or(&get, "TEMPERATURE", 0.8)?,
                top_p: parse_or(&get, "TOP_P", 0.9)?,
                max_tokens: parse_or(&get, "MAX_TOKENS", 512)?,
            },
            history_limit: parse_or(&get, "HISTORY_LIMIT", 10)?,
            system_prompt,
            allowed_origins,
            timeout: parse_opt::<u64, _>(&get, "CEREBRAS_TIMEOUT_SECS")?.map(Duration::from_secs),
        })
    }
}

fn parse_opt<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow!("Invalid value for {}: {:?} ({})", key, raw, e))
        })
        .transpose()
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}
