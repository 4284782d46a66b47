use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::matching::DEFAULT_MIN_SCORE;

/// Tunables for deck building and final picking.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub deck_size: usize,
    pub min_viable_deck: usize,
    pub topup_batch: usize,
    pub topup_cooldown: Duration,
    pub min_score: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            deck_size: 10,
            min_viable_deck: 3,
            topup_batch: 5,
            topup_cooldown: Duration::from_secs(2),
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub tmdb_api_key: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_temperature: f32,
    pub bind: SocketAddr,
    pub api_token: Option<String>,
    pub region: String,
    pub engine: EngineSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let tmdb_api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        let gemini_api_key = env::var("GEMINI_API_KEY").context("GEMINI_API_KEY not set")?;
        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash-lite".to_string());
        let gemini_temperature = parse_var("GEMINI_TEMPERATURE", 0.7_f32)?;
        let bind = parse_var("REELPICK_BIND", SocketAddr::from(([0, 0, 0, 0], 3146)))?;
        let api_token = env::var("REELPICK_API_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());
        let region = env::var("REELPICK_REGION")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_ascii_uppercase())
            .unwrap_or_else(|| "US".to_string());
        let cooldown_ms = parse_var("DECK_TOPUP_COOLDOWN_MS", 2000_u64)?;

        Ok(Self {
            tmdb_api_key,
            gemini_api_key,
            gemini_model,
            gemini_temperature,
            bind,
            api_token,
            region,
            engine: EngineSettings {
                topup_cooldown: Duration::from_millis(cooldown_ms),
                ..EngineSettings::default()
            },
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: '{raw}'")),
        _ => Ok(default),
    }
}
