use anyhow::{bail, Context, Result};

use crate::composition::pipeline::PipelineSettings;
use crate::composition::quality_gate::ParrotingThresholds;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub max_attempts: u32,
    pub parroting_max_overlap: f64,
    pub parroting_min_run_words: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let max_attempts = get("REPLY_MAX_ATTEMPTS", "3")
            .parse::<u32>()
            .context("REPLY_MAX_ATTEMPTS must be a positive integer")?;
        if max_attempts == 0 {
            bail!("REPLY_MAX_ATTEMPTS must be at least 1");
        }

        let parroting_max_overlap = get("PARROTING_MAX_OVERLAP", "0.35")
            .parse::<f64>()
            .context("PARROTING_MAX_OVERLAP must be a number")?;
        if !(0.0..=1.0).contains(&parroting_max_overlap) {
            bail!("PARROTING_MAX_OVERLAP must be between 0.0 and 1.0");
        }

        Ok(Config {
            anthropic_api_key: lookup("ANTHROPIC_API_KEY")
                .filter(|v| !v.trim().is_empty())
                .context("Required environment variable 'ANTHROPIC_API_KEY' is not set")?,
            host: get("HOST", "127.0.0.1"),
            port: get("PORT", "5001")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG", "info"),
            max_attempts,
            parroting_max_overlap,
            parroting_min_run_words: get("PARROTING_MIN_RUN", "10")
                .parse::<usize>()
                .context("PARROTING_MIN_RUN must be a positive integer")?,
        })
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            max_attempts: self.max_attempts,
            thresholds: ParrotingThresholds {
                max_overlap_ratio: self.parroting_max_overlap,
                min_verbatim_run_words: self.parroting_min_run_words,
                ..ParrotingThresholds::default()
            },
        }
    }
}
