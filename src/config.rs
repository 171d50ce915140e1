//! Application configuration loading from environment variables.
//!
//! All configuration is read from the environment at startup (a `.env` file is
//! honoured via `dotenvy` in `main`). Every variable has a default, so the
//! relay starts with no configuration at all and talks to the public Spaces.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Logging level (default: "info,tryon_relay=debug,tower_http=debug")
//! - `HOST`: Server bind address (default: "0.0.0.0")
//! - `PORT`: Server port (default: 7860)
//! - `TRYON_SPACES`: Comma-separated Space ids or URLs, in fallback order
//!   (default: "yisol/IDM-VTON,Nymbo/Virtual-Try-On,levihsu/OOTDiffusion")
//! - `HUGGINGFACE_TOKEN`: Bearer token sent to every Space
//! - `CONNECT_ATTEMPTS`: Connection attempts per Space (default: 3)
//! - `CONNECT_RETRY_DELAY_SECONDS`: Pause between attempts (default: 5)
//! - `REQUEST_TIMEOUT_SECONDS`: Per-request HTTP timeout (default: 300)
//! - `TEMP_DIR`: Where input images are staged (default: OS temp dir)
//! - `MAX_UPLOAD_BYTES`: Inbound body limit (default: 20 MiB)
//! - `GARMENT_DESCRIPTION`: Garment text sent to IDM-VTON (default: "a clothing item")
//! - `DENOISE_STEPS`: IDM-VTON denoising steps (default: 30)
//! - `SEED`: IDM-VTON seed (default: 42)

use crate::domain::tryon::endpoint::DEFAULT_SPACES;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Remote try-on services, highest precedence first
    pub tryon_spaces: Vec<String>,

    /// HuggingFace API token for gated or private Spaces
    pub huggingface_token: Option<String>,

    pub connect_attempts: u32,
    pub connect_retry_delay_seconds: u64,
    pub request_timeout_seconds: u64,

    /// Directory for staged input images
    pub temp_dir: PathBuf,

    pub max_upload_bytes: usize,

    pub garment_description: String,
    pub denoise_steps: u32,
    pub seed: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed, or if
    /// `TRYON_SPACES` is set but names no Space.
    pub fn from_env() -> anyhow::Result<Self> {
        let tryon_spaces = match std::env::var("TRYON_SPACES") {
            Ok(raw) => parse_list(&raw),
            Err(_) => DEFAULT_SPACES.iter().map(|s| s.to_string()).collect(),
        };
        if tryon_spaces.is_empty() {
            anyhow::bail!("TRYON_SPACES must name at least one Space");
        }

        Ok(Self {
            host: env_or("HOST", "0.0.0.0".to_string())?,
            port: env_or("PORT", 7860)?,
            tryon_spaces,
            huggingface_token: std::env::var("HUGGINGFACE_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            connect_attempts: env_or("CONNECT_ATTEMPTS", 3)?,
            connect_retry_delay_seconds: env_or("CONNECT_RETRY_DELAY_SECONDS", 5)?,
            request_timeout_seconds: env_or("REQUEST_TIMEOUT_SECONDS", 300)?,
            temp_dir: std::env::var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            garment_description: env_or("GARMENT_DESCRIPTION", "a clothing item".to_string())?,
            denoise_steps: env_or("DENOISE_STEPS", 30)?,
            seed: env_or("SEED", 42)?,
        })
    }

    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_secs(self.connect_retry_delay_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load an environment variable with a default value.
///
/// # Errors
///
/// Returns an error if the variable is set but cannot be parsed.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
