use std::env;
use std::time::Duration;
use anyhow::{Result, Context};
use tracing::{info, warn};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub max_file_size_mb: usize,
    pub google_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub classifier_timeout_seconds: u64,
}

/// Settings handed to the Gemini classifier at construction time.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| {
                info!("SERVER_HOST not set, using default: 0.0.0.0");
                "0.0.0.0".to_string()
            }),
            server_port: Self::parse_env_var("SERVER_PORT", 8080)
                .context("Failed to parse SERVER_PORT")?,
            max_file_size_mb: Self::parse_env_var("MAX_FILE_SIZE_MB", 10)
                .context("Failed to parse MAX_FILE_SIZE_MB")?,
            google_api_key: env::var("GOOGLE_API_KEY")
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| {
                info!("GEMINI_MODEL not set, using default: {}", DEFAULT_GEMINI_MODEL);
                DEFAULT_GEMINI_MODEL.to_string()
            }),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            classifier_timeout_seconds: Self::parse_env_var("CLASSIFIER_TIMEOUT_SECONDS", 30)
                .context("Failed to parse CLASSIFIER_TIMEOUT_SECONDS")?,
        };

        config.validate()?;

        if config.google_api_key.is_none() {
            warn!("GOOGLE_API_KEY not set. Classification requests will fail until it is configured.");
        }

        info!(
            server_host = %config.server_host,
            server_port = config.server_port,
            max_file_size_mb = config.max_file_size_mb,
            gemini_model = %config.gemini_model,
            classifier_timeout_seconds = config.classifier_timeout_seconds,
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    fn parse_env_var<T>(var_name: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(val) => match val.parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            Err(_) => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.classifier_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("CLASSIFIER_TIMEOUT_SECONDS must be greater than 0"));
        }
        if self.gemini_model.trim().is_empty() {
            return Err(anyhow::anyhow!("GEMINI_MODEL must not be empty"));
        }
        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Port to bind, honouring the `PORT` variable set by most hosting platforms.
    pub fn listen_port(&self) -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(self.server_port)
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.google_api_key.clone().unwrap_or_default(),
            model: self.gemini_model.clone(),
            base_url: self.gemini_base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(self.classifier_timeout_seconds),
        }
    }
}
